use eager_engine::Config;
use expect_test::expect;
use indoc::indoc;
use integration_tests::blog::{pretty, query_blog, query_blog_with_config, with_blog};
use serde_json::json;

#[test]
fn variables_reach_the_filters() {
    let (response, statements) = with_blog(Config::default(), |api| async move {
        let query = indoc! {r#"
            query Posts($title: String, $ids: [Int]) {
              posts(titleLikeNoCase: $title, idIn: $ids, orderByDesc: id) { id title }
            }
        "#};

        let response = api
            .execute_with_variables(query, json!({ "title": "%engine%", "ids": [1, 2, 4] }))
            .await;

        (pretty(&response), api.statements().await)
    });

    let expected = expect![[r#"
        {
          "data": {
            "posts": [
              {
                "id": 2,
                "title": "Sketch of the engine"
              },
              {
                "id": 1,
                "title": "Notes on the Analytical Engine"
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);

    let expected = expect![[
        r#"select posts.id, posts.title from posts where title ilike "%engine%" and id in [1, 2, 4] order by id desc"#
    ]];

    expected.assert_eq(&statements);
}

#[test]
fn variable_defaults() {
    let response = query_blog(|api| async move {
        let query = indoc! {r#"
            query Posts($author: Int = 2) {
              posts(authorIdEq: $author) { title authorId }
            }
        "#};

        api.execute(query).await
    });

    let expected = expect![[r#"
        {
          "data": {
            "posts": [
              {
                "title": "The first compiler",
                "authorId": 2
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);
}

#[test]
fn range_on_a_relation() {
    let (response, statements) = with_blog(Config::default(), |api| async move {
        let query = indoc! {r#"
            query {
              author(idEq: 1) {
                name
                posts(range: [1, 1], orderBy: id) { title }
              }
            }
        "#};

        let response = api.execute(query).await;

        (pretty(&response), api.statements().await)
    });

    let expected = expect![[r#"
        {
          "data": {
            "author": {
              "name": "Ada Lovelace",
              "posts": [
                {
                  "title": "Sketch of the engine"
                }
              ]
            }
          }
        }"#]];

    expected.assert_eq(&response);

    let expected = expect![[r#"
        select authors.name from authors where id = 1
        select posts.title from posts where author_id in [1] order by id asc limit 1 offset 1"#]];

    expected.assert_eq(&statements);
}

#[test]
fn null_checks() {
    let response = query_blog(|api| async move {
        let query = indoc! {r#"
            query {
              withoutEmail: authors(emailIsNull: true) { name }
              withEmail: authors(emailIsNull: false, orderByDesc: name) { name }
            }
        "#};

        api.execute(query).await
    });

    let expected = expect![[r#"
        {
          "data": {
            "withoutEmail": [
              {
                "name": "Alan Turing"
              }
            ],
            "withEmail": [
              {
                "name": "Grace Hopper"
              },
              {
                "name": "Ada Lovelace"
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);
}

#[test]
fn undefined_variable_is_a_datasource_error() {
    let response = query_blog(|api| async move {
        let query = indoc! {r#"
            query Posts($min: Int) {
              posts(idGt: $min) { id }
            }
        "#};

        api.execute(query).await
    });

    let expected = expect![[r#"
        {
          "data": {
            "posts": null
          },
          "errors": [
            {
              "message": "no value bound for a condition on column `id`",
              "path": [
                "posts"
              ]
            }
          ]
        }"#]];

    expected.assert_eq(&response);
}

#[test]
fn undefined_variable_is_skipped_when_configured() {
    let config = indoc! {r#"
        [query]
        skip_undefined = true
    "#};

    let response = query_blog_with_config(config, |api| async move {
        let query = indoc! {r#"
            query Posts($min: Int) {
              posts(idGt: $min, publishedEq: false) { id }
            }
        "#};

        api.execute(query).await
    });

    let expected = expect![[r#"
        {
          "data": {
            "posts": [
              {
                "id": 2
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);
}
