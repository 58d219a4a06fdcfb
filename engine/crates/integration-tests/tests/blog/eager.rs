use eager_engine::Config;
use expect_test::expect;
use indoc::indoc;
use integration_tests::blog::{pretty, query_blog, with_blog};

#[test]
fn nested_relations_are_fetched_in_one_batch_per_level() {
    let (response, statements) = with_blog(Config::default(), |api| async move {
        let query = indoc! {r#"
            query {
              authors(orderBy: id, limit: 2) {
                name
                posts(orderByDesc: id) {
                  title
                  comments { text }
                }
              }
            }
        "#};

        let response = api.execute(query).await;

        (pretty(&response), api.statements().await)
    });

    let expected = expect![[r#"
        {
          "data": {
            "authors": [
              {
                "name": "Ada Lovelace",
                "posts": [
                  {
                    "title": "Sketch of the engine",
                    "comments": []
                  },
                  {
                    "title": "Notes on the Analytical Engine",
                    "comments": [
                      {
                        "text": "Brilliant"
                      },
                      {
                        "text": "Poetical science"
                      }
                    ]
                  }
                ]
              },
              {
                "name": "Grace Hopper",
                "posts": [
                  {
                    "title": "The first compiler",
                    "comments": [
                      {
                        "text": "Bugs!"
                      }
                    ]
                  }
                ]
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);

    let expected = expect![[r#"
        select authors.name from authors order by id asc limit 2
        select posts.title from posts where author_id in [1, 2] order by id desc
        select comments.text from comments where post_id in [3, 2, 1]"#]];

    expected.assert_eq(&statements);
}

#[test]
fn aliased_selections_of_one_relation() {
    let (response, statements) = with_blog(Config::default(), |api| async move {
        let query = indoc! {r#"
            query {
              authors(orderBy: id, limit: 1) {
                first: posts(orderBy: id, limit: 1) { title }
                all: posts(orderByDesc: id) { id }
              }
            }
        "#};

        let response = api.execute(query).await;

        (pretty(&response), api.statements().await)
    });

    let expected = expect![[r#"
        {
          "data": {
            "authors": [
              {
                "first": [
                  {
                    "title": "Notes on the Analytical Engine"
                  }
                ],
                "all": [
                  {
                    "id": 2
                  },
                  {
                    "id": 1
                  }
                ]
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);

    let expected = expect![[r#"
        select * from authors order by id asc limit 1
        select posts.title from posts where author_id in [1] order by id asc limit 1
        select posts.id from posts where author_id in [1] order by id desc"#]];

    expected.assert_eq(&statements);
}

#[test]
fn relation_selected_twice_without_aliases() {
    let response = query_blog(|api| async move {
        let query = indoc! {r#"
            query {
              authors { posts { title } ...PostIds }
            }

            fragment PostIds on Author {
              posts { id }
            }
        "#};

        api.execute(query).await
    });

    let expected = expect![[r#"
        {
          "data": {
            "authors": null
          },
          "errors": [
            {
              "message": "`posts` selects a relation of `Author` more than once, alias each selection",
              "path": [
                "authors"
              ]
            }
          ]
        }"#]];

    expected.assert_eq(&response);
}

#[test]
fn many_to_many_through_a_pivot_table() {
    let (response, statements) = with_blog(Config::default(), |api| async move {
        let query = indoc! {r#"
            query {
              posts(publishedEq: true, orderBy: title) {
                title
                tags(orderBy: label) { label }
              }
            }
        "#};

        let response = api.execute(query).await;

        (pretty(&response), api.statements().await)
    });

    let expected = expect![[r#"
        {
          "data": {
            "posts": [
              {
                "title": "Computable numbers",
                "tags": [
                  {
                    "label": "math"
                  }
                ]
              },
              {
                "title": "Notes on the Analytical Engine",
                "tags": [
                  {
                    "label": "history"
                  },
                  {
                    "label": "math"
                  }
                ]
              },
              {
                "title": "The first compiler",
                "tags": [
                  {
                    "label": "compilers"
                  },
                  {
                    "label": "history"
                  }
                ]
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);

    let expected = expect![[r#"
        select posts.title from posts where published = true order by title asc
        select * from post_tags where post_id in [4, 1, 3]
        select tags.label from tags where id in [1, 3, 2] order by label asc"#]];

    expected.assert_eq(&statements);
}

#[test]
fn belongs_to_with_virtual_attribute() {
    let (response, statements) = with_blog(Config::default(), |api| async move {
        let query = indoc! {r#"
            query {
              post(idEq: 3) {
                title
                author { name displayName }
              }
            }
        "#};

        let response = api.execute(query).await;

        (pretty(&response), api.statements().await)
    });

    let expected = expect![[r#"
        {
          "data": {
            "post": {
              "title": "The first compiler",
              "author": {
                "name": "Grace Hopper",
                "displayName": "Grace Hopper <grace@example.com>"
              }
            }
          }
        }"#]];

    expected.assert_eq(&response);

    let expected = expect![[r#"
        select posts.title from posts where id = 3
        select authors.name, authors.email_address as email from authors where id in [2]"#]];

    expected.assert_eq(&statements);
}

#[test]
fn virtual_attributes_fetch_their_dependencies() {
    let response = query_blog(|api| async move {
        let query = indoc! {r#"
            query {
              authors(orderBy: born) { displayName }
            }
        "#};

        api.execute(query).await
    });

    let expected = expect![[r#"
        {
          "data": {
            "authors": [
              {
                "displayName": "Ada Lovelace <ada@example.com>"
              },
              {
                "displayName": "Grace Hopper <grace@example.com>"
              },
              {
                "displayName": "Alan Turing"
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);
}

#[test]
fn without_select_optimization_every_column_is_fetched() {
    let config = Config::from_toml_str("[query]\nselect_optimization = false").unwrap();

    let (response, statements) = with_blog(config, |api| async move {
        let query = indoc! {r#"
            query {
              authors(idEq: 1) {
                name
                posts { title }
              }
            }
        "#};

        let response = api.execute(query).await;

        (pretty(&response), api.statements().await)
    });

    let expected = expect![[r#"
        {
          "data": {
            "authors": [
              {
                "name": "Ada Lovelace",
                "posts": [
                  {
                    "title": "Notes on the Analytical Engine"
                  },
                  {
                    "title": "Sketch of the engine"
                  }
                ]
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);

    let expected = expect![[r#"
        select * from authors where id = 1
        select * from posts where author_id in [1]"#]];

    expected.assert_eq(&statements);
}

#[test]
fn unqualified_columns() {
    let config = Config::from_toml_str("[query]\nqualify_columns = false").unwrap();

    let statements = with_blog(config, |api| async move {
        api.execute("{ authors(idEq: 1) { name email } }").await;
        api.statements().await
    });

    let expected = expect![[r#"select name, email_address as email from authors where id = 1"#]];
    expected.assert_eq(&statements);
}
