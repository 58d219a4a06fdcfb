use eager_engine::Config;
use expect_test::expect;
use indoc::indoc;
use integration_tests::blog::{pretty, query_blog, with_blog};

#[test]
fn named_and_inline_fragments() {
    let (response, statements) = with_blog(Config::default(), |api| async move {
        let query = indoc! {r#"
            query {
              people: authors(idLte: 2) {
                ...AuthorFields
                ... on Author {
                  writings: posts(publishedEq: true) { ...PostFields }
                }
              }
            }

            fragment AuthorFields on Author {
              __typename
              name
            }

            fragment PostFields on Post {
              title
              excerpt
            }
        "#};

        let response = api.execute(query).await;

        (pretty(&response), api.statements().await)
    });

    let expected = expect![[r#"
        {
          "data": {
            "people": [
              {
                "__typename": "Author",
                "name": "Ada Lovelace",
                "writings": [
                  {
                    "title": "Notes on the Analytical Engine",
                    "excerpt": "The engine weaves"
                  }
                ]
              },
              {
                "__typename": "Author",
                "name": "Grace Hopper",
                "writings": [
                  {
                    "title": "The first compiler",
                    "excerpt": "Programs writing programs"
                  }
                ]
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);

    let expected = expect![[r#"
        select authors.name from authors where id <= 2
        select posts.title, posts.body from posts where published = true and author_id in [1, 2]"#]];

    expected.assert_eq(&statements);
}

#[test]
fn root_level_fragments() {
    let response = query_blog(|api| async move {
        let query = indoc! {r#"
            query {
              __typename
              ...Roots
            }

            fragment Roots on Query {
              tags { label }
            }
        "#};

        api.execute(query).await
    });

    let expected = expect![[r#"
        {
          "data": {
            "__typename": "Query",
            "tags": [
              {
                "label": "history"
              },
              {
                "label": "compilers"
              },
              {
                "label": "math"
              }
            ]
          }
        }"#]];

    expected.assert_eq(&response);
}
