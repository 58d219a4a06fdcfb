use expect_test::expect;
use integration_tests::blog::query_blog;

#[test]
fn unknown_fragment_fails_the_root_field() {
    let response = query_blog(|api| async move { api.execute("{ authors { ...Missing } tags { label } }").await });

    let expected = expect![[r#"
        {
          "data": {
            "authors": null,
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
          },
          "errors": [
            {
              "message": "unknown fragment `Missing`",
              "path": [
                "authors"
              ]
            }
          ]
        }"#]];

    expected.assert_eq(&response);
}

#[test]
fn object_literals_are_not_supported() {
    let response = query_blog(|api| async move { api.execute("{ posts(idIn: [1, { id: 2 }]) { id } }").await });

    let expected = expect![[r#"
        {
          "data": {
            "posts": null
          },
          "errors": [
            {
              "message": "unsupported argument literal: {id: 2}",
              "path": [
                "posts"
              ]
            }
          ]
        }"#]];

    expected.assert_eq(&response);
}

#[test]
fn unbound_root_field() {
    let response = query_blog(|api| async move { api.execute("{ comments { text } }").await });

    let expected = expect![[r#"
        {
          "data": {
            "comments": null
          },
          "errors": [
            {
              "message": "no resolver registered for root field `comments`",
              "path": [
                "comments"
              ]
            }
          ]
        }"#]];

    expected.assert_eq(&response);
}

#[test]
fn mutations_are_rejected() {
    let response = query_blog(|api| async move { api.execute("mutation { authors { id } }").await });

    let expected = expect![[r#"
        {
          "data": null,
          "errors": [
            {
              "message": "invalid request: mutation operations are not supported"
            }
          ]
        }"#]];

    expected.assert_eq(&response);
}
