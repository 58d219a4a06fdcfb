use eager_engine::{CacheReadStatus, Config};
use indoc::indoc;
use integration_tests::blog::with_blog;
use serde_json::json;

#[test]
fn identical_request_is_served_from_cache() {
    with_blog(Config::default(), |api| async move {
        let query = "{ authors { name posts { title } } }";

        let first = api.execute(query).await;
        assert_eq!(Some(CacheReadStatus::Miss), first.cache_status("authors"));
        assert_eq!(2, api.executed_queries());

        let second = api.execute(query).await;
        assert_eq!(Some(CacheReadStatus::Hit), second.cache_status("authors"));
        assert_eq!(2, api.executed_queries());

        assert_eq!(first.data, second.data);
    });
}

#[test]
fn bypass_flag_always_fetches() {
    with_blog(Config::default(), |api| async move {
        let payload = json!({ "query": "{ authors { name } }", "skipCache": true });

        let first = api.execute_payload(payload.clone()).await;
        let second = api.execute_payload(payload).await;

        assert_eq!(Some(CacheReadStatus::Bypass), first.cache_status("authors"));
        assert_eq!(Some(CacheReadStatus::Bypass), second.cache_status("authors"));
        assert_eq!(2, api.executed_queries());

        // bypassed requests never populate the cache
        let cached = api.execute("{ authors { name } }").await;
        assert_eq!(Some(CacheReadStatus::Miss), cached.cache_status("authors"));
    });
}

#[test]
fn variables_are_part_of_the_key() {
    with_blog(Config::default(), |api| async move {
        let query = "query Author($id: Int) { author(idEq: $id) { name } }";

        let ada = api.execute_with_variables(query, json!({ "id": 1 })).await;
        let grace = api.execute_with_variables(query, json!({ "id": 2 })).await;
        let ada_again = api.execute_with_variables(query, json!({ "id": 1 })).await;

        assert_eq!(Some(CacheReadStatus::Miss), ada.cache_status("author"));
        assert_eq!(Some(CacheReadStatus::Miss), grace.cache_status("author"));
        assert_eq!(Some(CacheReadStatus::Hit), ada_again.cache_status("author"));

        assert_eq!(json!({ "author": { "name": "Ada Lovelace" } }), ada_again.data);
        assert_eq!(2, api.executed_queries());
    });
}

#[test]
fn aliased_root_fields_are_cached_separately() {
    with_blog(Config::default(), |api| async move {
        let query = indoc! {r#"
            query {
              first: authors(idEq: 1) { name }
              second: authors(idEq: 2) { name }
            }
        "#};

        let response = api.execute(query).await;
        assert_eq!(Some(CacheReadStatus::Miss), response.cache_status("first"));
        assert_eq!(Some(CacheReadStatus::Miss), response.cache_status("second"));

        let response = api.execute(query).await;
        assert_eq!(Some(CacheReadStatus::Hit), response.cache_status("first"));
        assert_eq!(Some(CacheReadStatus::Hit), response.cache_status("second"));

        assert_eq!(
            json!({ "first": [{ "name": "Ada Lovelace" }], "second": [{ "name": "Grace Hopper" }] }),
            response.data
        );
    });
}

#[test]
fn empty_results_are_refetched() {
    with_blog(Config::default(), |api| async move {
        let query = "{ authors(idEq: 99) { name } }";

        api.execute(query).await;
        let second = api.execute(query).await;

        assert_eq!(Some(CacheReadStatus::Miss), second.cache_status("authors"));
        assert_eq!(json!({ "authors": [] }), second.data);
        assert_eq!(2, api.executed_queries());
    });
}

#[test]
fn disabled_cache() {
    let config = Config::from_toml_str("[cache]\nenabled = false").unwrap();

    with_blog(config, |api| async move {
        let query = "{ tags { label } }";

        api.execute(query).await;
        let second = api.execute(query).await;

        assert_eq!(Some(CacheReadStatus::Bypass), second.cache_status("tags"));
        assert_eq!(2, api.executed_queries());
    });
}
