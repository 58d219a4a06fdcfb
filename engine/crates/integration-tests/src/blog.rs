use std::{future::Future, sync::Arc};

use eager_engine::{
    registry::{Join, VirtualAttribute},
    Config, Engine, EngineBuilder, EntityBuilder, Registry, RelationKind, RequestContext, Response, RootField, Row,
};
use runtime_local::{InMemoryCache, MemoryDatabase};
use serde_json::{json, Value};

/// Runs `test` against a fresh blog with the default configuration and returns the pretty
/// printed response.
#[track_caller]
pub fn query_blog<F, U>(test: F) -> String
where
    F: FnOnce(TestApi) -> U,
    U: Future<Output = Response>,
{
    with_blog(Config::default(), |api| async move { pretty(&test(api).await) })
}

#[track_caller]
pub fn query_blog_with_config<F, U>(config: &str, test: F) -> String
where
    F: FnOnce(TestApi) -> U,
    U: Future<Output = Response>,
{
    let config = Config::from_toml_str(config).unwrap();
    with_blog(config, |api| async move { pretty(&test(api).await) })
}

#[track_caller]
pub fn with_blog<F, U, T>(config: Config, test: F) -> T
where
    F: FnOnce(TestApi) -> U,
    U: Future<Output = T>,
{
    super::init_logging();
    super::runtime().block_on(test(TestApi::new(config)))
}

pub fn pretty(response: &Response) -> String {
    serde_json::to_string_pretty(response).unwrap()
}

#[derive(Clone)]
pub struct TestApi {
    engine: Engine,
    database: Arc<MemoryDatabase>,
}

impl TestApi {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(registry());
        let database = Arc::new(database(registry.clone()));

        let engine = EngineBuilder::new(registry, database.clone())
            .with_config(config)
            .with_cache(InMemoryCache::new())
            .root_field(RootField::list("authors", "Author"))
            .root_field(RootField::single("author", "Author"))
            .root_field(RootField::list("posts", "Post"))
            .root_field(RootField::single("post", "Post"))
            .root_field(RootField::list("tags", "Tag"))
            .build()
            .unwrap();

        Self { engine, database }
    }

    pub async fn execute(&self, query: &str) -> Response {
        self.execute_payload(json!({ "query": query })).await
    }

    pub async fn execute_with_variables(&self, query: &str, variables: Value) -> Response {
        self.execute_payload(json!({ "query": query, "variables": variables }))
            .await
    }

    pub async fn execute_payload(&self, payload: Value) -> Response {
        self.engine.execute(payload, &RequestContext::new()).await
    }

    /// Statements the data source ran so far, one per line.
    pub async fn statements(&self) -> String {
        self.database.statements().await.join("\n")
    }

    pub fn executed_queries(&self) -> usize {
        self.database.executed_queries()
    }
}

pub fn registry() -> Registry {
    Registry::builder()
        .entity(
            EntityBuilder::new("Author", "authors")
                .column("id")
                .column("name")
                .column_as("email", "email_address")
                .column("born")
                .relation("posts", RelationKind::Many, "Post", Join::new("id", "author_id"))
                .virtual_attribute(
                    VirtualAttribute::new("displayName", ["name", "email"]).with_compute(|row| {
                        match (row.get("name").and_then(Value::as_str), row.get("email").and_then(Value::as_str)) {
                            (Some(name), Some(email)) => Value::String(format!("{name} <{email}>")),
                            (Some(name), None) => Value::String(name.to_string()),
                            _ => Value::Null,
                        }
                    }),
                ),
        )
        .entity(
            EntityBuilder::new("Post", "posts")
                .column("id")
                .column("title")
                .column("body")
                .column_as("authorId", "author_id")
                .column("published")
                .relation("author", RelationKind::One, "Author", Join::new("author_id", "id"))
                .relation("comments", RelationKind::Many, "Comment", Join::new("id", "post_id"))
                .relation(
                    "tags",
                    RelationKind::Many,
                    "Tag",
                    Join::new("id", "id").through("post_tags", "post_id", "tag_id"),
                )
                .virtual_attribute(VirtualAttribute::new("excerpt", ["body"]).with_compute(|row| {
                    let body = row.get("body").and_then(Value::as_str).unwrap_or_default();
                    Value::String(body.split_whitespace().take(3).collect::<Vec<_>>().join(" "))
                })),
        )
        .entity(
            EntityBuilder::new("Comment", "comments")
                .column("id")
                .column("text")
                .column_as("postId", "post_id")
                .relation("post", RelationKind::One, "Post", Join::new("post_id", "id")),
        )
        .entity(
            EntityBuilder::new("Tag", "tags")
                .column("id")
                .column("label")
                .relation(
                    "posts",
                    RelationKind::Many,
                    "Post",
                    Join::new("id", "id").through("post_tags", "tag_id", "post_id"),
                ),
        )
        .build()
        .unwrap()
}

fn database(registry: Arc<Registry>) -> MemoryDatabase {
    MemoryDatabase::new(registry)
        .with_table(
            "authors",
            rows(json!([
                { "id": 1, "name": "Ada Lovelace", "email_address": "ada@example.com", "born": 1815 },
                { "id": 2, "name": "Grace Hopper", "email_address": "grace@example.com", "born": 1906 },
                { "id": 3, "name": "Alan Turing", "email_address": null, "born": 1912 },
            ])),
        )
        .with_table(
            "posts",
            rows(json!([
                { "id": 1, "title": "Notes on the Analytical Engine", "body": "The engine weaves algebraic patterns", "author_id": 1, "published": true },
                { "id": 2, "title": "Sketch of the engine", "body": "A translation with notes", "author_id": 1, "published": false },
                { "id": 3, "title": "The first compiler", "body": "Programs writing programs", "author_id": 2, "published": true },
                { "id": 4, "title": "Computable numbers", "body": "On computable numbers with an application", "author_id": 3, "published": true },
            ])),
        )
        .with_table(
            "comments",
            rows(json!([
                { "id": 1, "text": "Brilliant", "post_id": 1 },
                { "id": 2, "text": "Poetical science", "post_id": 1 },
                { "id": 3, "text": "Bugs!", "post_id": 3 },
            ])),
        )
        .with_table(
            "tags",
            rows(json!([
                { "id": 1, "label": "history" },
                { "id": 2, "label": "compilers" },
                { "id": 3, "label": "math" },
            ])),
        )
        .with_table(
            "post_tags",
            rows(json!([
                { "post_id": 1, "tag_id": 1 },
                { "post_id": 1, "tag_id": 3 },
                { "post_id": 3, "tag_id": 2 },
                { "post_id": 3, "tag_id": 1 },
                { "post_id": 4, "tag_id": 3 },
            ])),
        )
}

fn rows(value: Value) -> Vec<Row> {
    serde_json::from_value(value).unwrap()
}
