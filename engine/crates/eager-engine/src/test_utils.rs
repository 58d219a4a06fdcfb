use async_graphql_parser::types::{ExecutableDocument, Field, Selection};
use async_graphql_value::Variables;
use engine_config::QueryConfig;
use serde_json::Value;

use crate::{
    context::QueryContext,
    registry::{Entity, EntityBuilder, Join, Registry, RelationKind, VirtualAttribute},
};

pub(crate) fn parse(query: &str) -> ExecutableDocument {
    async_graphql_parser::parse_query(query).unwrap()
}

/// Authors write posts, posts have comments and are tagged through `post_tags`.
pub(crate) fn blog_registry() -> Registry {
    Registry::builder()
        .entity(
            EntityBuilder::new("Author", "authors")
                .column("id")
                .column("name")
                .column_as("email", "email_address")
                .column("born")
                .relation("posts", RelationKind::Many, "Post", Join::new("id", "author_id"))
                .virtual_attribute(VirtualAttribute::new("displayName", ["name", "email"]).with_compute(|row| {
                    let name = row.get("name").and_then(Value::as_str).unwrap_or_default();
                    let email = row.get("email").and_then(Value::as_str).unwrap_or_default();

                    Value::String(format!("{name} <{email}>"))
                })),
        )
        .entity(
            EntityBuilder::new("Post", "posts")
                .column("id")
                .column("title")
                .column("body")
                .column_as("authorId", "author_id")
                .column("published")
                .computed_column("wordCount")
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
        .entity(EntityBuilder::new("Tag", "tags").column("id").column("label"))
        .build()
        .unwrap()
}

pub(crate) fn query_context<'a>(
    registry: &'a Registry,
    document: &'a ExecutableDocument,
    variables: &'a Variables,
    config: &'a QueryConfig,
) -> QueryContext<'a> {
    QueryContext {
        registry,
        fragments: &document.fragments,
        variables,
        config,
    }
}

/// The first root field of the document and the entity it returns.
pub(crate) fn root<'a>(registry: &'a Registry, document: &'a ExecutableDocument) -> (&'a Entity, &'a Field) {
    let (_, operation) = document.operations.iter().next().unwrap();

    let field = operation
        .node
        .selection_set
        .node
        .items
        .iter()
        .find_map(|selection| match &selection.node {
            Selection::Field(field) => Some(&field.node),
            _ => None,
        })
        .unwrap();

    let entity = match field.name.node.as_str() {
        "authors" | "author" => "Author",
        "posts" | "post" => "Post",
        "comments" => "Comment",
        "tags" => "Tag",
        other => unreachable!("no entity for root field {other}"),
    };

    (registry.find_entity(entity).unwrap(), field)
}
