use std::sync::Arc;

use async_graphql_parser::types::Field;
use async_graphql_value::Variables;

use crate::{
    context::RequestContext,
    eager::expression::ExpressionError,
    query::{ReadQuery, Row},
};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("no value bound for a condition on column `{0}`")]
    UndefinedBinding(String),
    #[error("the eager expression references the unknown modifier `{0}`")]
    UnknownModifier(String),
    #[error("entity `{entity}` has no relation `{relation}`")]
    UnknownRelation { entity: String, relation: String },
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error("data source error: {0}")]
    Datasource(String),
}

/// Runs read queries against the data source, including their eager load.
///
/// Relation results are attached to each row under the relation name: an object (or `null`)
/// for one-of-one relations and an array for to-many relations.
#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, query: ReadQuery) -> Result<Vec<Row>, ExecutorError>;
}

#[async_trait::async_trait]
impl<T: Executor + ?Sized> Executor for Arc<T> {
    async fn execute(&self, query: ReadQuery) -> Result<Vec<Row>, ExecutorError> {
        T::execute(self, query).await
    }
}

/// What a custom root fetch gets to work with.
pub struct FetchRequest<'a> {
    pub field: &'a Field,
    pub variables: &'a Variables,
    /// The raw request payload.
    pub request: &'a serde_json::Value,
    pub context: &'a RequestContext,
}

/// Replaces the generic translation for the root fields of an entity.
#[async_trait::async_trait]
pub trait CustomFetch: Send + Sync {
    async fn fetch(&self, request: FetchRequest<'_>) -> Result<serde_json::Value, ExecutorError>;
}
