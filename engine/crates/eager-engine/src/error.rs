use crate::executor::ExecutorError;

/// Failures while serving a request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported argument literal: {0}")]
    UnsupportedArgumentLiteral(String),
    #[error("unknown fragment `{0}`")]
    UnknownFragment(String),
    #[error("`{key}` selects a relation of `{entity}` more than once, alias each selection")]
    DuplicateRelation { entity: String, key: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("no resolver registered for root field `{0}`")]
    UnknownRootField(String),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

/// Failures while building the entity registry. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("relation `{relation}` of entity `{entity}` has an unsupported kind `{kind}`")]
    UnsupportedRelationKind {
        entity: String,
        relation: String,
        kind: String,
    },
    #[error("relation `{relation}` of entity `{entity}` refers to the unregistered entity `{target}`")]
    MissingRelatedEntity {
        entity: String,
        relation: String,
        target: String,
    },
    #[error("entity `{0}` is registered more than once")]
    DuplicateEntity(String),
    #[error("root field `{field}` is bound to the unregistered entity `{entity}`")]
    UnknownRootEntity { field: String, entity: String },
}
