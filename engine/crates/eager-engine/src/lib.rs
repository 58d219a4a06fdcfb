//! Translates client selection trees into one batched read query per root field.
//!
//! A root field's selection is compiled into an eager-load expression naming every selected
//! relation, plus a flat table of named modifiers (column projections and argument filters)
//! referenced from that expression. The executor runs the whole tree as a single fetch and the
//! normalized result is cached per request shape.

mod arguments;
mod cache_key;
mod context;
mod engine;
mod error;
mod executor;
mod normalize;
mod projection;
mod query;
mod resolver;
mod response;
#[cfg(test)]
mod test_utils;
mod value;

pub mod eager;
pub mod registry;

pub use context::{QueryContext, RequestContext};
pub use eager::{compile, expression, EagerLoad};
pub use engine::{Engine, EngineBuilder, QueryHook, Request, RootField};
pub use error::{Error, RegistryError};
pub use executor::{CustomFetch, Executor, ExecutorError, FetchRequest};
pub use query::{ColumnRef, Condition, Direction, FilterTable, Modifier, Operator, OrderBy, ReadQuery, Row};
pub use registry::{Cardinality, Entity, EntityBuilder, EntityId, Registry, RegistryBuilder, RelationKind};
pub use resolver::{ResolveInput, Resolved};
pub use response::{Response, ServerError};
pub use value::resolve_value;

pub use engine_config::Config;
pub use runtime::cache::CacheReadStatus;
