use std::{collections::HashMap, sync::Arc};

use async_graphql_parser::{
    types::{ExecutableDocument, Field, FragmentDefinition, OperationDefinition, OperationType, Selection, SelectionSet},
    Positioned,
};
use async_graphql_value::{Name, Variables};
use engine_config::Config;
use indexmap::IndexMap;
use runtime::cache::{Cache, CacheInner, GlobalCacheConfig};
use serde_json::{Map, Value};

use crate::{
    context::RequestContext,
    executor::Executor,
    query::{Modifier, ReadQuery},
    registry::{Cardinality, EntityId, Registry},
    resolver::{ResolveInput, Resolved, RootResolver},
    response::{Response, ServerError, Shaper},
    Error, RegistryError,
};

/// Runs on every root query before any filter is applied.
pub type QueryHook = Arc<dyn Fn(&mut ReadQuery, &RequestContext) + Send + Sync>;

/// The request payload of the GraphQL-over-HTTP protocol.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: Variables,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de> + Default,
{
    <Option<T> as serde::Deserialize>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A root field backed by an entity.
#[derive(Debug, Clone)]
pub struct RootField {
    name: String,
    entity: String,
    cardinality: Cardinality,
    modifier: Option<Modifier>,
}

impl RootField {
    pub fn single(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, entity, Cardinality::Single)
    }

    pub fn list(name: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::new(name, entity, Cardinality::List)
    }

    /// A modifier applied to every query of this field, after the argument and column filters.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    fn new(name: impl Into<String>, entity: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            entity: entity.into(),
            cardinality,
            modifier: None,
        }
    }
}

pub(crate) struct BoundRootField {
    pub(crate) name: String,
    pub(crate) entity: EntityId,
    pub(crate) cardinality: Cardinality,
    pub(crate) modifier: Option<Modifier>,
}

type CacheFactory = Box<dyn FnOnce(GlobalCacheConfig) -> Cache + Send>;

pub struct EngineBuilder {
    registry: Arc<Registry>,
    executor: Arc<dyn Executor>,
    config: Config,
    cache: Option<CacheFactory>,
    root_fields: Vec<RootField>,
    on_query: Option<QueryHook>,
}

impl EngineBuilder {
    pub fn new(registry: impl Into<Arc<Registry>>, executor: impl Executor + 'static) -> Self {
        Self {
            registry: registry.into(),
            executor: Arc::new(executor),
            config: Config::default(),
            cache: None,
            root_fields: Vec::new(),
            on_query: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Caches root field results in `cache`, with the key prefix and ttl from the config.
    pub fn with_cache(mut self, cache: impl CacheInner + 'static) -> Self {
        self.cache = Some(Box::new(move |config| Cache::new(cache, config)));
        self
    }

    pub fn root_field(mut self, field: RootField) -> Self {
        self.root_fields.push(field);
        self
    }

    pub fn on_query(mut self, hook: impl Fn(&mut ReadQuery, &RequestContext) + Send + Sync + 'static) -> Self {
        self.on_query = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<Engine, RegistryError> {
        let root_fields = self
            .root_fields
            .into_iter()
            .map(|field| {
                let Some(entity) = self.registry.find_entity(&field.entity) else {
                    return Err(RegistryError::UnknownRootEntity {
                        field: field.name,
                        entity: field.entity,
                    });
                };

                let bound = BoundRootField {
                    name: field.name,
                    entity: entity.id(),
                    cardinality: field.cardinality,
                    modifier: field.modifier,
                };

                Ok((bound.name.clone(), bound))
            })
            .collect::<Result<IndexMap<_, _>, _>>()?;

        let cache = self.cache.map(|factory| {
            factory(GlobalCacheConfig {
                key_prefix: self.config.cache.key_prefix.clone(),
                ttl: self.config.cache.ttl,
            })
        });

        Ok(Engine {
            inner: Arc::new(EngineInner {
                registry: self.registry,
                config: self.config,
                executor: self.executor,
                cache,
                root_fields,
                on_query: self.on_query,
            }),
        })
    }
}

pub(crate) struct EngineInner {
    pub(crate) registry: Arc<Registry>,
    pub(crate) config: Config,
    pub(crate) executor: Arc<dyn Executor>,
    pub(crate) cache: Option<Cache>,
    pub(crate) root_fields: IndexMap<String, BoundRootField>,
    pub(crate) on_query: Option<QueryHook>,
}

#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Executes a GraphQL request payload (`query`, `operationName`, `variables`, plus whatever
    /// flags the caller sends along). Root fields resolve one after the other.
    pub async fn execute(&self, payload: Value, context: &RequestContext) -> Response {
        match self.try_execute(&payload, context).await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!("request failed: {error}");
                Response::request_error(error)
            }
        }
    }

    /// Resolves one root field into its normalized value, without shaping it to the selection.
    pub async fn resolve(&self, input: ResolveInput<'_>) -> Result<Resolved, Error> {
        let name = input.field.node.name.node.as_str();

        let root = self
            .inner
            .root_fields
            .get(name)
            .ok_or_else(|| Error::UnknownRootField(name.to_string()))?;

        RootResolver::new(&self.inner, root).resolve(input).await
    }

    async fn try_execute(&self, payload: &Value, context: &RequestContext) -> Result<Response, Error> {
        let request: Request =
            serde_json::from_value(payload.clone()).map_err(|error| Error::InvalidRequest(error.to_string()))?;

        let document = async_graphql_parser::parse_query(&request.query)
            .map_err(|error| Error::InvalidRequest(error.to_string()))?;

        let operation = select_operation(&document, request.operation_name.as_deref())?;

        match operation.ty {
            OperationType::Query => (),
            OperationType::Mutation => return Err(Error::InvalidRequest("mutation operations are not supported".into())),
            OperationType::Subscription => {
                return Err(Error::InvalidRequest("subscription operations are not supported".into()))
            }
        }

        let variables = with_defaults(request.variables, operation);

        let mut fields = Vec::new();
        collect_root_fields(&document.fragments, &operation.selection_set.node, &mut fields)?;

        let shaper = Shaper {
            registry: &self.inner.registry,
            fragments: &document.fragments,
        };

        let mut data = Map::new();
        let mut errors = Vec::new();
        let mut cache = IndexMap::new();

        for field in fields {
            let key = field.node.response_key().node.to_string();

            if field.node.name.node == "__typename" {
                data.insert(key, Value::String("Query".into()));
                continue;
            }

            let input = ResolveInput {
                field,
                fragments: &document.fragments,
                variables: &variables,
                request: payload,
                context,
            };

            let result = match self.resolve(input).await {
                Ok(resolved) => self
                    .shape(&shaper, &field.node, &resolved.value)
                    .map(|value| (value, resolved.cache)),
                Err(error) => Err(error),
            };

            match result {
                Ok((value, status)) => {
                    cache.insert(key.clone(), status);
                    data.insert(key, value);
                }
                Err(error) => {
                    tracing::debug!("root field {key} failed: {error}");
                    errors.push(ServerError::new(error.to_string(), vec![key.clone()]));
                    data.insert(key, Value::Null);
                }
            }
        }

        Ok(Response {
            data: Value::Object(data),
            errors,
            cache,
        })
    }

    fn shape(&self, shaper: &Shaper<'_>, field: &Field, value: &Value) -> Result<Value, Error> {
        let name = field.name.node.as_str();

        let Some(root) = self.inner.root_fields.get(name) else {
            return Err(Error::UnknownRootField(name.to_string()));
        };

        let entity = self.inner.registry.entity(root.entity);

        shaper.shape(entity, &field.selection_set.node, value)
    }
}

fn select_operation<'a>(
    document: &'a ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<&'a OperationDefinition, Error> {
    let mut operations = document.operations.iter();

    let operation = match operation_name {
        Some(name) => operations
            .find(|(candidate, _)| candidate.map(Name::as_str) == Some(name))
            .ok_or_else(|| Error::InvalidRequest(format!("unknown operation named `{name}`")))?,
        None => match (operations.next(), operations.next()) {
            (Some(operation), None) => operation,
            (None, _) => return Err(Error::InvalidRequest("the document contains no operation".into())),
            (Some(_), Some(_)) => {
                return Err(Error::InvalidRequest(
                    "an operation name is required when the document has several operations".into(),
                ))
            }
        },
    };

    Ok(&operation.1.node)
}

/// Variables missing from the request take their declared default.
fn with_defaults(mut variables: Variables, operation: &OperationDefinition) -> Variables {
    for definition in &operation.variable_definitions {
        let definition = &definition.node;

        if variables.contains_key(&definition.name.node) {
            continue;
        }

        // only declared defaults, a nullable variable without one stays undefined
        if let Some(default) = &definition.default_value {
            variables.insert(definition.name.node.clone(), default.node.clone());
        }
    }

    variables
}

fn collect_root_fields<'a>(
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    selection_set: &'a SelectionSet,
    fields: &mut Vec<&'a Positioned<Field>>,
) -> Result<(), Error> {
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => fields.push(field),
            Selection::FragmentSpread(spread) => {
                let name = &spread.node.fragment_name.node;
                let fragment = fragments
                    .get(name)
                    .ok_or_else(|| Error::UnknownFragment(name.to_string()))?;

                collect_root_fields(fragments, &fragment.node.selection_set.node, fields)?;
            }
            Selection::InlineFragment(fragment) => {
                collect_root_fields(fragments, &fragment.node.selection_set.node, fields)?;
            }
        }
    }

    Ok(())
}
