use std::collections::HashMap;

use async_graphql_parser::{
    types::{Field, FragmentDefinition},
    Positioned,
};
use async_graphql_value::{Name, Variables};
use runtime::cache::{cached_fetch, CacheReadStatus};
use serde_json::Value;
use tracing_futures::Instrument;

use crate::{
    arguments::argument_modifier,
    cache_key,
    context::{QueryContext, RequestContext},
    eager,
    engine::{BoundRootField, EngineInner},
    executor::FetchRequest,
    normalize::{is_empty, normalize},
    projection::projection_modifier,
    query::ReadQuery,
    Error,
};

/// The inputs of one root field resolution.
#[derive(Clone, Copy)]
pub struct ResolveInput<'a> {
    pub field: &'a Positioned<Field>,
    pub fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    pub variables: &'a Variables,
    /// The raw request payload, used for the cache key and the bypass flag.
    pub request: &'a Value,
    pub context: &'a RequestContext,
}

/// A normalized root field value and how the cache behaved.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub value: Value,
    pub cache: CacheReadStatus,
}

pub(crate) struct RootResolver<'a> {
    engine: &'a EngineInner,
    root: &'a BoundRootField,
}

impl<'a> RootResolver<'a> {
    pub(crate) fn new(engine: &'a EngineInner, root: &'a BoundRootField) -> Self {
        Self { engine, root }
    }

    pub(crate) async fn resolve(&self, input: ResolveInput<'_>) -> Result<Resolved, Error> {
        let entity = self.engine.registry.entity(self.root.entity);

        if let Some(custom) = entity.custom_fetch(self.root.cardinality) {
            tracing::debug!(entity = entity.name(), field = self.root.name.as_str(), "delegating to custom fetch");

            let value = custom
                .fetch(FetchRequest {
                    field: &input.field.node,
                    variables: input.variables,
                    request: input.request,
                    context: input.context,
                })
                .await?;

            return Ok(Resolved {
                value,
                cache: CacheReadStatus::Bypass,
            });
        }

        let cache_config = &self.engine.config.cache;

        let cache = match &self.engine.cache {
            Some(cache) if cache_config.enabled && !cache_key::is_bypassed(input.request, &cache_config.bypass_field) => {
                let discriminator = format!("{}:{}", self.root.name, input.field.node.response_key().node);
                let digest = cache_key::digest(&discriminator, input.request, &cache_config.bypass_field, input.variables);

                Some((cache, cache.build_key(&digest)))
            }
            _ => None,
        };

        let fetched = cached_fetch(cache, self.fetch(input), |value| !is_empty(value)).await?;

        Ok(Resolved {
            value: fetched.value,
            cache: fetched.status,
        })
    }

    async fn fetch(&self, input: ResolveInput<'_>) -> Result<Value, Error> {
        let registry = &self.engine.registry;
        let config = &self.engine.config.query;
        let entity = registry.entity(self.root.entity);
        let field = &input.field.node;
        let selection_set = &field.selection_set.node;

        let ctx = QueryContext {
            registry,
            fragments: input.fragments,
            variables: input.variables,
            config,
        };

        let eager = eager::compile(&ctx, entity, selection_set)?;
        let arguments = argument_modifier(&ctx, entity, field)?;
        let projection = projection_modifier(&ctx, entity, selection_set)?;

        let mut query = ReadQuery::new(entity);
        query.skip_undefined(config.skip_undefined);

        if let Some(hook) = &self.engine.on_query {
            hook(&mut query, input.context);
        }

        for modifier in [arguments.as_ref(), projection.as_ref(), self.root.modifier.as_ref()]
            .into_iter()
            .flatten()
        {
            query.modify(modifier);
        }

        let relations = eager.relations().to_vec();

        if !eager.is_empty() {
            query.with_eager(eager);
        }

        let rows = self
            .engine
            .executor
            .execute(query)
            .instrument(tracing::info_span!("fetch", entity = entity.name(), field = self.root.name.as_str()))
            .await?;

        Ok(normalize(registry, entity, &relations, self.root.cardinality, rows))
    }
}
