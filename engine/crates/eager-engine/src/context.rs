use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

use async_graphql_parser::{
    types::{FragmentDefinition, SelectionSet},
    Positioned,
};
use async_graphql_value::{Name, Variables};
use engine_config::QueryConfig;

use crate::{registry::Registry, Error};

/// Everything compiling one root field needs. Request scoped.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    pub registry: &'a Registry,
    pub fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    pub variables: &'a Variables,
    pub config: &'a QueryConfig,
}

impl<'a> QueryContext<'a> {
    pub(crate) fn fragment(&self, name: &Name) -> Result<&'a SelectionSet, Error> {
        self.fragments
            .get(name)
            .map(|fragment| &fragment.node.selection_set.node)
            .ok_or_else(|| Error::UnknownFragment(name.to_string()))
    }
}

/// Per-request data from the caller, made available to query hooks and custom fetches.
#[derive(Default)]
pub struct RequestContext {
    by_type: HashMap<TypeId, Box<dyn Any + Sync + Send>>,
    by_name: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed_get<T>(&self) -> Option<&T>
    where
        T: 'static + Send + Sync,
    {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn typed_insert<T>(&mut self, value: T)
    where
        T: 'static + Send + Sync,
    {
        self.by_type.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get(&self, name: &str) -> Option<&String> {
        self.by_name.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.by_name.insert(name.into(), value.into());
    }
}
