use std::collections::HashMap;

use async_graphql_parser::{
    types::{FragmentDefinition, Selection, SelectionSet},
    Positioned,
};
use async_graphql_value::Name;
use indexmap::IndexMap;
use runtime::cache::CacheReadStatus;
use serde_json::{Map, Value};

use crate::{
    registry::{Entity, Registry},
    Error,
};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ServerError {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl ServerError {
    pub fn new(message: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            message: message.into(),
            path,
        }
    }
}

/// A GraphQL response. Failed root fields are `null` in `data` with an entry in `errors`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Response {
    pub data: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ServerError>,
    /// How the cache behaved for each resolved root field, by response key.
    #[serde(skip)]
    pub cache: IndexMap<String, CacheReadStatus>,
}

impl Response {
    pub(crate) fn request_error(error: Error) -> Self {
        Self {
            data: Value::Null,
            errors: vec![ServerError::new(error.to_string(), Vec::new())],
            cache: IndexMap::new(),
        }
    }

    pub fn cache_status(&self, response_key: &str) -> Option<CacheReadStatus> {
        self.cache.get(response_key).copied()
    }
}

pub(crate) struct Shaper<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
}

impl Shaper<'_> {
    /// Projects a normalized value of `entity` onto the selection set: response keys follow
    /// aliases, in selection order, and unselected columns are dropped.
    pub(crate) fn shape(&self, entity: &Entity, selection_set: &SelectionSet, value: &Value) -> Result<Value, Error> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| self.shape(entity, selection_set, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(row) => {
                let mut output = Map::new();
                self.shape_object(entity, selection_set, row, &mut output)?;

                Ok(Value::Object(output))
            }
            other => Ok(other.clone()),
        }
    }

    fn shape_object(
        &self,
        entity: &Entity,
        selection_set: &SelectionSet,
        row: &Map<String, Value>,
        output: &mut Map<String, Value>,
    ) -> Result<(), Error> {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    let field = &field.node;
                    let name = field.name.node.as_str();
                    let key = field.response_key().node.to_string();

                    let value = if name == "__typename" {
                        Value::String(entity.name().to_string())
                    } else if let Some(relation) = entity.relation(name) {
                        match row.get(&key) {
                            Some(value) => self.shape(
                                self.registry.entity(relation.target()),
                                &field.selection_set.node,
                                value,
                            )?,
                            None => Value::Null,
                        }
                    } else {
                        row.get(name).cloned().unwrap_or_default()
                    };

                    output.insert(key, value);
                }
                Selection::FragmentSpread(spread) => {
                    let name = &spread.node.fragment_name.node;
                    let fragment = self
                        .fragments
                        .get(name)
                        .ok_or_else(|| Error::UnknownFragment(name.to_string()))?;

                    self.shape_object(entity, &fragment.node.selection_set.node, row, output)?;
                }
                Selection::InlineFragment(fragment) => {
                    self.shape_object(entity, &fragment.node.selection_set.node, row, output)?;
                }
            }
        }

        Ok(())
    }
}
