use serde_json::Value;

use crate::{
    eager::expression::RelationNode,
    query::Row,
    registry::{Cardinality, Entity, Registry},
};

/// Turns executor rows into the plain value of a root field: rows are keyed by client names,
/// virtual attributes with a compute function are filled in at every level of the loaded
/// `relations`.
pub(crate) fn normalize(
    registry: &Registry,
    entity: &Entity,
    relations: &[RelationNode],
    cardinality: Cardinality,
    rows: Vec<Row>,
) -> Value {
    let mut rows = rows
        .into_iter()
        .map(|row| Value::Object(normalize_row(registry, entity, relations, row)));

    match cardinality {
        Cardinality::Single => rows.next().unwrap_or(Value::Null),
        Cardinality::List => Value::Array(rows.collect()),
    }
}

fn normalize_row(registry: &Registry, entity: &Entity, relations: &[RelationNode], mut row: Row) -> Row {
    for column in entity.columns() {
        if column.storage_name != column.name {
            if let Some(value) = row.remove(&column.storage_name) {
                row.entry(column.name.clone()).or_insert(value);
            }
        }
    }

    for node in relations {
        let (Some(relation), Some(value)) = (entity.relation(&node.name), row.get_mut(node.key())) else {
            continue;
        };

        let related = registry.entity(relation.target());

        match value {
            Value::Object(related_row) => {
                let normalized = normalize_row(registry, related, &node.children, std::mem::take(related_row));
                *related_row = normalized;
            }
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(related_row) = item {
                        let normalized = normalize_row(registry, related, &node.children, std::mem::take(related_row));
                        *related_row = normalized;
                    }
                }
            }
            _ => (),
        }
    }

    for attribute in entity.virtual_attributes() {
        if let Some(value) = attribute.compute(&row) {
            row.insert(attribute.name().to_string(), value);
        }
    }

    row
}

/// Empty results are never cached.
pub(crate) fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
