use std::{collections::HashMap, fmt, sync::Arc};

use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use super::Column;
use crate::query::{Direction, Operator, ReadQuery};

type FilterFn = dyn Fn(&mut ReadQuery, Option<&ConstValue>) + Send + Sync;

/// Applies one argument to a query. The value is `None` when the argument resolved to no value.
#[derive(Clone)]
pub struct ArgumentFilter(Arc<FilterFn>);

impl ArgumentFilter {
    pub fn new(apply: impl Fn(&mut ReadQuery, Option<&ConstValue>) + Send + Sync + 'static) -> Self {
        Self(Arc::new(apply))
    }

    pub fn apply(&self, query: &mut ReadQuery, value: Option<&ConstValue>) {
        (self.0)(query, value)
    }

    /// `column <operator> value`, the value is passed through as is.
    pub fn condition(column: impl Into<String>, operator: Operator) -> Self {
        let column = column.into();

        Self::new(move |query, value| {
            query.filter(column.clone(), operator, value.cloned());
        })
    }
}

impl fmt::Debug for ArgumentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ArgumentFilter")
    }
}

const SUFFIXES: &[(&str, Operator)] = &[
    ("Eq", Operator::Eq),
    ("NotEq", Operator::NotEq),
    ("Gt", Operator::Gt),
    ("Gte", Operator::Gte),
    ("Lt", Operator::Lt),
    ("Lte", Operator::Lte),
    ("Like", Operator::Like),
    ("LikeNoCase", Operator::ILike),
    ("In", Operator::In),
    ("NotIn", Operator::NotIn),
];

/// The filters every entity gets unless registered without them.
pub(super) fn defaults(columns: &[Column]) -> IndexMap<String, ArgumentFilter> {
    let mut filters = IndexMap::new();

    for column in columns.iter().filter(|column| !column.computed) {
        filters.insert(
            column.name.clone(),
            ArgumentFilter::condition(&column.storage_name, Operator::Eq),
        );

        for (suffix, operator) in SUFFIXES {
            filters.insert(
                format!("{}{suffix}", column.name),
                ArgumentFilter::condition(&column.storage_name, *operator),
            );
        }

        let storage_name = column.storage_name.clone();

        filters.insert(
            format!("{}IsNull", column.name),
            ArgumentFilter::new(move |query, value| {
                let operator = if value.is_some_and(is_truthy) {
                    Operator::IsNull
                } else {
                    Operator::IsNotNull
                };

                query.filter(storage_name.clone(), operator, None);
            }),
        );
    }

    let storage_names: Arc<HashMap<String, String>> = Arc::new(
        columns
            .iter()
            .map(|column| (column.name.clone(), column.storage_name.clone()))
            .collect(),
    );

    for (argument, direction) in [("orderBy", Direction::Asc), ("orderByDesc", Direction::Desc)] {
        let storage_names = storage_names.clone();

        filters.insert(
            argument.to_string(),
            ArgumentFilter::new(move |query, value| {
                let Some(name) = value.and_then(column_name) else {
                    return;
                };

                let column = storage_names.get(name).map(String::as_str).unwrap_or(name);
                query.order_by(column, direction);
            }),
        );
    }

    filters.insert(
        "range".to_string(),
        ArgumentFilter::new(|query, value| {
            let Some(ConstValue::List(bounds)) = value else {
                return;
            };

            let [start, end] = bounds.as_slice() else {
                return;
            };

            let (Some(start), Some(end)) = (as_u64(start), as_u64(end)) else {
                return;
            };

            query.offset(start);

            // inclusive bounds, an inverted range selects nothing
            match end.checked_sub(start) {
                Some(span) => {
                    if let Some(count) = span.checked_add(1) {
                        query.limit(count);
                    }
                }
                None => {
                    query.limit(0);
                }
            }
        }),
    );

    filters.insert(
        "limit".to_string(),
        ArgumentFilter::new(|query, value| {
            if let Some(limit) = value.and_then(as_u64) {
                query.limit(limit);
            }
        }),
    );

    filters.insert(
        "offset".to_string(),
        ArgumentFilter::new(|query, value| {
            if let Some(offset) = value.and_then(as_u64) {
                query.offset(offset);
            }
        }),
    );

    filters
}

fn is_truthy(value: &ConstValue) -> bool {
    match value {
        ConstValue::Null => false,
        ConstValue::Boolean(value) => *value,
        ConstValue::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        ConstValue::String(value) => !value.is_empty(),
        _ => true,
    }
}

fn column_name(value: &ConstValue) -> Option<&str> {
    match value {
        ConstValue::Enum(name) => Some(name.as_str()),
        ConstValue::String(name) => Some(name.as_str()),
        _ => None,
    }
}

fn as_u64(value: &ConstValue) -> Option<u64> {
    match value {
        ConstValue::Number(number) => number.as_u64(),
        _ => None,
    }
}
