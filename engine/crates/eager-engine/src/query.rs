use std::{fmt, sync::Arc};

use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use crate::{
    eager::EagerLoad,
    registry::{Entity, EntityId},
};

/// A row as returned by the executor, keyed by column (or alias) and relation name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A column in a projection. `name` is the storage name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
    pub alias: Option<String>,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
            alias: None,
        }
    }

    /// The key this column has in returned rows.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            write!(f, "{table}.")?;
        }

        f.write_str(&self.name)?;

        if let Some(alias) = &self.alias {
            write!(f, " as {alias}")?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Operator {
    #[strum(serialize = "=")]
    Eq,
    #[strum(serialize = "<>")]
    NotEq,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Gte,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Lte,
    #[strum(serialize = "like")]
    Like,
    #[strum(serialize = "ilike")]
    ILike,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "not in")]
    NotIn,
    #[strum(serialize = "is null")]
    IsNull,
    #[strum(serialize = "is not null")]
    IsNotNull,
}

/// A row predicate. A `None` value is an undefined binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: Option<ConstValue>,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.operator, &self.value) {
            (Operator::IsNull | Operator::IsNotNull, _) => write!(f, "{} {}", self.column, self.operator),
            (_, Some(value)) => write!(f, "{} {} {}", self.column, self.operator, value),
            (_, None) => write!(f, "{} {} undefined", self.column, self.operator),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

/// A function shaping a read query: a row filter, a column projection or anything else a
/// caller wants to do to the query before it runs.
#[derive(Clone)]
pub struct Modifier(Arc<dyn Fn(&mut ReadQuery) + Send + Sync>);

impl Modifier {
    pub fn new(f: impl Fn(&mut ReadQuery) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, query: &mut ReadQuery) {
        (self.0)(query)
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Modifier")
    }
}

/// Modifiers referenced by name from an eager expression. Names are unique within one
/// compile pass, the table is shared by every nesting level of the expression.
#[derive(Clone, Default)]
pub struct FilterTable(IndexMap<String, Modifier>);

impl FilterTable {
    pub fn insert(&mut self, name: impl Into<String>, modifier: Modifier) -> Option<Modifier> {
        self.0.insert(name.into(), modifier)
    }

    pub fn get(&self, name: &str) -> Option<&Modifier> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for FilterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// The query builder handed to the executor. One per entity fetch, nested fetches are
/// described by the eager load.
#[derive(Debug, Clone)]
pub struct ReadQuery {
    entity: EntityId,
    table: String,
    columns: Option<Vec<ColumnRef>>,
    conditions: Vec<Condition>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    eager: Option<EagerLoad>,
    skip_undefined: bool,
}

impl ReadQuery {
    pub fn new(entity: &Entity) -> Self {
        Self {
            entity: entity.id(),
            table: entity.table().to_string(),
            columns: None,
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            eager: None,
            skip_undefined: false,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Restricts the fetched columns. Without a projection every column is fetched.
    pub fn select(&mut self, columns: Vec<ColumnRef>) -> &mut Self {
        self.columns = Some(columns);
        self
    }

    pub fn columns(&self) -> Option<&[ColumnRef]> {
        self.columns.as_deref()
    }

    pub fn filter(&mut self, column: impl Into<String>, operator: Operator, value: Option<ConstValue>) -> &mut Self {
        self.conditions.push(Condition {
            column: column.into(),
            operator,
            value,
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn order_by(&mut self, column: impl Into<String>, direction: Direction) -> &mut Self {
        self.order_by.push(OrderBy {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn orderings(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn modify(&mut self, modifier: &Modifier) -> &mut Self {
        modifier.apply(self);
        self
    }

    pub fn with_eager(&mut self, eager: EagerLoad) -> &mut Self {
        self.eager = Some(eager);
        self
    }

    pub fn eager(&self) -> Option<&EagerLoad> {
        self.eager.as_ref()
    }

    /// In skip-undefined mode, filters whose argument resolved to no value are not applied
    /// and executors ignore conditions without a binding.
    pub fn skip_undefined(&mut self, skip: bool) -> &mut Self {
        self.skip_undefined = skip;
        self
    }

    pub fn skips_undefined(&self) -> bool {
        self.skip_undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_display() {
        let column = ColumnRef {
            table: Some("posts".into()),
            name: "post_title".into(),
            alias: Some("title".into()),
        };

        assert_eq!("posts.post_title as title", column.to_string());
        assert_eq!("title", column.output_name());
        assert_eq!("id", ColumnRef::new("id").output_name());
    }

    #[test]
    fn condition_display() {
        let eq = Condition {
            column: "name".into(),
            operator: Operator::Eq,
            value: Some(ConstValue::from("Ada")),
        };

        let undefined = Condition {
            value: None,
            ..eq.clone()
        };

        let is_null = Condition {
            operator: Operator::IsNull,
            ..undefined.clone()
        };

        assert_eq!(r#"name = "Ada""#, eq.to_string());
        assert_eq!("name = undefined", undefined.to_string());
        assert_eq!("name is null", is_null.to_string());
    }
}
