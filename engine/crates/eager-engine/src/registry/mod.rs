mod builder;
mod filters;
mod metadata;

use std::{fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{executor::CustomFetch, query::Row};

pub use builder::{EntityBuilder, RegistryBuilder};
pub use filters::ArgumentFilter;
pub use metadata::{ColumnMetadata, EntityMetadata, JoinMetadata, RelationMetadata, ThroughMetadata, VirtualMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub(crate) u32);

/// Whether a relation yields one related entity or an ordered collection of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum RelationKind {
    One,
    Many,
}

/// How a root field wraps its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Cardinality {
    Single,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub storage_name: String,
    /// Computed columns are not part of the table schema and never get qualified or renamed.
    pub computed: bool,
}

/// The columns joining an owner row to its related rows, in storage names. With a
/// through table, `owner_column` and `related_column` are matched against the through table's
/// columns instead of each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub owner_column: String,
    pub related_column: String,
    pub through: Option<Through>,
}

impl Join {
    pub fn new(owner_column: impl Into<String>, related_column: impl Into<String>) -> Self {
        Self {
            owner_column: owner_column.into(),
            related_column: related_column.into(),
            through: None,
        }
    }

    pub fn through(
        mut self,
        table: impl Into<String>,
        owner_column: impl Into<String>,
        related_column: impl Into<String>,
    ) -> Self {
        self.through = Some(Through {
            table: table.into(),
            owner_column: owner_column.into(),
            related_column: related_column.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Through {
    pub table: String,
    pub owner_column: String,
    pub related_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    kind: RelationKind,
    target: EntityId,
    join: Join,
}

impl Relation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    pub fn target(&self) -> EntityId {
        self.target
    }

    pub fn join(&self) -> &Join {
        &self.join
    }
}

type ComputeFn = dyn Fn(&Row) -> serde_json::Value + Send + Sync;

/// A computed attribute. Selecting it fetches its dependency columns instead.
#[derive(Clone)]
pub struct VirtualAttribute {
    name: String,
    dependencies: Vec<String>,
    compute: Option<Arc<ComputeFn>>,
}

impl VirtualAttribute {
    pub fn new<I, S>(name: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            compute: None,
        }
    }

    pub fn with_compute(mut self, compute: impl Fn(&Row) -> serde_json::Value + Send + Sync + 'static) -> Self {
        self.compute = Some(Arc::new(compute));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub(crate) fn compute(&self, row: &Row) -> Option<serde_json::Value> {
        self.compute.as_ref().map(|compute| compute(row))
    }
}

impl fmt::Debug for VirtualAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualAttribute")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// A registered entity type.
pub struct Entity {
    id: EntityId,
    name: String,
    table: String,
    columns: IndexMap<String, Column>,
    relations: IndexMap<String, Relation>,
    virtual_attributes: IndexMap<String, VirtualAttribute>,
    filters: IndexMap<String, ArgumentFilter>,
    custom_single_fetch: Option<Arc<dyn CustomFetch>>,
    custom_list_fetch: Option<Arc<dyn CustomFetch>>,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn columns(&self) -> impl ExactSizeIterator<Item = &Column> + '_ {
        self.columns.values()
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl ExactSizeIterator<Item = &Relation> + '_ {
        self.relations.values()
    }

    pub fn virtual_attribute(&self, name: &str) -> Option<&VirtualAttribute> {
        self.virtual_attributes.get(name)
    }

    pub fn virtual_attributes(&self) -> impl ExactSizeIterator<Item = &VirtualAttribute> + '_ {
        self.virtual_attributes.values()
    }

    pub fn filter(&self, argument: &str) -> Option<&ArgumentFilter> {
        self.filters.get(argument)
    }

    pub fn filter_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.filters.keys().map(String::as_str)
    }

    /// The custom fetch replacing the generic translation for root fields of this cardinality.
    pub fn custom_fetch(&self, cardinality: Cardinality) -> Option<&Arc<dyn CustomFetch>> {
        match cardinality {
            Cardinality::Single => self.custom_single_fetch.as_ref(),
            Cardinality::List => self.custom_list_fetch.as_ref(),
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("columns", &self.columns.keys().collect::<Vec<_>>())
            .field("relations", &self.relations.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Every registered entity type, immutable once built.
#[derive(Debug)]
pub struct Registry {
    entities: Vec<Entity>,
    names: IndexMap<String, EntityId>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0 as usize]
    }

    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        self.names.get(name).map(|id| self.entity(*id))
    }

    pub fn entities(&self) -> impl ExactSizeIterator<Item = &Entity> + '_ {
        self.entities.iter()
    }
}
