use std::sync::Arc;

use indexmap::IndexMap;

use super::{filters, ArgumentFilter, Column, Entity, EntityId, Join, Registry, Relation, RelationKind, VirtualAttribute};
use crate::{executor::CustomFetch, RegistryError};

#[derive(Default)]
pub struct RegistryBuilder {
    entities: Vec<EntityBuilder>,
}

impl RegistryBuilder {
    pub fn entity(mut self, entity: EntityBuilder) -> Self {
        self.entities.push(entity);
        self
    }

    /// Validates the registrations and resolves every relation to its related entity.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut names = IndexMap::with_capacity(self.entities.len());

        for (index, entity) in self.entities.iter().enumerate() {
            if names.insert(entity.name.clone(), EntityId(index as u32)).is_some() {
                return Err(RegistryError::DuplicateEntity(entity.name.clone()));
            }
        }

        let entities = self
            .entities
            .into_iter()
            .enumerate()
            .map(|(index, entity)| entity.build(EntityId(index as u32), &names))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Registry { entities, names })
    }
}

struct PendingRelation {
    name: String,
    kind: RelationKind,
    target: String,
    join: Join,
}

/// Registration of one entity type.
pub struct EntityBuilder {
    name: String,
    table: String,
    columns: Vec<Column>,
    relations: Vec<PendingRelation>,
    virtual_attributes: Vec<VirtualAttribute>,
    filters: Vec<(String, ArgumentFilter)>,
    default_filters: bool,
    custom_single_fetch: Option<Arc<dyn CustomFetch>>,
    custom_list_fetch: Option<Arc<dyn CustomFetch>>,
}

impl EntityBuilder {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: Vec::new(),
            relations: Vec::new(),
            virtual_attributes: Vec::new(),
            filters: Vec::new(),
            default_filters: true,
            custom_single_fetch: None,
            custom_list_fetch: None,
        }
    }

    pub fn column(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.column_as(name.clone(), name)
    }

    /// A column whose storage name differs from the name clients use.
    pub fn column_as(mut self, name: impl Into<String>, storage_name: impl Into<String>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            storage_name: storage_name.into(),
            computed: false,
        });
        self
    }

    pub fn computed_column(mut self, name: impl Into<String>) -> Self {
        let name = name.into();

        self.columns.push(Column {
            storage_name: name.clone(),
            name,
            computed: true,
        });
        self
    }

    pub fn relation(mut self, name: impl Into<String>, kind: RelationKind, target: impl Into<String>, join: Join) -> Self {
        self.relations.push(PendingRelation {
            name: name.into(),
            kind,
            target: target.into(),
            join,
        });
        self
    }

    pub fn virtual_attribute(mut self, attribute: VirtualAttribute) -> Self {
        self.virtual_attributes.push(attribute);
        self
    }

    /// Registers a filter for an argument. Overrides a built-in filter of the same name.
    pub fn filter(mut self, argument: impl Into<String>, filter: ArgumentFilter) -> Self {
        self.filters.push((argument.into(), filter));
        self
    }

    pub fn without_default_filters(mut self) -> Self {
        self.default_filters = false;
        self
    }

    pub fn custom_single_fetch(mut self, fetch: impl CustomFetch + 'static) -> Self {
        self.custom_single_fetch = Some(Arc::new(fetch));
        self
    }

    pub fn custom_list_fetch(mut self, fetch: impl CustomFetch + 'static) -> Self {
        self.custom_list_fetch = Some(Arc::new(fetch));
        self
    }

    fn build(self, id: EntityId, names: &IndexMap<String, EntityId>) -> Result<Entity, RegistryError> {
        let relations = self
            .relations
            .into_iter()
            .map(|relation| {
                let Some(target) = names.get(&relation.target).copied() else {
                    return Err(RegistryError::MissingRelatedEntity {
                        entity: self.name.clone(),
                        relation: relation.name,
                        target: relation.target,
                    });
                };

                let relation = Relation {
                    name: relation.name,
                    kind: relation.kind,
                    target,
                    join: relation.join,
                };

                Ok((relation.name.clone(), relation))
            })
            .collect::<Result<IndexMap<_, _>, _>>()?;

        let mut filters = if self.default_filters {
            filters::defaults(&self.columns)
        } else {
            IndexMap::new()
        };

        filters.extend(self.filters);

        Ok(Entity {
            id,
            name: self.name,
            table: self.table,
            columns: self
                .columns
                .into_iter()
                .map(|column| (column.name.clone(), column))
                .collect(),
            relations,
            virtual_attributes: self
                .virtual_attributes
                .into_iter()
                .map(|attribute| (attribute.name.clone(), attribute))
                .collect(),
            filters,
            custom_single_fetch: self.custom_single_fetch,
            custom_list_fetch: self.custom_list_fetch,
        })
    }
}
