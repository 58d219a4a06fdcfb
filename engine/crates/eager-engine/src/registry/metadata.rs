use std::str::FromStr;

use super::{EntityBuilder, Join, RelationKind, VirtualAttribute};
use crate::RegistryError;

/// Entity description as provided by the entity-metadata source.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntityMetadata {
    pub name: String,
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
    #[serde(default)]
    pub relations: Vec<RelationMetadata>,
    #[serde(default)]
    pub virtual_attributes: Vec<VirtualMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ColumnMetadata {
    pub name: String,
    #[serde(default)]
    pub storage_name: Option<String>,
    #[serde(default)]
    pub computed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelationMetadata {
    pub name: String,
    /// The relation class, e.g. `HasManyRelation`.
    pub kind: String,
    pub related_entity: String,
    pub join: JoinMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinMetadata {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub through: Option<ThroughMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThroughMetadata {
    pub table: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VirtualMetadata {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
enum RelationClass {
    BelongsToOneRelation,
    HasOneRelation,
    HasOneThroughRelation,
    HasManyRelation,
    ManyToManyRelation,
}

impl From<RelationClass> for RelationKind {
    fn from(class: RelationClass) -> Self {
        match class {
            RelationClass::BelongsToOneRelation | RelationClass::HasOneRelation | RelationClass::HasOneThroughRelation => {
                RelationKind::One
            }
            RelationClass::HasManyRelation | RelationClass::ManyToManyRelation => RelationKind::Many,
        }
    }
}

impl EntityMetadata {
    /// Starts a registration from metadata. Custom filters, compute functions and custom
    /// fetches can be added to the returned builder.
    pub fn into_builder(self) -> Result<EntityBuilder, RegistryError> {
        let mut builder = EntityBuilder::new(&self.name, self.table_name);

        for column in self.columns {
            builder = match (column.computed, column.storage_name) {
                (true, _) => builder.computed_column(column.name),
                (false, Some(storage_name)) => builder.column_as(column.name, storage_name),
                (false, None) => builder.column(column.name),
            };
        }

        for relation in self.relations {
            let Ok(class) = RelationClass::from_str(&relation.kind) else {
                return Err(RegistryError::UnsupportedRelationKind {
                    entity: self.name,
                    relation: relation.name,
                    kind: relation.kind,
                });
            };

            let mut join = Join::new(relation.join.from, relation.join.to);

            if let Some(through) = relation.join.through {
                join = join.through(through.table, through.from, through.to);
            }

            builder = builder.relation(relation.name, class.into(), relation.related_entity, join);
        }

        for attribute in self.virtual_attributes {
            builder = builder.virtual_attribute(VirtualAttribute::new(attribute.name, attribute.dependencies));
        }

        Ok(builder)
    }
}
