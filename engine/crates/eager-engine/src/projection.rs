use async_graphql_parser::types::{Selection, SelectionSet};
use indexmap::IndexSet;

use crate::{
    context::QueryContext,
    query::{ColumnRef, Modifier},
    registry::Entity,
    Error,
};

/// The columns a selection set needs from `entity`, in selection order.
///
/// Relations are fetched by the eager load and introspection fields are not data, so neither
/// contributes. A virtual attribute contributes its dependencies instead of itself.
pub(crate) fn collect_columns(
    ctx: &QueryContext<'_>,
    entity: &Entity,
    selection_set: &SelectionSet,
) -> Result<IndexSet<String>, Error> {
    let mut columns = IndexSet::new();
    collect(ctx, entity, selection_set, &mut columns)?;

    Ok(columns)
}

fn collect(
    ctx: &QueryContext<'_>,
    entity: &Entity,
    selection_set: &SelectionSet,
    columns: &mut IndexSet<String>,
) -> Result<(), Error> {
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => {
                let name = field.node.name.node.as_str();

                if entity.relation(name).is_some() || name.starts_with("__") {
                    continue;
                }

                match entity.virtual_attribute(name) {
                    Some(attribute) => columns.extend(attribute.dependencies().iter().cloned()),
                    None => {
                        columns.insert(name.to_string());
                    }
                }
            }
            Selection::FragmentSpread(spread) => {
                let fragment = ctx.fragment(&spread.node.fragment_name.node)?;
                collect(ctx, entity, fragment, columns)?;
            }
            Selection::InlineFragment(fragment) => {
                collect(ctx, entity, &fragment.node.selection_set.node, columns)?;
            }
        }
    }

    Ok(())
}

/// A modifier selecting only the needed columns, or `None` when select optimization is off or
/// nothing but relations was selected.
pub(crate) fn projection_modifier(
    ctx: &QueryContext<'_>,
    entity: &Entity,
    selection_set: &SelectionSet,
) -> Result<Option<Modifier>, Error> {
    if !ctx.config.select_optimization {
        return Ok(None);
    }

    let columns = collect_columns(ctx, entity, selection_set)?;

    if columns.is_empty() {
        return Ok(None);
    }

    let columns = columns
        .iter()
        .map(|name| column_ref(entity, name, ctx.config.qualify_columns))
        .collect::<Vec<_>>();

    tracing::debug!(
        entity = entity.name(),
        "projection: {}",
        itertools::join(columns.iter(), ", ")
    );

    Ok(Some(Modifier::new(move |query| {
        query.select(columns.clone());
    })))
}

fn column_ref(entity: &Entity, name: &str, qualify: bool) -> ColumnRef {
    match entity.column(name) {
        Some(column) if !column.computed => ColumnRef {
            table: qualify.then(|| entity.table().to_string()),
            name: column.storage_name.clone(),
            alias: (column.storage_name != column.name).then(|| column.name.clone()),
        },
        _ => ColumnRef::new(name),
    }
}
