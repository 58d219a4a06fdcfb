use async_graphql_parser::types::Field;

use crate::{context::QueryContext, query::Modifier, registry::Entity, value::resolve_value, Error};

/// Composes the filters for the arguments present on `field` into one modifier, applied in
/// argument order. `None` when the field has no arguments.
///
/// Values are resolved here, so unsupported literals fail the compile rather than the fetch.
/// An argument that resolved to no value is skipped in skip-undefined mode and otherwise handed
/// to its filter as `None`.
pub(crate) fn argument_modifier(ctx: &QueryContext<'_>, entity: &Entity, field: &Field) -> Result<Option<Modifier>, Error> {
    if field.arguments.is_empty() {
        return Ok(None);
    }

    let mut filters = Vec::with_capacity(field.arguments.len());

    for (name, value) in &field.arguments {
        let value = resolve_value(&value.node, ctx.variables)?;

        match entity.filter(name.node.as_str()) {
            Some(filter) => filters.push((filter.clone(), value)),
            None => tracing::debug!("entity {} has no filter for argument `{}`", entity.name(), name.node),
        }
    }

    Ok(Some(Modifier::new(move |query| {
        for (filter, value) in &filters {
            if value.is_none() && query.skips_undefined() {
                continue;
            }

            filter.apply(query, value.as_ref());
        }
    })))
}
