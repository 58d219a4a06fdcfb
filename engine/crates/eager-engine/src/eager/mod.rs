//! Compilation of a selection tree into an eager-load expression.
//!
//! Every selected relation becomes a segment `relation(s0, f1).children`, where `s0` names the
//! column projection and `f1` the argument filter of that relation in the shared
//! [`FilterTable`]. Sibling segments are comma separated and bracketed, so the compiled form of
//! `{ name posts(limit: 5) { title comments { text } } }` on an author is
//! `[posts(s0, f1).comments(s2)]`.
//! A relation selected under an alias is prefixed with it, as in `recent:posts(s0, f1)`.

pub mod expression;

use async_graphql_parser::types::{Field, Selection, SelectionSet};
use engine_config::FilterPrefixes;

use self::expression::{ExpressionError, RelationNode};
use crate::{
    arguments::argument_modifier,
    context::QueryContext,
    projection::projection_modifier,
    query::{FilterTable, Modifier},
    registry::{Entity, Relation},
    Error,
};

/// The eager part of a read query: which relations to fetch alongside the root rows, and the
/// modifiers the expression refers to.
#[derive(Debug, Clone, Default)]
pub struct EagerLoad {
    relations: Vec<RelationNode>,
    expression: String,
    filters: FilterTable,
}

impl EagerLoad {
    pub fn new(relations: Vec<RelationNode>, filters: FilterTable) -> Self {
        Self {
            expression: expression::render(&relations),
            relations,
            filters,
        }
    }

    /// A load from an already compiled expression.
    pub fn parse(compiled: &str, filters: FilterTable) -> Result<Self, ExpressionError> {
        Ok(Self::new(expression::parse(compiled)?, filters))
    }

    /// An empty load means no eager fetch at all.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn filters(&self) -> &FilterTable {
        &self.filters
    }

    pub fn relations(&self) -> &[RelationNode] {
        &self.relations
    }
}

/// Compiles the relations selected under `selection_set` for `entity`.
pub fn compile(ctx: &QueryContext<'_>, entity: &Entity, selection_set: &SelectionSet) -> Result<EagerLoad, Error> {
    let mut compiler = EagerCompiler {
        ctx,
        prefixes: &ctx.config.filter_prefixes,
        next_index: 0,
        filters: FilterTable::default(),
    };

    let relations = compiler.relations(entity, selection_set)?;
    let eager = EagerLoad::new(relations, compiler.filters);

    tracing::debug!(
        entity = entity.name(),
        filters = ?eager.filters,
        "eager expression: {:?}",
        eager.expression
    );

    Ok(eager)
}

/// State of one compile pass. The reference counter lives here so concurrent requests never
/// share filter names.
struct EagerCompiler<'a, 'ctx> {
    ctx: &'a QueryContext<'ctx>,
    prefixes: &'a FilterPrefixes,
    next_index: usize,
    filters: FilterTable,
}

enum FilterKind {
    Projection,
    Argument,
}

impl EagerCompiler<'_, '_> {
    fn relations(&mut self, entity: &Entity, selection_set: &SelectionSet) -> Result<Vec<RelationNode>, Error> {
        let mut nodes = Vec::new();
        self.collect_relations(entity, selection_set, &mut nodes)?;

        Ok(nodes)
    }

    /// Fragments keep the type context, so spreads and inline fragments are walked like the
    /// selection set they appear in.
    fn collect_relations(
        &mut self,
        entity: &Entity,
        selection_set: &SelectionSet,
        nodes: &mut Vec<RelationNode>,
    ) -> Result<(), Error> {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    let field = &field.node;

                    let Some(relation) = entity.relation(field.name.node.as_str()) else {
                        continue;
                    };

                    let key = field.response_key().node.as_str();

                    // rows of a relation are attached under its response key
                    if nodes.iter().any(|node| node.key() == key) {
                        return Err(Error::DuplicateRelation {
                            entity: entity.name().to_string(),
                            key: key.to_string(),
                        });
                    }

                    let node = self.relation(relation, field)?;
                    nodes.push(node);
                }
                Selection::FragmentSpread(spread) => {
                    let fragment = self.ctx.fragment(&spread.node.fragment_name.node)?;
                    self.collect_relations(entity, fragment, nodes)?;
                }
                Selection::InlineFragment(fragment) => {
                    self.collect_relations(entity, &fragment.node.selection_set.node, nodes)?;
                }
            }
        }

        Ok(())
    }

    fn relation(&mut self, relation: &Relation, field: &Field) -> Result<RelationNode, Error> {
        let related = self.ctx.registry.entity(relation.target());
        let selection_set = &field.selection_set.node;

        let mut modifiers = Vec::with_capacity(2);

        if let Some(projection) = projection_modifier(self.ctx, related, selection_set)? {
            modifiers.push(self.register(FilterKind::Projection, projection));
        }

        if let Some(arguments) = argument_modifier(self.ctx, related, field)? {
            modifiers.push(self.register(FilterKind::Argument, arguments));
        }

        let key = field.response_key().node.as_str();
        let children = self.relations(related, selection_set)?;

        Ok(RelationNode {
            name: relation.name().to_string(),
            alias: (key != relation.name()).then(|| key.to_string()),
            modifiers,
            children,
        })
    }

    fn register(&mut self, kind: FilterKind, modifier: Modifier) -> String {
        let prefix = match kind {
            FilterKind::Projection => &self.prefixes.projection,
            FilterKind::Argument => &self.prefixes.argument,
        };

        let name = format!("{prefix}{}", self.next_index);
        self.next_index += 1;
        self.filters.insert(name.clone(), modifier);

        name
    }
}
