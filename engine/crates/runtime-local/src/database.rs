use std::{
    cmp::Ordering,
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering::Relaxed},
        Arc,
    },
};

use async_graphql_value::ConstValue;
use eager_engine::{
    expression::{self, RelationNode},
    registry::Join,
    Condition, Direction, Entity, ExecutorError, FilterTable, Operator, ReadQuery, Registry, RelationKind, Row,
};
use futures_util::lock::Mutex;
use itertools::Itertools;
use serde_json::Value;

/// An executor over in-memory tables. Rows are keyed by storage column names.
///
/// Every statement it runs, including the batched relation fetches of an eager load, is
/// counted and logged in a SQL-like form.
pub struct MemoryDatabase {
    registry: Arc<Registry>,
    tables: HashMap<String, Vec<Row>>,
    executed: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl MemoryDatabase {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            tables: HashMap::new(),
            executed: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables.insert(table.into(), rows);
        self
    }

    /// Statements run so far.
    pub fn executed_queries(&self) -> usize {
        self.executed.load(Relaxed)
    }

    pub async fn statements(&self) -> Vec<String> {
        self.log.lock().await.clone()
    }

    pub async fn clear_statements(&self) {
        self.log.lock().await.clear();
    }

    fn table(&self, name: &str) -> &[Row] {
        self.tables.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl eager_engine::Executor for MemoryDatabase {
    async fn execute(&self, query: ReadQuery) -> Result<Vec<Row>, ExecutorError> {
        let mut run = Run {
            database: self,
            statements: Vec::new(),
        };

        let result = run.root(&query);

        self.executed.fetch_add(run.statements.len(), Relaxed);
        self.log.lock().await.extend(run.statements);

        result
    }
}

/// Pivot rows of a through table matching a set of owner keys.
#[derive(Default)]
struct Links {
    /// Related keys by owner key, the owner key in its JSON form.
    by_owner: HashMap<String, Vec<Value>>,
    /// Every related key once, in pivot row order.
    related: Vec<Value>,
}

/// One root query with its eager load.
struct Run<'a> {
    database: &'a MemoryDatabase,
    statements: Vec<String>,
}

impl Run<'_> {
    fn root(&mut self, query: &ReadQuery) -> Result<Vec<Row>, ExecutorError> {
        let database = self.database;
        let entity = database.registry.entity(query.entity());
        let mut rows = self.select(query)?;

        let nodes = match query.eager() {
            Some(eager) => {
                let nodes = expression::parse(eager.expression())?;
                self.load(entity, &nodes, eager.filters(), query.skips_undefined(), &mut rows)?;
                nodes
            }
            None => Vec::new(),
        };

        Ok(rows.into_iter().map(|row| project(query, &nodes, row)).collect())
    }

    /// Attaches every relation of `nodes` to `rows`, one batched statement per relation.
    fn load(
        &mut self,
        entity: &Entity,
        nodes: &[RelationNode],
        filters: &FilterTable,
        skip_undefined: bool,
        rows: &mut [Row],
    ) -> Result<(), ExecutorError> {
        let database = self.database;

        for node in nodes {
            let relation = entity.relation(&node.name).ok_or_else(|| ExecutorError::UnknownRelation {
                entity: entity.name().to_string(),
                relation: node.name.clone(),
            })?;

            let target = database.registry.entity(relation.target());
            let join = relation.join();

            let mut query = ReadQuery::new(target);
            query.skip_undefined(skip_undefined);

            for name in &node.modifiers {
                let modifier = filters
                    .get(name)
                    .ok_or_else(|| ExecutorError::UnknownModifier(name.clone()))?;

                query.modify(modifier);
            }

            let owner_keys = rows
                .iter()
                .filter_map(|row| row.get(&join.owner_column))
                .filter(|value| !value.is_null())
                .cloned()
                .unique_by(ToString::to_string)
                .collect::<Vec<_>>();

            let links = self.links(join, &owner_keys)?;
            let related_keys = match &links {
                Some(links) => links.related.clone(),
                None => owner_keys,
            };

            query.filter(join.related_column.clone(), Operator::In, Some(to_const(related_keys)?));

            let mut related = self.select(&query)?;
            self.load(target, &node.children, filters, skip_undefined, &mut related)?;

            for row in rows.iter_mut() {
                let mut matching = related
                    .iter()
                    .filter(|candidate| {
                        let Some(owner_key) = row.get(&join.owner_column) else {
                            return false;
                        };

                        let Some(related_key) = candidate.get(&join.related_column) else {
                            return false;
                        };

                        match &links {
                            Some(links) => links
                                .by_owner
                                .get(&owner_key.to_string())
                                .is_some_and(|keys| keys.iter().any(|key| equals(key, related_key))),
                            None => equals(owner_key, related_key),
                        }
                    })
                    .map(|candidate| Value::Object(project(&query, &node.children, candidate.clone())));

                let value = match relation.kind() {
                    RelationKind::One => matching.next().unwrap_or(Value::Null),
                    RelationKind::Many => Value::Array(matching.collect()),
                };

                row.insert(node.key().to_string(), value);
            }
        }

        Ok(())
    }

    /// Reads the through table of the join, if it has one.
    fn links(&mut self, join: &Join, owner_keys: &[Value]) -> Result<Option<Links>, ExecutorError> {
        let Some(through) = &join.through else {
            return Ok(None);
        };

        self.statements.push(format!(
            "select * from {} where {} in {}",
            through.table,
            through.owner_column,
            to_const(owner_keys.to_vec())?
        ));

        let mut links = Links::default();

        for pivot in self.database.table(&through.table) {
            let (Some(owner), Some(related)) = (pivot.get(&through.owner_column), pivot.get(&through.related_column))
            else {
                continue;
            };

            if !owner_keys.iter().any(|key| equals(key, owner)) {
                continue;
            }

            links.by_owner.entry(owner.to_string()).or_default().push(related.clone());

            if !links.related.iter().any(|key| equals(key, related)) {
                links.related.push(related.clone());
            }
        }

        Ok(Some(links))
    }

    /// Full rows of the query's table, filtered, ordered and paginated.
    fn select(&mut self, query: &ReadQuery) -> Result<Vec<Row>, ExecutorError> {
        let mut conditions = Vec::with_capacity(query.conditions().len());

        for condition in query.conditions() {
            let unary = matches!(condition.operator, Operator::IsNull | Operator::IsNotNull);

            match &condition.value {
                None if !unary && query.skips_undefined() => continue,
                None if !unary => return Err(ExecutorError::UndefinedBinding(condition.column.clone())),
                Some(value) => conditions.push((condition, Some(to_json(value)?))),
                None => conditions.push((condition, None)),
            }
        }

        let statement = render(query, &conditions);
        tracing::debug!("executing {statement}");
        self.statements.push(statement);

        let mut rows = self
            .database
            .table(query.table())
            .iter()
            .filter(|row| {
                conditions
                    .iter()
                    .all(|(condition, value)| satisfies(row, condition, value.as_ref()))
            })
            .cloned()
            .collect::<Vec<_>>();

        for ordering in query.orderings().iter().rev() {
            rows.sort_by(|left, right| {
                let ordering_of = compare(
                    left.get(&ordering.column).unwrap_or(&Value::Null),
                    right.get(&ordering.column).unwrap_or(&Value::Null),
                );

                match ordering.direction {
                    Direction::Asc => ordering_of,
                    Direction::Desc => ordering_of.reverse(),
                }
            });
        }

        let offset = query.offset_value().unwrap_or_default() as usize;
        let limit = query.limit_value().map_or(usize::MAX, |limit| limit as usize);

        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}

/// Keeps the selected columns under their output names, plus the loaded relations.
fn project(query: &ReadQuery, nodes: &[RelationNode], mut row: Row) -> Row {
    let Some(columns) = query.columns() else {
        return row;
    };

    let mut projected = Row::new();

    for column in columns {
        if let Some(value) = row.get(&column.name) {
            projected.insert(column.output_name().to_string(), value.clone());
        }
    }

    for node in nodes {
        if let Some(value) = row.remove(node.key()) {
            projected.insert(node.key().to_string(), value);
        }
    }

    projected
}

fn render(query: &ReadQuery, conditions: &[(&Condition, Option<Value>)]) -> String {
    let mut statement = match query.columns() {
        Some(columns) => format!("select {} from {}", columns.iter().join(", "), query.table()),
        None => format!("select * from {}", query.table()),
    };

    if !conditions.is_empty() {
        statement.push_str(" where ");
        statement.push_str(&conditions.iter().map(|(condition, _)| condition).join(" and "));
    }

    if !query.orderings().is_empty() {
        statement.push_str(" order by ");
        statement.push_str(
            &query
                .orderings()
                .iter()
                .map(|ordering| format!("{} {}", ordering.column, ordering.direction))
                .join(", "),
        );
    }

    if let Some(limit) = query.limit_value() {
        statement.push_str(&format!(" limit {limit}"));
    }

    if let Some(offset) = query.offset_value() {
        statement.push_str(&format!(" offset {offset}"));
    }

    statement
}

fn satisfies(row: &Row, condition: &Condition, value: Option<&Value>) -> bool {
    let column = row.get(&condition.column).unwrap_or(&Value::Null);

    match (condition.operator, value) {
        (Operator::IsNull, _) => column.is_null(),
        (Operator::IsNotNull, _) => !column.is_null(),
        (_, None) => true,
        (_, Some(_)) if column.is_null() => false,
        (Operator::Eq, Some(value)) => equals(column, value),
        (Operator::NotEq, Some(value)) => !equals(column, value),
        (Operator::Gt, Some(value)) => compare(column, value) == Ordering::Greater,
        (Operator::Gte, Some(value)) => compare(column, value) != Ordering::Less,
        (Operator::Lt, Some(value)) => compare(column, value) == Ordering::Less,
        (Operator::Lte, Some(value)) => compare(column, value) != Ordering::Greater,
        (Operator::Like, Some(value)) => like(column, value, false),
        (Operator::ILike, Some(value)) => like(column, value, true),
        (Operator::In, Some(Value::Array(values))) => values.iter().any(|value| equals(column, value)),
        (Operator::NotIn, Some(Value::Array(values))) => !values.iter().any(|value| equals(column, value)),
        (Operator::In | Operator::NotIn, Some(_)) => false,
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64() == right.as_f64(),
        _ => left == right,
    }
}

fn compare(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        // nulls sort first
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn like(column: &Value, pattern: &Value, ignore_case: bool) -> bool {
    let (Value::String(text), Value::String(pattern)) = (column, pattern) else {
        return false;
    };

    if ignore_case {
        wildcard_match(&pattern.to_lowercase(), &text.to_lowercase())
    } else {
        wildcard_match(pattern, text)
    }
}

/// SQL `LIKE` matching: `%` is any run of characters, `_` exactly one.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.chars().collect::<Vec<_>>();
    let text = text.chars().collect::<Vec<_>>();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some('_') => {
                p += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

fn to_json(value: &ConstValue) -> Result<Value, ExecutorError> {
    value
        .clone()
        .into_json()
        .map_err(|error| ExecutorError::Datasource(error.to_string()))
}

fn to_const(values: Vec<Value>) -> Result<ConstValue, ExecutorError> {
    ConstValue::from_json(Value::Array(values)).map_err(|error| ExecutorError::Datasource(error.to_string()))
}
