//! Module: query::memory
//! Responsibility: a complete in-memory `Queryable` over record tables.
//! Does not own: persistence; tables are immutable once shared.
//! Boundary: used by hosts without a database and as the reference backend
//! in tests, where its execution counters stand in for store instrumentation.

use crate::{
    query::{Predicate, QueryError, QueryHandle, Queryable, RecordSet},
    value::{Record, Value},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Write as _,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

///
/// MemoryTable
///

#[derive(Debug, Default)]
pub struct MemoryTable {
    name: String,
    rows: Vec<Record>,
    relations: BTreeMap<String, MemoryRelation>,
    computed_columns: BTreeSet<String>,
    failure: Option<QueryError>,
    stats: ExecutionStats,
}

impl MemoryTable {
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            rows,
            ..Self::default()
        }
    }

    /// Declare a belongs-to style relation: `row[local_key] == target[foreign_key]`.
    #[must_use]
    pub fn with_relation(
        mut self,
        name: impl Into<String>,
        target: Arc<Self>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relations.insert(
            name.into(),
            MemoryRelation {
                target,
                local_key: local_key.into(),
                foreign_key: foreign_key.into(),
            },
        );
        self
    }

    /// Mark a column as computed: readable on full rows, not selectable.
    #[must_use]
    pub fn with_computed_column(mut self, column: impl Into<String>) -> Self {
        self.computed_columns.insert(column.into());
        self
    }

    /// Make every execution against this table fail with `err`.
    #[must_use]
    pub fn with_failure(mut self, err: QueryError) -> Self {
        self.failure = Some(err);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn stats(&self) -> &ExecutionStats {
        &self.stats
    }
}

///
/// MemoryRelation
///

#[derive(Debug)]
struct MemoryRelation {
    target: Arc<MemoryTable>,
    local_key: String,
    foreign_key: String,
}

impl MemoryRelation {
    fn matches(&self, row: &Record) -> impl Iterator<Item = &Record> {
        let local = row.get_path(&self.local_key).unwrap_or(Value::Null);

        self.target.rows.iter().filter(move |candidate| {
            !local.is_null()
                && candidate
                    .get_path(&self.foreign_key)
                    .is_some_and(|foreign| Value::loose_eq(&local, &foreign))
        })
    }
}

///
/// ExecutionStats
///
/// Per-table execution counters shared by every query over the table.
///

#[derive(Debug, Default)]
pub struct ExecutionStats {
    executions: AtomicU64,
    row_executions: AtomicU64,
    projected_executions: AtomicU64,
}

impl ExecutionStats {
    /// Every `execute` call, successful or not.
    #[must_use]
    pub fn executions(&self) -> u64 {
        self.executions.load(Ordering::Relaxed)
    }

    /// Executions that materialized full rows.
    #[must_use]
    pub fn row_executions(&self) -> u64 {
        self.row_executions.load(Ordering::Relaxed)
    }

    /// Executions of single-column projections.
    #[must_use]
    pub fn projected_executions(&self) -> u64 {
        self.projected_executions.load(Ordering::Relaxed)
    }
}

///
/// MemoryQuery
///

#[derive(Debug)]
pub struct MemoryQuery {
    table: Arc<MemoryTable>,
    handle: QueryHandle,
    predicates: Vec<Predicate>,
    order: Vec<String>,
    select: Option<String>,
    distinct: bool,
    limit: Option<usize>,
}

impl MemoryQuery {
    #[must_use]
    pub fn new(table: Arc<MemoryTable>) -> Self {
        Self {
            table,
            handle: QueryHandle::next(),
            predicates: Vec::new(),
            order: Vec::new(),
            select: None,
            distinct: false,
            limit: None,
        }
    }

    #[must_use]
    pub fn table(&self) -> &MemoryTable {
        &self.table
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    fn eval(table: &MemoryTable, row: &Record, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Eq { column, value } => {
                row.get_path(column)
                    .is_some_and(|field| Value::loose_eq(&field, value))
            }
            Predicate::DateEq { column, date } => match row.get_path(column) {
                Some(Value::Date(d)) => d == *date,
                Some(Value::Timestamp(ts)) => ts.date() == *date,
                Some(Value::Text(text)) => text.get(..10) == Some(date.to_iso().as_str()),
                _ => false,
            },
            Predicate::In { column, values } => row
                .get_path(column)
                .is_some_and(|field| values.iter().any(|v| Value::loose_eq(&field, v))),
            Predicate::ContainsCi { column, needle } => row
                .get_path(column)
                .is_some_and(|field| !field.is_null() && field.contains_ci(needle)),
            Predicate::Or(children) => children
                .iter()
                .any(|child| Self::eval(table, row, child)),
            Predicate::Exists {
                relation,
                predicate,
            } => table.relations.get(relation).is_some_and(|rel| {
                rel.matches(row)
                    .any(|related| Self::eval(&rel.target, related, predicate))
            }),
        }
    }

    // Attach the first related record under each relation name so display
    // paths like `customer.name` resolve on materialized rows.
    fn eager_load(&self, row: &Record) -> Record {
        let mut row = row.clone();
        for (name, relation) in &self.table.relations {
            if row.contains(name) {
                continue;
            }
            let related = relation.matches(&row).next().cloned();
            row.insert(name.clone(), Value::from(related));
        }

        row
    }
}

impl Clone for MemoryQuery {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            handle: QueryHandle::next(),
            predicates: self.predicates.clone(),
            order: self.order.clone(),
            select: self.select.clone(),
            distinct: self.distinct,
            limit: self.limit,
        }
    }
}

impl Queryable for MemoryQuery {
    fn handle(&self) -> QueryHandle {
        self.handle
    }

    fn without_ordering(mut self) -> Self {
        self.order.clear();
        self.handle = QueryHandle::next();
        self
    }

    fn select(mut self, column: &str) -> Self {
        self.select = Some(column.to_string());
        self.handle = QueryHandle::next();
        self
    }

    fn distinct(mut self) -> Self {
        self.distinct = true;
        self.handle = QueryHandle::next();
        self
    }

    fn order_by(mut self, column: &str) -> Self {
        self.order.push(column.to_string());
        self.handle = QueryHandle::next();
        self
    }

    fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self.handle = QueryHandle::next();
        self
    }

    fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self.handle = QueryHandle::next();
        self
    }

    fn related(&self, relation: &str) -> Result<Self, QueryError> {
        let rel = self.table.relations.get(relation).ok_or_else(|| {
            QueryError::unsupported(format!(
                "table '{}' has no relation '{relation}'",
                self.table.name
            ))
        })?;

        Ok(Self::new(Arc::clone(&rel.target)))
    }

    fn execute(&self) -> Result<RecordSet, QueryError> {
        let stats = &self.table.stats;
        stats.executions.fetch_add(1, Ordering::Relaxed);

        if let Some(err) = &self.table.failure {
            return Err(err.clone());
        }

        if let Some(column) = &self.select
            && self.table.computed_columns.contains(column)
        {
            return Err(QueryError::unsupported(format!(
                "column '{column}' is not selectable on '{}'",
                self.table.name
            )));
        }

        let mut rows: Vec<Record> = self
            .table
            .rows
            .iter()
            .filter(|row| {
                self.predicates
                    .iter()
                    .all(|predicate| Self::eval(&self.table, row, predicate))
            })
            .map(|row| self.eager_load(row))
            .collect();

        for column in self.order.iter().rev() {
            rows.sort_by(|a, b| {
                let left = a.get_path(column).unwrap_or(Value::Null);
                let right = b.get_path(column).unwrap_or(Value::Null);
                Value::canonical_cmp(&left, &right)
            });
        }

        let mut out: Vec<Value> = match &self.select {
            Some(column) => {
                stats.projected_executions.fetch_add(1, Ordering::Relaxed);
                rows.iter()
                    .map(|row| {
                        let value = row.get_path(column).unwrap_or(Value::Null);
                        Value::Record(Record::new().with(column.clone(), value))
                    })
                    .collect()
            }
            None => {
                stats.row_executions.fetch_add(1, Ordering::Relaxed);
                rows.into_iter().map(Value::Record).collect()
            }
        };

        if self.distinct {
            let mut kept: Vec<Value> = Vec::with_capacity(out.len());
            for value in out {
                if !kept.iter().any(|seen| Value::canonical_eq(seen, &value)) {
                    kept.push(value);
                }
            }
            out = kept;
        }

        if let Some(limit) = self.limit {
            out.truncate(limit);
        }

        Ok(RecordSet::new(out))
    }

    fn compiled_predicate_text(&self) -> String {
        let mut out = String::new();
        let mut ignored = Vec::new();

        let _ = write!(
            out,
            "select {}{} from {}",
            if self.distinct { "distinct " } else { "" },
            self.select.as_deref().unwrap_or("*"),
            self.table.name
        );
        for (i, predicate) in self.predicates.iter().enumerate() {
            out.push_str(if i == 0 { " where " } else { " and " });
            predicate.compile(&mut out, &mut ignored);
        }
        if !self.order.is_empty() {
            let _ = write!(out, " order by {}", self.order.join(", "));
        }
        if let Some(limit) = self.limit {
            let _ = write!(out, " limit {limit}");
        }

        out
    }

    fn bound_parameters(&self) -> Vec<Value> {
        let mut text = String::new();
        let mut bindings = Vec::new();
        for predicate in &self.predicates {
            predicate.compile(&mut text, &mut bindings);
        }

        bindings
    }
}

///
/// TESTS
///
