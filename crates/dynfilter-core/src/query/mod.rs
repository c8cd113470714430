//! Module: query
//! Responsibility: the query capability the engine needs from a host, and
//! the data shapes that cross that boundary.
//! Does not own: SQL generation, connections, or execution (host concerns).

pub mod memory;
mod predicate;

use crate::value::{Date, Value};
use derive_more::{Deref, Display, IntoIterator};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error as ThisError;

// re-exports
pub use predicate::Predicate;

///
/// Queryable
///
/// Cloneable query description that can be narrowed and executed.
///
/// Builder methods consume and return the query; the engine always clones
/// the host's base query before narrowing it, so the base is never mutated.
///

pub trait Queryable: Clone {
    /// Identity of this query instance. Clones and reshaped queries must
    /// receive a new handle.
    fn handle(&self) -> QueryHandle;

    #[must_use]
    fn without_ordering(self) -> Self;

    #[must_use]
    fn select(self, column: &str) -> Self;

    #[must_use]
    fn distinct(self) -> Self;

    #[must_use]
    fn order_by(self, column: &str) -> Self;

    #[must_use]
    fn limit(self, n: usize) -> Self;

    #[must_use]
    fn filter(self, predicate: Predicate) -> Self;

    /// Unscoped query over the entity reached through `relation`.
    fn related(&self, relation: &str) -> Result<Self, QueryError>;

    fn execute(&self) -> Result<RecordSet, QueryError>;

    /// Compiled predicate text, excluding bound values.
    fn compiled_predicate_text(&self) -> String;

    /// Bound parameter values in placeholder order.
    fn bound_parameters(&self) -> Vec<Value>;

    // ------------------------------------------------------------------
    // Predicate shorthands
    // ------------------------------------------------------------------

    #[must_use]
    fn where_equals(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Predicate::eq(column, value))
    }

    #[must_use]
    fn where_date_equals(self, column: &str, date: Date) -> Self {
        self.filter(Predicate::date_eq(column, date))
    }

    #[must_use]
    fn where_in(self, column: &str, values: Vec<Value>) -> Self {
        self.filter(Predicate::in_list(column, values))
    }

    #[must_use]
    fn where_contains(self, column: &str, substring: &str) -> Self {
        self.filter(Predicate::contains_ci(column, substring))
    }

    #[must_use]
    fn where_exists(self, relation: &str, predicate: Predicate) -> Self {
        self.filter(Predicate::exists(relation, predicate))
    }
}

///
/// QueryHandle
///
/// Opaque per-instance identity used to memoize fingerprints within one
/// resolution context.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct QueryHandle(u64);

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

impl QueryHandle {
    /// Allocate a process-unique handle.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

///
/// RecordSet
///
/// Materialized result of executing a query. Rows are usually records but
/// hosts may return bare scalars for single-column projections.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct RecordSet(Vec<Value>);

impl RecordSet {
    #[must_use]
    pub const fn new(rows: Vec<Value>) -> Self {
        Self(rows)
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Value> {
        self.0
    }
}

impl<T: Into<Value>> FromIterator<T> for RecordSet {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

///
/// OptionsSource
///
/// Where option values come from: a query (optimized distinct path
/// available) or an already-materialized record set.
///

#[derive(Clone, Debug)]
pub enum OptionsSource<Q> {
    Query(Q),
    Records(RecordSet),
}

///
/// QueryError
///
/// Failure reported by a host while executing a query.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{kind}: {message}")]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub message: String,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The query shape is not supported (e.g. a computed column in SELECT).
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::Unsupported, message)
    }

    /// The store failed while running an otherwise valid query.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(QueryErrorKind::Execution, message)
    }
}

///
/// QueryErrorKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum QueryErrorKind {
    #[display("unsupported query")]
    Unsupported,

    #[display("query execution failed")]
    Execution,
}
