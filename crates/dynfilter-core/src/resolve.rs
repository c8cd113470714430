//! Module: resolve
//! Responsibility: distinct, optionally searched and capped, sorted raw
//! values for one column of an options source.
//! Does not own: formatting or caching.
//! Boundary: a two-stage strategy. Stage one asks the store for
//! `SELECT DISTINCT`; a declared `QueryError` from that stage falls back to
//! materializing the untouched base query and resolving in memory.

use crate::{
    error::InternalError,
    extract::extract_values,
    query::{OptionsSource, QueryError, QueryErrorKind, Queryable},
    value::Value,
};

///
/// DistinctRequest
///
/// `extract_column` is the display path read from materialized rows;
/// `predicate_column` is the store column used by the distinct query.
/// They may differ (relation-qualified display over a base-table column).
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DistinctRequest<'a> {
    pub extract_column: &'a str,
    pub predicate_column: &'a str,
    pub limit: Option<usize>,
    pub search: Option<&'a str>,
}

impl<'a> DistinctRequest<'a> {
    #[must_use]
    pub const fn new(extract_column: &'a str, predicate_column: &'a str) -> Self {
        Self {
            extract_column,
            predicate_column,
            limit: None,
            search: None,
        }
    }

    /// Cap the number of values; zero means unbounded.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = match limit {
            Some(0) => None,
            other => other,
        };
        self
    }

    /// Narrow by a case-insensitive substring; blank terms are ignored.
    #[must_use]
    pub fn with_search(mut self, term: Option<&'a str>) -> Self {
        self.search = term.map(str::trim).filter(|t| !t.is_empty());
        self
    }
}

///
/// DistinctStage
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DistinctStage {
    /// Store-side `SELECT DISTINCT` over the predicate column.
    Query,
    /// Full materialization, then in-memory search/dedup/sort/limit.
    Materialize,
}

///
/// DistinctOutcome
///

#[derive(Clone, Debug, PartialEq)]
pub struct DistinctOutcome {
    pub values: Vec<Value>,
    pub stage: DistinctStage,
    /// The query-stage failure that triggered the fallback, if any.
    pub fallback_cause: Option<QueryError>,
}

///
/// FallbackTrigger
///
/// Which query-stage failures are expected and answered by materializing.
/// Anything not matched surfaces as an error.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FallbackTrigger {
    /// Any `QueryError` raised while running the distinct query.
    #[default]
    AnyQueryError,
    /// Only `QueryErrorKind::Unsupported` (unselectable columns).
    Unsupported,
}

impl FallbackTrigger {
    #[must_use]
    pub const fn triggers(self, err: &QueryError) -> bool {
        match self {
            Self::AnyQueryError => true,
            Self::Unsupported => matches!(err.kind, QueryErrorKind::Unsupported),
        }
    }
}

///
/// DistinctStrategy
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DistinctStrategy {
    trigger: FallbackTrigger,
}

impl DistinctStrategy {
    #[must_use]
    pub const fn new(trigger: FallbackTrigger) -> Self {
        Self { trigger }
    }

    #[must_use]
    pub const fn trigger(self) -> FallbackTrigger {
        self.trigger
    }

    pub fn resolve<Q: Queryable>(
        self,
        source: &OptionsSource<Q>,
        request: &DistinctRequest<'_>,
    ) -> Result<DistinctOutcome, InternalError> {
        let OptionsSource::Query(base) = source else {
            return Ok(DistinctOutcome {
                values: materialize_stage(source, request)?,
                stage: DistinctStage::Materialize,
                fallback_cause: None,
            });
        };

        match query_stage(base, request) {
            Ok(values) => Ok(DistinctOutcome {
                values,
                stage: DistinctStage::Query,
                fallback_cause: None,
            }),
            Err(err) if self.trigger.triggers(&err) => Ok(DistinctOutcome {
                values: materialize_stage(source, request)?,
                stage: DistinctStage::Materialize,
                fallback_cause: Some(err),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

/// Resolve with the default strategy (fall back on any query error).
pub fn resolve_distinct<Q: Queryable>(
    source: &OptionsSource<Q>,
    request: &DistinctRequest<'_>,
) -> Result<DistinctOutcome, InternalError> {
    DistinctStrategy::default().resolve(source, request)
}

// Stage one: clone, strip ordering, narrow, project, dedup, sort, cap.
fn query_stage<Q: Queryable>(
    base: &Q,
    request: &DistinctRequest<'_>,
) -> Result<Vec<Value>, QueryError> {
    let column = request.predicate_column;
    let mut query = base.clone().without_ordering();

    if let Some(term) = request.search {
        query = query.where_contains(column, term);
    }
    query = query.select(column).distinct().order_by(column);
    // Distinct yields at most one NULL row; reserve a slot for it.
    if let Some(limit) = request.limit {
        query = query.limit(limit.saturating_add(1));
    }

    let rows = query.execute()?;

    let mut values: Vec<Value> = rows
        .into_iter()
        .map(|row| match row {
            Value::Record(record) => record.get_path(column).unwrap_or(Value::Null),
            scalar => scalar,
        })
        .filter(|value| !value.is_null())
        .collect();
    if let Some(limit) = request.limit {
        values.truncate(limit);
    }

    Ok(values)
}

// Stage two: materialize the original source and do everything in memory.
fn materialize_stage<Q: Queryable>(
    source: &OptionsSource<Q>,
    request: &DistinctRequest<'_>,
) -> Result<Vec<Value>, InternalError> {
    let mut values: Vec<Value> = extract_values(source, request.extract_column)?
        .flat_map(|value| match value {
            Value::List(items) => items,
            other => vec![other],
        })
        .filter(|value| !value.is_null())
        .filter(|value| request.search.is_none_or(|term| value.contains_ci(term)))
        .collect();

    values.sort_by(Value::canonical_cmp);
    values.dedup_by(|a, b| Value::canonical_eq(a, b));
    if let Some(limit) = request.limit {
        values.truncate(limit);
    }

    Ok(values)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        query::{
            RecordSet,
            memory::{MemoryQuery, MemoryTable},
        },
        value::{Date, Record},
    };
    use proptest::prelude::*;
    use std::sync::Arc;

    fn products() -> Arc<MemoryTable> {
        Arc::new(
            MemoryTable::new(
                "products",
                vec![
                    Record::new().with("color", "Blue").with("shade", "navy"),
                    Record::new().with("color", "red").with("shade", "crimson"),
                    Record::new().with("color", "black").with("shade", "jet"),
                    Record::new().with("color", "Blue").with("shade", "sky"),
                    Record::new().with("color", Value::Null).with("shade", "none"),
                ],
            )
            .with_computed_column("shade"),
        )
    }

    #[test]
    fn query_stage_returns_sorted_distinct_values() {
        let table = products();
        let source = OptionsSource::Query(MemoryQuery::new(Arc::clone(&table)));

        let outcome =
            resolve_distinct(&source, &DistinctRequest::new("color", "color")).expect("resolve");

        assert_eq!(outcome.stage, DistinctStage::Query);
        assert_eq!(
            outcome.values,
            vec![Value::from("Blue"), Value::from("black"), Value::from("red")]
        );
        assert_eq!(table.stats().projected_executions(), 1);
        assert_eq!(table.stats().row_executions(), 0);
    }

    #[test]
    fn query_stage_applies_search_and_limit() {
        let source = OptionsSource::Query(MemoryQuery::new(products()));
        let request = DistinctRequest::new("color", "color")
            .with_search(Some(" BL "))
            .with_limit(Some(1));

        let outcome = resolve_distinct(&source, &request).expect("resolve");

        assert_eq!(outcome.values, vec![Value::from("Blue")]);
    }

    #[test]
    fn null_rows_do_not_consume_the_option_limit() {
        let table = Arc::new(MemoryTable::new(
            "products",
            vec![
                Record::new().with("color", Value::Null),
                Record::new().with("color", "blue"),
                Record::new().with("color", "red"),
                Record::new().with("color", "green"),
            ],
        ));
        let source = OptionsSource::Query(MemoryQuery::new(table));
        let request = DistinctRequest::new("color", "color").with_limit(Some(2));

        let outcome = resolve_distinct(&source, &request).expect("resolve");

        assert_eq!(outcome.stage, DistinctStage::Query);
        assert_eq!(outcome.values, vec![Value::from("blue"), Value::from("green")]);
    }

    #[test]
    fn limit_truncates_when_no_null_is_present() {
        let table = Arc::new(MemoryTable::new(
            "products",
            vec![
                Record::new().with("color", "blue"),
                Record::new().with("color", "red"),
                Record::new().with("color", "green"),
            ],
        ));
        let source = OptionsSource::Query(MemoryQuery::new(table));
        let request = DistinctRequest::new("color", "color").with_limit(Some(2));

        let outcome = resolve_distinct(&source, &request).expect("resolve");

        assert_eq!(outcome.values, vec![Value::from("blue"), Value::from("green")]);
    }

    #[test]
    fn unselectable_column_falls_back_to_materialization() {
        let table = products();
        let source = OptionsSource::Query(MemoryQuery::new(Arc::clone(&table)));
        let request = DistinctRequest::new("color", "shade").with_search(Some("bl"));

        let outcome = resolve_distinct(&source, &request).expect("resolve");

        assert_eq!(outcome.stage, DistinctStage::Materialize);
        assert_eq!(
            outcome.fallback_cause.map(|err| err.kind),
            Some(QueryErrorKind::Unsupported)
        );
        assert_eq!(
            outcome.values,
            vec![Value::from("Blue"), Value::from("black")]
        );
        assert_eq!(table.stats().row_executions(), 1);
    }

    #[test]
    fn narrow_trigger_surfaces_execution_failures() {
        let table = Arc::new(
            MemoryTable::new("broken", vec![]).with_failure(QueryError::execution("disk")),
        );
        let source = OptionsSource::Query(MemoryQuery::new(table));
        let strategy = DistinctStrategy::new(FallbackTrigger::Unsupported);

        let err = strategy
            .resolve(&source, &DistinctRequest::new("a", "a"))
            .expect_err("execution failure must not fall back");

        assert_eq!(err.origin, crate::error::ErrorOrigin::Query);
    }

    #[test]
    fn fallback_failure_propagates() {
        let table = Arc::new(
            MemoryTable::new("broken", vec![]).with_failure(QueryError::execution("disk")),
        );
        let source = OptionsSource::Query(MemoryQuery::new(Arc::clone(&table)));

        assert!(resolve_distinct(&source, &DistinctRequest::new("a", "a")).is_err());
        assert_eq!(table.stats().executions(), 2);
    }

    #[test]
    fn record_sources_resolve_in_memory_with_temporal_projection() {
        let jan = Date::parse("2024-01-15").expect("date");
        let feb = Date::parse("2024-02-15").expect("date");
        let records: RecordSet = vec![Value::Date(feb), Value::Date(jan), Value::Date(feb)]
            .into_iter()
            .collect();
        let source = OptionsSource::<MemoryQuery>::Records(records);
        let request = DistinctRequest::new("created_at", "created_at").with_search(Some("-01-"));

        let outcome = resolve_distinct(&source, &request).expect("resolve");

        assert_eq!(outcome.stage, DistinctStage::Materialize);
        assert!(outcome.fallback_cause.is_none());
        assert_eq!(outcome.values, vec![Value::Date(jan)]);
    }

    #[test]
    fn materialization_flattens_has_many_paths() {
        let records: RecordSet = vec![
            Record::new().with(
                "tags",
                vec![
                    Record::new().with("name", "b"),
                    Record::new().with("name", "a"),
                ],
            ),
            Record::new().with("tags", vec![Record::new().with("name", "a")]),
        ]
        .into_iter()
        .collect();
        let source = OptionsSource::<MemoryQuery>::Records(records);

        let request = DistinctRequest::new("tags.name", "tags.name");

        let outcome = resolve_distinct(&source, &request).expect("resolve");

        assert_eq!(outcome.values, vec![Value::from("a"), Value::from("b")]);
    }

    proptest! {
        #[test]
        fn in_memory_search_keeps_exactly_matching_values(
            words in proptest::collection::vec("[a-zA-Z]{1,6}", 0..24),
            term in "[a-zA-Z]{1,2}",
        ) {
            let records: RecordSet = words.iter().map(|w| Value::from(w.as_str())).collect();
            let source = OptionsSource::<MemoryQuery>::Records(records);
            let request = DistinctRequest::new("word", "word").with_search(Some(term.as_str()));

            let outcome = resolve_distinct(&source, &request).expect("resolve");
            let needle = term.to_lowercase();

            for value in &outcome.values {
                prop_assert!(value.text_projection().to_lowercase().contains(&needle));
            }
            for word in &words {
                if word.to_lowercase().contains(&needle) {
                    prop_assert!(outcome.values.contains(&Value::from(word.as_str())));
                }
            }
            for pair in outcome.values.windows(2) {
                prop_assert!(Value::canonical_cmp(&pair[0], &pair[1]).is_lt());
            }
        }
    }
}
