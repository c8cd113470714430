//! Module: extract
//! Responsibility: turn a data source plus a column path into raw values.
//! Does not own: dedup, search, or ordering (see `resolve`).

use crate::{
    error::InternalError,
    query::{OptionsSource, Queryable, RecordSet},
    value::Value,
};

/// Materialize `source` and pluck the values at `path`.
///
/// Queries are always executed first; extraction never runs against an
/// unmaterialized query.
pub fn extract_values<Q: Queryable>(
    source: &OptionsSource<Q>,
    path: &str,
) -> Result<impl Iterator<Item = Value>, InternalError> {
    let records = match source {
        OptionsSource::Query(query) => query.execute()?,
        OptionsSource::Records(records) => records.clone(),
    };

    pluck(records, path)
}

/// Pluck `path` from each row of a materialized record set.
///
/// The shape of the first row decides: composite rows are plucked at
/// `path` (rows missing it yield `Null`), scalar rows are the values.
pub fn pluck(records: RecordSet, path: &str) -> Result<impl Iterator<Item = Value>, InternalError> {
    if path.is_empty() {
        return Err(InternalError::extract_internal(
            "cannot extract values at an empty column path",
        ));
    }

    let plucks = records.first().is_some_and(Value::is_composite);
    let path = path.to_string();

    Ok(records.into_iter().map(move |row| {
        if !plucks {
            return row;
        }

        match row {
            Value::Record(record) => record.get_path(&path).unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }))
}

///
/// TESTS
///
