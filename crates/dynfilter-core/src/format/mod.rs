//! Module: format
//! Responsibility: convert raw values into `(key, label)` option entries
//! through an ordered rule chain, and stringify labels for display.
//! Does not own: dedup of raw values (done before formatting, see `resolve`).

mod key;
mod rule;

#[cfg(test)]
mod tests;

use crate::{error::InternalError, value::Value};
use std::{collections::BTreeMap, fmt, sync::Arc};

// re-exports
pub use key::OptionKey;
pub use rule::{FORMAT_RULES, FormatRule};

///
/// OptionEntry
///

#[derive(Clone, Debug, PartialEq)]
pub struct OptionEntry {
    pub key: OptionKey,
    pub label: Value,
}

///
/// FormatOutput
///
/// What a caller-supplied formatter returns for one raw value.
/// A scalar is both key and label; a pair is an explicit key and label.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FormatOutput {
    Scalar(Value),
    Pair { key: Value, label: Value },
}

impl FormatOutput {
    #[must_use]
    pub fn pair(key: impl Into<Value>, label: impl Into<Value>) -> Self {
        Self::Pair {
            key: key.into(),
            label: label.into(),
        }
    }
}

impl From<Value> for FormatOutput {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for FormatOutput {
    fn from(value: &str) -> Self {
        Self::Scalar(value.into())
    }
}

impl From<String> for FormatOutput {
    fn from(value: String) -> Self {
        Self::Scalar(value.into())
    }
}

type FormatFn = dyn Fn(&Value) -> Result<Option<FormatOutput>, InternalError> + Send + Sync;

///
/// OptionFormatter
///
/// Caller-supplied, highest-priority formatter. Returning `None` (or a
/// null scalar) defers to the built-in rules.
///

#[derive(Clone)]
pub struct OptionFormatter(Arc<FormatFn>);

impl OptionFormatter {
    /// Wrap a fallible formatter; errors degrade the whole option set.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Option<FormatOutput>, InternalError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wrap an infallible formatter.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Option<FormatOutput> + Send + Sync + 'static,
    {
        Self(Arc::new(move |value| Ok(f(value))))
    }

    pub fn call(&self, value: &Value) -> Result<Option<FormatOutput>, InternalError> {
        (self.0)(value)
    }
}

impl fmt::Debug for OptionFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OptionFormatter(..)")
    }
}

///
/// ValueLabelMap
///
/// Explicit raw value → label overrides, matched on plain scalars only.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValueLabelMap(BTreeMap<OptionKey, String>);

impl ValueLabelMap {
    #[must_use]
    pub fn get(&self, key: &OptionKey) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<OptionKey>, label: impl Into<String>) {
        self.0.insert(key.into(), label.into());
    }
}

impl<K: Into<OptionKey>, L: Into<String>> FromIterator<(K, L)> for ValueLabelMap {
    fn from_iter<I: IntoIterator<Item = (K, L)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, l)| (k.into(), l.into()))
                .collect(),
        )
    }
}

/// Format one raw value through the rule chain.
pub fn format_option(
    value: &Value,
    map: Option<&ValueLabelMap>,
    formatter: Option<&OptionFormatter>,
) -> Result<OptionEntry, InternalError> {
    for rule in FORMAT_RULES {
        if let Some(entry) = rule.apply(value, map, formatter)? {
            return Ok(entry);
        }
    }

    Err(InternalError::format_invariant(
        "format rule chain must terminate with the identity rule",
    ))
}

/// Format one raw value and stringify its label.
///
/// Used for active-filter descriptions and to label a previously-selected
/// key without fetching options.
pub fn label_of(
    value: &Value,
    map: Option<&ValueLabelMap>,
    formatter: Option<&OptionFormatter>,
) -> Result<String, InternalError> {
    let entry = format_option(value, map, formatter)?;

    label_text(&entry.label)
}

/// Stringify a formatted label: booleans as `1`/`0`, composites as their
/// canonical JSON encoding.
pub fn label_text(label: &Value) -> Result<String, InternalError> {
    match label {
        Value::List(_) | Value::Record(_) => serde_json::to_string(label)
            .map_err(|err| InternalError::format_internal(format!("label encoding: {err}"))),
        Value::Enum(e) => Ok(e.label.clone()),
        Value::Date(d) => Ok(d.to_display()),
        _ => Ok(label.text_projection()),
    }
}
