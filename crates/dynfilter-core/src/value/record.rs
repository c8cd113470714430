use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

///
/// Record
///
/// Composite row shape: named fields, possibly nesting related records.
/// Field order is canonical (sorted by name).
///

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Resolve a dot-separated path.
    ///
    /// A field whose name literally contains the dots wins over nested
    /// traversal, so single-column projections keyed by the full path
    /// resolve directly. A list met mid-path yields a list of the
    /// remaining path resolved against each element.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value.clone());
        }

        let (head, rest) = path.split_once('.')?;
        match self.0.get(head)? {
            Value::Record(inner) => inner.get_path(rest),
            Value::List(items) => Some(Value::List(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Record(inner) => inner.get_path(rest),
                        _ => None,
                    })
                    .collect(),
            )),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
