use crate::format::OptionKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

///
/// ResolvedOptionSet
///
/// Ordered `key → label` mapping handed to the UI layer.
/// Insertion order is the resolver's sort order; keys are unique.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "OptionEntries")]
pub struct ResolvedOptionSet {
    entries: Vec<(OptionKey, String)>,
    #[serde(skip)]
    positions: HashMap<OptionKey, usize>,
}

// Wire shape; the position index is rebuilt on decode.
#[derive(Deserialize)]
struct OptionEntries {
    entries: Vec<(OptionKey, String)>,
}

impl From<OptionEntries> for ResolvedOptionSet {
    fn from(raw: OptionEntries) -> Self {
        raw.entries.into_iter().collect()
    }
}

impl ResolvedOptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An overwritten key keeps its original position
    /// and the previous label is returned.
    pub fn insert(&mut self, key: OptionKey, label: String) -> Option<String> {
        if let Some(&pos) = self.positions.get(&key) {
            return Some(std::mem::replace(&mut self.entries[pos].1, label));
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push((key, label));

        None
    }

    #[must_use]
    pub fn get(&self, key: &OptionKey) -> Option<&str> {
        self.positions
            .get(key)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    #[must_use]
    pub fn contains_key(&self, key: &OptionKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &OptionKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OptionKey, &str)> {
        self.entries.iter().map(|(k, l)| (k, l.as_str()))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<OptionKey>, L: Into<String>> FromIterator<(K, L)> for ResolvedOptionSet {
    fn from_iter<I: IntoIterator<Item = (K, L)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, label) in iter {
            set.insert(key.into(), label.into());
        }

        set
    }
}

impl IntoIterator for ResolvedOptionSet {
    type Item = (OptionKey, String);
    type IntoIter = std::vec::IntoIter<(OptionKey, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

///
/// TESTS
///
