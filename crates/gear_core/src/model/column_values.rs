//! Insertion-ordered column/value map.
//!
//! # Responsibility
//! - Hold one row's values keyed by column name.
//! - Preserve the order columns were first inserted in.
//!
//! # Invariants
//! - Keys are unique.
//! - Overwriting a key keeps its original position.

use crate::model::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Ordered mapping of column name to [`Value`].
///
/// Rows are small, so lookups scan linearly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues {
    entries: Vec<(String, Value)>,
}

impl ColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites one column and returns the previous value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();
        match self.position(&column) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((column, value));
                None
            }
        }
    }

    /// Builder-style insert, convenient for literal rows.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.position(column).map(|index| &self.entries[index].1)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.position(column).is_some()
    }

    /// Removes one column, keeping the relative order of the others.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.position(column)
            .map(|index| self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(column, _)| column.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.entries.iter().position(|(key, _)| key == column)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ColumnValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (column, value) in iter {
            values.insert(column, value);
        }
        values
    }
}

impl IntoIterator for ColumnValues {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ColumnValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
