//! Rows regrouped into nested containers.

use crate::row::Row;
use crate::value::Value;
use indexmap::IndexMap;
use indexmap::map::Entry;

/// One entry of a [`GroupedRow`].
#[derive(Debug, Clone, PartialEq)]
pub enum RowEntry {
    /// A plain column value
    Value(Value),
    /// Columns that shared a prefix, keyed by the remainder of their name
    Nested(GroupedRow),
}

impl RowEntry {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            RowEntry::Value(v) => Some(v),
            RowEntry::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&GroupedRow> {
        match self {
            RowEntry::Nested(n) => Some(n),
            RowEntry::Value(_) => None,
        }
    }
}

impl From<Value> for RowEntry {
    fn from(value: Value) -> Self {
        RowEntry::Value(value)
    }
}

impl From<GroupedRow> for RowEntry {
    fn from(row: GroupedRow) -> Self {
        RowEntry::Nested(row)
    }
}

/// An ordered, possibly nested row.
///
/// Built from a flat [`Row`]; the grouping stage moves `prefix<divider>rest`
/// columns into a nested container under `prefix`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedRow {
    entries: IndexMap<String, RowEntry>,
}

impl GroupedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&RowEntry> {
        self.entries.get(key)
    }

    /// Get a scalar value by key.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).and_then(RowEntry::as_value)
    }

    /// Get a nested container by key.
    pub fn nested(&self, key: &str) -> Option<&GroupedRow> {
        self.entries.get(key).and_then(RowEntry::as_nested)
    }

    /// Set a scalar value, replacing any previous entry under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries
            .insert(key.into(), RowEntry::Value(value.into()));
    }

    /// Set an entry, replacing any previous entry under `key`.
    pub fn insert_entry(&mut self, key: impl Into<String>, entry: RowEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Remove an entry, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &str) -> Option<RowEntry> {
        self.entries.shift_remove(key)
    }

    /// Store `value` under `prefix` -> `key`, creating the container on
    /// first use.
    ///
    /// If `prefix` already holds a scalar, that scalar moves into the new
    /// container under the empty key instead of being lost.
    pub fn nest(&mut self, prefix: &str, key: impl Into<String>, entry: impl Into<RowEntry>) {
        let container = match self.entries.entry(prefix.to_string()) {
            Entry::Vacant(slot) => slot.insert(RowEntry::Nested(GroupedRow::new())),
            Entry::Occupied(slot) => {
                let slot = slot.into_mut();
                if let RowEntry::Value(existing) = &mut *slot {
                    let scalar = std::mem::replace(existing, Value::Null);
                    let mut promoted = GroupedRow::new();
                    promoted.insert(String::new(), scalar);
                    *slot = RowEntry::Nested(promoted);
                }
                slot
            }
        };
        if let RowEntry::Nested(group) = container {
            group.insert_entry(key, entry.into());
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render the row as a JSON object, nested containers as nested objects.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(k, entry)| {
                let value = match entry {
                    RowEntry::Value(v) => v.to_json(),
                    RowEntry::Nested(n) => n.to_json(),
                };
                (k.clone(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl From<Row> for GroupedRow {
    fn from(row: Row) -> Self {
        Self {
            entries: row
                .into_pairs()
                .map(|(k, v)| (k, RowEntry::Value(v)))
                .collect(),
        }
    }
}

impl IntoIterator for GroupedRow {
    type Item = (String, RowEntry);
    type IntoIter = indexmap::map::IntoIter<String, RowEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, RowEntry)> for GroupedRow {
    fn from_iter<I: IntoIterator<Item = (String, RowEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
