//! Intermediate value model shared by every codec
//!
//! All formats decode into a [`Value`] tree and encode from one. Scalars are
//! kept as text so that a round trip through formats without a shared
//! numeric or boolean type stays lossless; the [`ScalarKind`] tag remembers
//! whether the text was a typed literal in a format that has them.

use crate::error::ShapeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a scalar's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Plain string data
    Text,
    /// Canonical numeric literal (`25`, `-1.5`)
    Number,
    /// `true` or `false`
    Boolean,
}

/// A scalar value stored as text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scalar {
    text: String,
    kind: ScalarKind,
}

impl Scalar {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ScalarKind::Text,
        }
    }

    pub fn number(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: ScalarKind::Number,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            text: value.to_string(),
            kind: ScalarKind::Boolean,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Ordered string-keyed map with unique keys
///
/// Insertion order is preserved; inserting an existing key replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a value, returning the previous value for the key if any
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// One row of tabular data: a [`Map`] whose values are scalars or null
pub type Record = Map;

/// Ordered sequence of records
pub type RecordSet = Vec<Record>;

/// Tagged intermediate representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Scalar(Scalar),
    List(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Shorthand for a text scalar
    pub fn text(text: impl Into<String>) -> Self {
        Value::Scalar(Scalar::text(text))
    }

    /// Shorthand for a numeric scalar
    pub fn number(text: impl Into<String>) -> Self {
        Value::Scalar(Scalar::number(text))
    }

    pub fn boolean(value: bool) -> Self {
        Value::Scalar(Scalar::boolean(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalar and null values are leaves
    pub fn is_leaf(&self) -> bool {
        matches!(self, Value::Null | Value::Scalar(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Text of a leaf value; null renders as the empty string
    pub fn leaf_text(&self) -> Option<&str> {
        match self {
            Value::Null => Some(""),
            Value::Scalar(s) => Some(s.as_str()),
            Value::List(_) | Value::Map(_) => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Scalar(_) => "scalar",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Wrap rows as a list of maps
    pub fn from_record_set(records: RecordSet) -> Self {
        Value::List(records.into_iter().map(Value::Map).collect())
    }

    /// Tabular view of this value
    ///
    /// Succeeds only for a list whose elements are all maps holding scalar or
    /// null values.
    pub fn as_record_set(&self) -> Result<RecordSet, ShapeError> {
        self.clone().into_record_set()
    }

    /// Consuming variant of [`Value::as_record_set`]
    pub fn into_record_set(self) -> Result<RecordSet, ShapeError> {
        let items = match self {
            Value::List(items) => items,
            other => {
                return Err(ShapeError::new(format!(
                    "expected a list of records, found {}",
                    other.type_name()
                )))
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for (row, item) in items.into_iter().enumerate() {
            let record = match item {
                Value::Map(map) => map,
                other => {
                    return Err(ShapeError::new(format!(
                        "row {} is a {}, expected a map",
                        row,
                        other.type_name()
                    )))
                }
            };

            if let Some((key, value)) = record.iter().find(|(_, v)| !v.is_leaf()) {
                return Err(ShapeError::new(format!(
                    "row {} field '{}' is a nested {}",
                    row,
                    key,
                    value.type_name()
                )));
            }
            records.push(record);
        }

        Ok(records)
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}
