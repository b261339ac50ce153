//! Ordered, list-valued metadata store
//!
//! Both metadata sources of a package are edited through the same shape: an
//! ordered mapping from a unique field name to either a single string or a
//! sequence of strings. bag-info fields load as sequences, significant
//! properties load as scalars.
//!
//! Entries keep their insertion order. Replacing the value of an existing
//! field keeps its position; a new field is appended at the end.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Value of a single metadata field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A bare string
    Single(String),
    /// An ordered sequence of strings
    List(Vec<String>),
}

impl FieldValue {
    /// Build a one-element sequence
    pub fn list_of(value: impl Into<String>) -> Self {
        FieldValue::List(vec![value.into()])
    }

    /// The value as a sequence, wrapping a bare string in a one-element list.
    pub fn into_list(self) -> Vec<String> {
        match self {
            FieldValue::Single(value) => vec![value],
            FieldValue::List(values) => values,
        }
    }

    /// First string of the value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            FieldValue::Single(value) => Some(value),
            FieldValue::List(values) => values.first().map(String::as_str),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::List(_))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::List(values)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Single(value) => f.write_str(value),
            FieldValue::List(values) => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}", value)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Ordered mapping from field name to [`FieldValue`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    fields: Vec<(String, FieldValue)>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `field` is present, regardless of its value.
    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.position(field).map(|i| &self.fields[i].1)
    }

    /// Insert or replace the value of `field`, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        let field = field.into();
        match self.position(&field) {
            Some(i) => Some(std::mem::replace(&mut self.fields[i].1, value)),
            None => {
                self.fields.push((field, value));
                None
            }
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.position(field).map(|i| self.fields.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|(k, _)| k == field)
    }
}

impl<K, V> FromIterator<(K, V)> for MetadataStore
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = MetadataStore::new();
        for (field, value) in iter {
            store.insert(field, value.into());
        }
        store
    }
}

impl IntoIterator for MetadataStore {
    type Item = (String, FieldValue);
    type IntoIter = std::vec::IntoIter<(String, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl Serialize for MetadataStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MetadataStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StoreVisitor;

        impl<'de> Visitor<'de> for StoreVisitor {
            type Value = MetadataStore;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to a string or a list of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut store = MetadataStore::new();
                while let Some((field, value)) = map.next_entry::<String, FieldValue>()? {
                    store.insert(field, value);
                }
                Ok(store)
            }
        }

        deserializer.deserialize_map(StoreVisitor)
    }
}
