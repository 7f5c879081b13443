//! The Value type - dynamically-typed data carried by class fields, event
//! payloads and store data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A tree-shaped value.
///
/// Maps directly onto JSON but keeps integers and floats apart.
///
/// # Design Notes
///
/// - Uses `BTreeMap` for deterministic ordering (important for comparison and
///   for stable member listings)
/// - Uses `i64` for integers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Key-value map with string keys.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a map.
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Whether this value carries no payload: null, an empty map or an
    /// empty array. Scalars are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Map(map) => map.is_empty(),
            Value::Array(arr) => arr.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            Value::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        }
    }

    /// Mutable lookup of a key in a map value.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Map(map) => map.get_mut(key),
            Value::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get_mut(i)),
            _ => None,
        }
    }

    /// Insert a key into a map value, turning a null into an empty map first.
    ///
    /// Returns the previous value, or `None` when `self` is not a map.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        if self.is_null() {
            *self = Value::map();
        }
        match self {
            Value::Map(map) => map.insert(key.into(), value),
            _ => None,
        }
    }

    /// Merge `other` into `self` in place.
    ///
    /// Maps are merged key by key, recursively. Any other combination
    /// replaces the existing value. Keys present only in `self` are kept.
    pub fn merge(&mut self, other: Value) {
        match (self, other) {
            (Value::Map(existing), Value::Map(incoming)) => {
                for (key, value) in incoming {
                    match existing.get_mut(&key) {
                        Some(slot) => slot.merge(value),
                        None => {
                            existing.insert(key, value);
                        }
                    }
                }
            }
            (slot, incoming) => *slot = incoming,
        }
    }

    /// Convert to `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    // Fallback for very large numbers
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        value.to_json()
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collection_literals::btree;

    #[test]
    fn empty_payloads() {
        assert!(Value::Null.is_empty());
        assert!(Value::map().is_empty());
        assert!(Value::array().is_empty());
        assert!(!Value::from(0i64).is_empty());
        assert!(!Value::from("").is_empty());
    }

    #[test]
    fn merge_updates_nested_maps_in_place() {
        let mut data = Value::Map(btree! {
            "name".into() => Value::from("Alice"),
            "address".into() => Value::Map(btree! {
                "city".into() => Value::from("Paris"),
                "zip".into() => Value::from("75001"),
            }),
        });
        data.merge(Value::Map(btree! {
            "address".into() => Value::Map(btree! {
                "city".into() => Value::from("Lyon"),
            }),
            "age".into() => Value::from(30i64),
        }));

        assert_eq!(data.get("name"), Some(&Value::from("Alice")));
        assert_eq!(data.get("age"), Some(&Value::from(30i64)));
        let address = data.get("address").unwrap();
        assert_eq!(address.get("city"), Some(&Value::from("Lyon")));
        assert_eq!(address.get("zip"), Some(&Value::from("75001")));
    }

    #[test]
    fn merge_replaces_arrays_and_scalars() {
        let mut data = Value::Map(btree! {
            "items".into() => Value::from(vec![1i64, 2, 3]),
        });
        data.merge(Value::Map(btree! {
            "items".into() => Value::from(vec![4i64]),
        }));
        assert_eq!(data.get("items"), Some(&Value::from(vec![4i64])));

        let mut scalar = Value::from(1i64);
        scalar.merge(Value::from("x"));
        assert_eq!(scalar, Value::from("x"));
    }

    #[test]
    fn json_conversion() {
        let json = serde_json::json!({"a": 1, "b": [true, null], "c": 1.5, "d": "s"});
        let value = Value::from(json.clone());
        assert_eq!(value.get("a"), Some(&Value::Integer(1)));
        assert_eq!(value.get("c"), Some(&Value::Float(1.5)));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn serde_untagged_round_trip() {
        let value: Value = serde_json::from_str(r#"{"n": 2, "f": 0.5, "s": "x"}"#).unwrap();
        assert_eq!(value.get("n"), Some(&Value::Integer(2)));
        assert_eq!(value.get("f"), Some(&Value::Float(0.5)));
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"f":0.5,"n":2,"s":"x"}"#);
    }

    #[test]
    fn insert_turns_null_into_map() {
        let mut value = Value::Null;
        value.insert("k", Value::from(true));
        assert_eq!(value.get("k"), Some(&Value::Bool(true)));
    }

    #[test]
    fn array_index_lookup() {
        let value = Value::from(vec!["a", "b"]);
        assert_eq!(value.get("1"), Some(&Value::from("b")));
        assert_eq!(value.get("2"), None);
    }
}
