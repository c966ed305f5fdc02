//! The TopicValue type - object-shaped topic state.
//!
//! Topics only ever hold object-shaped data. Instead of checking
//! "is this object-like" at runtime on every mutation, the shape
//! requirement is encoded in the type: a `TopicValue` is either the
//! canonical empty object or a string-keyed map of JSON leaves.
//! Non-object JSON is rejected once, at the conversion boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Error;

/// The underlying map shape of an object-valued topic.
pub type ObjectMap = BTreeMap<String, JsonValue>;

/// An object-shaped topic value.
///
/// `Empty` and an empty `Object` map are the same value; conversions
/// normalize to `Empty`, and equality treats them as equal.
///
/// # Example
///
/// ```rust
/// use topicbus_core::TopicValue;
/// use serde_json::json;
///
/// let cart = TopicValue::try_from(json!({ "items": ["x"] })).unwrap();
/// assert_eq!(cart.get("items"), Some(&json!(["x"])));
///
/// // Non-object JSON is rejected at the boundary.
/// assert!(TopicValue::try_from(json!(42)).is_err());
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "ObjectMap", into = "ObjectMap")]
pub enum TopicValue {
    /// The canonical empty object, `{}`.
    #[default]
    Empty,
    /// A non-empty object.
    Object(ObjectMap),
}

impl TopicValue {
    /// Look up a field by key.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        match self {
            TopicValue::Empty => None,
            TopicValue::Object(map) => map.get(key),
        }
    }

    /// Insert or replace a field, promoting `Empty` to `Object`.
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        match self {
            TopicValue::Empty => {
                let mut map = ObjectMap::new();
                map.insert(key.into(), value);
                *self = TopicValue::Object(map);
                None
            }
            TopicValue::Object(map) => map.insert(key.into(), value),
        }
    }

    /// Remove a field, normalizing back to `Empty` when the last one goes.
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        match self {
            TopicValue::Empty => None,
            TopicValue::Object(map) => {
                let removed = map.remove(key);
                if map.is_empty() {
                    *self = TopicValue::Empty;
                }
                removed
            }
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        match self {
            TopicValue::Empty => 0,
            TopicValue::Object(map) => map.len(),
        }
    }

    /// True for `Empty` or an object with no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        static EMPTY: ObjectMap = ObjectMap::new();
        match self {
            TopicValue::Empty => EMPTY.iter(),
            TopicValue::Object(map) => map.iter(),
        }
    }
}

impl PartialEq for TopicValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TopicValue::Object(a), TopicValue::Object(b)) => a == b,
            // Empty == Object(∅) by normalization.
            (a, b) => a.is_empty() && b.is_empty(),
        }
    }
}

impl From<ObjectMap> for TopicValue {
    fn from(map: ObjectMap) -> Self {
        if map.is_empty() {
            TopicValue::Empty
        } else {
            TopicValue::Object(map)
        }
    }
}

impl From<TopicValue> for ObjectMap {
    fn from(value: TopicValue) -> Self {
        match value {
            TopicValue::Empty => ObjectMap::new(),
            TopicValue::Object(map) => map,
        }
    }
}

impl TryFrom<JsonValue> for TopicValue {
    type Error = Error;

    /// Convert arbitrary JSON into a topic value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAnObject`] for anything that is not a JSON
    /// object.
    fn try_from(value: JsonValue) -> Result<Self, Error> {
        match value {
            JsonValue::Object(map) => Ok(map.into_iter().collect::<ObjectMap>().into()),
            _ => Err(Error::NotAnObject),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_is_empty() {
        let value = TopicValue::default();
        assert!(value.is_empty());
        assert_eq!(value.len(), 0);
        assert_eq!(value.get("anything"), None);
    }

    #[test]
    fn insert_promotes_empty_to_object() {
        let mut value = TopicValue::Empty;
        assert_eq!(value.insert("count", json!(1)), None);
        assert!(matches!(value, TopicValue::Object(_)));
        assert_eq!(value.get("count"), Some(&json!(1)));
    }

    #[test]
    fn remove_normalizes_back_to_empty() {
        let mut value = TopicValue::Empty;
        value.insert("only", json!(true));
        assert_eq!(value.remove("only"), Some(json!(true)));
        assert!(matches!(value, TopicValue::Empty));
    }

    #[test]
    fn empty_equals_empty_object() {
        let empty_map = TopicValue::Object(ObjectMap::new());
        assert_eq!(TopicValue::Empty, empty_map);
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert_eq!(TopicValue::try_from(json!("str")), Err(Error::NotAnObject));
        assert_eq!(TopicValue::try_from(json!(1)), Err(Error::NotAnObject));
        assert_eq!(TopicValue::try_from(json!([1, 2])), Err(Error::NotAnObject));
        assert_eq!(TopicValue::try_from(json!(null)), Err(Error::NotAnObject));
    }

    #[test]
    fn object_json_converts() {
        let value = TopicValue::try_from(json!({ "a": 1, "b": [2] })).unwrap();
        assert_eq!(value.get("a"), Some(&json!(1)));
        assert_eq!(value.get("b"), Some(&json!([2])));
    }

    #[test]
    fn empty_object_json_normalizes() {
        let value = TopicValue::try_from(json!({})).unwrap();
        assert!(matches!(value, TopicValue::Empty));
    }

    #[test]
    fn serializes_as_json_map() {
        let mut value = TopicValue::Empty;
        value.insert("a", json!(1));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":1}"#);
        assert_eq!(serde_json::to_string(&TopicValue::Empty).unwrap(), "{}");
    }

    #[test]
    fn deserializes_from_json_map() {
        let value: TopicValue = serde_json::from_str(r#"{"a":1}"#).unwrap();
        assert_eq!(value.get("a"), Some(&json!(1)));

        let empty: TopicValue = serde_json::from_str("{}").unwrap();
        assert!(matches!(empty, TopicValue::Empty));
    }

    #[test]
    fn iter_walks_fields_in_key_order() {
        let value = TopicValue::try_from(json!({ "b": 2, "a": 1 })).unwrap();
        let keys: Vec<&String> = value.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a", "b"]);
    }
}
