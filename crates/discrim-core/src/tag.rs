//! # Tag Keys and Scalar Tag Values
//!
//! A tag key names one point on a discrimination axis: the axis itself
//! (the [`CategoryId`]) plus the scalar value that selects one shape on
//! that axis. Tag keys are the primary index of the discriminator
//! registry, so both halves must be hashable and immutable.
//!
//! ## Invariant
//!
//! Discriminator values are scalars. Floats are rejected at the
//! conversion boundary because their equality and hashing are not stable
//! across producers; nulls and containers are rejected because they
//! cannot name a single shape.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TagValueError;

/// The name of a discrimination axis shared by a family of shapes.
///
/// Enumerated categories map onto their type name through the
/// [`TagCategory`] trait; plain string categories are constructed
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

impl CategoryId {
    /// Construct a category id from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Access the category name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CategoryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A scalar discriminator value.
///
/// Serializes untagged, so `"circle"`, `7`, and `true` round-trip as the
/// plain JSON scalars they are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// Textual discriminator (the common case).
    Str(String),
    /// Integer discriminator.
    Int(i64),
    /// Boolean discriminator.
    Bool(bool),
}

impl TagValue {
    /// Render this value as the JSON scalar it stands for.
    pub fn to_json(&self) -> Value {
        match self {
            TagValue::Str(s) => Value::String(s.clone()),
            TagValue::Int(n) => Value::Number((*n).into()),
            TagValue::Bool(b) => Value::Bool(*b),
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Str(s) => f.write_str(s),
            TagValue::Int(n) => write!(f, "{n}"),
            TagValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for TagValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl TryFrom<&Value> for TagValue {
    type Error = TagValueError;

    /// Convert a JSON value read out of a payload into a tag value.
    ///
    /// # Errors
    ///
    /// Returns [`TagValueError::NotAScalar`] for nulls, arrays, and
    /// objects, and [`TagValueError::FloatRejected`] for numbers that are
    /// not representable as `i64`.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => Err(TagValueError::FloatRejected(n.to_string())),
            },
            Value::Null => Err(TagValueError::NotAScalar("null")),
            Value::Array(_) => Err(TagValueError::NotAScalar("array")),
            Value::Object(_) => Err(TagValueError::NotAScalar("object")),
        }
    }
}

/// One point on a discrimination axis: category plus scalar value.
///
/// Two shapes must never be bound to the same key; the registry enforces
/// this at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagKey {
    /// The discrimination axis.
    pub category: CategoryId,
    /// The value selecting one shape on that axis.
    pub value: TagValue,
}

impl TagKey {
    /// Construct a key from a category and a value.
    pub fn new(category: impl Into<CategoryId>, value: impl Into<TagValue>) -> Self {
        Self {
            category: category.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.category, self.value)
    }
}

/// Enumerated discrimination axes.
///
/// Implement this for an enum whose variants are the discriminator values
/// of one category, then bind shapes with
/// `DiscriminatorRegistry::register_variant`. The category name doubles
/// as the tag field name, matching the string-category convention.
pub trait TagCategory {
    /// The category all variants of this type belong to.
    fn category() -> CategoryId;

    /// The discriminator value of this variant.
    fn tag_value(&self) -> TagValue;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tag_value_from_json_scalars() {
        assert_eq!(
            TagValue::try_from(&json!("circle")).unwrap(),
            TagValue::Str("circle".to_string())
        );
        assert_eq!(TagValue::try_from(&json!(7)).unwrap(), TagValue::Int(7));
        assert_eq!(TagValue::try_from(&json!(true)).unwrap(), TagValue::Bool(true));
    }

    #[test]
    fn test_tag_value_rejects_float() {
        let err = TagValue::try_from(&json!(1.5)).unwrap_err();
        assert!(matches!(err, TagValueError::FloatRejected(_)));
    }

    #[test]
    fn test_tag_value_rejects_containers_and_null() {
        assert!(TagValue::try_from(&json!(null)).is_err());
        assert!(TagValue::try_from(&json!([1])).is_err());
        assert!(TagValue::try_from(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_tag_value_to_json_roundtrip() {
        for value in [
            TagValue::from("rectangle"),
            TagValue::from(-3),
            TagValue::from(false),
        ] {
            let json = value.to_json();
            assert_eq!(TagValue::try_from(&json).unwrap(), value);
        }
    }

    #[test]
    fn test_tag_value_serde_untagged() {
        let value: TagValue = serde_json::from_value(json!("circle")).unwrap();
        assert_eq!(value, TagValue::from("circle"));
        assert_eq!(serde_json::to_value(&value).unwrap(), json!("circle"));

        let value: TagValue = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(serde_json::to_value(&value).unwrap(), json!(42));
    }

    #[test]
    fn test_tag_key_display() {
        let key = TagKey::new("shape_type", "circle");
        assert_eq!(key.to_string(), "shape_type=circle");

        let key = TagKey::new("version", 2i64);
        assert_eq!(key.to_string(), "version=2");
    }

    #[test]
    fn test_tag_key_hash_distinguishes_value_type() {
        use std::collections::HashSet;
        let mut keys = HashSet::new();
        assert!(keys.insert(TagKey::new("kind", "1")));
        assert!(keys.insert(TagKey::new("kind", 1i64)));
        assert!(!keys.insert(TagKey::new("kind", "1")));
    }

    enum MessageKind {
        Text,
        Image,
    }

    impl TagCategory for MessageKind {
        fn category() -> CategoryId {
            CategoryId::new("message_kind")
        }

        fn tag_value(&self) -> TagValue {
            match self {
                MessageKind::Text => TagValue::from("text"),
                MessageKind::Image => TagValue::from("image"),
            }
        }
    }

    #[test]
    fn test_tag_category_enum() {
        assert_eq!(MessageKind::category().as_str(), "message_kind");
        assert_eq!(MessageKind::Text.tag_value(), TagValue::from("text"));
        assert_eq!(MessageKind::Image.tag_value(), TagValue::from("image"));
    }
}
