//! # Instances
//!
//! An instance is a validated record value paired with the shape it was
//! validated against. The recorded identity is what lets the injection
//! engine recover tag metadata while walking serialized trees.
//!
//! ## Invariant
//!
//! An instance of a bound shape always carries its tag value in its tag
//! field. Every constructor that knows the binding asserts the field, and
//! [`Instance::update`] re-asserts it after caller mutation. The field
//! map is private so the invariant cannot be broken from outside.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::binding::TagBinding;
use crate::error::InstanceError;
use crate::shape::ShapeId;

/// A record value with recorded type identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    shape: ShapeId,
    fields: Map<String, Value>,
}

impl Instance {
    /// Wrap an already-validated field map for an unbound shape.
    ///
    /// Dispatch and validation paths are the usual constructors; use this
    /// directly only for shapes that carry no discriminator.
    pub fn new(shape: impl Into<ShapeId>, fields: Map<String, Value>) -> Self {
        Self {
            shape: shape.into(),
            fields,
        }
    }

    /// Wrap a field map for a bound shape, asserting the tag field.
    pub fn with_binding(binding: &TagBinding, mut fields: Map<String, Value>) -> Self {
        fields.insert(binding.tag_field.clone(), binding.tag_value.to_json());
        Self {
            shape: binding.shape.clone(),
            fields,
        }
    }

    /// Serialize a typed value into an instance.
    ///
    /// Serde is the structural serializer here; the result is the
    /// pre-injection tree. Pass the binding when the shape is bound so
    /// the tag field is asserted.
    ///
    /// # Errors
    ///
    /// Returns [`InstanceError::NotAMap`] when the value does not
    /// serialize to a JSON object, or [`InstanceError::Serialization`]
    /// when serde fails.
    pub fn from_serialize<T: Serialize>(
        shape: impl Into<ShapeId>,
        binding: Option<&TagBinding>,
        value: &T,
    ) -> Result<Self, InstanceError> {
        let shape = shape.into();
        let tree = serde_json::to_value(value)?;
        let fields = match tree {
            Value::Object(map) => map,
            _ => return Err(InstanceError::NotAMap(shape.to_string())),
        };
        Ok(match binding {
            Some(binding) => Self::with_binding(binding, fields),
            None => Self::new(shape, fields),
        })
    }

    /// The shape this instance was validated against.
    pub fn shape(&self) -> &ShapeId {
        &self.shape
    }

    /// The field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Read one field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The pre-injection tree, as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Consume the instance, yielding the pre-injection tree.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Mutate the field map, then re-assert the tag field from the
    /// binding so the tag invariant survives the mutation.
    pub fn update(&mut self, binding: &TagBinding, f: impl FnOnce(&mut Map<String, Value>)) {
        f(&mut self.fields);
        self.fields
            .insert(binding.tag_field.clone(), binding.tag_value.to_json());
    }

    /// Decode the instance back into a typed value through serde.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_value())
    }
}
