//! # Shape Descriptors and Declared Field Sets
//!
//! A shape is one concrete record type with a fixed field set. The
//! declared field set serves two consumers: the tag-injection engine
//! walks it to recover the identity of nested values, and the structural
//! validator compiles the optional JSON Schema attached to it.
//!
//! Wrapper kinds ([`FieldKind::List`], [`FieldKind::Optional`],
//! [`FieldKind::Map`]) are transparent to traversal: the engine recurses
//! into elements and contained values without touching the wrapper level
//! itself. [`FieldKind::Any`] marks an opaque subtree with no recoverable
//! identity.

use std::fmt;

use serde_json::Value;

use crate::tag::CategoryId;

/// Identifier for one concrete record shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeId(pub String);

impl ShapeId {
    /// Construct a shape id from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Access the shape name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ShapeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Declared kind of one field in a shape's field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// A plain scalar (string, number, boolean). Tag fields are scalars.
    Scalar,
    /// A nested record with a known shape identity.
    Shape(ShapeId),
    /// A discriminated member of the given category. The concrete
    /// identity is recovered from the value's own tag field, so lists
    /// declared with this kind may hold differently-tagged elements.
    Tagged(CategoryId),
    /// A sequence of values of one inner kind. Transparent to traversal.
    List(Box<FieldKind>),
    /// A possibly-absent value of one inner kind. Transparent to traversal.
    Optional(Box<FieldKind>),
    /// A string-keyed map of values of one inner kind. Transparent to traversal.
    Map(Box<FieldKind>),
    /// An opaque subtree with no recoverable identity.
    Any,
}

impl FieldKind {
    /// Shorthand for a list of the given inner kind.
    pub fn list(inner: FieldKind) -> Self {
        Self::List(Box::new(inner))
    }

    /// Shorthand for an optional value of the given inner kind.
    pub fn optional(inner: FieldKind) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Shorthand for a map of values of the given inner kind.
    pub fn map(inner: FieldKind) -> Self {
        Self::Map(Box::new(inner))
    }

    /// Shorthand for a nested shape field.
    pub fn shape(id: impl Into<ShapeId>) -> Self {
        Self::Shape(id.into())
    }

    /// Shorthand for a discriminated member of a category.
    pub fn tagged(category: impl Into<CategoryId>) -> Self {
        Self::Tagged(category.into())
    }

    /// Whether a field of this kind can carry a scalar tag value.
    pub fn hosts_scalar(&self) -> bool {
        matches!(self, FieldKind::Scalar | FieldKind::Any)
    }
}

/// One declared field: name, kind, and an optional default value.
///
/// Defaults exist so the registry can synthesize a tag field whose value
/// is filled in when a payload omits it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name as it appears in serialized trees.
    pub name: String,
    /// Declared kind.
    pub kind: FieldKind,
    /// Default value injected when the field is absent.
    pub default: Option<Value>,
}

impl FieldSpec {
    /// A field with no default.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }
}

/// Metadata for one concrete record shape: identity, declared field set,
/// and an optional JSON Schema for structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    id: ShapeId,
    fields: Vec<FieldSpec>,
    schema: Option<Value>,
}

impl ShapeDescriptor {
    /// Start a descriptor for the named shape with an empty field set.
    pub fn new(id: impl Into<ShapeId>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
            schema: None,
        }
    }

    /// Declare a field. Builder-style; later declarations of the same
    /// name replace earlier ones.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        self.fields.retain(|f| f.name != name);
        self.fields.push(FieldSpec::new(name, kind));
        self
    }

    /// Declare a field with a default value.
    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        default: Value,
    ) -> Self {
        let name = name.into();
        self.fields.retain(|f| f.name != name);
        self.fields.push(FieldSpec {
            name,
            kind,
            default: Some(default),
        });
        self
    }

    /// Attach a JSON Schema for the structural validator to compile.
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// The shape's identity.
    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    /// The declared field set, in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up one declared field by name.
    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The attached JSON Schema, if any.
    pub fn json_schema(&self) -> Option<&Value> {
        self.schema.as_ref()
    }

    /// Append a field spec in place. Used by the registry when it
    /// synthesizes a tag field during registration.
    pub fn push_field(&mut self, spec: FieldSpec) {
        self.fields.retain(|f| f.name != spec.name);
        self.fields.push(spec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_declares_fields_in_order() {
        let desc = ShapeDescriptor::new("circle")
            .field("radius", FieldKind::Scalar)
            .field("label", FieldKind::optional(FieldKind::Scalar));
        assert_eq!(desc.id().as_str(), "circle");
        assert_eq!(desc.fields().len(), 2);
        assert_eq!(desc.fields()[0].name, "radius");
        assert_eq!(desc.fields()[1].name, "label");
    }

    #[test]
    fn test_redeclaring_a_field_replaces_it() {
        let desc = ShapeDescriptor::new("circle")
            .field("radius", FieldKind::Scalar)
            .field("radius", FieldKind::Any);
        assert_eq!(desc.fields().len(), 1);
        assert_eq!(desc.fields()[0].kind, FieldKind::Any);
    }

    #[test]
    fn test_field_spec_lookup() {
        let desc = ShapeDescriptor::new("drawing")
            .field("members", FieldKind::list(FieldKind::shape("circle")));
        let spec = desc.field_spec("members").unwrap();
        assert_eq!(spec.kind, FieldKind::list(FieldKind::shape("circle")));
        assert!(desc.field_spec("missing").is_none());
    }

    #[test]
    fn test_push_field_replaces_by_name() {
        let mut desc = ShapeDescriptor::new("circle").field("radius", FieldKind::Scalar);
        desc.push_field(FieldSpec {
            name: "radius".to_string(),
            kind: FieldKind::Scalar,
            default: Some(json!(1)),
        });
        assert_eq!(desc.fields().len(), 1);
        assert_eq!(desc.field_spec("radius").unwrap().default, Some(json!(1)));
    }

    #[test]
    fn test_hosts_scalar() {
        assert!(FieldKind::Scalar.hosts_scalar());
        assert!(FieldKind::Any.hosts_scalar());
        assert!(!FieldKind::shape("circle").hosts_scalar());
        assert!(!FieldKind::list(FieldKind::Scalar).hosts_scalar());
    }

    #[test]
    fn test_descriptor_equality_for_redeclaration_checks() {
        let a = ShapeDescriptor::new("circle")
            .field("radius", FieldKind::Scalar)
            .schema(json!({"type": "object"}));
        let b = ShapeDescriptor::new("circle")
            .field("radius", FieldKind::Scalar)
            .schema(json!({"type": "object"}));
        assert_eq!(a, b);
    }
}
