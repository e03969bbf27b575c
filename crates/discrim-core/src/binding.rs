//! # Tag Bindings
//!
//! A binding records how one shape participates in discrimination: the
//! field its tag lives in, the value that selects it, and any
//! shape-level serialization overrides. Bindings are created once at
//! registration and never mutated; the registry clones them out to
//! callers.

use crate::policy::PolicyOverride;
use crate::shape::ShapeId;
use crate::tag::TagValue;

/// Discrimination metadata bound to one concrete shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TagBinding {
    /// The shape this binding belongs to.
    pub shape: ShapeId,
    /// Name of the field carrying the discriminator in serialized trees.
    pub tag_field: String,
    /// The discriminator value that selects this shape.
    pub tag_value: TagValue,
    /// Shape-level serialization overrides, consulted between the
    /// call-site override and the global policy.
    pub policy: Option<PolicyOverride>,
}

impl TagBinding {
    /// Construct a binding with no shape-level overrides.
    pub fn new(
        shape: impl Into<ShapeId>,
        tag_field: impl Into<String>,
        tag_value: impl Into<TagValue>,
    ) -> Self {
        Self {
            shape: shape.into(),
            tag_field: tag_field.into(),
            tag_value: tag_value.into(),
            policy: None,
        }
    }

    /// Attach shape-level serialization overrides.
    pub fn with_policy(mut self, policy: PolicyOverride) -> Self {
        self.policy = Some(policy);
        self
    }
}
