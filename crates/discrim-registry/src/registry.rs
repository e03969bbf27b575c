//! # Discriminator Registry
//!
//! Process-wide table from [`TagKey`] to [`TagBinding`], with a reverse
//! index from [`ShapeId`] to its key. Shape declaration and tag binding
//! are two explicit steps: `declare` records a shape's field set,
//! `register` binds a declared shape to a key and augments the stored
//! field set with the tag field.
//!
//! ## Invariants
//!
//! - At most one binding per tag key.
//! - At most one key per shape, for the shape's lifetime.
//! - A failed registration leaves the registry exactly as it was.
//!
//! Registration is expected during a single-threaded startup phase;
//! lookups are safe under concurrent traffic once registration has
//! quiesced.

use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;
use thiserror::Error;

use discrim_core::{
    CategoryId, FieldKind, FieldSpec, PolicyOverride, ShapeDescriptor, ShapeId, TagBinding,
    TagCategory, TagKey, TagValue,
};

/// Error during shape declaration or tag binding. Load-time and fatal:
/// callers should abort startup rather than continue with a partial
/// registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistrationError {
    /// A different descriptor is already declared under this shape id.
    #[error("shape '{0}' is already declared with a different field set")]
    DuplicateShape(ShapeId),

    /// The shape was never declared.
    #[error("shape '{0}' is not declared")]
    UnknownShape(ShapeId),

    /// The key is already bound to a different shape.
    #[error("tag {key} is already bound to shape '{existing}'")]
    DuplicateTag {
        /// The contested key.
        key: TagKey,
        /// The shape that holds the binding.
        existing: ShapeId,
    },

    /// The shape is already bound to a different key.
    #[error("shape '{shape}' is already bound to tag {existing}")]
    AlreadyBound {
        /// The shape being re-bound.
        shape: ShapeId,
        /// Its existing key.
        existing: TagKey,
    },

    /// The shape declares the tag field in a way that cannot carry the
    /// tag value, and the registry cannot synthesize it.
    #[error("shape '{shape}' cannot host tag field '{field}': {reason}")]
    MissingField {
        /// The shape that cannot host the field.
        shape: ShapeId,
        /// The tag field name.
        field: String,
        /// Why the field cannot be synthesized.
        reason: String,
    },

    /// The binding parameters themselves are unusable.
    #[error("invalid binding: {0}")]
    InvalidBinding(String),
}

#[derive(Debug, Default)]
struct RegistryInner {
    shapes: HashMap<ShapeId, ShapeDescriptor>,
    bindings: HashMap<TagKey, TagBinding>,
    by_shape: HashMap<ShapeId, TagKey>,
}

/// The discriminator registry.
///
/// The stack-wide instance lives behind [`DiscriminatorRegistry::global`],
/// initialized on first use. Tests construct their own registries with
/// [`DiscriminatorRegistry::new`] to avoid coupling through process
/// state.
#[derive(Debug, Default)]
pub struct DiscriminatorRegistry {
    inner: RwLock<RegistryInner>,
}

impl DiscriminatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static DiscriminatorRegistry {
        static REGISTRY: OnceLock<DiscriminatorRegistry> = OnceLock::new();
        REGISTRY.get_or_init(DiscriminatorRegistry::new)
    }

    /// Declare a shape's field set (and optional schema).
    ///
    /// Re-declaring an identical descriptor is a no-op, so module load
    /// order cannot turn a benign re-import into a failure. Declaring a
    /// different descriptor under an existing id is an error.
    pub fn declare(&self, descriptor: ShapeDescriptor) -> Result<(), RegistrationError> {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.shapes.get(descriptor.id()) {
            if existing == &descriptor {
                return Ok(());
            }
            return Err(RegistrationError::DuplicateShape(descriptor.id().clone()));
        }
        tracing::debug!(shape = %descriptor.id(), "declared shape");
        inner.shapes.insert(descriptor.id().clone(), descriptor);
        Ok(())
    }

    /// Bind a declared shape to a tag key.
    ///
    /// On success the stored field set gains `tag_field` as a scalar
    /// defaulting to `value` (if not already declared), and the created
    /// binding is returned. Re-registering the exact same binding is a
    /// silent no-op; any conflicting registration under the same key or
    /// shape is an error, and the registry is left untouched.
    pub fn register(
        &self,
        category: impl Into<CategoryId>,
        value: impl Into<TagValue>,
        shape: impl Into<ShapeId>,
        tag_field: impl Into<String>,
        policy: Option<PolicyOverride>,
    ) -> Result<TagBinding, RegistrationError> {
        let category = category.into();
        let shape = shape.into();
        let tag_field = tag_field.into();
        let key = TagKey {
            category,
            value: value.into(),
        };

        if key.category.as_str().is_empty() {
            return Err(RegistrationError::InvalidBinding(
                "category name is empty".to_string(),
            ));
        }
        if tag_field.is_empty() {
            return Err(RegistrationError::InvalidBinding(
                "tag field name is empty".to_string(),
            ));
        }

        let candidate = TagBinding {
            shape: shape.clone(),
            tag_field: tag_field.clone(),
            tag_value: key.value.clone(),
            policy,
        };

        let mut inner = self.inner.write();

        let descriptor = inner
            .shapes
            .get(&shape)
            .ok_or_else(|| RegistrationError::UnknownShape(shape.clone()))?;

        if let Some(existing) = inner.bindings.get(&key) {
            if existing == &candidate {
                return Ok(existing.clone());
            }
            return Err(RegistrationError::DuplicateTag {
                key,
                existing: existing.shape.clone(),
            });
        }
        if let Some(existing) = inner.by_shape.get(&shape) {
            return Err(RegistrationError::AlreadyBound {
                shape,
                existing: existing.clone(),
            });
        }

        // The declared field set must be able to carry the tag value.
        let synthesized = match descriptor.field_spec(&tag_field) {
            None => true,
            Some(spec) => {
                if !spec.kind.hosts_scalar() {
                    return Err(RegistrationError::MissingField {
                        shape,
                        field: tag_field,
                        reason: format!("field is declared as {:?}, not a scalar", spec.kind),
                    });
                }
                match &spec.default {
                    Some(default) if default != &key.value.to_json() => {
                        return Err(RegistrationError::MissingField {
                            shape,
                            field: tag_field,
                            reason: format!(
                                "declared default {default} conflicts with tag value {}",
                                key.value
                            ),
                        });
                    }
                    Some(_) => false,
                    None => true,
                }
            }
        };

        // All checks passed; apply every mutation under the same lock.
        if synthesized {
            if let Some(descriptor) = inner.shapes.get_mut(&shape) {
                descriptor.push_field(FieldSpec {
                    name: tag_field.clone(),
                    kind: FieldKind::Scalar,
                    default: Some(key.value.to_json()),
                });
            }
        }
        inner.by_shape.insert(shape.clone(), key.clone());
        inner.bindings.insert(key.clone(), candidate.clone());
        tracing::debug!(%key, %shape, "registered discriminated shape");
        Ok(candidate)
    }

    /// Bind a shape to an enumerated category variant. The category name
    /// doubles as the tag field name.
    pub fn register_variant<C: TagCategory>(
        &self,
        variant: &C,
        shape: impl Into<ShapeId>,
        policy: Option<PolicyOverride>,
    ) -> Result<TagBinding, RegistrationError> {
        let category = C::category();
        let field = category.as_str().to_string();
        self.register(category, variant.tag_value(), shape, field, policy)
    }

    /// Look up the binding for a tag key.
    pub fn resolve(&self, category: &CategoryId, value: &TagValue) -> Option<TagBinding> {
        let key = TagKey {
            category: category.clone(),
            value: value.clone(),
        };
        self.inner.read().bindings.get(&key).cloned()
    }

    /// Reverse lookup: the key and binding for a shape. Serialization
    /// walks trees shape-first, so this is the engine's entry point.
    pub fn describe(&self, shape: &ShapeId) -> Option<(TagKey, TagBinding)> {
        let inner = self.inner.read();
        let key = inner.by_shape.get(shape)?;
        let binding = inner.bindings.get(key)?;
        Some((key.clone(), binding.clone()))
    }

    /// The declared (and possibly augmented) descriptor for a shape.
    pub fn shape(&self, shape: &ShapeId) -> Option<ShapeDescriptor> {
        self.inner.read().shapes.get(shape).cloned()
    }

    /// All declared shapes, in unspecified order.
    pub fn shapes(&self) -> Vec<ShapeDescriptor> {
        self.inner.read().shapes.values().cloned().collect()
    }

    /// Every binding in one category, sorted by tag value rendering for
    /// deterministic iteration.
    pub fn category_members(&self, category: &CategoryId) -> Vec<TagBinding> {
        let inner = self.inner.read();
        let mut members: Vec<TagBinding> = inner
            .bindings
            .iter()
            .filter(|(key, _)| &key.category == category)
            .map(|(_, binding)| binding.clone())
            .collect();
        members.sort_by_key(|b| b.tag_value.to_string());
        members
    }

    /// Number of bindings across all categories.
    pub fn binding_count(&self) -> usize {
        self.inner.read().bindings.len()
    }
}
