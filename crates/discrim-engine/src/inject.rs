//! # Tag Injection
//!
//! The injector rewrites an already-serialized tree so that tag-related
//! fields are present or absent per the effective policy. It is applied
//! to every node reachable from the root: a plain container may hold
//! discriminated members at any depth, so traversal does not stop at
//! unbound shapes.
//!
//! Traversal is guided by declared field sets. A field declared as a
//! nested shape hands its child the corresponding identity; list,
//! optional, and map wrappers are transparent (the engine recurses into
//! elements and contained values without adding fields at the wrapper
//! level); scalar and opaque fields terminate.
//!
//! Applying the injector twice with the same effective policy yields the
//! same tree as applying it once.

use serde_json::Value;

use discrim_core::{CategoryId, FieldKind, PolicyOverride, PolicyStore, ShapeId, TagPolicy};
use discrim_registry::DiscriminatorRegistry;

/// A tree transformer bound to one registry, one policy snapshot, and
/// one optional call-site override.
///
/// Construct one per serialization call; the global snapshot is taken
/// once, in the constructor.
#[derive(Debug)]
pub struct TagInjector<'a> {
    registry: &'a DiscriminatorRegistry,
    global: TagPolicy,
    call: Option<PolicyOverride>,
}

impl<'a> TagInjector<'a> {
    /// An injector resolving against the process-wide policy.
    pub fn new(registry: &'a DiscriminatorRegistry, call: Option<PolicyOverride>) -> Self {
        Self::with_policy(registry, PolicyStore::global().get(), call)
    }

    /// An injector resolving against an explicit policy snapshot.
    pub fn with_policy(
        registry: &'a DiscriminatorRegistry,
        global: TagPolicy,
        call: Option<PolicyOverride>,
    ) -> Self {
        Self {
            registry,
            global,
            call,
        }
    }

    /// Rewrite `tree` in place, treating it as an instance of `shape`.
    pub fn apply(&self, tree: &mut Value, shape: &ShapeId) {
        self.visit_shape(tree, shape);
    }

    fn visit_shape(&self, node: &mut Value, shape: &ShapeId) {
        let Value::Object(fields) = node else {
            return;
        };

        if let Some((key, binding)) = self.registry.describe(shape) {
            let policy =
                TagPolicy::effective(&self.global, binding.policy.as_ref(), self.call.as_ref());

            if policy.emit_domain_field {
                fields.insert(binding.tag_field.clone(), binding.tag_value.to_json());
            } else {
                fields.remove(&binding.tag_field);
            }

            if policy.use_standard_fields {
                fields.insert(
                    policy.standard_category_field.clone(),
                    Value::String(key.category.to_string()),
                );
                fields.insert(
                    policy.standard_value_field.clone(),
                    binding.tag_value.to_json(),
                );
            } else {
                fields.remove(&policy.standard_category_field);
                fields.remove(&policy.standard_value_field);
            }
        }

        // Children are walked whether or not this shape is bound.
        if let Some(descriptor) = self.registry.shape(shape) {
            for spec in descriptor.fields() {
                if let Some(child) = fields.get_mut(&spec.name) {
                    self.visit_kind(child, &spec.kind);
                }
            }
        }
    }

    fn visit_kind(&self, value: &mut Value, kind: &FieldKind) {
        match kind {
            FieldKind::Scalar | FieldKind::Any => {}
            FieldKind::Shape(shape) => self.visit_shape(value, shape),
            FieldKind::Tagged(category) => {
                if let Some(shape) = self.resolve_tagged(category, value) {
                    self.visit_shape(value, &shape);
                }
            }
            FieldKind::List(inner) => {
                if let Value::Array(items) = value {
                    for item in items {
                        self.visit_kind(item, inner);
                    }
                }
            }
            FieldKind::Optional(inner) => {
                if !value.is_null() {
                    self.visit_kind(value, inner);
                }
            }
            FieldKind::Map(inner) => {
                if let Value::Object(entries) = value {
                    for (_, entry) in entries.iter_mut() {
                        self.visit_kind(entry, inner);
                    }
                }
            }
        }
    }

    /// Recover the identity of a discriminated member from its own tag
    /// field. Instances of bound shapes always carry their tag, so a
    /// member produced by dispatch or instance construction resolves
    /// here; anything else is left alone.
    fn resolve_tagged(&self, category: &CategoryId, value: &Value) -> Option<ShapeId> {
        let fields = value.as_object()?;
        for binding in self.registry.category_members(category) {
            let expected = binding.tag_value.to_json();
            if fields.get(&binding.tag_field) == Some(&expected) {
                return Some(binding.shape);
            }
        }
        None
    }
}
