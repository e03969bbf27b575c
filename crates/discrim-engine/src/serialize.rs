//! # Serialization Entry Points
//!
//! Three ways a tree leaves the system:
//!
//! - [`serialize_with_policy`] is the explicit path: the caller asked
//!   for tag handling, so the injector always runs.
//! - [`serialize_tree`] is the generic path used by ordinary container
//!   serialization: it runs the injector only while the interception
//!   switch is on.
//! - [`DiscriminatorAware`] is the compose-time opt-in: a container
//!   implementing it gets injection from [`DiscriminatorAware::tagged_tree`]
//!   regardless of the switch, which is how callers keep tag handling
//!   after turning interception off.
//!
//! Flipping the switch affects future calls only; trees already produced
//! are never revisited.

use serde_json::Value;

use discrim_core::{Instance, PolicyOverride, PolicyStore, ShapeId};
use discrim_registry::DiscriminatorRegistry;

use crate::inject::TagInjector;

/// Serialize an instance with tag handling, resolving the policy from
/// the call override, the shape-level override, and the global snapshot.
pub fn serialize_with_policy(
    registry: &DiscriminatorRegistry,
    instance: &Instance,
    call: Option<PolicyOverride>,
) -> Value {
    let mut tree = instance.to_value();
    TagInjector::new(registry, call).apply(&mut tree, instance.shape());
    tree
}

/// Serialize an instance the way ordinary containers do.
///
/// While interception is enabled (the default) this is equivalent to
/// [`serialize_with_policy`] with no call override; while disabled it
/// returns the plain pre-injection tree.
pub fn serialize_tree(registry: &DiscriminatorRegistry, instance: &Instance) -> Value {
    if PolicyStore::global().interception_enabled() {
        serialize_with_policy(registry, instance, None)
    } else {
        tracing::trace!(shape = %instance.shape(), "interception off, emitting plain tree");
        instance.to_value()
    }
}

/// Serialize an instance to a JSON string with tag handling.
pub fn to_json_string(
    registry: &DiscriminatorRegistry,
    instance: &Instance,
    call: Option<PolicyOverride>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&serialize_with_policy(registry, instance, call))
}

/// Pretty-printed variant of [`to_json_string`].
pub fn to_json_string_pretty(
    registry: &DiscriminatorRegistry,
    instance: &Instance,
    call: Option<PolicyOverride>,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serialize_with_policy(registry, instance, call))
}

/// Compose-time capability for containers that always want tag handling.
///
/// Implementors expose their identity and their pre-injection tree; the
/// default [`tagged_tree`](DiscriminatorAware::tagged_tree) runs the
/// injector unconditionally, so the interception switch does not apply.
pub trait DiscriminatorAware {
    /// The shape this container serializes as.
    fn shape_id(&self) -> &ShapeId;

    /// The pre-injection tree, as the structural serializer produced it.
    fn raw_tree(&self) -> Value;

    /// The tree with tag-related fields applied per the current policy.
    fn tagged_tree(&self, registry: &DiscriminatorRegistry) -> Value {
        let mut tree = self.raw_tree();
        TagInjector::new(registry, None).apply(&mut tree, self.shape_id());
        tree
    }
}

impl DiscriminatorAware for Instance {
    fn shape_id(&self) -> &ShapeId {
        self.shape()
    }

    fn raw_tree(&self) -> Value {
        self.to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discrim_core::{FieldKind, ShapeDescriptor, TagBinding};
    use serde_json::json;

    fn circle_registry() -> DiscriminatorRegistry {
        let registry = DiscriminatorRegistry::new();
        registry
            .declare(ShapeDescriptor::new("circle").field("radius", FieldKind::Scalar))
            .unwrap();
        registry
            .register("shape_type", "circle", "circle", "shape_type", None)
            .unwrap();
        registry
    }

    fn circle_instance(registry: &DiscriminatorRegistry) -> Instance {
        let (_, binding) = registry.describe(&ShapeId::new("circle")).unwrap();
        let Value::Object(fields) = json!({"radius": 2}) else {
            unreachable!()
        };
        Instance::with_binding(&binding, fields)
    }

    #[test]
    fn test_serialize_with_policy_injects() {
        let registry = circle_registry();
        let instance = circle_instance(&registry);
        let tree = serialize_with_policy(&registry, &instance, None);
        assert_eq!(tree["shape_type"], json!("circle"));
        assert_eq!(tree["discriminator_value"], json!("circle"));
    }

    #[test]
    fn test_call_override_strips_the_domain_field() {
        let registry = circle_registry();
        let instance = circle_instance(&registry);
        let call = PolicyOverride::new()
            .emit_domain_field(false)
            .use_standard_fields(false);
        let tree = serialize_with_policy(&registry, &instance, Some(call));
        assert_eq!(tree, json!({"radius": 2}));
    }

    #[test]
    fn test_to_json_string_round_trips() {
        let registry = circle_registry();
        let instance = circle_instance(&registry);
        let text = to_json_string(&registry, &instance, None).unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["shape_type"], json!("circle"));
    }

    #[test]
    fn test_discriminator_aware_instance() {
        let registry = circle_registry();
        let instance = circle_instance(&registry);
        let tree = instance.tagged_tree(&registry);
        assert_eq!(tree["shape_type"], json!("circle"));
    }

    #[test]
    fn test_discriminator_aware_custom_container() {
        struct Envelope {
            shape: ShapeId,
            body: Value,
        }

        impl DiscriminatorAware for Envelope {
            fn shape_id(&self) -> &ShapeId {
                &self.shape
            }

            fn raw_tree(&self) -> Value {
                self.body.clone()
            }
        }

        let registry = circle_registry();
        let envelope = Envelope {
            shape: ShapeId::new("circle"),
            body: json!({"radius": 9}),
        };
        let tree = envelope.tagged_tree(&registry);
        assert_eq!(tree["shape_type"], json!("circle"));
        assert_eq!(tree["radius"], json!(9));
    }

    #[test]
    fn test_unbound_instance_serializes_plain() {
        let registry = circle_registry();
        registry
            .declare(ShapeDescriptor::new("note").field("text", FieldKind::Scalar))
            .unwrap();
        let Value::Object(fields) = json!({"text": "hi"}) else {
            unreachable!()
        };
        let instance = Instance::new("note", fields);
        let tree = serialize_with_policy(&registry, &instance, None);
        assert_eq!(tree, json!({"text": "hi"}));
    }

    #[test]
    fn test_binding_helper_behaves_like_registry_binding() {
        // TagBinding::new builds the same binding the registry returns,
        // which keeps fixture setup out of instance tests elsewhere.
        let registry = circle_registry();
        let (_, from_registry) = registry.describe(&ShapeId::new("circle")).unwrap();
        let by_hand = TagBinding::new("circle", "shape_type", "circle");
        assert_eq!(from_registry, by_hand);
    }
}
