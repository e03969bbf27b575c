//! End-to-end flow: declare shapes with schemas, bind them, dispatch raw
//! payloads through the union, and serialize the results back out with
//! tag handling.

use serde::{Deserialize, Serialize};
use serde_json::json;

use discrim_core::{FieldKind, PolicyOverride, ShapeDescriptor, ShapeId, TagPolicy};
use discrim_engine::{serialize_with_policy, TagInjector};
use discrim_registry::{
    resolve_and_validate_with, DiscriminatorRegistry, DispatchError, DispatchTarget, ShapeUnion,
};
use discrim_schema::SchemaValidator;

fn build_registry() -> DiscriminatorRegistry {
    let registry = DiscriminatorRegistry::new();
    registry
        .declare(
            ShapeDescriptor::new("circle")
                .field("radius", FieldKind::Scalar)
                .schema(json!({
                    "type": "object",
                    "properties": {
                        "shape_type": {"const": "circle"},
                        "radius": {"type": "number", "exclusiveMinimum": 0}
                    },
                    "required": ["shape_type", "radius"]
                })),
        )
        .unwrap();
    registry
        .declare(
            ShapeDescriptor::new("rectangle")
                .field("width", FieldKind::Scalar)
                .field("height", FieldKind::Scalar)
                .schema(json!({
                    "type": "object",
                    "properties": {
                        "shape_type": {"const": "rectangle"},
                        "width": {"type": "number"},
                        "height": {"type": "number"}
                    },
                    "required": ["shape_type", "width", "height"]
                })),
        )
        .unwrap();
    registry
        .declare(
            ShapeDescriptor::new("drawing")
                .field("title", FieldKind::Scalar)
                .field("members", FieldKind::list(FieldKind::tagged("shape_type"))),
        )
        .unwrap();
    registry
        .register("shape_type", "circle", "circle", "shape_type", None)
        .unwrap();
    registry
        .register("shape_type", "rectangle", "rectangle", "shape_type", None)
        .unwrap();
    registry
}

fn shapes_target(registry: &DiscriminatorRegistry) -> DispatchTarget {
    DispatchTarget::Union(
        ShapeUnion::new(
            registry,
            [ShapeId::new("circle"), ShapeId::new("rectangle")],
        )
        .unwrap(),
    )
}

#[test]
fn test_dispatch_then_serialize_reproduces_the_tag() {
    let registry = build_registry();
    let validator = SchemaValidator::from_registry(&registry).unwrap();
    let policy = TagPolicy::default();
    let target = shapes_target(&registry);

    let payload = json!({"shape_type": "circle", "radius": 2});
    let dispatched =
        resolve_and_validate_with(&registry, &policy, &payload, &target, &validator).unwrap();

    let tree = serialize_with_policy(&registry, &dispatched.instance, None);
    assert_eq!(tree["shape_type"], json!("circle"));
    assert_eq!(tree["radius"], json!(2));
    assert_eq!(tree["discriminator_category"], json!("shape_type"));
    assert_eq!(tree["discriminator_value"], json!("circle"));
}

#[test]
fn test_schema_rejection_surfaces_through_dispatch() {
    let registry = build_registry();
    let validator = SchemaValidator::from_registry(&registry).unwrap();
    let policy = TagPolicy::default();
    let target = shapes_target(&registry);

    // Valid tag, invalid body: the radius violates the schema.
    let payload = json!({"shape_type": "circle", "radius": -1});
    let err = resolve_and_validate_with(&registry, &policy, &payload, &target, &validator)
        .unwrap_err();
    match err {
        DispatchError::Validation { shape, source } => {
            assert_eq!(shape, ShapeId::new("circle"));
            assert!(!source.violations.is_empty());
        }
        other => panic!("expected Validation, got {other}"),
    }
}

#[test]
fn test_unknown_tag_is_a_dispatch_error_not_a_validation_error() {
    let registry = build_registry();
    let validator = SchemaValidator::from_registry(&registry).unwrap();
    let policy = TagPolicy::default();
    let target = shapes_target(&registry);

    let payload = json!({"shape_type": "triangle", "sides": 3});
    let err = resolve_and_validate_with(&registry, &policy, &payload, &target, &validator)
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::UnknownDiscriminatorValue { ref value, .. } if value == "triangle"
    ));
}

#[test]
fn test_batch_processing_continues_past_bad_records() {
    let registry = build_registry();
    let validator = SchemaValidator::from_registry(&registry).unwrap();
    let policy = TagPolicy::default();
    let target = shapes_target(&registry);

    let batch = [
        json!({"shape_type": "circle", "radius": 1}),
        json!({"shape_type": "triangle"}),
        json!({"radius": 3}),
        json!({"shape_type": "rectangle", "width": 2, "height": 5}),
    ];
    let outcomes: Vec<_> = batch
        .iter()
        .map(|p| resolve_and_validate_with(&registry, &policy, p, &target, &validator))
        .collect();
    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_err());
    assert!(outcomes[2].is_err());
    assert!(outcomes[3].is_ok());
}

#[test]
fn test_drawing_with_mixed_members_serializes_each_tag() {
    let registry = build_registry();
    let validator = SchemaValidator::from_registry(&registry).unwrap();
    let policy = TagPolicy::default();
    let target = shapes_target(&registry);

    // Dispatch two differently-tagged members, then embed their trees in
    // a drawing and run the injector over the whole container.
    let circle = resolve_and_validate_with(
        &registry,
        &policy,
        &json!({"shape_type": "circle", "radius": 1}),
        &target,
        &validator,
    )
    .unwrap();
    let rectangle = resolve_and_validate_with(
        &registry,
        &policy,
        &json!({"shape_type": "rectangle", "width": 2, "height": 3}),
        &target,
        &validator,
    )
    .unwrap();

    let mut drawing = json!({
        "title": "mixed",
        "members": [circle.instance.to_value(), rectangle.instance.to_value()]
    });
    TagInjector::with_policy(&registry, policy, None)
        .apply(&mut drawing, &ShapeId::new("drawing"));

    let members = drawing["members"].as_array().unwrap();
    assert_eq!(members[0]["shape_type"], json!("circle"));
    assert_eq!(members[0]["discriminator_value"], json!("circle"));
    assert_eq!(members[1]["shape_type"], json!("rectangle"));
    assert_eq!(members[1]["discriminator_value"], json!("rectangle"));
    // Sibling tags do not bleed into each other or the container.
    assert!(drawing.get("shape_type").is_none());
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Circle {
    radius: i64,
}

#[test]
fn test_typed_values_enter_and_leave_through_serde() {
    let registry = build_registry();
    let (_, binding) = registry.describe(&ShapeId::new("circle")).unwrap();
    let instance =
        discrim_core::Instance::from_serialize("circle", Some(&binding), &Circle { radius: 4 })
            .unwrap();

    let tree = serialize_with_policy(&registry, &instance, None);
    assert_eq!(tree["shape_type"], json!("circle"));
    assert_eq!(tree["radius"], json!(4));

    let call = PolicyOverride::new()
        .emit_domain_field(false)
        .use_standard_fields(false);
    let plain = serialize_with_policy(&registry, &instance, Some(call));
    let decoded: Circle = serde_json::from_value(plain).unwrap();
    assert_eq!(decoded, Circle { radius: 4 });
}
