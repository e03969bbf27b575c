//! # Dispatch Resolution
//!
//! Given a raw payload and an expected target (one shape, or a closed
//! union of candidates), dispatch reads the discriminator out of the
//! payload, resolves it to a concrete shape through the registry, hands
//! structural validation to the external validator, and returns a
//! validated [`Instance`] carrying its tag.
//!
//! The whole path is a pure, synchronous decision function over data the
//! caller already holds: no retries, no I/O, no side effects beyond the
//! returned value.
//!
//! Union misconfiguration (candidates disagreeing on category) is caught
//! when the union is built, not when payloads arrive.

use thiserror::Error;

use serde_json::{Map, Value};

use discrim_core::{
    CategoryId, Instance, PolicyStore, ShapeId, StructureError, StructureValidator, TagBinding,
    TagKey, TagPolicy, TagValue,
};

use crate::registry::DiscriminatorRegistry;

/// Error while resolving a payload to a concrete shape. Per-call and
/// recoverable: returned to the caller so batch processing can continue
/// past a bad record.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The payload is not a JSON object, so there is nothing to read a
    /// discriminator from.
    #[error("payload is not a JSON object")]
    NotAMap,

    /// The payload carries no discriminator under the expected field.
    #[error("payload is missing discriminator field '{field}'")]
    MissingDiscriminator {
        /// The field name that was consulted.
        field: String,
    },

    /// The discriminator value resolves to no candidate shape.
    #[error("no shape registered for value '{value}' in category '{category}'")]
    UnknownDiscriminatorValue {
        /// The category that was searched.
        category: CategoryId,
        /// The offending value, rendered for diagnostics.
        value: String,
    },

    /// The payload's discriminator contradicts the shape it was
    /// validated as.
    #[error("payload is tagged '{got}' but shape '{shape}' expects '{expected}'")]
    TagMismatch {
        /// The shape the payload was validated as.
        shape: ShapeId,
        /// The shape's own tag value.
        expected: TagValue,
        /// What the payload carried, rendered for diagnostics.
        got: String,
    },

    /// The expected shape carries no discriminator binding.
    #[error("shape '{0}' has no discriminator binding")]
    UnregisteredShape(ShapeId),

    /// Structural validation failed; the error is annotated with the
    /// shape that was resolved.
    #[error("validation failed for shape '{shape}'")]
    Validation {
        /// The resolved shape.
        shape: ShapeId,
        /// The validator's structured report.
        #[source]
        source: StructureError,
    },
}

/// Error while building a [`ShapeUnion`]. Load-time: raised when the
/// union is constructed, never at parse time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnionError {
    /// A union needs at least one candidate.
    #[error("union has no candidate shapes")]
    Empty,

    /// A candidate has no discriminator binding.
    #[error("union candidate '{0}' has no discriminator binding")]
    Unregistered(ShapeId),

    /// Candidates disagree on the discrimination axis.
    #[error(
        "union candidates disagree on category: '{first_shape}' uses {first}, '{second_shape}' uses {second}"
    )]
    CategoryConflict {
        /// The first candidate, which sets the expectation.
        first_shape: ShapeId,
        /// Category and field of the first candidate.
        first: String,
        /// The conflicting candidate.
        second_shape: ShapeId,
        /// Category and field of the conflicting candidate.
        second: String,
    },
}

/// A closed set of candidate shapes sharing one discrimination axis.
///
/// Construction verifies the closure: every member must be bound, and
/// all members must agree on category and tag field.
#[derive(Debug, Clone)]
pub struct ShapeUnion {
    category: CategoryId,
    tag_field: String,
    members: Vec<ShapeId>,
}

impl ShapeUnion {
    /// Build a union over the given candidates.
    pub fn new(
        registry: &DiscriminatorRegistry,
        candidates: impl IntoIterator<Item = ShapeId>,
    ) -> Result<Self, UnionError> {
        let mut members = Vec::new();
        let mut axis: Option<(ShapeId, CategoryId, String)> = None;

        for shape in candidates {
            let (key, binding) = registry
                .describe(&shape)
                .ok_or_else(|| UnionError::Unregistered(shape.clone()))?;
            match &axis {
                None => axis = Some((shape.clone(), key.category, binding.tag_field)),
                Some((first_shape, category, tag_field)) => {
                    if &key.category != category || &binding.tag_field != tag_field {
                        return Err(UnionError::CategoryConflict {
                            first_shape: first_shape.clone(),
                            first: format!("{category}/{tag_field}"),
                            second_shape: shape,
                            second: format!("{}/{}", key.category, binding.tag_field),
                        });
                    }
                }
            }
            members.push(shape);
        }

        match axis {
            Some((_, category, tag_field)) => Ok(Self {
                category,
                tag_field,
                members,
            }),
            None => Err(UnionError::Empty),
        }
    }

    /// The shared discrimination axis.
    pub fn category(&self) -> &CategoryId {
        &self.category
    }

    /// The shared tag field name.
    pub fn tag_field(&self) -> &str {
        &self.tag_field
    }

    /// The candidate shapes.
    pub fn members(&self) -> &[ShapeId] {
        &self.members
    }

    fn contains(&self, shape: &ShapeId) -> bool {
        self.members.iter().any(|m| m == shape)
    }
}

/// What a payload is expected to be: one concrete shape, or any member
/// of a closed union.
#[derive(Debug, Clone)]
pub enum DispatchTarget {
    /// One concrete shape; its binding fixes the tag field and category.
    Shape(ShapeId),
    /// A closed candidate set sharing one axis.
    Union(ShapeUnion),
}

impl From<ShapeId> for DispatchTarget {
    fn from(shape: ShapeId) -> Self {
        Self::Shape(shape)
    }
}

impl From<ShapeUnion> for DispatchTarget {
    fn from(union: ShapeUnion) -> Self {
        Self::Union(union)
    }
}

/// The outcome of dispatch: which key matched, and the validated
/// instance.
#[derive(Debug, Clone)]
pub struct Dispatched {
    /// The tag key the payload resolved to.
    pub key: TagKey,
    /// The validated instance, tag field asserted.
    pub instance: Instance,
}

/// Resolve a payload against a target and validate it, reading the
/// process-wide policy for the standard-field fallback.
///
/// See [`resolve_and_validate_with`] for the policy-explicit variant.
pub fn resolve_and_validate(
    registry: &DiscriminatorRegistry,
    payload: &Value,
    target: &DispatchTarget,
    validator: &dyn StructureValidator,
) -> Result<Dispatched, DispatchError> {
    let policy = PolicyStore::global().get();
    resolve_and_validate_with(registry, &policy, payload, target, validator)
}

/// Resolve a payload against a target and validate it.
///
/// The policy snapshot governs only the standard-field fallback: when
/// the domain tag field is absent but the payload carries the standard
/// category/value pair for the expected category, the value is read from
/// there. The snapshot is taken once by the caller, so concurrent policy
/// mutation cannot tear this call.
///
/// # Errors
///
/// [`DispatchError::NotAMap`] for non-object payloads;
/// [`DispatchError::MissingDiscriminator`] when no tag can be read;
/// [`DispatchError::UnknownDiscriminatorValue`] when the value resolves
/// to no candidate (naming the value and category);
/// [`DispatchError::Validation`] when the external validator rejects the
/// payload, annotated with the resolved shape.
pub fn resolve_and_validate_with(
    registry: &DiscriminatorRegistry,
    policy: &TagPolicy,
    payload: &Value,
    target: &DispatchTarget,
    validator: &dyn StructureValidator,
) -> Result<Dispatched, DispatchError> {
    let fields = payload.as_object().ok_or(DispatchError::NotAMap)?;

    let (category, tag_field) = match target {
        DispatchTarget::Shape(shape) => {
            let (key, binding) = registry
                .describe(shape)
                .ok_or_else(|| DispatchError::UnregisteredShape(shape.clone()))?;
            (key.category, binding.tag_field)
        }
        DispatchTarget::Union(union) => {
            (union.category.clone(), union.tag_field.clone())
        }
    };

    let raw = read_discriminator(fields, &category, &tag_field, policy)
        .ok_or(DispatchError::MissingDiscriminator {
            field: tag_field.clone(),
        })?;

    let value = TagValue::try_from(raw).map_err(|_| DispatchError::UnknownDiscriminatorValue {
        category: category.clone(),
        value: render(raw),
    })?;

    let binding = registry.resolve(&category, &value).ok_or_else(|| {
        DispatchError::UnknownDiscriminatorValue {
            category: category.clone(),
            value: value.to_string(),
        }
    })?;

    if let DispatchTarget::Union(union) = target {
        if !union.contains(&binding.shape) {
            return Err(DispatchError::UnknownDiscriminatorValue {
                category,
                value: value.to_string(),
            });
        }
    }

    validate_against(&binding, fields.clone(), validator).map(|instance| Dispatched {
        key: TagKey { category, value },
        instance,
    })
}

/// Validate a payload as one specific shape.
///
/// The payload's own discriminator, when present, must agree with the
/// shape's binding; when absent it is filled in before validation, so a
/// schema that requires the tag field still passes.
pub fn validate_as(
    registry: &DiscriminatorRegistry,
    shape: &ShapeId,
    payload: &Value,
    validator: &dyn StructureValidator,
) -> Result<Instance, DispatchError> {
    let fields = payload.as_object().ok_or(DispatchError::NotAMap)?;
    let (_, binding) = registry
        .describe(shape)
        .ok_or_else(|| DispatchError::UnregisteredShape(shape.clone()))?;

    if let Some(raw) = fields.get(&binding.tag_field) {
        let matches = TagValue::try_from(raw)
            .map(|value| value == binding.tag_value)
            .unwrap_or(false);
        if !matches {
            return Err(DispatchError::TagMismatch {
                shape: shape.clone(),
                expected: binding.tag_value.clone(),
                got: render(raw),
            });
        }
    }

    validate_against(&binding, fields.clone(), validator)
}

/// Run the external validator over the tag-asserted payload and wrap the
/// result into an instance.
fn validate_against(
    binding: &TagBinding,
    mut fields: Map<String, Value>,
    validator: &dyn StructureValidator,
) -> Result<Instance, DispatchError> {
    fields.insert(binding.tag_field.clone(), binding.tag_value.to_json());
    let candidate = Value::Object(fields);
    validator
        .validate(&binding.shape, &candidate)
        .map_err(|source| DispatchError::Validation {
            shape: binding.shape.clone(),
            source,
        })?;
    let Value::Object(fields) = candidate else {
        return Err(DispatchError::NotAMap);
    };
    Ok(Instance::with_binding(binding, fields))
}

/// Read the discriminator for `category` out of a payload: the domain
/// tag field first, then the standard field pair when the policy has it
/// on and the recorded category matches.
fn read_discriminator<'a>(
    fields: &'a Map<String, Value>,
    category: &CategoryId,
    tag_field: &str,
    policy: &TagPolicy,
) -> Option<&'a Value> {
    if let Some(raw) = fields.get(tag_field) {
        return Some(raw);
    }
    if policy.use_standard_fields {
        let recorded = fields.get(&policy.standard_category_field)?.as_str()?;
        if recorded == category.as_str() {
            return fields.get(&policy.standard_value_field);
        }
    }
    None
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
