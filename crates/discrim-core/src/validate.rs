//! # Structural Validation Capability
//!
//! Checking field types and constraints for one concrete shape is the
//! job of an external collaborator, reached through the
//! [`StructureValidator`] trait. The dispatch resolver calls it after
//! tag resolution; implementations decide what "structurally valid"
//! means.
//!
//! The `discrim-schema` crate provides the JSON Schema implementation.
//! [`AcceptAll`] is the permissive fallback for callers whose shapes
//! carry no schemas, and for tests.

use std::fmt;

use thiserror::Error;

use serde_json::Value;

use crate::shape::ShapeId;

/// A single structural violation with its location in the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// Path within the schema (or rule set) that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// A payload failed structural validation against one shape.
#[derive(Error, Debug)]
#[error("payload does not match shape '{shape}':\n{}", format_violations(.violations))]
pub struct StructureError {
    /// The shape the payload was validated against.
    pub shape: ShapeId,
    /// Individual violations, in validator order.
    pub violations: Vec<Violation>,
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Capability: validate a raw payload against one concrete shape.
///
/// Implementations must be shareable across threads; dispatch runs under
/// concurrent traffic once registration has quiesced.
pub trait StructureValidator: Send + Sync {
    /// Check `payload` against the rules for `shape`.
    fn validate(&self, shape: &ShapeId, payload: &Value) -> Result<(), StructureError>;
}

/// The permissive validator: every payload passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl StructureValidator for AcceptAll {
    fn validate(&self, _shape: &ShapeId, _payload: &Value) -> Result<(), StructureError> {
        Ok(())
    }
}
