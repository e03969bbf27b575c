//! # discrim-schema — JSON Schema Structural Validation
//!
//! Implements the [`StructureValidator`] capability with the
//! `jsonschema` crate (Draft 2020-12). Each shape that declares a schema
//! gets one compiled validator; shapes without a schema pass trivially,
//! which keeps schema adoption incremental.
//!
//! Documents that fail validation are rejected with structured error
//! information: the instance path of the violating field, the schema
//! path that triggered it, and a message.
//!
//! ## Thread Safety
//!
//! `SchemaValidator` is `Send + Sync`. Compilation happens once at
//! construction; validation shares the compiled validators across
//! threads without further locking.

use std::collections::HashMap;

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use discrim_core::{ShapeId, StructureError, StructureValidator, Violation};
use discrim_registry::DiscriminatorRegistry;

/// Error while compiling shape schemas.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema attached to a shape is not a valid JSON Schema.
    #[error("cannot compile schema for shape '{shape}': {reason}")]
    Build {
        /// The shape whose schema failed to compile.
        shape: ShapeId,
        /// The compiler's report.
        reason: String,
    },
}

/// A structural validator backed by per-shape JSON Schemas.
#[derive(Default)]
pub struct SchemaValidator {
    validators: HashMap<ShapeId, Validator>,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("shapes", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SchemaValidator {
    /// A validator with no schemas; every shape passes until schemas are
    /// inserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a validator for every declared shape that carries a
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Build`] for the first shape whose schema
    /// does not compile.
    pub fn from_registry(registry: &DiscriminatorRegistry) -> Result<Self, SchemaError> {
        let mut validator = Self::new();
        for descriptor in registry.shapes() {
            if let Some(schema) = descriptor.json_schema() {
                validator.insert_schema(descriptor.id().clone(), schema)?;
            }
        }
        Ok(validator)
    }

    /// Compile and store the schema for one shape, replacing any
    /// previous one.
    pub fn insert_schema(&mut self, shape: ShapeId, schema: &Value) -> Result<(), SchemaError> {
        let mut options = jsonschema::options();
        options.with_draft(jsonschema::Draft::Draft202012);
        let compiled = options.build(schema).map_err(|e| SchemaError::Build {
            shape: shape.clone(),
            reason: e.to_string(),
        })?;
        self.validators.insert(shape, compiled);
        Ok(())
    }

    /// Whether a compiled schema exists for this shape.
    pub fn has_schema(&self, shape: &ShapeId) -> bool {
        self.validators.contains_key(shape)
    }

    /// Number of compiled schemas.
    pub fn schema_count(&self) -> usize {
        self.validators.len()
    }
}

impl StructureValidator for SchemaValidator {
    fn validate(&self, shape: &ShapeId, payload: &Value) -> Result<(), StructureError> {
        let Some(validator) = self.validators.get(shape) else {
            return Ok(());
        };

        let violations: Vec<Violation> = validator
            .iter_errors(payload)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(StructureError {
                shape: shape.clone(),
                violations,
            })
        }
    }
}
