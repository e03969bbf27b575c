//! # discrim-core — Foundational Types for the Discrim Stack
//!
//! This crate is the bedrock of the discrim workspace. It defines the
//! type-system primitives shared by the registry, the dispatch resolver,
//! and the tag-injection engine. Every other crate in the workspace
//! depends on `discrim-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `CategoryId` and
//!    `ShapeId` are distinct newtypes. You cannot pass a category name
//!    where a shape handle is expected.
//!
//! 2. **Scalar-only discriminators.** `TagValue` admits strings, integers,
//!    and booleans. Floats, nulls, and containers are rejected at the
//!    conversion boundary: they are not stable hash keys.
//!
//! 3. **Instances carry their identity.** An [`Instance`] pairs a JSON
//!    object tree with the [`ShapeId`] it was validated against, and every
//!    construction path asserts the tag-field invariant for bound shapes.
//!
//! 4. **Policy is resolved per call, never cached.** [`TagPolicy`] holds a
//!    fully resolved flag set; [`PolicyOverride`] is a partial record.
//!    [`TagPolicy::effective`] merges call, shape, and global layers with a
//!    fixed precedence, one field at a time.
//!
//! 5. **Validation is a capability, not an implementation.** The
//!    [`StructureValidator`] trait is the seam to whatever checks field
//!    types and constraints for one concrete shape. This crate ships only
//!    the permissive [`AcceptAll`]; the `discrim-schema` crate provides the
//!    JSON Schema implementation.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `discrim-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public data types derive `Debug` and `Clone`.

pub mod binding;
pub mod error;
pub mod instance;
pub mod policy;
pub mod shape;
pub mod tag;
pub mod validate;

// Re-export primary types for ergonomic imports.
pub use binding::TagBinding;
pub use error::{InstanceError, TagValueError};
pub use instance::Instance;
pub use policy::{
    disable_interception, enable_interception, global_policy, interception_enabled,
    set_global_policy, PolicyOverride, PolicyStore, TagPolicy,
};
pub use shape::{FieldKind, FieldSpec, ShapeDescriptor, ShapeId};
pub use tag::{CategoryId, TagCategory, TagKey, TagValue};
pub use validate::{AcceptAll, StructureError, StructureValidator, Violation};
