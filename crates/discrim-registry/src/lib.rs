//! # discrim-registry — Discriminator Registry and Dispatch
//!
//! The registry is the process-wide table mapping tag keys to shape
//! bindings, plus the reverse index from shape to key that serialization
//! needs. Registration populates it during startup; dispatch and the
//! injection engine read it under concurrent traffic.
//!
//! - **Registry** (`registry.rs`): shape declaration, tag binding with
//!   field-set augmentation, forward and reverse lookup.
//!
//! - **Dispatch** (`dispatch.rs`): resolution of raw payloads to
//!   validated [`Instance`]s through the registry and a structural
//!   validator, including closed unions of candidate shapes.
//!
//! ## Thread Safety
//!
//! All registry state sits behind a single `parking_lot::RwLock`.
//! Registration takes the write lock and applies all of its mutations
//! only after every check has passed, so a failed registration leaves no
//! partial state. Lookups clone data out under the read lock and never
//! hold it across calls into other components.
//!
//! ## Crate Policy
//!
//! - Load-time failures (duplicate tags, unhostable tag fields) are hard
//!   errors; callers are expected to abort startup on them.
//! - Per-call failures (missing or unknown discriminators, validation)
//!   are returned, never panicked, so batch callers continue past a bad
//!   record.

pub mod dispatch;
pub mod registry;

pub use dispatch::{
    resolve_and_validate, resolve_and_validate_with, validate_as, DispatchError, DispatchTarget,
    Dispatched, ShapeUnion, UnionError,
};
pub use registry::{DiscriminatorRegistry, RegistrationError};

pub use discrim_core::Instance;
