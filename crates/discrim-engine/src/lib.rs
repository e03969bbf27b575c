//! # discrim-engine — Tag Injection and Serialization
//!
//! The engine post-processes trees produced by the structural serializer
//! (serde), adding or removing tag-related fields per the resolved
//! policy, recursively through arbitrarily nested containers.
//!
//! - **Injector** (`inject.rs`): the recursive tree transformer. Walks a
//!   tree guided by the declared field sets in the registry, applying
//!   the effective policy at every node whose shape is bound.
//!
//! - **Serialization** (`serialize.rs`): the entry points application
//!   code calls. The explicit path always injects; the generic path
//!   consults the interception switch; the [`DiscriminatorAware`]
//!   capability opts a container in at compose time, switch or no
//!   switch.
//!
//! ## Policy Snapshot
//!
//! Each injector snapshots the global policy exactly once at
//! construction and resolves every node against that snapshot, so
//! concurrent policy mutation cannot tear a single serialization call.

pub mod inject;
pub mod serialize;

pub use inject::TagInjector;
pub use serialize::{
    serialize_tree, serialize_with_policy, to_json_string, to_json_string_pretty,
    DiscriminatorAware,
};
