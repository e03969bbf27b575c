//! # Serialization Policy
//!
//! The policy governs where tag-related fields appear in serialized
//! output: the shape's own tag field, and the pair of standard fields
//! that name the category and value uniformly across categories.
//!
//! Three layers feed one resolved [`TagPolicy`]: an explicit per-call
//! override, the shape-level override attached at registration, and the
//! process-wide default. Each of the four fields resolves independently,
//! call layer first, so a caller may flip `emit_domain_field` alone and
//! inherit everything else.
//!
//! ## Thread Safety
//!
//! [`PolicyStore`] guards the global default behind a
//! `parking_lot::RwLock`. Readers take one snapshot per serialization
//! call via [`PolicyStore::get`]; resolving field-by-field against live
//! state would admit torn reads under concurrent mutation. The
//! interception switch is a separate `AtomicBool` so flipping it never
//! contends with policy reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use parking_lot::RwLock;

/// Default name of the standard field carrying the category.
pub const STANDARD_CATEGORY_FIELD: &str = "discriminator_category";

/// Default name of the standard field carrying the tag value.
pub const STANDARD_VALUE_FIELD: &str = "discriminator_value";

/// A fully resolved set of serialization flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    /// Emit the shape's own tag field (`shape_type: "circle"`).
    pub emit_domain_field: bool,
    /// Emit the standard category/value field pair.
    pub use_standard_fields: bool,
    /// Name of the standard field carrying the category.
    pub standard_category_field: String,
    /// Name of the standard field carrying the tag value.
    pub standard_value_field: String,
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            emit_domain_field: true,
            use_standard_fields: true,
            standard_category_field: STANDARD_CATEGORY_FIELD.to_string(),
            standard_value_field: STANDARD_VALUE_FIELD.to_string(),
        }
    }
}

impl TagPolicy {
    /// Resolve the effective policy for one serialization call.
    ///
    /// Precedence per field: call override, then shape override, then the
    /// global snapshot. Total and deterministic; for any combination of
    /// set and unset fields exactly one value wins.
    pub fn effective(
        global: &TagPolicy,
        shape: Option<&PolicyOverride>,
        call: Option<&PolicyOverride>,
    ) -> TagPolicy {
        fn pick<T: Clone>(call: Option<&T>, shape: Option<&T>, global: &T) -> T {
            call.or(shape).unwrap_or(global).clone()
        }

        TagPolicy {
            emit_domain_field: pick(
                call.and_then(|o| o.emit_domain_field.as_ref()),
                shape.and_then(|o| o.emit_domain_field.as_ref()),
                &global.emit_domain_field,
            ),
            use_standard_fields: pick(
                call.and_then(|o| o.use_standard_fields.as_ref()),
                shape.and_then(|o| o.use_standard_fields.as_ref()),
                &global.use_standard_fields,
            ),
            standard_category_field: pick(
                call.and_then(|o| o.standard_category_field.as_ref()),
                shape.and_then(|o| o.standard_category_field.as_ref()),
                &global.standard_category_field,
            ),
            standard_value_field: pick(
                call.and_then(|o| o.standard_value_field.as_ref()),
                shape.and_then(|o| o.standard_value_field.as_ref()),
                &global.standard_value_field,
            ),
        }
    }
}

/// A partial policy: unset fields fall back to the next layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyOverride {
    /// Override for [`TagPolicy::emit_domain_field`].
    pub emit_domain_field: Option<bool>,
    /// Override for [`TagPolicy::use_standard_fields`].
    pub use_standard_fields: Option<bool>,
    /// Override for [`TagPolicy::standard_category_field`].
    pub standard_category_field: Option<String>,
    /// Override for [`TagPolicy::standard_value_field`].
    pub standard_value_field: Option<String>,
}

impl PolicyOverride {
    /// An override with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the domain-field flag.
    pub fn emit_domain_field(mut self, emit: bool) -> Self {
        self.emit_domain_field = Some(emit);
        self
    }

    /// Set the standard-fields flag.
    pub fn use_standard_fields(mut self, standard: bool) -> Self {
        self.use_standard_fields = Some(standard);
        self
    }

    /// Rename the standard category field.
    pub fn standard_category_field(mut self, name: impl Into<String>) -> Self {
        self.standard_category_field = Some(name.into());
        self
    }

    /// Rename the standard value field.
    pub fn standard_value_field(mut self, name: impl Into<String>) -> Self {
        self.standard_value_field = Some(name.into());
        self
    }

    /// Whether every field is unset.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Process-wide policy state: the global default and the interception
/// switch.
///
/// The stack-wide instance lives behind [`PolicyStore::global`],
/// initialized on first use. Tests construct their own stores to avoid
/// coupling through process state.
#[derive(Debug)]
pub struct PolicyStore {
    policy: RwLock<TagPolicy>,
    intercept: AtomicBool,
}

impl PolicyStore {
    /// A store holding the default policy, interception on.
    pub fn new() -> Self {
        Self {
            policy: RwLock::new(TagPolicy::default()),
            intercept: AtomicBool::new(true),
        }
    }

    /// The process-wide store.
    pub fn global() -> &'static PolicyStore {
        static STORE: OnceLock<PolicyStore> = OnceLock::new();
        STORE.get_or_init(PolicyStore::new)
    }

    /// Take a consistent snapshot of the current policy.
    ///
    /// One read under the lock; callers resolve against the snapshot for
    /// the remainder of their call.
    pub fn get(&self) -> TagPolicy {
        self.policy.read().clone()
    }

    /// Replace the policy wholesale.
    pub fn set(&self, policy: TagPolicy) {
        *self.policy.write() = policy;
    }

    /// Mutate the policy in place under the write lock.
    pub fn update(&self, f: impl FnOnce(&mut TagPolicy)) {
        f(&mut *self.policy.write());
    }

    /// Route ordinary container serialization through the injection
    /// engine. Idempotent; affects future calls only.
    pub fn enable_interception(&self) {
        self.intercept.store(true, Ordering::SeqCst);
    }

    /// Stop routing ordinary serialization through the engine; callers
    /// that still want injection use an explicitly discriminator-aware
    /// path. Idempotent; affects future calls only.
    pub fn disable_interception(&self) {
        self.intercept.store(false, Ordering::SeqCst);
    }

    /// Whether ordinary serialization currently runs the engine.
    pub fn interception_enabled(&self) -> bool {
        self.intercept.load(Ordering::SeqCst)
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot the process-wide policy. See [`PolicyStore::get`].
pub fn global_policy() -> TagPolicy {
    PolicyStore::global().get()
}

/// Replace the process-wide policy. See [`PolicyStore::set`].
pub fn set_global_policy(policy: TagPolicy) {
    PolicyStore::global().set(policy);
}

/// Turn the process-wide interception switch on. See
/// [`PolicyStore::enable_interception`].
pub fn enable_interception() {
    PolicyStore::global().enable_interception();
}

/// Turn the process-wide interception switch off. See
/// [`PolicyStore::disable_interception`].
pub fn disable_interception() {
    PolicyStore::global().disable_interception();
}

/// Whether the process-wide interception switch is on.
pub fn interception_enabled() -> bool {
    PolicyStore::global().interception_enabled()
}
