//! Scale-down cooldown bookkeeping.
//!
//! Only scale-downs are recorded; scale-up is never rate limited. The
//! store answers "how long ago did this resource last shrink" and the
//! decision engine compares that against the policy's cooldown.
//!
//! Reads and writes for the same resource are not serialized against
//! each other: two concurrent requests can both observe "no cooldown"
//! before either records. A stricter store can implement
//! [`CooldownStore`] with an atomic check-and-record without touching
//! the decision engine.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use puscale_core::ResourceId;

/// Last-scale-down timestamps keyed by resource identity.
pub trait CooldownStore: Send + Sync {
    /// Record a scale-down at `at`, overwriting any earlier entry.
    ///
    /// Visible to every subsequent reader once this returns.
    fn record_scale_down(&self, resource: &ResourceId, at: Instant);

    /// Time elapsed between the last recorded scale-down and `now`, or
    /// `None` if the resource has never been scaled down.
    fn time_since_last_scale_down(&self, resource: &ResourceId, now: Instant) -> Option<Duration>;
}

/// Process-lifetime in-memory cooldown store.
///
/// Entries are created on the first scale-down of a resource and never
/// evicted; resource cardinality is expected to be small. A restart
/// forgets all history.
#[derive(Debug, Default)]
pub struct InMemoryCooldownStore {
    entries: RwLock<HashMap<ResourceId, Instant>>,
}

impl InMemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of resources with a recorded scale-down.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A poisoned lock still guards a map of plain `Instant`s, so the data is
// never torn; recover it instead of propagating the panic.
impl CooldownStore for InMemoryCooldownStore {
    fn record_scale_down(&self, resource: &ResourceId, at: Instant) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(resource.clone(), at);
        debug!(resource = %resource, "recorded scale-down");
    }

    fn time_since_last_scale_down(&self, resource: &ResourceId, now: Instant) -> Option<Duration> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(resource)
            .map(|at| now.saturating_duration_since(*at))
    }
}
