//! puscale-autoscale — step-based processing-unit scaling.
//!
//! Reads the current processing units and recent utilization of a
//! resource, decides whether to add or remove one step of capacity, and
//! applies the change. Scale-downs are rate limited by a per-resource
//! cooldown; scale-ups react immediately.
//!
//! # Scaling pass
//!
//! ```text
//! CapacityReader::current()      ──┐
//! UtilizationReader::recent()    ──┤
//! CooldownStore::time_since_…()  ──┼─► decide() ─► ScaleDecision
//!                                  │
//! ScaleUp/ScaleDown ─► CapacityWriter::apply()
//!                      └─ on success, ScaleDown ─► CooldownStore::record_scale_down()
//! ```
//!
//! The decision engine is a pure function; the collaborators are trait
//! objects so passes can run against real backends or [`InMemoryFleet`].

pub mod clock;
pub mod collaborator;
pub mod cooldown;
pub mod decision;
pub mod error;
pub mod fleet;
pub mod scaler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collaborator::{
    CapacityError, CapacityReader, CapacityWriter, UtilizationError, UtilizationReader, WriteError,
};
pub use cooldown::{CooldownStore, InMemoryCooldownStore};
pub use decision::{DecisionInput, ScaleDecision, decide};
pub use error::{ScaleError, ScaleResult};
pub use fleet::{InMemoryFleet, InjectedFailure};
pub use scaler::{Autoscaler, ScaleOutcome};
