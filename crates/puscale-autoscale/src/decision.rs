//! Decision engine — maps one capacity/utilization reading to an action.
//!
//! ```text
//! if utilization > scale_up_threshold:
//!     candidate = clamp(current + step, min, max)
//!     candidate != current ? ScaleUp(candidate) : HoldAtMax
//! elif utilization < scale_down_threshold:
//!     since_last_scale_down < cooldown ? SkipDueToCooldown
//!     candidate = clamp(current - step, min, max)
//!     candidate != current ? ScaleDown(candidate) : HoldAtMin
//! else:
//!     HoldWithinDeadZone
//! ```
//!
//! The engine is total: it never fails and never touches the cooldown
//! store itself. The caller supplies `since_last_scale_down`.

use std::fmt;
use std::time::{Duration, Instant};

use puscale_core::ScalingPolicy;

/// Everything the engine looks at for a single decision.
#[derive(Debug, Clone)]
pub struct DecisionInput<'a> {
    pub current_units: u32,
    /// Utilization percentage (0-100).
    pub utilization: f64,
    pub policy: &'a ScalingPolicy,
    pub now: Instant,
    /// `None` if the resource has never been scaled down.
    pub since_last_scale_down: Option<Duration>,
}

/// Outcome of a scaling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Grow to the given unit count.
    ScaleUp(u32),
    /// Shrink to the given unit count.
    ScaleDown(u32),
    /// Utilization is high but capacity is already at the maximum.
    HoldAtMax,
    /// Utilization is low but capacity is already at the minimum.
    HoldAtMin,
    /// Utilization is between the two thresholds.
    HoldWithinDeadZone,
    /// A scale-down was due but the last one is too recent.
    SkipDueToCooldown,
}

impl ScaleDecision {
    /// The unit count to apply, if this decision changes capacity.
    pub fn target_units(&self) -> Option<u32> {
        match self {
            ScaleDecision::ScaleUp(n) | ScaleDecision::ScaleDown(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_scale_down(&self) -> bool {
        matches!(self, ScaleDecision::ScaleDown(_))
    }

    /// Short machine-friendly label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            ScaleDecision::ScaleUp(_) => "scale_up",
            ScaleDecision::ScaleDown(_) => "scale_down",
            ScaleDecision::HoldAtMax => "hold_at_max",
            ScaleDecision::HoldAtMin => "hold_at_min",
            ScaleDecision::HoldWithinDeadZone => "hold_within_dead_zone",
            ScaleDecision::SkipDueToCooldown => "skip_due_to_cooldown",
        }
    }

    /// Plain-text summary returned to the caller.
    pub fn summary(&self) -> String {
        match self {
            ScaleDecision::ScaleUp(n) => format!("Scaled up to {n} PUs."),
            ScaleDecision::ScaleDown(n) => format!("Scaled down to {n} PUs."),
            ScaleDecision::HoldAtMax => "Utilization is high, but already at max PUs.".to_string(),
            ScaleDecision::HoldAtMin => "Utilization is low, but already at min PUs.".to_string(),
            ScaleDecision::HoldWithinDeadZone => {
                "Utilization is within the normal range.".to_string()
            }
            ScaleDecision::SkipDueToCooldown => {
                "Skipping scale down due to interval.".to_string()
            }
        }
    }
}

impl fmt::Display for ScaleDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Decide what to do with a resource given its current reading.
pub fn decide(input: &DecisionInput<'_>) -> ScaleDecision {
    let policy = input.policy;
    let current = input.current_units;

    if input.utilization > policy.scale_up_threshold {
        let candidate = clamp_units(current.saturating_add(policy.step), policy);
        if candidate != current {
            ScaleDecision::ScaleUp(candidate)
        } else {
            ScaleDecision::HoldAtMax
        }
    } else if input.utilization < policy.scale_down_threshold {
        if let Some(elapsed) = input.since_last_scale_down
            && elapsed < policy.cooldown
        {
            return ScaleDecision::SkipDueToCooldown;
        }

        let candidate = clamp_units(current.saturating_sub(policy.step), policy);
        if candidate != current {
            ScaleDecision::ScaleDown(candidate)
        } else {
            ScaleDecision::HoldAtMin
        }
    } else {
        ScaleDecision::HoldWithinDeadZone
    }
}

fn clamp_units(units: u32, policy: &ScalingPolicy) -> u32 {
    units.clamp(policy.min_units, policy.max_units)
}
