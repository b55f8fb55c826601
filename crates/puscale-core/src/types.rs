//! Shared types used across puscale crates.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default utilization above which capacity is added.
pub const DEFAULT_SCALE_UP_THRESHOLD: f64 = 50.0;

/// Default utilization below which capacity is released.
pub const DEFAULT_SCALE_DOWN_THRESHOLD: f64 = 30.0;

/// Default minimum time between two scale-downs of the same resource.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30 * 60);

/// Identity of a scalable target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId {
    pub project: String,
    pub instance: String,
}

impl ResourceId {
    pub fn new(project: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            instance: instance.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/instances/{}", self.project, self.instance)
    }
}

/// Step-based scaling policy for a single resource.
///
/// Construct through [`ScalingPolicy::new`] (or from a validated
/// `ScaleRequest`) so the bound and threshold invariants hold:
///
/// - `step > 0`, `min_units > 0`, `min_units <= max_units`
/// - both thresholds lie in `[0, 100]`
/// - `scale_down_threshold < scale_up_threshold`
///
/// The gap between the two thresholds is the dead zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingPolicy {
    pub step: u32,
    pub min_units: u32,
    pub max_units: u32,
    pub scale_up_threshold: f64,
    pub scale_down_threshold: f64,
    pub cooldown: Duration,
}

impl ScalingPolicy {
    /// Build a policy, rejecting any combination that violates its invariants.
    pub fn new(
        step: u32,
        min_units: u32,
        max_units: u32,
        scale_up_threshold: f64,
        scale_down_threshold: f64,
        cooldown: Duration,
    ) -> ConfigResult<Self> {
        let policy = Self {
            step,
            min_units,
            max_units,
            scale_up_threshold,
            scale_down_threshold,
            cooldown,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Check the policy invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.step == 0 {
            return Err(ConfigError::MissingField("puStep"));
        }
        if self.min_units == 0 {
            return Err(ConfigError::MissingField("puMin"));
        }
        if self.max_units == 0 {
            return Err(ConfigError::MissingField("puMax"));
        }
        if self.min_units > self.max_units {
            return Err(ConfigError::InvalidBounds {
                min: self.min_units,
                max: self.max_units,
            });
        }
        check_percentage("scaleUpThreshold", self.scale_up_threshold)?;
        check_percentage("scaleDownThreshold", self.scale_down_threshold)?;
        if self.scale_down_threshold >= self.scale_up_threshold {
            return Err(ConfigError::InvalidThresholds {
                down: self.scale_down_threshold,
                up: self.scale_up_threshold,
            });
        }
        Ok(())
    }
}

fn check_percentage(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ScalingPolicy {
        ScalingPolicy::new(100, 100, 1000, 50.0, 30.0, DEFAULT_COOLDOWN).unwrap()
    }

    #[test]
    fn resource_id_display() {
        let id = ResourceId::new("acme", "orders");
        assert_eq!(id.to_string(), "projects/acme/instances/orders");
    }

    #[test]
    fn valid_policy() {
        let p = policy();
        assert_eq!(p.step, 100);
        assert_eq!(p.min_units, 100);
        assert_eq!(p.max_units, 1000);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn min_above_max_rejected() {
        let err = ScalingPolicy::new(100, 2000, 1000, 50.0, 30.0, DEFAULT_COOLDOWN).unwrap_err();
        assert_eq!(err, ConfigError::InvalidBounds { min: 2000, max: 1000 });
    }

    #[test]
    fn min_equal_max_accepted() {
        assert!(ScalingPolicy::new(100, 500, 500, 50.0, 30.0, DEFAULT_COOLDOWN).is_ok());
    }

    #[test]
    fn zero_step_rejected() {
        let err = ScalingPolicy::new(0, 100, 1000, 50.0, 30.0, DEFAULT_COOLDOWN).unwrap_err();
        assert_eq!(err, ConfigError::MissingField("puStep"));
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let err = ScalingPolicy::new(100, 100, 1000, 30.0, 30.0, DEFAULT_COOLDOWN).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThresholds { .. }));
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let err = ScalingPolicy::new(100, 100, 1000, 150.0, 30.0, DEFAULT_COOLDOWN).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ThresholdOutOfRange { field: "scaleUpThreshold", .. }
        ));

        let err = ScalingPolicy::new(100, 100, 1000, 50.0, f64::NAN, DEFAULT_COOLDOWN).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ThresholdOutOfRange { field: "scaleDownThreshold", .. }
        ));
    }
}
