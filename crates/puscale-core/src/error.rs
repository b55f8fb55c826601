//! Configuration errors.

use thiserror::Error;

/// Result type alias for configuration parsing and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A scaling request or daemon config that cannot be accepted.
///
/// Every variant is raised before any collaborator is contacted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("puMin ({min}) must not exceed puMax ({max})")]
    InvalidBounds { min: u32, max: u32 },

    #[error("scaleDownThreshold ({down}) must be below scaleUpThreshold ({up})")]
    InvalidThresholds { down: f64, up: f64 },

    #[error("{field} must be a percentage between 0 and 100, got {value}")]
    ThresholdOutOfRange { field: &'static str, value: f64 },

    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("failed to read config file: {0}")]
    Io(String),
}
