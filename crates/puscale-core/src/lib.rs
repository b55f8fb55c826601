//! puscale-core — types shared by the processing-unit autoscaler.
//!
//! Holds the resource identity, the validated [`ScalingPolicy`], the JSON
//! [`ScaleRequest`] accepted by the HTTP surface, and the daemon's TOML
//! configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{DaemonConfig, ScaleRequest};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
