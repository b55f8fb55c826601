//! Capability traits for the systems the autoscaler talks to.
//!
//! Reading capacity, reading utilization and applying a new capacity
//! are the only suspending points of a scaling pass. Each is a trait
//! object so the orchestration can run against an admin API, a
//! monitoring backend, or an in-memory fake.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use puscale_core::ResourceId;

/// Boxed future returned by collaborator calls.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CapacityError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("capacity backend unavailable: {0}")]
    Unavailable(String),

    #[error("capacity read timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum UtilizationError {
    /// The window held no samples. Never read as zero load.
    #[error("no utilization data points in the last {0:?}")]
    NoDataPoints(Duration),

    #[error("metrics backend unavailable: {0}")]
    Unavailable(String),

    #[error("utilization read timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WriteError {
    #[error("capacity change failed: {0}")]
    ApplyFailed(String),

    /// The change may still land on the resource.
    #[error("capacity change timed out after {0:?}")]
    Timeout(Duration),
}

/// Returns the current processing units of a resource.
pub trait CapacityReader: Send + Sync {
    fn current<'a>(&'a self, resource: &'a ResourceId) -> BoxFuture<'a, Result<u32, CapacityError>>;
}

/// Returns utilization (0-100) over a trailing window.
pub trait UtilizationReader: Send + Sync {
    fn recent<'a>(
        &'a self,
        resource: &'a ResourceId,
        window: Duration,
    ) -> BoxFuture<'a, Result<f64, UtilizationError>>;
}

/// Requests a capacity change and resolves once it has been applied.
pub trait CapacityWriter: Send + Sync {
    fn apply<'a>(
        &'a self,
        resource: &'a ResourceId,
        units: u32,
    ) -> BoxFuture<'a, Result<(), WriteError>>;
}
