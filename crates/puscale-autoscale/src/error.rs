//! Errors raised by a scaling pass.

use thiserror::Error;

use puscale_core::ResourceId;

use crate::collaborator::{CapacityError, UtilizationError, WriteError};

pub type ScaleResult<T> = Result<T, ScaleError>;

/// A collaborator failure that aborted a scaling pass.
///
/// Read failures leave the resource untouched. A write failure may have
/// partially applied on the resource.
#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("failed to read current processing units of {resource}: {source}")]
    ReadCapacity {
        resource: ResourceId,
        source: CapacityError,
    },

    #[error("failed to read utilization of {resource}: {source}")]
    ReadUtilization {
        resource: ResourceId,
        source: UtilizationError,
    },

    #[error("failed to update {resource} to {units} processing units: {source}")]
    ApplyCapacity {
        resource: ResourceId,
        units: u32,
        source: WriteError,
    },
}

impl ScaleError {
    /// Name of the stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            ScaleError::ReadCapacity { .. } => "read_capacity",
            ScaleError::ReadUtilization { .. } => "read_utilization",
            ScaleError::ApplyCapacity { .. } => "apply_capacity",
        }
    }

    pub fn is_write_failure(&self) -> bool {
        matches!(self, ScaleError::ApplyCapacity { .. })
    }
}
