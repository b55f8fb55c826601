//! Autoscaler — one scaling pass for one resource.
//!
//! Reads capacity and utilization through the collaborator traits, asks
//! the decision engine what to do, applies the change, and records
//! scale-downs in the cooldown store only after the write succeeded.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use puscale_core::config::DEFAULT_UTILIZATION_WINDOW;
use puscale_core::{ResourceId, ScalingPolicy};

use crate::clock::{Clock, SystemClock};
use crate::collaborator::*;
use crate::cooldown::CooldownStore;
use crate::decision::{DecisionInput, ScaleDecision, decide};
use crate::error::{ScaleError, ScaleResult};

/// Default deadline for each collaborator call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a completed scaling pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleOutcome {
    pub resource: ResourceId,
    pub current_units: u32,
    pub utilization: f64,
    pub decision: ScaleDecision,
}

/// Runs scaling passes against a set of collaborators.
///
/// Cheap to share: every collaborator is behind an `Arc`, and the
/// autoscaler holds no per-request state of its own.
#[derive(Clone)]
pub struct Autoscaler {
    capacity: Arc<dyn CapacityReader>,
    utilization: Arc<dyn UtilizationReader>,
    writer: Arc<dyn CapacityWriter>,
    cooldowns: Arc<dyn CooldownStore>,
    clock: Arc<dyn Clock>,
    call_timeout: Duration,
    window: Duration,
}

impl Autoscaler {
    /// Create an autoscaler from its collaborators.
    pub fn new(
        capacity: Arc<dyn CapacityReader>,
        utilization: Arc<dyn UtilizationReader>,
        writer: Arc<dyn CapacityWriter>,
        cooldowns: Arc<dyn CooldownStore>,
    ) -> Self {
        Self {
            capacity,
            utilization,
            writer,
            cooldowns,
            clock: Arc::new(SystemClock),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            window: DEFAULT_UTILIZATION_WINDOW,
        }
    }

    /// Create an autoscaler whose three collaborators are one backend.
    pub fn with_backend<B>(backend: Arc<B>, cooldowns: Arc<dyn CooldownStore>) -> Self
    where
        B: CapacityReader + UtilizationReader + CapacityWriter + 'static,
    {
        Self::new(backend.clone(), backend.clone(), backend, cooldowns)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_utilization_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Evaluate and, if needed, resize a single resource.
    ///
    /// Any collaborator failure aborts the pass before later stages run.
    /// Dropping the returned future cancels the pass; the cooldown store
    /// is untouched unless the capacity write completed.
    pub async fn run_once(
        &self,
        resource: &ResourceId,
        policy: &ScalingPolicy,
    ) -> ScaleResult<ScaleOutcome> {
        let current_units = self.read_capacity(resource).await?;
        info!(resource = %resource, units = current_units, "current processing units");

        let utilization = self.read_utilization(resource).await?;
        info!(resource = %resource, utilization = format_args!("{utilization:.2}"), "current utilization");

        let now = self.clock.now();
        let since_last_scale_down = self.cooldowns.time_since_last_scale_down(resource, now);

        let decision = decide(&DecisionInput {
            current_units,
            utilization,
            policy,
            now,
            since_last_scale_down,
        });
        debug!(
            resource = %resource,
            decision = decision.label(),
            since_last_scale_down_secs = since_last_scale_down.map(|d| d.as_secs()),
            cooldown_secs = policy.cooldown.as_secs(),
            "scaling decision"
        );

        if let Some(target) = decision.target_units() {
            info!(resource = %resource, from = current_units, to = target, "applying capacity change");
            self.apply(resource, target).await?;

            if decision.is_scale_down() {
                self.cooldowns.record_scale_down(resource, self.clock.now());
            }
            info!(resource = %resource, units = target, decision = decision.label(), "capacity change applied");
        } else {
            info!(resource = %resource, decision = decision.label(), "no capacity change");
        }

        Ok(ScaleOutcome {
            resource: resource.clone(),
            current_units,
            utilization,
            decision,
        })
    }

    async fn read_capacity(&self, resource: &ResourceId) -> ScaleResult<u32> {
        let result = tokio::time::timeout(self.call_timeout, self.capacity.current(resource))
            .await
            .unwrap_or(Err(CapacityError::Timeout(self.call_timeout)));

        result.map_err(|source| {
            warn!(resource = %resource, error = %source, "failed to get current processing units");
            ScaleError::ReadCapacity {
                resource: resource.clone(),
                source,
            }
        })
    }

    async fn read_utilization(&self, resource: &ResourceId) -> ScaleResult<f64> {
        let result =
            tokio::time::timeout(self.call_timeout, self.utilization.recent(resource, self.window))
                .await
                .unwrap_or(Err(UtilizationError::Timeout(self.call_timeout)))
                .and_then(|value| {
                    if value.is_finite() {
                        Ok(value)
                    } else {
                        Err(UtilizationError::Unavailable(format!("non-finite reading {value}")))
                    }
                });

        result.map_err(|source| {
            warn!(resource = %resource, error = %source, "failed to get utilization");
            ScaleError::ReadUtilization {
                resource: resource.clone(),
                source,
            }
        })
    }

    async fn apply(&self, resource: &ResourceId, units: u32) -> ScaleResult<()> {
        let result = tokio::time::timeout(self.call_timeout, self.writer.apply(resource, units))
            .await
            .unwrap_or(Err(WriteError::Timeout(self.call_timeout)));

        result.map_err(|source| {
            warn!(resource = %resource, units, error = %source, "failed to update processing units");
            ScaleError::ApplyCapacity {
                resource: resource.clone(),
                units,
                source,
            }
        })
    }
}
