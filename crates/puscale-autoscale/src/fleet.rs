//! In-memory fleet — a self-contained stand-in for the admin and
//! monitoring APIs.
//!
//! Implements all three collaborator traits over a shared map. Backs the
//! daemon's standalone mode and the orchestration tests; failures can be
//! injected per resource and per stage.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use puscale_core::ResourceId;
use puscale_core::config::SeedResource;

use crate::collaborator::*;

/// Which collaborator call should fail for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    CapacityUnavailable,
    UtilizationUnavailable,
    ApplyFailed,
}

#[derive(Debug, Clone)]
struct FleetEntry {
    units: u32,
    utilization: Option<f64>,
    failure: Option<InjectedFailure>,
}

/// Simulated set of scalable resources.
#[derive(Debug, Default)]
pub struct InMemoryFleet {
    entries: RwLock<HashMap<ResourceId, FleetEntry>>,
    writes: RwLock<Vec<(ResourceId, u32)>>,
    /// Artificial latency added to every capacity change.
    apply_delay: Option<Duration>,
}

impl InMemoryFleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_apply_delay(mut self, delay: Duration) -> Self {
        self.apply_delay = Some(delay);
        self
    }

    /// Build a fleet from the `[[resources]]` section of the daemon config.
    pub fn from_seeds(seeds: &[SeedResource]) -> Self {
        let entries = seeds
            .iter()
            .map(|s| {
                (
                    ResourceId::new(s.project.clone(), s.instance.clone()),
                    FleetEntry {
                        units: s.units,
                        utilization: s.utilization,
                        failure: None,
                    },
                )
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
            ..Self::default()
        }
    }

    pub async fn insert(&self, resource: ResourceId, units: u32, utilization: Option<f64>) {
        self.entries.write().await.insert(
            resource,
            FleetEntry {
                units,
                utilization,
                failure: None,
            },
        );
    }

    pub async fn set_utilization(&self, resource: &ResourceId, utilization: Option<f64>) {
        if let Some(entry) = self.entries.write().await.get_mut(resource) {
            entry.utilization = utilization;
        }
    }

    pub async fn inject_failure(&self, resource: &ResourceId, failure: Option<InjectedFailure>) {
        if let Some(entry) = self.entries.write().await.get_mut(resource) {
            entry.failure = failure;
        }
    }

    pub async fn units(&self, resource: &ResourceId) -> Option<u32> {
        self.entries.read().await.get(resource).map(|e| e.units)
    }

    /// Every successful capacity change, in order.
    pub async fn writes(&self) -> Vec<(ResourceId, u32)> {
        self.writes.read().await.clone()
    }
}

impl CapacityReader for InMemoryFleet {
    fn current<'a>(
        &'a self,
        resource: &'a ResourceId,
    ) -> BoxFuture<'a, Result<u32, CapacityError>> {
        Box::pin(async move {
            let entries = self.entries.read().await;
            let entry = entries
                .get(resource)
                .ok_or_else(|| CapacityError::NotFound(resource.to_string()))?;
            if entry.failure == Some(InjectedFailure::CapacityUnavailable) {
                return Err(CapacityError::Unavailable("injected failure".to_string()));
            }
            Ok(entry.units)
        })
    }
}

impl UtilizationReader for InMemoryFleet {
    fn recent<'a>(
        &'a self,
        resource: &'a ResourceId,
        window: Duration,
    ) -> BoxFuture<'a, Result<f64, UtilizationError>> {
        Box::pin(async move {
            let entries = self.entries.read().await;
            let entry = entries
                .get(resource)
                .ok_or(UtilizationError::NoDataPoints(window))?;
            if entry.failure == Some(InjectedFailure::UtilizationUnavailable) {
                return Err(UtilizationError::Unavailable("injected failure".to_string()));
            }
            entry.utilization.ok_or(UtilizationError::NoDataPoints(window))
        })
    }
}

impl CapacityWriter for InMemoryFleet {
    fn apply<'a>(
        &'a self,
        resource: &'a ResourceId,
        units: u32,
    ) -> BoxFuture<'a, Result<(), WriteError>> {
        Box::pin(async move {
            if let Some(delay) = self.apply_delay {
                tokio::time::sleep(delay).await;
            }

            let mut entries = self.entries.write().await;
            let entry = entries
                .get_mut(resource)
                .ok_or_else(|| WriteError::ApplyFailed(format!("resource not found: {resource}")))?;
            if entry.failure == Some(InjectedFailure::ApplyFailed) {
                return Err(WriteError::ApplyFailed("injected failure".to_string()));
            }

            debug!(resource = %resource, from = entry.units, to = units, "fleet capacity updated");
            entry.units = units;
            drop(entries);

            self.writes.write().await.push((resource.clone(), units));
            Ok(())
        })
    }
}
