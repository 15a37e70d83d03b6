//! Observes the resource's lifecycle state.

use std::sync::Arc;
use std::time::Duration;

use powercycle_core::{LifecycleState, ResourceId};
use tokio_util::sync::CancellationToken;

use crate::compute::ComputeApi;
use crate::error::{ControlError, Result};

/// Read-only view of the control plane.
pub struct StateOracle<C: ComputeApi> {
    compute: Arc<C>,
}

impl<C: ComputeApi> Clone for StateOracle<C> {
    fn clone(&self) -> Self {
        Self {
            compute: Arc::clone(&self.compute),
        }
    }
}

impl<C: ComputeApi> StateOracle<C> {
    /// Create an oracle over the given compute API.
    #[must_use]
    pub fn new(compute: Arc<C>) -> Self {
        Self { compute }
    }

    /// Query the current state once.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ResourceNotFound` for unknown resources and
    /// `ControlError::TransientQuery` when the query itself fails.
    pub async fn current_state(&self, resource_id: &ResourceId) -> Result<LifecycleState> {
        let state = self.compute.describe_state(resource_id).await?;
        tracing::debug!(resource_id = %resource_id, state = %state, "Observed resource state");
        Ok(state)
    }

    /// Query the current state, retrying transient failures.
    ///
    /// Makes up to `attempts` queries (at least one), sleeping `spacing`
    /// between them. A cancelled `cancel` ends the retries early.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::QueryFailed` once every attempt failed
    /// transiently or `cancel` fired between attempts; `ResourceNotFound` is
    /// returned immediately.
    pub async fn observe(
        &self,
        resource_id: &ResourceId,
        attempts: u32,
        spacing: Duration,
        cancel: &CancellationToken,
    ) -> Result<LifecycleState> {
        let attempts = attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.current_state(resource_id).await {
                Err(ControlError::TransientQuery { message, .. }) => {
                    if attempt >= attempts || cancel.is_cancelled() {
                        return Err(ControlError::QueryFailed {
                            resource_id: resource_id.clone(),
                            attempts: attempt,
                            message,
                        });
                    }
                    tracing::warn!(
                        resource_id = %resource_id,
                        attempt,
                        error = %message,
                        "State query failed, retrying"
                    );
                    tokio::select! {
                        () = cancel.cancelled() => {
                            tracing::warn!(
                                resource_id = %resource_id,
                                attempt,
                                "State query retries cancelled"
                            );
                            return Err(ControlError::QueryFailed {
                                resource_id: resource_id.clone(),
                                attempts: attempt,
                                message,
                            });
                        }
                        () = tokio::time::sleep(spacing) => {}
                    }
                }
                other => return other,
            }
        }
    }
}
