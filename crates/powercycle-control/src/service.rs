//! Transition controller.
//!
//! This module provides the `TransitionEngine` trait and the
//! `TransitionController` implementation that runs
//! validator → executor → waiter for each request.

use std::sync::Arc;

use async_trait::async_trait;
use powercycle_core::{
    LifecycleState, ResourceId, TransitionKind, TransitionOutcome, TransitionPhase,
    TransitionRequest,
};
use tokio_util::sync::CancellationToken;

use crate::compute::ComputeApi;
use crate::error::{ControlError, Result};
use crate::executor::{Action, ActionExecutor};
use crate::lifecycle;
use crate::oracle::StateOracle;
use crate::types::ControlConfig;
use crate::waiter::{ConvergenceWaiter, WaitOutcome};

/// Trait defining the transition operations triggers call into.
#[async_trait]
pub trait TransitionEngine: Send + Sync {
    /// Run a transition to completion.
    ///
    /// Never fails: every error is folded into the returned outcome. The
    /// call blocks until the resource converges, the wait times out or
    /// `cancel` fires.
    async fn execute(
        &self,
        request: &TransitionRequest,
        cancel: &CancellationToken,
    ) -> TransitionOutcome;

    /// Report the resource's current lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ResourceNotFound` for unknown resources and
    /// `ControlError::QueryFailed` if the control plane stays unreachable.
    async fn describe(&self, resource_id: &ResourceId) -> Result<LifecycleState>;
}

/// The transition controller.
///
/// Stateless between invocations; it assumes no other writer touches the
/// resource while it runs (see [`crate::lease`] for the guard that makes
/// that true within one process).
pub struct TransitionController<C: ComputeApi> {
    oracle: StateOracle<C>,
    executor: ActionExecutor<C>,
    waiter: ConvergenceWaiter<C>,
    config: ControlConfig,
}

impl<C: ComputeApi> TransitionController<C> {
    /// Create a new controller.
    #[must_use]
    pub fn new(compute: Arc<C>, config: ControlConfig) -> Self {
        let oracle = StateOracle::new(Arc::clone(&compute));
        Self {
            executor: ActionExecutor::new(compute),
            waiter: ConvergenceWaiter::new(oracle.clone()),
            oracle,
            config,
        }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(compute: Arc<C>) -> Self {
        Self::new(compute, ControlConfig::default())
    }

    async fn run(&self, request: &TransitionRequest, cancel: &CancellationToken) -> Result<LifecycleState> {
        let resource_id = &request.resource_id;

        let state = self
            .oracle
            .observe(
                resource_id,
                self.config.query_attempts,
                self.config.poll_interval(),
                cancel,
            )
            .await?;
        tracing::info!(resource_id = %resource_id, state = %state, "Current resource state");

        lifecycle::validate_transition(resource_id, state, request.kind)?;

        match request.kind {
            TransitionKind::Stop => {
                self.run_phase(resource_id, TransitionPhase::Stop, state, cancel)
                    .await
            }
            TransitionKind::Start => {
                self.run_phase(resource_id, TransitionPhase::Start, state, cancel)
                    .await
            }
            TransitionKind::Reboot => {
                let stopped = self
                    .run_phase(resource_id, TransitionPhase::Stop, state, cancel)
                    .await?;
                lifecycle::validate_transition(resource_id, stopped, TransitionKind::Start)?;
                self.run_phase(resource_id, TransitionPhase::Start, stopped, cancel)
                    .await
            }
        }
    }

    /// Issue the phase's command and wait for its target state.
    ///
    /// `from` is the state the phase starts in. A token that is already
    /// cancelled stops the phase before any command goes out.
    async fn run_phase(
        &self,
        resource_id: &ResourceId,
        phase: TransitionPhase,
        from: LifecycleState,
        cancel: &CancellationToken,
    ) -> Result<LifecycleState> {
        if cancel.is_cancelled() {
            tracing::warn!(
                resource_id = %resource_id,
                phase = %phase,
                "Cancelled before issuing command"
            );
            return Err(ControlError::Cancelled {
                resource_id: resource_id.clone(),
                phase,
                last_observed: Some(from),
            });
        }

        self.executor.issue(Action::for_phase(phase), resource_id).await?;

        let outcome = self
            .waiter
            .wait_for(resource_id, phase.target_state(), &self.config.wait_policy(), cancel)
            .await?;

        match outcome {
            WaitOutcome::Converged { state, .. } => Ok(state),
            WaitOutcome::TimedOut {
                last_observed,
                elapsed,
                ..
            } => Err(ControlError::ConvergenceTimeout {
                resource_id: resource_id.clone(),
                phase,
                last_observed,
                waited: elapsed,
            }),
            WaitOutcome::Cancelled { last_observed, .. } => Err(ControlError::Cancelled {
                resource_id: resource_id.clone(),
                phase,
                last_observed,
            }),
        }
    }
}

#[async_trait]
impl<C: ComputeApi + 'static> TransitionEngine for TransitionController<C> {
    async fn execute(
        &self,
        request: &TransitionRequest,
        cancel: &CancellationToken,
    ) -> TransitionOutcome {
        let resource_id = &request.resource_id;
        tracing::info!(resource_id = %resource_id, kind = %request.kind, "Transition requested");

        match self.run(request, cancel).await {
            Ok(state) => {
                tracing::info!(
                    resource_id = %resource_id,
                    kind = %request.kind,
                    state = %state,
                    "Transition completed"
                );
                TransitionOutcome::succeeded(resource_id, request.kind, state)
            }
            Err(e) => {
                match e {
                    ControlError::Rejected { .. } => tracing::warn!(
                        resource_id = %resource_id,
                        kind = %request.kind,
                        error = %e,
                        "Transition rejected"
                    ),
                    _ => tracing::error!(
                        resource_id = %resource_id,
                        kind = %request.kind,
                        error = %e,
                        "Transition failed"
                    ),
                }
                e.to_outcome(resource_id.as_str())
            }
        }
    }

    async fn describe(&self, resource_id: &ResourceId) -> Result<LifecycleState> {
        self.oracle
            .observe(
                resource_id,
                self.config.query_attempts,
                self.config.poll_interval(),
                &CancellationToken::new(),
            )
            .await
    }
}
