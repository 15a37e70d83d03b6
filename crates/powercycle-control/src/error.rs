//! Error types for the transition engine.
//!
//! Every failure the engine can hit is a `ControlError`. None of them leave
//! the engine as an error: [`ControlError::to_outcome`] turns each one into
//! the [`TransitionOutcome`] handed back to the caller.

use std::time::Duration;

use powercycle_core::{
    LifecycleState, ResourceId, TransitionKind, TransitionOutcome, TransitionPhase,
    TransitionStatus,
};
use thiserror::Error;

use crate::executor::Action;
use crate::lifecycle::RejectReason;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur while executing a transition.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Required configuration is missing or malformed. No action was attempted.
    #[error("configuration error: {0}")]
    Config(String),

    /// The control plane does not know the resource.
    #[error("resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// A single state query failed; the caller may retry.
    #[error("state query for {resource_id} failed: {message}")]
    TransientQuery {
        /// The resource being queried.
        resource_id: ResourceId,
        /// What went wrong.
        message: String,
    },

    /// The validator refused the transition. No command was issued.
    #[error("cannot {kind} resource {resource_id} in state {state}: {reason}")]
    Rejected {
        /// The resource being transitioned.
        resource_id: ResourceId,
        /// The requested transition.
        kind: TransitionKind,
        /// The observed state.
        state: LifecycleState,
        /// Why the transition was refused.
        reason: RejectReason,
    },

    /// The control plane refused a stop or start command.
    #[error("control plane refused {action} for {resource_id}: {message}")]
    ActionRejected {
        /// The resource being transitioned.
        resource_id: ResourceId,
        /// The refused command.
        action: Action,
        /// The control plane's explanation.
        message: String,
    },

    /// A command was accepted but the target state was not observed in time.
    #[error(
        "timed out after {waited:?} waiting for {resource_id} to reach {} during {phase} phase",
        phase.target_state()
    )]
    ConvergenceTimeout {
        /// The resource being transitioned.
        resource_id: ResourceId,
        /// The phase that did not converge.
        phase: TransitionPhase,
        /// The last state observed while waiting, if any poll succeeded.
        last_observed: Option<LifecycleState>,
        /// How long the waiter held on.
        waited: Duration,
    },

    /// The caller cancelled the wait before the resource converged.
    #[error("wait for {resource_id} cancelled during {phase} phase")]
    Cancelled {
        /// The resource being transitioned.
        resource_id: ResourceId,
        /// The phase that was interrupted.
        phase: TransitionPhase,
        /// The last state observed while waiting, if any poll succeeded.
        last_observed: Option<LifecycleState>,
    },

    /// The control plane stayed unreachable through every retry.
    #[error("control plane unreachable for {resource_id} after {attempts} attempts: {message}")]
    QueryFailed {
        /// The resource being queried.
        resource_id: ResourceId,
        /// How many queries were made.
        attempts: u32,
        /// The last failure.
        message: String,
    },

    /// Another transition currently holds the resource.
    #[error("another transition is in progress for {0}")]
    LeaseHeld(ResourceId),
}

impl ControlError {
    /// Returns the outcome classification for this error.
    #[must_use]
    pub const fn status(&self) -> TransitionStatus {
        match self {
            Self::Rejected { .. } => TransitionStatus::PreconditionFailed,
            Self::LeaseHeld(_) => TransitionStatus::Busy,
            Self::ConvergenceTimeout { .. } | Self::Cancelled { .. } => TransitionStatus::TimedOut,
            Self::Config(_)
            | Self::ResourceNotFound(_)
            | Self::TransientQuery { .. }
            | Self::ActionRejected { .. }
            | Self::QueryFailed { .. } => TransitionStatus::Fatal,
        }
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.status().http_status_code()
    }

    /// Machine-readable code carried in the outcome.
    ///
    /// Stop-phase and start-phase timeouts get distinct codes so callers can
    /// tell a resource left stopped from one left running.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::ResourceNotFound(_) => "resource_not_found",
            Self::TransientQuery { .. } | Self::QueryFailed { .. } => "query_failed",
            Self::Rejected { reason, .. } => reason.code(),
            Self::ActionRejected { .. } => "action_failed",
            Self::ConvergenceTimeout { phase, .. } => match phase {
                TransitionPhase::Stop => "stop_phase_timeout",
                TransitionPhase::Start => "start_phase_timeout",
            },
            Self::Cancelled { phase, .. } => match phase {
                TransitionPhase::Stop => "stop_phase_cancelled",
                TransitionPhase::Start => "start_phase_cancelled",
            },
            Self::LeaseHeld(_) => "lease_held",
        }
    }

    /// Returns true if the caller may simply retry the request.
    ///
    /// Timeouts are not retriable: the command is still in flight and a
    /// second command against a resource mid-transition may be refused.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::TransientQuery { .. }
                | Self::ActionRejected { .. }
                | Self::QueryFailed { .. }
                | Self::LeaseHeld(_)
        )
    }

    /// The last lifecycle state known when the error was raised.
    #[must_use]
    pub const fn last_observed(&self) -> Option<LifecycleState> {
        match self {
            Self::Rejected { state, .. } => Some(*state),
            Self::ConvergenceTimeout { last_observed, .. }
            | Self::Cancelled { last_observed, .. } => *last_observed,
            _ => None,
        }
    }

    /// Convert this error into the outcome returned to the caller.
    #[must_use]
    pub fn to_outcome(&self, resource_id: &str) -> TransitionOutcome {
        TransitionOutcome::failed(
            resource_id,
            self.status(),
            self.error_code(),
            self.to_string(),
            self.last_observed(),
        )
    }
}
