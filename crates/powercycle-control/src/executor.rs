//! Issues state-changing commands to the control plane.

use std::fmt;
use std::sync::Arc;

use powercycle_core::{ResourceId, TransitionPhase};
use serde::{Deserialize, Serialize};

use crate::compute::ComputeApi;
use crate::error::{ControlError, Result};

/// A state-changing command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Halt the resource.
    Stop,
    /// Boot the resource.
    Start,
}

impl Action {
    /// The command that drives the given phase.
    #[must_use]
    pub const fn for_phase(phase: TransitionPhase) -> Self {
        match phase {
            TransitionPhase::Stop => Self::Stop,
            TransitionPhase::Start => Self::Start,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str("stop"),
            Self::Start => f.write_str("start"),
        }
    }
}

/// Sends stop and start commands.
///
/// A successful return only means the control plane accepted the command;
/// the state change itself happens asynchronously.
pub struct ActionExecutor<C: ComputeApi> {
    compute: Arc<C>,
}

impl<C: ComputeApi> ActionExecutor<C> {
    /// Create an executor over the given compute API.
    #[must_use]
    pub fn new(compute: Arc<C>) -> Self {
        Self { compute }
    }

    /// Request a stop.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ActionRejected` if the control plane refuses.
    pub async fn issue_stop(&self, resource_id: &ResourceId) -> Result<()> {
        self.issue(Action::Stop, resource_id).await
    }

    /// Request a start.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ActionRejected` if the control plane refuses.
    pub async fn issue_start(&self, resource_id: &ResourceId) -> Result<()> {
        self.issue(Action::Start, resource_id).await
    }

    /// Issue the given command.
    ///
    /// Any failure, whatever the compute API reported, surfaces as
    /// `ControlError::ActionRejected`.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ActionRejected` if the control plane refuses.
    pub async fn issue(&self, action: Action, resource_id: &ResourceId) -> Result<()> {
        tracing::info!(resource_id = %resource_id, action = %action, "Issuing command");

        let result = match action {
            Action::Stop => self.compute.stop(resource_id).await,
            Action::Start => self.compute.start(resource_id).await,
        };

        result.map_err(|e| match e {
            rejected @ ControlError::ActionRejected { .. } => rejected,
            other => ControlError::ActionRejected {
                resource_id: resource_id.clone(),
                action,
                message: other.to_string(),
            },
        })
    }
}
