//! Transition validation.
//!
//! A command is only ever issued from a stable state. Acting on a resource
//! that is mid-transition gives undefined control-plane behaviour, so the
//! gate below runs before any state-changing call.
//!
//! # Rules
//!
//! ```text
//!   current state    │  start          stop / reboot
//!  ──────────────────┼─────────────────────────────────
//!   running          │  NotStopped     accept
//!   stopped          │  accept         NotRunning
//!   pending          │  TransientState TransientState
//!   stopping         │  TransientState TransientState
//!   shutting-down    │  TransientState TransientState
//!   terminated       │  TransientState TransientState
//! ```

use std::fmt;

use powercycle_core::{LifecycleState, ResourceId, TransitionKind};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};

/// Why a transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Stop or reboot requested while the resource is not running.
    NotRunning,
    /// Start requested while the resource is not stopped.
    NotStopped,
    /// The resource is mid-transition or gone.
    TransientState,
}

impl RejectReason {
    /// Machine-readable code for this reason.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotRunning => "not_running",
            Self::NotStopped => "not_stopped",
            Self::TransientState => "transient_state",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning => f.write_str("resource is not running"),
            Self::NotStopped => f.write_str("resource is not stopped"),
            Self::TransientState => f.write_str("resource is not in a stable state"),
        }
    }
}

/// The validator's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The transition may proceed.
    Accept,
    /// The transition must not proceed.
    Reject(RejectReason),
}

/// Decide whether `kind` may start from `state`.
#[must_use]
pub const fn validate(state: LifecycleState, kind: TransitionKind) -> Verdict {
    use LifecycleState::{Pending, Running, ShuttingDown, Stopped, Stopping, Terminated};

    match (state, kind) {
        (Pending | Stopping | ShuttingDown | Terminated, _) => {
            Verdict::Reject(RejectReason::TransientState)
        }
        (Running, TransitionKind::Stop | TransitionKind::Reboot)
        | (Stopped, TransitionKind::Start) => Verdict::Accept,
        (Stopped, TransitionKind::Stop | TransitionKind::Reboot) => {
            Verdict::Reject(RejectReason::NotRunning)
        }
        (Running, TransitionKind::Start) => Verdict::Reject(RejectReason::NotStopped),
    }
}

/// Validate a transition for a specific resource.
///
/// # Errors
///
/// Returns `ControlError::Rejected` if the transition is not allowed.
pub fn validate_transition(
    resource_id: &ResourceId,
    state: LifecycleState,
    kind: TransitionKind,
) -> Result<()> {
    match validate(state, kind) {
        Verdict::Accept => Ok(()),
        Verdict::Reject(reason) => Err(ControlError::Rejected {
            resource_id: resource_id.clone(),
            kind,
            state,
            reason,
        }),
    }
}

/// Returns the transitions that may start from the given state.
#[must_use]
pub fn valid_transitions_from(state: LifecycleState) -> Vec<TransitionKind> {
    [TransitionKind::Start, TransitionKind::Stop, TransitionKind::Reboot]
        .into_iter()
        .filter(|kind| validate(state, *kind) == Verdict::Accept)
        .collect()
}
