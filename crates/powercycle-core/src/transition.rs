//! Transition requests and outcomes.
//!
//! A [`TransitionRequest`] is built per invocation by a trigger and handed to
//! the engine. The engine always answers with a [`TransitionOutcome`], never
//! with a bare error, so callers can serialize it straight to a response.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::ResourceId;
use crate::state::LifecycleState;

/// The lifecycle transition a trigger asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Boot a stopped resource.
    Start,
    /// Halt a running resource.
    Stop,
    /// Stop then start a running resource.
    Reboot,
}

impl TransitionKind {
    /// The state the resource must be in for this transition to be accepted.
    #[must_use]
    pub const fn required_state(self) -> LifecycleState {
        match self {
            Self::Start => LifecycleState::Stopped,
            Self::Stop | Self::Reboot => LifecycleState::Running,
        }
    }

    /// The state the resource is left in when the transition succeeds.
    #[must_use]
    pub const fn target_state(self) -> LifecycleState {
        match self {
            Self::Start | Self::Reboot => LifecycleState::Running,
            Self::Stop => LifecycleState::Stopped,
        }
    }

    /// Lowercase name, as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reboot => "reboot",
        }
    }

    const fn past_tense(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Reboot => "rebooted",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransitionKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "reboot" | "restart" => Ok(Self::Reboot),
            _ => Err(CoreError::UnknownTransition(s.to_string())),
        }
    }
}

/// Which half of a transition was in flight when it failed.
///
/// A reboot runs a stop phase then a start phase; plain stop and start run
/// one phase each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPhase {
    /// Waiting for the resource to reach `stopped`.
    Stop,
    /// Waiting for the resource to reach `running`.
    Start,
}

impl TransitionPhase {
    /// The state this phase waits for.
    #[must_use]
    pub const fn target_state(self) -> LifecycleState {
        match self {
            Self::Stop => LifecycleState::Stopped,
            Self::Start => LifecycleState::Running,
        }
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop => f.write_str("stop"),
            Self::Start => f.write_str("start"),
        }
    }
}

/// A request to move the resource through a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    /// The resource to act on.
    pub resource_id: ResourceId,
    /// The transition to perform.
    #[serde(rename = "transitionKind")]
    pub kind: TransitionKind,
}

impl TransitionRequest {
    /// Create a new request.
    #[must_use]
    pub const fn new(resource_id: ResourceId, kind: TransitionKind) -> Self {
        Self { resource_id, kind }
    }
}

/// Coarse classification of a transition outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStatus {
    /// The resource was observed in the target state.
    Success,
    /// The resource was not in a state the transition may start from.
    PreconditionFailed,
    /// Another transition holds the resource.
    Busy,
    /// A command was accepted but the target state was not observed in time.
    TimedOut,
    /// Anything else: refused commands, unreachable control plane, bad config.
    Fatal,
}

impl TransitionStatus {
    /// The HTTP status code a response layer should use.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::PreconditionFailed => 400,
            Self::Busy => 409,
            Self::TimedOut | Self::Fatal => 500,
        }
    }
}

/// The structured result of a transition request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    /// HTTP-style status code derived from `status`.
    pub status_code: u16,
    /// Outcome classification.
    pub status: TransitionStatus,
    /// Human-readable summary.
    pub message: String,
    /// The resource the request targeted.
    pub resource_id: String,
    /// The last state observed, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_state: Option<LifecycleState>,
    /// Machine-readable failure code, absent on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl TransitionOutcome {
    /// Outcome for a transition whose target state was re-observed.
    #[must_use]
    pub fn succeeded(resource_id: &ResourceId, kind: TransitionKind, observed: LifecycleState) -> Self {
        Self {
            status_code: TransitionStatus::Success.http_status_code(),
            status: TransitionStatus::Success,
            message: format!("resource {} successfully", kind.past_tense()),
            resource_id: resource_id.to_string(),
            new_state: Some(observed),
            error_code: None,
        }
    }

    /// Outcome for a failed transition.
    #[must_use]
    pub fn failed(
        resource_id: impl Into<String>,
        status: TransitionStatus,
        error_code: impl Into<String>,
        message: impl Into<String>,
        last_state: Option<LifecycleState>,
    ) -> Self {
        Self {
            status_code: status.http_status_code(),
            status,
            message: message.into(),
            resource_id: resource_id.into(),
            new_state: last_state,
            error_code: Some(error_code.into()),
        }
    }

    /// Check if the transition succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, TransitionStatus::Success)
    }
}
