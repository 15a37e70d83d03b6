//! Lifecycle states reported by the control plane.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of the managed resource.
///
/// The state is owned by the control plane; powercycle only observes it.
/// Wire names match the compute API (`shutting-down` is hyphenated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    /// The resource is booting.
    Pending,
    /// The resource is up.
    Running,
    /// A stop is in progress.
    Stopping,
    /// The resource is halted and can be started again.
    Stopped,
    /// A termination is in progress.
    ShuttingDown,
    /// The resource is gone for good.
    Terminated,
}

impl LifecycleState {
    /// All states, in the order the control plane documents them.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Running,
        Self::Stopping,
        Self::Stopped,
        Self::ShuttingDown,
        Self::Terminated,
    ];

    /// Parse a state from the control plane's state name.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownState` for names outside the known set.
    pub fn from_api_name(name: &str) -> crate::Result<Self> {
        match name {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "stopping" => Ok(Self::Stopping),
            "stopped" => Ok(Self::Stopped),
            "shutting-down" => Ok(Self::ShuttingDown),
            "terminated" => Ok(Self::Terminated),
            other => Err(CoreError::UnknownState(other.to_string())),
        }
    }

    /// The control plane's name for this state.
    #[must_use]
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
        }
    }

    /// Check if the resource is at rest, i.e. a transition may start from here.
    #[must_use]
    pub const fn is_stable(self) -> bool {
        matches!(self, Self::Running | Self::Stopped)
    }

    /// Check if the resource can never come back.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ShuttingDown | Self::Terminated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

impl FromStr for LifecycleState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_api_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_from_api_name() {
        for state in LifecycleState::ALL {
            assert_eq!(LifecycleState::from_api_name(state.api_name()).unwrap(), state);
        }
        assert!(matches!(
            LifecycleState::from_api_name("rebooting"),
            Err(CoreError::UnknownState(name)) if name == "rebooting"
        ));
    }

    #[test]
    fn stable_states() {
        assert!(LifecycleState::Running.is_stable());
        assert!(LifecycleState::Stopped.is_stable());
        assert!(!LifecycleState::Pending.is_stable());
        assert!(!LifecycleState::Stopping.is_stable());
        assert!(!LifecycleState::ShuttingDown.is_stable());
        assert!(!LifecycleState::Terminated.is_stable());
    }

    #[test]
    fn terminal_states() {
        assert!(LifecycleState::Terminated.is_terminal());
        assert!(LifecycleState::ShuttingDown.is_terminal());
        assert!(!LifecycleState::Stopped.is_terminal());
    }

    #[test]
    fn serde_uses_api_names() {
        let json = serde_json::to_string(&LifecycleState::ShuttingDown).unwrap();
        assert_eq!(json, "\"shutting-down\"");

        let parsed: LifecycleState = serde_json::from_str("\"stopped\"").unwrap();
        assert_eq!(parsed, LifecycleState::Stopped);
    }
}
