//! Common error types for powercycle.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while parsing the shared vocabulary types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// An invalid resource identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),

    /// The control plane reported a lifecycle state name we do not know.
    #[error("unknown lifecycle state: {0}")]
    UnknownState(String),

    /// The transition kind name is not one of start, stop or reboot.
    #[error("unknown transition kind: {0}")]
    UnknownTransition(String),
}
