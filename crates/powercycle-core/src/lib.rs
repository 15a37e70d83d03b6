//! Core types for powercycle.
//!
//! This crate provides the vocabulary shared by the transition engine, the
//! trigger service and the CLI:
//!
//! - **Identifiers**: [`ResourceId`], the opaque id of the managed resource
//! - **Lifecycle**: [`LifecycleState`] as reported by the control plane
//! - **Transitions**: [`TransitionRequest`] in, [`TransitionOutcome`] out
//!
//! # Example
//!
//! ```
//! use powercycle_core::{LifecycleState, ResourceId, TransitionKind, TransitionRequest};
//!
//! let resource_id = ResourceId::new("i-0123456789abcdef0").unwrap();
//! let request = TransitionRequest::new(resource_id, TransitionKind::Reboot);
//!
//! assert_eq!(request.kind.required_state(), LifecycleState::Running);
//! assert_eq!(request.kind.target_state(), LifecycleState::Running);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod state;
pub mod transition;

pub use error::{CoreError, Result};
pub use ids::{IdError, ResourceId};
pub use state::LifecycleState;
pub use transition::{
    TransitionKind, TransitionOutcome, TransitionPhase, TransitionRequest, TransitionStatus,
};
