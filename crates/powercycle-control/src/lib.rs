//! Lifecycle transition engine for a single managed compute resource.
//!
//! This crate holds the only real decision logic in powercycle: find out
//! what state the resource is in, decide whether the requested transition
//! may start from there, issue the control-plane command and block until the
//! resource converges or a bounded wait expires.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Triggers (gateway events, CLI)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  TransitionRequest
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │          LeasedEngine (one transition per resource)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   TransitionController                       │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │  Validator  │ │  Executor   │ │ Convergence Waiter  │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        ┌──────────────┐             ┌──────────────┐
//!        │ State Oracle │             │  ComputeApi  │
//!        └──────────────┘             └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use powercycle_control::{
//!     ComputeConfig, ControlConfig, HttpComputeClient, TransitionController, TransitionEngine,
//! };
//! use powercycle_core::{ResourceId, TransitionKind, TransitionRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let compute = HttpComputeClient::new(&ComputeConfig::new("http://compute:8080"))?;
//! let controller = TransitionController::new(Arc::new(compute), ControlConfig::default());
//!
//! let request = TransitionRequest::new(ResourceId::new("i-0abc")?, TransitionKind::Stop);
//! let outcome = controller.execute(&request, &CancellationToken::new()).await;
//!
//! println!("{}: {}", outcome.status_code, outcome.message);
//! # Ok(())
//! # }
//! ```
//!
//! # Validation
//!
//! Transitions start only from stable states:
//!
//! - `stop` and `reboot` require `running`
//! - `start` requires `stopped`
//! - `pending`, `stopping`, `shutting-down` and `terminated` reject everything
//!
//! See the [`lifecycle`] module for the rules.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod compute;
pub mod error;
pub mod executor;
pub mod lease;
pub mod lifecycle;
pub mod oracle;
pub mod service;
pub mod types;
pub mod waiter;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use compute::{ComputeApi, HttpComputeClient};
pub use error::{ControlError, Result};
pub use executor::{Action, ActionExecutor};
pub use lease::{Lease, LeaseGuard, LeaseRegistry, LeasedEngine};
pub use lifecycle::{RejectReason, Verdict};
pub use oracle::StateOracle;
pub use service::{TransitionController, TransitionEngine};
pub use types::{ComputeConfig, ControlConfig};
pub use waiter::{ConvergenceWaiter, WaitOutcome, WaitPolicy};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockCompute, Observation};

// Re-export commonly used types from dependencies for convenience
pub use powercycle_core::{
    LifecycleState, ResourceId, TransitionKind, TransitionOutcome, TransitionPhase,
    TransitionRequest, TransitionStatus,
};
pub use tokio_util::sync::CancellationToken;
