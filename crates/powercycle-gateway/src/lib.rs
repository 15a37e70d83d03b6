//! HTTP trigger gateway for powercycle.
//!
//! This crate exposes the transition engine to the outside world. It handles:
//!
//! - Storage upload notifications (key prefix selects the transition)
//! - Scheduled ticks
//! - Direct transition requests and state lookups
//!
//! Every transition response carries the outcome body, and its HTTP status
//! equals the outcome's `statusCode`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          Storage events / schedules / operators              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    powercycle-gateway                        │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │   Event     │ │   Router    │ │  Shutdown token     │   │
//! │  │   Parsing   │ │  + Handlers │ │  (cancels waits)    │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                  ┌──────────────────────┐
//!                  │  TransitionEngine    │
//!                  └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use powercycle_control::{
//!     ComputeConfig, ControlConfig, HttpComputeClient, LeasedEngine, TransitionController,
//! };
//! use powercycle_gateway::{create_router, GatewayConfig, GatewayState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let compute = HttpComputeClient::new(&ComputeConfig::new("http://compute:8080"))?;
//! let controller = TransitionController::new(Arc::new(compute), ControlConfig::default());
//! let engine = Arc::new(LeasedEngine::new(controller));
//!
//! let state = GatewayState::new(engine, GatewayConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::{GatewayConfig, TriggerRules};
pub use error::ApiError;
pub use events::{EventError, ScheduleEvent, StorageEvent, StorageMatch};
pub use routes::create_router;
pub use state::GatewayState;
