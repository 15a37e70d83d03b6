//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use powercycle_control::TransitionEngine;

use crate::handlers::{events, health, transitions};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
/// - `POST /v1/transitions` - Run a transition
/// - `GET /v1/resources/:resource_id/state` - Current lifecycle state
/// - `POST /v1/events/storage` - Storage upload notification
/// - `POST /v1/events/schedule` - Schedule tick
pub fn create_router<E>(state: GatewayState<E>) -> Router
where
    E: TransitionEngine + 'static,
{
    // Extract config values before moving state
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    // Quick lookups get a hard timeout. Transition routes enforce the same
    // deadline themselves by cancelling the wait, so a long reboot still
    // answers with an outcome body.
    let lookups = Router::new()
        .route("/health", get(health::health::<E>))
        .route(
            "/v1/resources/:resource_id/state",
            get(transitions::get_state::<E>),
        )
        .layer(TimeoutLayer::new(request_timeout));

    let triggers = Router::new()
        .route("/v1/transitions", post(transitions::create_transition::<E>))
        .route("/v1/events/storage", post(events::storage_event::<E>))
        .route("/v1/events/schedule", post(events::schedule_event::<E>));

    lookups
        .merge(triggers)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}
