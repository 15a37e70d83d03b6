//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use powercycle_control::TransitionEngine;

use crate::state::GatewayState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Resource targeted by triggers that do not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    /// Whether shutdown has begun.
    pub draining: bool,
}

/// Health check handler.
///
/// Reports liveness only; the compute API is not contacted.
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "instanceId": "i-0123456789abcdef0",
///   "draining": false
/// }
/// ```
pub async fn health<E>(State(state): State<Arc<GatewayState<E>>>) -> impl IntoResponse
where
    E: TransitionEngine + 'static,
{
    let draining = state.shutdown.is_cancelled();
    let response = HealthResponse {
        status: if draining { "draining" } else { "healthy" },
        version: env!("CARGO_PKG_VERSION"),
        instance_id: state.config.instance_id.clone(),
        draining,
    };

    let status = if draining {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(response))
}
