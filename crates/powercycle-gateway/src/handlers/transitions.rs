//! Direct transition and state endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use powercycle_control::TransitionEngine;
use powercycle_core::{LifecycleState, ResourceId, TransitionKind};

use crate::error::ApiError;
use crate::handlers::run_transition;
use crate::state::GatewayState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to run a transition.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionBody {
    /// Target resource; the configured instance when absent.
    #[serde(default)]
    pub resource_id: Option<String>,
    /// `start`, `stop` or `reboot`.
    pub transition_kind: String,
}

/// Current state of a resource.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateResponse {
    /// Resource identifier.
    pub resource_id: String,
    /// Observed lifecycle state.
    pub state: LifecycleState,
}

// =============================================================================
// Handlers
// =============================================================================

/// Run a transition and block until it finishes.
///
/// The response body is the transition outcome and the HTTP status matches
/// its `statusCode`.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for an unknown transition kind or an
/// invalid resource id.
pub async fn create_transition<E>(
    State(state): State<Arc<GatewayState<E>>>,
    Json(body): Json<TransitionBody>,
) -> Result<Response, ApiError>
where
    E: TransitionEngine + 'static,
{
    let kind: TransitionKind = body
        .transition_kind
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    run_transition(&state, body.resource_id.as_deref(), kind).await
}

/// Report a resource's current lifecycle state.
///
/// # Errors
///
/// Returns `ApiError::NotFound` for unknown resources and
/// `ApiError::Unavailable` if the compute API cannot be reached.
pub async fn get_state<E>(
    State(state): State<Arc<GatewayState<E>>>,
    Path(resource_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    E: TransitionEngine + 'static,
{
    let resource_id = ResourceId::new(&resource_id)?;
    let observed = state.engine.describe(&resource_id).await?;

    Ok(Json(StateResponse {
        resource_id: resource_id.to_string(),
        state: observed,
    }))
}
