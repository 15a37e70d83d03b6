//! Event trigger endpoints.
//!
//! Storage notifications and schedule ticks are mapped onto a transition
//! for the configured instance.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;

use powercycle_control::TransitionEngine;

use crate::error::ApiError;
use crate::events::{ScheduleEvent, StorageEvent};
use crate::handlers::run_transition;
use crate::state::GatewayState;

/// Handle a storage upload notification.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` if no record matches a trigger prefix.
pub async fn storage_event<E>(
    State(state): State<Arc<GatewayState<E>>>,
    Json(event): Json<StorageEvent>,
) -> Result<Response, ApiError>
where
    E: TransitionEngine + 'static,
{
    let matched = event.select(&state.config.trigger_rules())?;

    tracing::info!(
        bucket = %matched.bucket,
        key = %matched.key,
        kind = %matched.kind,
        event_time = ?matched.event_time,
        "Storage event matched"
    );

    run_transition(&state, None, matched.kind).await
}

/// Handle a schedule tick.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` if the tick names an unknown transition.
pub async fn schedule_event<E>(
    State(state): State<Arc<GatewayState<E>>>,
    Json(event): Json<ScheduleEvent>,
) -> Result<Response, ApiError>
where
    E: TransitionEngine + 'static,
{
    let kind = event.transition(state.config.schedule_transition)?;

    tracing::info!(
        source = ?event.source,
        time = ?event.time,
        kind = %kind,
        "Schedule tick received"
    );

    run_transition(&state, None, kind).await
}
