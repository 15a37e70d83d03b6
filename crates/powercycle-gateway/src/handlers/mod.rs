//! HTTP request handlers.
//!
//! This module contains all the endpoint handlers for the gateway API.

pub mod events;
pub mod health;
pub mod transitions;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use powercycle_control::{ControlError, TransitionEngine};
use powercycle_core::{ResourceId, TransitionKind, TransitionOutcome, TransitionRequest};

use crate::error::ApiError;
use crate::state::GatewayState;

/// Render an outcome with its own status code.
pub(crate) fn outcome_response(outcome: TransitionOutcome) -> Response {
    let status =
        StatusCode::from_u16(outcome.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome)).into_response()
}

/// Run `kind` against `resource_id`, or the configured instance if none is
/// given.
///
/// Once the request timeout passes the transition is cancelled and its
/// cancelled outcome is returned.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` if `resource_id` is not a valid identifier.
pub(crate) async fn run_transition<E>(
    state: &GatewayState<E>,
    resource_id: Option<&str>,
    kind: TransitionKind,
) -> Result<Response, ApiError>
where
    E: TransitionEngine + 'static,
{
    let resource_id = match resource_id.or(state.config.instance_id.as_deref()) {
        Some(id) => ResourceId::new(id)?,
        None => {
            tracing::error!(kind = %kind, "No resource id in request and INSTANCE_ID is not set");
            let err = ControlError::Config("INSTANCE_ID is not set".to_string());
            return Ok(outcome_response(err.to_outcome("")));
        }
    };

    let request = TransitionRequest::new(resource_id, kind);
    let cancel = state.shutdown.child_token();
    let deadline = state.config.request_timeout();

    let execute = state.engine.execute(&request, &cancel);
    tokio::pin!(execute);
    let outcome = tokio::select! {
        outcome = &mut execute => outcome,
        () = tokio::time::sleep(deadline) => {
            tracing::warn!(
                resource_id = %request.resource_id,
                kind = %kind,
                deadline_seconds = deadline.as_secs(),
                "Request deadline reached, cancelling transition"
            );
            cancel.cancel();
            execute.await
        }
    };

    Ok(outcome_response(outcome))
}
