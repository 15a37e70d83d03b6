//! HTTP client for the compute control plane.
//!
//! This module provides the [`ComputeApi`] trait, the control-plane boundary
//! the engine talks through, and [`HttpComputeClient`], which speaks the
//! compute service's REST API.

use std::time::Duration;

use async_trait::async_trait;
use powercycle_core::{LifecycleState, ResourceId};
use serde::Deserialize;

use crate::error::{ControlError, Result};
use crate::executor::Action;
use crate::types::ComputeConfig;

/// Trait for control-plane communication.
///
/// This trait abstracts the compute API, allowing for scripted
/// implementations in tests. Commands are asynchronous on the control plane:
/// `stop` and `start` return once the request is accepted, not once the
/// resource has changed state.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Describe the resource's current lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ResourceNotFound` if the control plane does not
    /// know the resource and `ControlError::TransientQuery` on any other
    /// failure.
    async fn describe_state(&self, resource_id: &ResourceId) -> Result<LifecycleState>;

    /// Request that the resource stop.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ActionRejected` if the request is refused.
    async fn stop(&self, resource_id: &ResourceId) -> Result<()>;

    /// Request that the resource start.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::ActionRejected` if the request is refused.
    async fn start(&self, resource_id: &ResourceId) -> Result<()>;
}

/// HTTP client for the compute service.
#[derive(Debug, Clone)]
pub struct HttpComputeClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpComputeClient {
    /// Create a new compute client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Config` if the base URL is empty or the HTTP
    /// client cannot be built.
    pub fn new(config: &ComputeConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ControlError::Config("compute API URL is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ControlError::Config(format!("Failed to create HTTP client: {e}")))?;

        let mut compute = Self::with_client(client, &config.base_url);
        compute.api_token.clone_from(&config.api_token);
        Ok(compute)
    }

    /// Create a new compute client with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
        }
    }

    /// Get the base URL of the compute service.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn instance_url(&self, resource_id: &ResourceId) -> String {
        format!("{}/v1/instances/{}", self.base_url, resource_id)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn issue(&self, resource_id: &ResourceId, action: Action) -> Result<()> {
        let url = format!("{}/{}", self.instance_url(resource_id), action);

        let response = self
            .authorize(self.client.post(&url))
            .send()
            .await
            .map_err(|e| ControlError::ActionRejected {
                resource_id: resource_id.clone(),
                action,
                message: format!("request failed: {e}"),
            })?;

        if response.status().is_success() {
            tracing::debug!(resource_id = %resource_id, action = %action, "Compute API accepted command");
            Ok(())
        } else {
            let status = response.status();
            let error = error_message(response).await;

            tracing::error!(
                resource_id = %resource_id,
                action = %action,
                status = %status,
                error = %error,
                "Compute API refused command"
            );

            Err(ControlError::ActionRejected {
                resource_id: resource_id.clone(),
                action,
                message: error,
            })
        }
    }
}

/// Describe response from the compute service.
#[derive(Debug, Deserialize)]
struct InstanceResponse {
    state: String,
}

/// Error response from the compute service.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    response
        .json::<ErrorResponse>()
        .await
        .map(|e| e.error)
        .unwrap_or_else(|_| format!("Compute API returned status {status}"))
}

#[async_trait]
impl ComputeApi for HttpComputeClient {
    async fn describe_state(&self, resource_id: &ResourceId) -> Result<LifecycleState> {
        let transient = |message: String| ControlError::TransientQuery {
            resource_id: resource_id.clone(),
            message,
        };

        let response = self
            .authorize(self.client.get(self.instance_url(resource_id)))
            .send()
            .await
            .map_err(|e| transient(format!("request failed: {e}")))?;

        if response.status().is_success() {
            let body = response
                .json::<InstanceResponse>()
                .await
                .map_err(|e| transient(format!("failed to parse response: {e}")))?;
            LifecycleState::from_api_name(&body.state).map_err(|e| transient(e.to_string()))
        } else if response.status() == reqwest::StatusCode::NOT_FOUND {
            Err(ControlError::ResourceNotFound(resource_id.clone()))
        } else {
            Err(transient(error_message(response).await))
        }
    }

    async fn stop(&self, resource_id: &ResourceId) -> Result<()> {
        self.issue(resource_id, Action::Stop).await
    }

    async fn start(&self, resource_id: &ResourceId) -> Result<()> {
        self.issue(resource_id, Action::Start).await
    }
}
