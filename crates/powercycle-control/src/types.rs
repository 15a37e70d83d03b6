//! Configuration types for the transition engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};
use crate::waiter::WaitPolicy;

/// Configuration for the transition controller.
///
/// The defaults mirror the usual cloud waiter budget: poll every 15 seconds
/// for up to 10 minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Interval between state polls while waiting (seconds).
    pub poll_interval_seconds: u64,
    /// Upper bound on each convergence wait (seconds).
    pub max_wait_seconds: u64,
    /// Attempts for the initial state query before giving up.
    pub query_attempts: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 15,
            max_wait_seconds: 600,
            query_attempts: 3,
        }
    }
}

impl ControlConfig {
    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `POLL_INTERVAL_SECONDS`: interval between state polls
    /// - `MAX_WAIT_SECONDS`: upper bound on each convergence wait
    /// - `QUERY_ATTEMPTS`: attempts for the initial state query
    ///
    /// Unset or unparseable values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(n) = env_parse("POLL_INTERVAL_SECONDS") {
            config.poll_interval_seconds = n;
        }
        if let Some(n) = env_parse("MAX_WAIT_SECONDS") {
            config.max_wait_seconds = n;
        }
        if let Some(n) = env_parse("QUERY_ATTEMPTS") {
            config.query_attempts = n;
        }

        config
    }

    /// Get the poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Get the maximum wait as a `Duration`.
    #[must_use]
    pub const fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_seconds)
    }

    /// The wait policy applied to every convergence phase.
    #[must_use]
    pub const fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(self.poll_interval(), self.max_wait())
    }

    /// Longest a single transition can take: initial query retries plus
    /// both waits of a reboot.
    #[must_use]
    pub fn transition_budget(&self) -> Duration {
        let retries = self
            .poll_interval()
            .saturating_mul(self.query_attempts.saturating_sub(1));
        retries.saturating_add(self.max_wait().saturating_mul(2))
    }
}

/// Configuration for the HTTP compute client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// Base URL of the compute API (e.g., "http://compute:8080").
    pub base_url: String,
    /// Bearer token sent with every request, if set.
    #[serde(default, skip_serializing)]
    pub api_token: Option<String>,
    /// Per-request timeout (seconds).
    #[serde(default = "ComputeConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl ComputeConfig {
    const fn default_request_timeout() -> u64 {
        30
    }

    /// Create a config for the given base URL with default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `COMPUTE_API_URL`: base URL of the compute API (required)
    /// - `COMPUTE_API_TOKEN`: bearer token
    /// - `COMPUTE_REQUEST_TIMEOUT_SECONDS`: per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Config` if `COMPUTE_API_URL` is unset or empty.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("COMPUTE_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ControlError::Config("COMPUTE_API_URL is not set".to_string()))?;

        let mut config = Self::new(base_url);
        config.api_token = std::env::var("COMPUTE_API_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());
        if let Some(n) = env_parse("COMPUTE_REQUEST_TIMEOUT_SECONDS") {
            config.request_timeout_seconds = n;
        }

        Ok(config)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.parse().ok())
}
