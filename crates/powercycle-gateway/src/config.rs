//! Gateway configuration types.
//!
//! This module defines the listener settings and the trigger rules that map
//! inbound events onto transitions.

use std::time::Duration;

use powercycle_core::TransitionKind;
use serde::Deserialize;

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Resource targeted when a trigger does not name one.
    #[serde(default)]
    pub instance_id: Option<String>,

    /// Only storage events from this bucket are accepted, if set.
    #[serde(default)]
    pub trigger_bucket: Option<String>,

    /// Object key prefix that triggers a stop.
    #[serde(default = "GatewayConfig::default_stop_prefix")]
    pub stop_prefix: String,

    /// Object key prefix that triggers a reboot.
    #[serde(default = "GatewayConfig::default_reboot_prefix")]
    pub reboot_prefix: String,

    /// Object key prefix that triggers a start, if any.
    #[serde(default)]
    pub start_prefix: Option<String>,

    /// Transition run by schedule ticks that do not name one.
    #[serde(default = "GatewayConfig::default_schedule_transition")]
    pub schedule_transition: TransitionKind,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds. Transitions still running at this point
    /// are cancelled; lookups are aborted with 408.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_stop_prefix() -> String {
        "complete/".to_string()
    }

    fn default_reboot_prefix() -> String {
        "reboot/".to_string()
    }

    const fn default_schedule_transition() -> TransitionKind {
        TransitionKind::Start
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        1800 // 30 minutes
    }

    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `LISTEN_ADDR`: listen address
    /// - `INSTANCE_ID`: default target resource
    /// - `TRIGGER_BUCKET`: bucket filter for storage events
    /// - `STOP_PREFIX`, `REBOOT_PREFIX`, `START_PREFIX`: key prefixes
    /// - `SCHEDULE_TRANSITION`: transition run by schedule ticks
    /// - `MAX_BODY_BYTES`: maximum request body size
    /// - `REQUEST_TIMEOUT_SECONDS`: request timeout
    ///
    /// Unset, empty or unparseable values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(addr) = env_string("LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        config.instance_id = env_string("INSTANCE_ID");
        config.trigger_bucket = env_string("TRIGGER_BUCKET");
        if let Some(prefix) = env_string("STOP_PREFIX") {
            config.stop_prefix = prefix;
        }
        if let Some(prefix) = env_string("REBOOT_PREFIX") {
            config.reboot_prefix = prefix;
        }
        config.start_prefix = env_string("START_PREFIX");
        if let Some(kind) = env_string("SCHEDULE_TRANSITION").and_then(|v| v.parse().ok()) {
            config.schedule_transition = kind;
        }
        if let Some(n) = env_string("MAX_BODY_BYTES").and_then(|v| v.parse().ok()) {
            config.max_body_bytes = n;
        }
        if let Some(n) = env_string("REQUEST_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            config.request_timeout_seconds = n;
        }

        config
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// The storage-event rules derived from this configuration.
    #[must_use]
    pub fn trigger_rules(&self) -> TriggerRules {
        TriggerRules {
            bucket: self.trigger_bucket.clone(),
            stop_prefix: self.stop_prefix.clone(),
            reboot_prefix: self.reboot_prefix.clone(),
            start_prefix: self.start_prefix.clone(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            instance_id: None,
            trigger_bucket: None,
            stop_prefix: Self::default_stop_prefix(),
            reboot_prefix: Self::default_reboot_prefix(),
            start_prefix: None,
            schedule_transition: Self::default_schedule_transition(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

/// Maps storage upload events onto transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRules {
    /// Accepted bucket; any bucket when unset.
    pub bucket: Option<String>,
    /// Key prefix for stop.
    pub stop_prefix: String,
    /// Key prefix for reboot.
    pub reboot_prefix: String,
    /// Key prefix for start.
    pub start_prefix: Option<String>,
}

impl TriggerRules {
    /// Whether events from `bucket` are accepted.
    #[must_use]
    pub fn accepts_bucket(&self, bucket: &str) -> bool {
        !matches!(self.bucket.as_deref(), Some(b) if b != bucket)
    }

    /// The transition selected by an object key, if any.
    ///
    /// When prefixes overlap the longest one wins.
    #[must_use]
    pub fn transition_for_key(&self, key: &str) -> Option<TransitionKind> {
        let candidates = [
            (Some(self.stop_prefix.as_str()), TransitionKind::Stop),
            (Some(self.reboot_prefix.as_str()), TransitionKind::Reboot),
            (self.start_prefix.as_deref(), TransitionKind::Start),
        ];

        candidates
            .into_iter()
            .filter_map(|(prefix, kind)| prefix.map(|p| (p, kind)))
            .filter(|(prefix, _)| !prefix.is_empty() && key.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, kind)| kind)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
