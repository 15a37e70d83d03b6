//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use powercycle_control::{CancellationToken, TransitionEngine};

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
pub struct GatewayState<E>
where
    E: TransitionEngine,
{
    /// The engine transitions run on.
    pub engine: Arc<E>,
    /// Gateway configuration.
    pub config: GatewayConfig,
    /// Cancelled on shutdown; every transition waits on a child token.
    pub shutdown: CancellationToken,
}

impl<E> GatewayState<E>
where
    E: TransitionEngine,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(engine: Arc<E>, config: GatewayConfig) -> Self {
        Self::with_shutdown(engine, config, CancellationToken::new())
    }

    /// Create a gateway state tied to an existing shutdown token.
    #[must_use]
    pub fn with_shutdown(engine: Arc<E>, config: GatewayConfig, shutdown: CancellationToken) -> Self {
        Self {
            engine,
            config,
            shutdown,
        }
    }
}

impl<E> Clone for GatewayState<E>
where
    E: TransitionEngine,
{
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            config: self.config.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}
