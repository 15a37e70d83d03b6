//! Powercycle Gateway - HTTP trigger service
//!
//! This is the main entry point for the gateway service. It wires the HTTP
//! compute client into a leased transition controller and serves the
//! trigger endpoints until Ctrl-C (or SIGTERM on Unix).
//!
//! # Configuration
//!
//! `COMPUTE_API_URL` is required. See `ComputeConfig::from_env`,
//! `ControlConfig::from_env` and `GatewayConfig::from_env` for the rest.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use powercycle_control::{
    CancellationToken, ComputeConfig, ControlConfig, HttpComputeClient, LeasedEngine,
    TransitionController,
};
use powercycle_gateway::{create_router, GatewayConfig, GatewayState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,powercycle=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Powercycle Gateway");

    // Load configuration from environment
    let compute_config = ComputeConfig::from_env()?;
    let control_config = ControlConfig::from_env();
    let gateway_config = GatewayConfig::from_env();

    tracing::info!(
        listen_addr = %gateway_config.listen_addr,
        compute_url = %compute_config.base_url,
        instance_id = ?gateway_config.instance_id,
        trigger_bucket = ?gateway_config.trigger_bucket,
        poll_interval_seconds = control_config.poll_interval_seconds,
        max_wait_seconds = control_config.max_wait_seconds,
        "Gateway configuration loaded"
    );

    if gateway_config.instance_id.is_none() {
        tracing::warn!("No INSTANCE_ID set - event triggers will fail with config_error");
    }

    let budget = control_config.transition_budget();
    if gateway_config.request_timeout() < budget {
        tracing::warn!(
            request_timeout_seconds = gateway_config.request_timeout_seconds,
            transition_budget_seconds = budget.as_secs(),
            "REQUEST_TIMEOUT_SECONDS is shorter than a worst-case reboot - long transitions will be cancelled"
        );
    }

    let compute = Arc::new(HttpComputeClient::new(&compute_config)?);
    let engine = Arc::new(LeasedEngine::new(TransitionController::new(
        compute,
        control_config,
    )));

    let shutdown = CancellationToken::new();
    let listen_addr = gateway_config.listen_addr.clone();
    let state = GatewayState::with_shutdown(engine, gateway_config, shutdown.clone());
    let app = create_router(state);

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, cancelling in-flight transitions first.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("Shutdown signal received, cancelling in-flight transitions");
    shutdown.cancel();
}
