//! Powercycle CLI - run one lifecycle transition from the terminal.
//!
//! This is the entry point for the `powercycle` binary. The transition runs
//! in-process against the compute API; the outcome is printed as JSON and
//! the exit status is non-zero unless it succeeded.

mod args;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;

use powercycle_control::{
    CancellationToken, HttpComputeClient, LifecycleState, ResourceId, TransitionController,
    TransitionEngine, TransitionRequest,
};

use args::Args;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    resource_id: String,
    state: LifecycleState,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        tracing_subscriber::fmt()
            .with_env_filter("powercycle=debug,warn")
            .with_writer(std::io::stderr)
            .init();
    }

    let resource_id = ResourceId::new(&args.instance_id)?;
    let compute = HttpComputeClient::new(&args.compute_config())?;
    let controller = TransitionController::new(Arc::new(compute), args.control_config());

    let Some(kind) = args.command.transition() else {
        let state = controller.describe(&resource_id).await?;
        let report = StatusReport {
            resource_id: resource_id.to_string(),
            state,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, abandoning wait");
            on_interrupt.cancel();
        }
    });

    let outcome = controller
        .execute(&TransitionRequest::new(resource_id, kind), &cancel)
        .await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
