//! End-to-end tests for the gateway router over a scripted compute API.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use powercycle_control::{
    CancellationToken, ControlConfig, LeasedEngine, LifecycleState, MockCompute, ResourceId,
    TransitionController,
};
use powercycle_gateway::{create_router, GatewayConfig, GatewayState};

type Engine = LeasedEngine<TransitionController<MockCompute>>;

const INSTANCE: &str = "i-0123456789abcdef0";

fn resource() -> ResourceId {
    ResourceId::new(INSTANCE).unwrap()
}

fn gateway_config() -> GatewayConfig {
    GatewayConfig {
        instance_id: Some(INSTANCE.to_string()),
        ..GatewayConfig::default()
    }
}

fn fast_control() -> ControlConfig {
    ControlConfig {
        poll_interval_seconds: 1,
        max_wait_seconds: 5,
        query_attempts: 1,
    }
}

fn server_with(
    compute: &Arc<MockCompute>,
    config: GatewayConfig,
    control: ControlConfig,
    shutdown: CancellationToken,
) -> TestServer {
    let engine: Arc<Engine> = Arc::new(LeasedEngine::new(TransitionController::new(
        Arc::clone(compute),
        control,
    )));
    let state = GatewayState::with_shutdown(engine, config, shutdown);
    TestServer::new(create_router(state)).unwrap()
}

fn setup(state: LifecycleState) -> (TestServer, Arc<MockCompute>) {
    let compute = Arc::new(MockCompute::new().with_resource(resource(), state));
    let server = server_with(
        &compute,
        gateway_config(),
        fast_control(),
        CancellationToken::new(),
    );
    (server, compute)
}

fn upload(key: &str) -> Value {
    json!({
        "Records": [{
            "eventName": "ObjectCreated:Put",
            "eventTime": "2024-05-01T12:00:00.000Z",
            "s3": {"bucket": {"name": "jobs"}, "object": {"key": key}}
        }]
    })
}

#[tokio::test]
async fn health_reports_instance() {
    let (server, _compute) = setup(LifecycleState::Running);

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["instanceId"], INSTANCE);
}

#[tokio::test]
async fn direct_stop_succeeds() {
    let (server, compute) = setup(LifecycleState::Running);
    compute.on_stop(&resource(), [LifecycleState::Stopped]);

    let response = server
        .post("/v1/transitions")
        .json(&json!({"transitionKind": "stop"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["status"], "success");
    assert_eq!(body["resourceId"], INSTANCE);
    assert_eq!(body["newState"], "stopped");
    assert_eq!(compute.stop_calls(&resource()), 1);
}

#[tokio::test]
async fn precondition_failure_uses_outcome_status() {
    let (server, compute) = setup(LifecycleState::Stopped);

    let response = server
        .post("/v1/transitions")
        .json(&json!({"resourceId": INSTANCE, "transitionKind": "reboot"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["errorCode"], "not_running");
    assert_eq!(body["newState"], "stopped");
    assert_eq!(compute.stop_calls(&resource()), 0);
}

#[tokio::test]
async fn missing_instance_is_config_error() {
    let compute = Arc::new(MockCompute::new().with_resource(resource(), LifecycleState::Running));
    let server = server_with(
        &compute,
        GatewayConfig::default(),
        fast_control(),
        CancellationToken::new(),
    );

    let response = server
        .post("/v1/transitions")
        .json(&json!({"transitionKind": "stop"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["errorCode"], "config_error");
    assert_eq!(body["resourceId"], "");
    assert_eq!(compute.describe_calls(&resource()), 0);
}

#[tokio::test]
async fn unknown_transition_kind_is_bad_request() {
    let (server, _compute) = setup(LifecycleState::Running);

    let response = server
        .post("/v1/transitions")
        .json(&json!({"transitionKind": "hibernate"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn storage_upload_stops_instance() {
    let (server, compute) = setup(LifecycleState::Running);
    compute.on_stop(&resource(), [LifecycleState::Stopped]);

    let response = server
        .post("/v1/events/storage")
        .json(&upload("complete/run-42.json"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["message"], "resource stopped successfully");
}

#[tokio::test]
async fn storage_upload_reboots_instance() {
    let (server, compute) = setup(LifecycleState::Running);
    compute.on_stop(&resource(), [LifecycleState::Stopped]);
    compute.on_start(&resource(), [LifecycleState::Running]);

    let response = server
        .post("/v1/events/storage")
        .json(&upload("reboot/now"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["newState"], "running");
    assert_eq!(compute.stop_calls(&resource()), 1);
    assert_eq!(compute.start_calls(&resource()), 1);
}

#[tokio::test]
async fn unmatched_upload_is_rejected() {
    let (server, compute) = setup(LifecycleState::Running);

    let response = server
        .post("/v1/events/storage")
        .json(&upload("logs/app.log"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(compute.describe_calls(&resource()), 0);
}

#[tokio::test]
async fn schedule_tick_runs_default_transition() {
    let (server, compute) = setup(LifecycleState::Stopped);
    compute.on_start(&resource(), [LifecycleState::Pending, LifecycleState::Running]);

    let response = server
        .post("/v1/events/schedule")
        .json(&json!({
            "source": "aws.events",
            "detail-type": "Scheduled Event",
            "time": "2024-05-01T09:00:00Z",
            "detail": {}
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["newState"], "running");
}

#[tokio::test]
async fn schedule_tick_names_transition() {
    let (server, compute) = setup(LifecycleState::Running);
    compute.on_stop(&resource(), [LifecycleState::Stopped]);

    let response = server
        .post("/v1/events/schedule")
        .json(&json!({"detail": {"transition": "stop"}}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(compute.stop_calls(&resource()), 1);
}

#[tokio::test]
async fn state_lookup() {
    let (server, _compute) = setup(LifecycleState::ShuttingDown);

    let response = server
        .get(&format!("/v1/resources/{INSTANCE}/state"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["resourceId"], INSTANCE);
    assert_eq!(body["state"], "shutting-down");
}

#[tokio::test]
async fn state_lookup_unknown_resource() {
    let (server, _compute) = setup(LifecycleState::Running);

    let response = server.get("/v1/resources/i-missing/state").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn shutdown_cancels_waits() {
    let compute = Arc::new(MockCompute::new().with_resource(resource(), LifecycleState::Running));
    compute.on_stop(&resource(), [LifecycleState::Stopping]);
    let shutdown = CancellationToken::new();
    let server = server_with(&compute, gateway_config(), fast_control(), shutdown.clone());
    shutdown.cancel();

    let response = server
        .post("/v1/transitions")
        .json(&json!({"transitionKind": "stop"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["errorCode"], "stop_phase_cancelled");
    assert_eq!(body["newState"], "running");
    assert_eq!(compute.stop_calls(&resource()), 0);

    let health = server.get("/health").await;
    assert_eq!(health.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test(start_paused = true)]
async fn request_deadline_cancels_long_reboot() {
    let compute = Arc::new(MockCompute::new().with_resource(resource(), LifecycleState::Running));
    compute.on_stop(&resource(), [LifecycleState::Stopping, LifecycleState::Stopped]);
    compute.on_start(&resource(), [LifecycleState::Pending]);
    let config = GatewayConfig {
        request_timeout_seconds: 30,
        ..gateway_config()
    };
    let control = ControlConfig {
        poll_interval_seconds: 5,
        max_wait_seconds: 600,
        query_attempts: 1,
    };
    let server = server_with(&compute, config, control, CancellationToken::new());

    let response = server
        .post("/v1/transitions")
        .json(&json!({"transitionKind": "reboot"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["errorCode"], "start_phase_cancelled");
    assert_eq!(body["newState"], "pending");
    assert_eq!(compute.stop_calls(&resource()), 1);
    assert_eq!(compute.start_calls(&resource()), 1);
}
