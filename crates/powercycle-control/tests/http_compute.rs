//! Tests for `HttpComputeClient` against a mocked compute API.

use std::sync::Arc;

use powercycle_control::{
    CancellationToken, ComputeApi, ComputeConfig, ControlConfig, ControlError, HttpComputeClient,
    LifecycleState, ResourceId, TransitionController, TransitionEngine, TransitionKind,
    TransitionRequest,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resource() -> ResourceId {
    ResourceId::new("i-0123456789abcdef0").unwrap()
}

fn client(server: &MockServer) -> HttpComputeClient {
    HttpComputeClient::new(&ComputeConfig::new(server.uri())).unwrap()
}

fn instance(state: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "instanceId": "i-0123456789abcdef0",
        "state": state,
    }))
}

#[tokio::test]
async fn describe_running_instance() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/i-0123456789abcdef0"))
        .respond_with(instance("running"))
        .expect(1)
        .mount(&server)
        .await;

    let state = client(&server).describe_state(&resource()).await.unwrap();
    assert_eq!(state, LifecycleState::Running);
}

#[tokio::test]
async fn describe_accepts_hyphenated_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/i-0123456789abcdef0"))
        .respond_with(instance("shutting-down"))
        .mount(&server)
        .await;

    let state = client(&server).describe_state(&resource()).await.unwrap();
    assert_eq!(state, LifecycleState::ShuttingDown);
}

#[tokio::test]
async fn describe_unknown_instance() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no such instance"})))
        .mount(&server)
        .await;

    let result = client(&server).describe_state(&resource()).await;
    assert!(matches!(result, Err(ControlError::ResourceNotFound(_))));
}

#[tokio::test]
async fn describe_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "throttled"})))
        .mount(&server)
        .await;

    let result = client(&server).describe_state(&resource()).await;
    match result {
        Err(ControlError::TransientQuery { message, .. }) => assert_eq!(message, "throttled"),
        other => panic!("expected transient query error, got {other:?}"),
    }
}

#[tokio::test]
async fn describe_unrecognized_state_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(instance("hibernating"))
        .mount(&server)
        .await;

    let result = client(&server).describe_state(&resource()).await;
    assert!(matches!(result, Err(ControlError::TransientQuery { .. })));
}

#[tokio::test]
async fn describe_unreachable_is_transient() {
    let client = HttpComputeClient::new(&ComputeConfig::new("http://127.0.0.1:1")).unwrap();

    let result = client.describe_state(&resource()).await;
    assert!(matches!(result, Err(ControlError::TransientQuery { .. })));
}

#[tokio::test]
async fn stop_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/instances/i-0123456789abcdef0/stop"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).stop(&resource()).await.unwrap();
}

#[tokio::test]
async fn start_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/instances/i-0123456789abcdef0/start"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"error": "IncorrectInstanceState"})),
        )
        .mount(&server)
        .await;

    let result = client(&server).start(&resource()).await;
    match result {
        Err(ControlError::ActionRejected { message, .. }) => {
            assert_eq!(message, "IncorrectInstanceState");
        }
        other => panic!("expected action rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(instance("stopped"))
        .expect(1)
        .mount(&server)
        .await;

    let config = ComputeConfig::new(server.uri()).with_token("s3cret");
    let client = HttpComputeClient::new(&config).unwrap();

    let state = client.describe_state(&resource()).await.unwrap();
    assert_eq!(state, LifecycleState::Stopped);
}

#[tokio::test]
async fn controller_starts_instance_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/i-0123456789abcdef0"))
        .respond_with(instance("stopped"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/i-0123456789abcdef0"))
        .respond_with(instance("running"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/instances/i-0123456789abcdef0/start"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let controller = TransitionController::new(Arc::new(client(&server)), ControlConfig::default());
    let outcome = controller
        .execute(
            &TransitionRequest::new(resource(), TransitionKind::Start),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome.status_code, 200);
    assert_eq!(outcome.new_state, Some(LifecycleState::Running));
}
