//! Integration tests for the panel provisioning endpoint
//!
//! Tests cover:
//! - Two-step provisioning (user account first, then server)
//! - Credential generation and customer-supplied passwords
//! - Required-field validation
//! - Upstream control-plane failures surfacing as 500s
//! - Orphaned user accounts on server-creation failure
//! - Operations-chat notification on success

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceExt;

use depstore_backend::api::panels::{create_panel, PanelsState};
use depstore_backend::config::ControlPlaneConfig;
use depstore_backend::middleware::error::options_preflight;
use depstore_backend::provisioner::client::ControlPlane;
use depstore_backend::provisioner::error::{ProvisionError, ProvisionResult};
use depstore_backend::provisioner::provision::Provisioner;
use depstore_backend::provisioner::types::{CreateServerRequest, CreateUserRequest};
use depstore_backend::services::notification::{
    NotificationSender, NotificationService, NotifyError,
};

/// Control-plane double recording the requests it receives and the order the
/// two calls arrive in.
struct StubControlPlane {
    fail_user_with: Option<u16>,
    fail_server_with: Option<u16>,
    user_calls: AtomicUsize,
    server_calls: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
    user_request: Mutex<Option<CreateUserRequest>>,
    server_request: Mutex<Option<CreateServerRequest>>,
}

impl StubControlPlane {
    fn healthy() -> Self {
        Self {
            fail_user_with: None,
            fail_server_with: None,
            user_calls: AtomicUsize::new(0),
            server_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            user_request: Mutex::new(None),
            server_request: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ControlPlane for StubControlPlane {
    async fn create_user(&self, request: &CreateUserRequest) -> ProvisionResult<u64> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push("create_user");
        *self.user_request.lock().unwrap() = Some(request.clone());
        if let Some(status) = self.fail_user_with {
            return Err(ProvisionError::UserCreationFailed { status });
        }
        Ok(42)
    }

    async fn create_server(&self, request: &CreateServerRequest) -> ProvisionResult<String> {
        self.server_calls.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push("create_server");
        *self.server_request.lock().unwrap() = Some(request.clone());
        if let Some(status) = self.fail_server_with {
            return Err(ProvisionError::ServerCreationFailed { status });
        }
        Ok("srv_a1b2c3".to_string())
    }
}

/// Captures outbound chat messages instead of talking to Telegram.
struct RecordingSender {
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn test_control_plane_config() -> ControlPlaneConfig {
    ControlPlaneConfig {
        base_url: "https://panel.depstore.test".to_string(),
        application_key: "ptla_test".to_string(),
        client_key: "ptlc_test".to_string(),
        email_domain: "panel.local".to_string(),
        request_timeout: 5,
    }
}

fn create_test_app(
    control_plane: Arc<StubControlPlane>,
    notifications: NotificationService,
) -> Router {
    let provisioner = Arc::new(Provisioner::new(control_plane, &test_control_plane_config()));
    let panels_state = PanelsState {
        provisioner,
        notifications,
    };

    Router::new()
        .route(
            "/api/create-panel",
            axum::routing::post(create_panel).options(options_preflight),
        )
        .with_state(panels_state)
}

fn panel_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/create-panel")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_panel_returns_credentials() {
    let control_plane = Arc::new(StubControlPlane::healthy());
    let app = create_test_app(control_plane.clone(), NotificationService::disabled());

    let response = app
        .oneshot(panel_request(json!({
            "panelName": "server-minecraft",
            "whatsapp": "08123456789",
            "ram": 2,
            "disk": 4,
            "cpu": 75
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let body = response_json(response).await;
    assert_eq!(body["domain"], "https://panel.depstore.test");
    assert_eq!(body["serverId"], "srv_a1b2c3");

    // Username is the sanitized 8-char prefix plus a numeric suffix
    let username = body["username"].as_str().unwrap();
    assert!(username.starts_with("servermi"), "got: {username}");
    assert!(username["servermi".len()..].parse::<u32>().unwrap() < 1000);

    // No password supplied, so the panel generated one
    assert_eq!(body["password"].as_str().unwrap().chars().count(), 12);

    // User account was created before the server that references it
    assert_eq!(
        *control_plane.calls.lock().unwrap(),
        vec!["create_user", "create_server"]
    );

    // GB in the request, MB at the control plane
    let server_request = control_plane.server_request.lock().unwrap();
    let server_request = server_request.as_ref().unwrap();
    assert_eq!(server_request.user, 42);
    assert_eq!(server_request.limits.memory, 2048);
    assert_eq!(server_request.limits.disk, 4096);
    assert_eq!(server_request.limits.cpu, 75);

    let user_request = control_plane.user_request.lock().unwrap();
    let user_request = user_request.as_ref().unwrap();
    assert_eq!(user_request.username, username);
    assert_eq!(user_request.email, format!("{}@panel.local", username));
}

#[tokio::test]
async fn test_create_panel_keeps_customer_password() {
    let control_plane = Arc::new(StubControlPlane::healthy());
    let app = create_test_app(control_plane.clone(), NotificationService::disabled());

    let response = app
        .oneshot(panel_request(json!({
            "panelName": "server-minecraft",
            "password": "S3cret!pw",
            "whatsapp": "08123456789",
            "ram": 1,
            "disk": 2,
            "cpu": 50
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["password"], "S3cret!pw");

    let user_request = control_plane.user_request.lock().unwrap();
    assert_eq!(user_request.as_ref().unwrap().password, "S3cret!pw");
}

#[tokio::test]
async fn test_create_panel_validates_required_fields() {
    let cases = [
        json!({ "whatsapp": "0812", "ram": 2, "disk": 4, "cpu": 75 }),
        json!({ "panelName": "server", "ram": 2, "disk": 4, "cpu": 75 }),
        json!({ "panelName": "server", "whatsapp": "0812", "disk": 4, "cpu": 75 }),
        json!({ "panelName": "server", "whatsapp": "0812", "ram": 0, "disk": 4, "cpu": 75 }),
        json!({ "panelName": "server", "whatsapp": "0812", "ram": 2, "cpu": 75 }),
        json!({ "panelName": "server", "whatsapp": "0812", "ram": 2, "disk": 4, "cpu": 0 }),
        json!({ "panelName": "", "whatsapp": "0812", "ram": 2, "disk": 4, "cpu": 75 }),
    ];

    for case in cases {
        let control_plane = Arc::new(StubControlPlane::healthy());
        let app = create_test_app(control_plane.clone(), NotificationService::disabled());

        let response = app.oneshot(panel_request(case.clone())).await.unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for {}",
            case
        );
        let body = response_json(response).await;
        assert_eq!(body["error"], "Missing required fields");
        assert_eq!(control_plane.user_calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_create_panel_user_failure_maps_to_500() {
    let control_plane = Arc::new(StubControlPlane {
        fail_user_with: Some(422),
        ..StubControlPlane::healthy()
    });
    let app = create_test_app(control_plane.clone(), NotificationService::disabled());

    let response = app
        .oneshot(panel_request(json!({
            "panelName": "server-minecraft",
            "whatsapp": "08123456789",
            "ram": 2,
            "disk": 4,
            "cpu": 75
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Failed to create user: 422");
    assert_eq!(control_plane.server_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_create_panel_server_failure_leaves_user_behind() {
    let control_plane = Arc::new(StubControlPlane {
        fail_server_with: Some(500),
        ..StubControlPlane::healthy()
    });
    let app = create_test_app(control_plane.clone(), NotificationService::disabled());

    let response = app
        .oneshot(panel_request(json!({
            "panelName": "server-minecraft",
            "whatsapp": "08123456789",
            "ram": 2,
            "disk": 4,
            "cpu": 75
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Failed to create server: 500");

    // The user account had already been created; it stays behind as an
    // orphan for manual cleanup.
    assert_eq!(control_plane.user_calls.load(Ordering::SeqCst), 1);
    assert_eq!(control_plane.server_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_create_panel_notifies_operations_chat() {
    let sender = Arc::new(RecordingSender {
        messages: Mutex::new(Vec::new()),
    });
    let (notifications, worker) = NotificationService::new(sender.clone(), 8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(worker.run(shutdown_rx));

    let control_plane = Arc::new(StubControlPlane::healthy());
    let app = create_test_app(control_plane, notifications);

    let response = app
        .oneshot(panel_request(json!({
            "panelName": "server-minecraft",
            "whatsapp": "08123456789",
            "ram": 2,
            "disk": 4,
            "cpu": 75
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // Delivery is asynchronous; give the worker a moment to drain the queue
    tokio::time::sleep(Duration::from_millis(100)).await;

    let messages = sender.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Pesanan Baru"));
    assert!(messages[0].contains("server-minecraft"));
    assert!(messages[0].contains("08123456789"));
    assert!(messages[0].contains("srv_a1b2c3"));
    assert!(messages[0].contains("RAM: 2 GB"));
}
