//! End-to-end tests for the order pipeline
//!
//! Drives a full customer session against stubbed upstreams: package
//! selection, order submission, QRIS settlement watching, two-step
//! provisioning and the operations-chat notification. Also covers the
//! paths that stop short of success (abandoned payment, provisioning
//! failure after a settled payment).

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use depstore_backend::config::{ControlPlaneConfig, WatcherConfig};
use depstore_backend::error::AppError;
use depstore_backend::payments::error::PaymentResult;
use depstore_backend::payments::provider::PaymentGateway;
use depstore_backend::payments::types::{PaymentIntent, PaymentStatus};
use depstore_backend::provisioner::client::ControlPlane;
use depstore_backend::provisioner::error::{ProvisionError, ProvisionResult};
use depstore_backend::provisioner::provision::Provisioner;
use depstore_backend::provisioner::types::{CreateServerRequest, CreateUserRequest};
use depstore_backend::services::notification::{
    NotificationSender, NotificationService, NotifyError,
};
use depstore_backend::services::order_orchestrator::{
    OrderFlow, OrderRequest, OrderState, OrchestratorError,
};

// ---------------------------------------------------------------------------
// Upstream doubles
// ---------------------------------------------------------------------------

/// Gateway whose status polls play back a script, then repeat the last entry.
struct ScriptedGateway {
    intent_calls: AtomicUsize,
    poll_calls: AtomicUsize,
    /// Poll answers in reverse order so `pop` yields the next one.
    script: Mutex<Vec<PaymentStatus>>,
}

impl ScriptedGateway {
    fn with_polls(polls: Vec<PaymentStatus>) -> Arc<Self> {
        let mut script = polls;
        script.reverse();
        Arc::new(Self {
            intent_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            script: Mutex::new(script),
        })
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_intent(&self, amount: u64) -> PaymentResult<PaymentIntent> {
        let n = self.intent_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentIntent {
            order_id: format!("order_{}", 1_755_945_600_000u64 + n as u64),
            qr_code_url: "https://gateway.test/qr.png".to_string(),
            amount_to_pay: amount,
        })
    }

    async fn poll_status(&self, _order_id: &str) -> PaymentResult<PaymentStatus> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        let status = if script.len() > 1 {
            script.pop().unwrap()
        } else {
            script.last().cloned().unwrap_or(PaymentStatus::Pending)
        };
        Ok(status)
    }
}

struct RecordingControlPlane {
    fail_server_with: Option<u16>,
    calls: Mutex<Vec<&'static str>>,
    user_request: Mutex<Option<CreateUserRequest>>,
    server_request: Mutex<Option<CreateServerRequest>>,
}

impl RecordingControlPlane {
    fn healthy() -> Arc<Self> {
        Arc::new(Self {
            fail_server_with: None,
            calls: Mutex::new(Vec::new()),
            user_request: Mutex::new(None),
            server_request: Mutex::new(None),
        })
    }

    fn server_failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            fail_server_with: Some(status),
            calls: Mutex::new(Vec::new()),
            user_request: Mutex::new(None),
            server_request: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ControlPlane for RecordingControlPlane {
    async fn create_user(&self, request: &CreateUserRequest) -> ProvisionResult<u64> {
        self.calls.lock().unwrap().push("create_user");
        *self.user_request.lock().unwrap() = Some(request.clone());
        Ok(42)
    }

    async fn create_server(&self, request: &CreateServerRequest) -> ProvisionResult<String> {
        self.calls.lock().unwrap().push("create_server");
        *self.server_request.lock().unwrap() = Some(request.clone());
        if let Some(status) = self.fail_server_with {
            return Err(ProvisionError::ServerCreationFailed { status });
        }
        Ok("srv_e2e01".to_string())
    }
}

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

fn test_provisioner(control_plane: Arc<RecordingControlPlane>) -> Arc<Provisioner> {
    let config = ControlPlaneConfig {
        base_url: "https://panel.depstore.test".to_string(),
        application_key: "ptla_test".to_string(),
        client_key: "ptlc_test".to_string(),
        email_domain: "panel.local".to_string(),
        request_timeout: 5,
    };
    Arc::new(Provisioner::new(control_plane, &config))
}

// ---------------------------------------------------------------------------
// Happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_full_order_reaches_provisioned_panel() {
    let gateway = ScriptedGateway::with_polls(vec![
        PaymentStatus::Pending,
        PaymentStatus::Settlement,
    ]);
    let control_plane = RecordingControlPlane::healthy();

    let sender = Arc::new(RecordingSender {
        messages: Mutex::new(Vec::new()),
    });
    let (notifications, worker) = NotificationService::new(sender.clone(), 8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(worker.run(shutdown_rx));

    let mut flow = OrderFlow::new(
        gateway.clone(),
        test_provisioner(control_plane.clone()),
        notifications,
        WatcherConfig { poll_interval: 1 },
    );
    assert_eq!(flow.state(), OrderState::Select);

    // Browse: pick the 2 GB package
    let package = flow.select_package("2gb").unwrap();
    assert_eq!(package.price, 15_000);
    assert_eq!(flow.state(), OrderState::Form);

    // Fill the form; a dashed WhatsApp number is normalized to digits
    let order = OrderRequest::new("server-minecraft", None, "0812-3456-789").unwrap();
    assert_eq!(order.whatsapp_number, "08123456789");

    let intent = flow.submit_order(order).await.unwrap();
    assert_eq!(intent.amount_to_pay, 15_000);
    assert_eq!(flow.state(), OrderState::Payment);

    // The watcher needs one pending tick and one settled tick
    let panel = flow.await_settlement().await.unwrap();
    assert_eq!(flow.state(), OrderState::Success);
    assert!(flow.state().is_terminal());
    assert_eq!(gateway.poll_calls.load(Ordering::SeqCst), 2);

    assert_eq!(panel.domain, "https://panel.depstore.test");
    assert_eq!(panel.server_id, "srv_e2e01");
    assert!(panel.username.starts_with("servermi"), "got: {}", panel.username);
    // No password in the order, so provisioning generated one
    assert_eq!(panel.password.chars().count(), 12);
    assert_eq!(flow.panel().unwrap().server_id, "srv_e2e01");

    // User account first, then the server that references it
    assert_eq!(
        *control_plane.calls.lock().unwrap(),
        vec!["create_user", "create_server"]
    );
    let server_request = control_plane.server_request.lock().unwrap();
    let server_request = server_request.as_ref().unwrap();
    assert_eq!(server_request.user, 42);
    assert_eq!(server_request.limits.memory, 2048);
    assert_eq!(server_request.limits.disk, 4096);
    assert_eq!(server_request.limits.cpu, 75);

    // The operations chat hears about it, off the critical path
    tokio::time::sleep(Duration::from_millis(100)).await;
    let messages = sender.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("Pesanan Baru"));
    assert!(messages[0].contains(&panel.username));
    assert!(messages[0].contains("08123456789"));
}

#[tokio::test]
async fn test_customer_password_survives_to_panel() {
    let gateway = ScriptedGateway::with_polls(vec![PaymentStatus::Settlement]);
    let control_plane = RecordingControlPlane::healthy();

    let mut flow = OrderFlow::new(
        gateway,
        test_provisioner(control_plane.clone()),
        NotificationService::disabled(),
        WatcherConfig { poll_interval: 1 },
    );

    flow.select_package("1gb").unwrap();
    let order = OrderRequest::new("my-panel", Some("S3cret!pw"), "08123456789").unwrap();
    flow.submit_order(order).await.unwrap();

    let panel = flow.await_settlement().await.unwrap();
    assert_eq!(panel.password, "S3cret!pw");

    let user_request = control_plane.user_request.lock().unwrap();
    assert_eq!(user_request.as_ref().unwrap().password, "S3cret!pw");
}

// ---------------------------------------------------------------------------
// Paths that stop short of success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_abandoned_payment_reports_not_settled() {
    // Long poll interval so the watcher never gets to ask the gateway
    let gateway = ScriptedGateway::with_polls(vec![PaymentStatus::Pending]);
    let control_plane = RecordingControlPlane::healthy();

    let mut flow = OrderFlow::new(
        gateway.clone(),
        test_provisioner(control_plane.clone()),
        NotificationService::disabled(),
        WatcherConfig { poll_interval: 60 },
    );

    flow.select_package("2gb").unwrap();
    let order = OrderRequest::new("server-minecraft", None, "08123456789").unwrap();
    flow.submit_order(order).await.unwrap();

    flow.abandon();

    let err = flow.await_settlement().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotSettled { .. }));
    assert_eq!(gateway.poll_calls.load(Ordering::SeqCst), 0);
    assert!(control_plane.calls.lock().unwrap().is_empty());

    // On the wire this reads as an illegal payment-to-success move
    let app_error = AppError::from(err);
    assert_eq!(app_error.status_code(), 409);
    assert!(app_error.user_message().contains("payment"));
}

#[tokio::test]
async fn test_provisioning_failure_after_settlement_requires_support() {
    let gateway = ScriptedGateway::with_polls(vec![PaymentStatus::Settlement]);
    let control_plane = RecordingControlPlane::server_failing(500);

    let sender = Arc::new(RecordingSender {
        messages: Mutex::new(Vec::new()),
    });
    let (notifications, worker) = NotificationService::new(sender.clone(), 8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(worker.run(shutdown_rx));

    let mut flow = OrderFlow::new(
        gateway,
        test_provisioner(control_plane.clone()),
        notifications,
        WatcherConfig { poll_interval: 1 },
    );

    flow.select_package("3gb").unwrap();
    let order = OrderRequest::new("server-minecraft", None, "08123456789").unwrap();
    flow.submit_order(order).await.unwrap();

    let err = flow.await_settlement().await.unwrap_err();
    assert!(err.requires_support());
    assert!(!err.is_retryable());
    // The payment settled but the panel never materialized; the flow does
    // not pretend the order succeeded.
    assert_eq!(flow.state(), OrderState::Payment);
    assert!(flow.panel().is_none());

    let app_error = AppError::from(err);
    assert_eq!(app_error.status_code(), 500);
    let message = app_error.user_message();
    assert!(message.contains("Failed to create server: 500"), "got: {message}");
    assert!(message.contains("Support"), "got: {message}");

    // The user account was created before the failure and stays behind
    assert_eq!(
        *control_plane.calls.lock().unwrap(),
        vec!["create_user", "create_server"]
    );

    // No success notification for a failed order
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sender.messages.lock().unwrap().is_empty());
}
