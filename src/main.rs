use axum::{
    routing::{get, post},
    Router,
};
use depstore_backend::api::panels::{create_panel, PanelsState};
use depstore_backend::api::payments::{check_payment, create_payment, PaymentsState};
use depstore_backend::config::AppConfig;
use depstore_backend::health::health;
use depstore_backend::logging::init_tracing;
use depstore_backend::middleware::error::options_preflight;
use depstore_backend::middleware::logging::{request_logging_middleware, UuidRequestId};
use depstore_backend::payments::provider::PaymentGateway;
use depstore_backend::payments::providers::qris::QrisGateway;
use depstore_backend::provisioner::client::{ControlPlane, PterodactylClient};
use depstore_backend::provisioner::provision::Provisioner;
use depstore_backend::services::notification::{
    NotificationSender, NotificationService, TelegramSender,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::{error, info};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

async fn shutdown_signal_with_notify(shutdown_tx: watch::Sender<bool>) {
    shutdown_signal().await;
    let _ = shutdown_tx.send(true);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config first; from_env loads .env, so LOG_* is in place for tracing.
    let config = AppConfig::from_env()?;
    config.validate()?;

    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "🚀 Starting depstore backend service"
    );
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration loaded"
    );

    // Payment gateway
    info!("💳 Initializing QRIS payment gateway...");
    let gateway: Arc<dyn PaymentGateway> = Arc::new(QrisGateway::new(&config.payment)?);
    info!(base_url = %config.payment.base_url, "✅ Payment gateway ready");

    // Control plane
    info!("🦖 Initializing Pterodactyl control plane client...");
    let control_plane: Arc<dyn ControlPlane> =
        Arc::new(PterodactylClient::new(&config.control_plane)?);
    let provisioner = Arc::new(Provisioner::new(control_plane, &config.control_plane));
    info!(domain = %config.control_plane.base_url, "✅ Control plane client ready");

    // Notification worker (only when a bot token is configured)
    let (worker_shutdown_tx, worker_shutdown_rx) = watch::channel(false);
    let mut notify_handle = None;
    let notifications = match config.notifier.bot_token.as_deref() {
        Some(token) => {
            let sender: Arc<dyn NotificationSender> =
                Arc::new(TelegramSender::new(token, &config.notifier)?);
            let (service, worker) = NotificationService::new(sender, config.notifier.queue_capacity);
            notify_handle = Some(tokio::spawn(worker.run(worker_shutdown_rx.clone())));
            info!(
                chat_id = %config.notifier.chat_id,
                "✅ Telegram notification worker started"
            );
            service
        }
        None => {
            info!("Telegram notifications disabled (TELEGRAM_BOT_TOKEN not set)");
            NotificationService::disabled()
        }
    };

    // Routes
    let payment_routes = Router::new()
        .route(
            "/api/create-payment",
            post(create_payment).options(options_preflight),
        )
        .route(
            "/api/check-payment",
            get(check_payment).options(options_preflight),
        )
        .with_state(PaymentsState { gateway });

    let panel_routes = Router::new()
        .route(
            "/api/create-panel",
            post(create_panel).options(options_preflight),
        )
        .with_state(PanelsState {
            provisioner,
            notifications,
        });

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(payment_routes)
        .merge(panel_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        );

    info!("✅ Routes configured");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind to address {}: {}", addr, e);
        e
    })?;

    // Print a prominent banner with server information
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║          🚀 DEPSTORE BACKEND SERVER IS RUNNING 🚀            ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  🌐 Server Address:  http://{}", addr);
    println!("║                                                              ║");
    println!("║  📡 AVAILABLE ENDPOINTS:                                     ║");
    println!("║  GET  /                        - Root endpoint               ║");
    println!("║  GET  /health                  - Health check                ║");
    println!("║  POST /api/create-payment      - Create QRIS payment intent  ║");
    println!("║  GET  /api/check-payment       - Poll payment status         ║");
    println!("║  POST /api/create-panel        - Provision a panel           ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    info!(address = %addr, "🚀 Server listening on http://{}", addr);
    info!("✅ Server is ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_with_notify(worker_shutdown_tx.clone()))
        .await?;

    let _ = worker_shutdown_tx.send(true);
    if let Some(handle) = notify_handle {
        if let Err(e) = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await {
            error!(error = %e, "Timed out waiting for notification worker shutdown");
        }
    }

    info!("👋 Server shutdown complete");

    Ok(())
}

// Handlers
async fn root() -> &'static str {
    info!("📍 Root endpoint accessed");
    "Welcome to Depstore Backend API"
}
