//! Operator notification service
//!
//! Provisioning outcomes are reported to the operations Telegram chat. The
//! happy path must never wait on Telegram: callers enqueue a message into a
//! bounded channel and move on, a background worker drains the channel and
//! performs the actual sends. A full queue drops the message with a warning
//! and a send failure is logged and forgotten: notification is best effort
//! and never fails an order.

use crate::config::NotifierConfig;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Message formatting
// ---------------------------------------------------------------------------

/// Everything the operations chat needs to know about a freshly provisioned
/// panel. Collected by whoever drove the provisioning call.
#[derive(Debug, Clone)]
pub struct ProvisioningNotice {
    pub panel_name: String,
    pub username: String,
    pub ram_gb: u32,
    pub disk_gb: u32,
    pub cpu_percent: u32,
    pub whatsapp_number: String,
    pub server_id: String,
}

/// Render the fixed-format HTML summary for a new order.
///
/// The wording is what the operations team reads all day; do not reword it
/// without telling them first.
pub fn provisioning_summary(notice: &ProvisioningNotice) -> String {
    format!(
        "🆕 <b>Pesanan Baru!</b>\n\n\
         📦 <b>Detail Panel:</b>\n\
         • Nama: {}\n\
         • Username: {}\n\
         • RAM: {} GB\n\
         • Disk: {} GB\n\
         • CPU: {}%\n\n\
         📱 <b>WhatsApp:</b> {}\n\n\
         🔗 Server ID: {}",
        notice.panel_name,
        notice.username,
        notice.ram_gb,
        notice.disk_gb,
        notice.cpu_percent,
        notice.whatsapp_number,
        notice.server_id,
    )
}

// ---------------------------------------------------------------------------
// Sender trait + Telegram implementation
// ---------------------------------------------------------------------------

/// Errors a sender can produce. The drain worker logs these; nothing else
/// ever sees them.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Telegram API error: {status}")]
    Http { status: u16 },
    #[error("Telegram network error: {message}")]
    Network { message: String },
}

/// Delivery backend for operator notifications.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Sends messages through the Telegram Bot API (`sendMessage`, HTML parse
/// mode, fixed operations chat id).
pub struct TelegramSender {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramSender {
    pub fn new(bot_token: &str, config: &NotifierConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| NotifyError::Network {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            bot_token: bot_token.to_string(),
            chat_id: config.chat_id.clone(),
        })
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let body = SendMessageRequest {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "HTML",
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Http {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Queue + drain worker
// ---------------------------------------------------------------------------

/// Handle for enqueueing notifications. Cheap to clone; every clone feeds
/// the same bounded channel.
#[derive(Clone)]
pub struct NotificationService {
    tx: Option<mpsc::Sender<String>>,
}

impl NotificationService {
    /// Create a service backed by `sender`, together with the worker that
    /// must be spawned to drain the queue.
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        queue_capacity: usize,
    ) -> (Self, NotificationWorker) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        (Self { tx: Some(tx) }, NotificationWorker { rx, sender })
    }

    /// A service that silently discards everything. Used when no bot token
    /// is configured.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Enqueue a message without waiting. If the queue is full the message
    /// is dropped and a warning logged; the caller's request proceeds
    /// unaffected either way.
    pub fn notify(&self, message: String) {
        let Some(tx) = &self.tx else {
            debug!("notifications disabled; dropping message");
            return;
        };

        if let Err(e) = tx.try_send(message) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!("notification queue full; dropping message");
                }
                mpsc::error::TrySendError::Closed(_) => {
                    warn!("notification worker gone; dropping message");
                }
            }
        }
    }
}

/// Drains the notification queue and performs the actual sends, one at a
/// time. Runs until shutdown is signalled or every service handle is gone.
pub struct NotificationWorker {
    rx: mpsc::Receiver<String>,
    sender: Arc<dyn NotificationSender>,
}

impl NotificationWorker {
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("notification worker started");

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("notification worker stopping");
                        break;
                    }
                }
                message = self.rx.recv() => {
                    match message {
                        Some(message) => self.deliver(&message).await,
                        None => {
                            info!("notification channel closed; worker stopping");
                            break;
                        }
                    }
                }
            }
        }

        // Flush whatever is already queued so ops messages for completed
        // orders are not lost on a clean shutdown.
        while let Ok(message) = self.rx.try_recv() {
            self.deliver(&message).await;
        }

        info!("notification worker stopped");
    }

    async fn deliver(&self, message: &str) {
        match self.sender.send(message).await {
            Ok(()) => debug!("notification delivered"),
            Err(e) => warn!(error = %e, "notification delivery failed; message dropped"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
