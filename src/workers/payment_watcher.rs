//! Payment settlement watcher
//!
//! One watcher task per live order. It polls the gateway's status endpoint at
//! a fixed interval until the payment settles or the order flow cancels it.
//! There is no backoff and no absolute cutoff: the QR code the customer is
//! looking at stays valid for as long as they keep the payment step open, so
//! the watcher simply keeps asking. Poll failures are logged and retried on
//! the next tick; a flaky gateway response must never kill the watch.

use crate::config::WatcherConfig;
use crate::payments::provider::PaymentGateway;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How a watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The gateway reported `settlement`; provisioning may begin.
    Settled,
    /// The cancellation token fired (or its sender was dropped) before
    /// settlement was observed.
    Cancelled,
}

pub struct PaymentWatcher {
    gateway: Arc<dyn PaymentGateway>,
    order_id: String,
    config: WatcherConfig,
}

impl PaymentWatcher {
    pub fn new(gateway: Arc<dyn PaymentGateway>, order_id: String, config: WatcherConfig) -> Self {
        Self {
            gateway,
            order_id,
            config,
        }
    }

    /// Poll until settlement or cancellation. The first status request goes
    /// out one interval after the watch starts, matching the cadence the
    /// customer sees on the payment screen.
    pub async fn run(self, mut cancel_rx: watch::Receiver<bool>) -> WatchOutcome {
        let interval = Duration::from_secs(self.config.poll_interval);

        info!(
            order_id = %self.order_id,
            poll_interval_secs = interval.as_secs(),
            "payment watcher started"
        );

        loop {
            tokio::select! {
                changed = cancel_rx.changed() => {
                    // A dropped sender means the order flow is gone; treat it
                    // the same as an explicit cancellation.
                    if changed.is_err() || *cancel_rx.borrow() {
                        info!(order_id = %self.order_id, "payment watcher cancelled");
                        return WatchOutcome::Cancelled;
                    }
                }
                _ = tokio::time::sleep(interval) => {
                    match self.gateway.poll_status(&self.order_id).await {
                        Ok(status) if status.is_settled() => {
                            info!(order_id = %self.order_id, "payment settled");
                            return WatchOutcome::Settled;
                        }
                        Ok(status) => {
                            debug!(
                                order_id = %self.order_id,
                                status = %status,
                                "payment not settled yet"
                            );
                        }
                        Err(e) => {
                            warn!(
                                order_id = %self.order_id,
                                error = %e,
                                "status poll failed; retrying next tick"
                            );
                        }
                    }
                }
            }
        }
    }
}
