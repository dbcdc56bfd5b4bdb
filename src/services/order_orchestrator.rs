//! Order flow orchestrator
//!
//! Drives a single customer order from package selection to a provisioned
//! panel. The flow is a strict state machine:
//!
//! ```text
//! select ──► form ──► payment ──► success
//!    ▲         │
//!    └─────────┘  (the only backward edge)
//! ```
//!
//! Entering `payment` creates a gateway intent and spawns a settlement
//! watcher; leaving it, whether by settlement or abandonment, always cancels
//! the watcher. A failed intent keeps the customer on the form for a retry. A
//! provisioning failure after settlement is final: money has moved, so the
//! flow refuses to pretend otherwise and surfaces an error that routes the
//! customer to support.

use crate::catalog::{find_package, Package};
use crate::config::WatcherConfig;
use crate::error::{AppError, AppErrorKind, DomainError, ValidationError};
use crate::payments::error::PaymentError;
use crate::payments::provider::PaymentGateway;
use crate::payments::types::PaymentIntent;
use crate::provisioner::error::ProvisionError;
use crate::provisioner::provision::Provisioner;
use crate::provisioner::types::{ProvisionRequest, ProvisionedPanel};
use crate::services::notification::{
    provisioning_summary, NotificationService, ProvisioningNotice,
};
use crate::workers::payment_watcher::{PaymentWatcher, WatchOutcome};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

// ---------------------------------------------------------------------------
// Order state machine
// ---------------------------------------------------------------------------

/// The four steps a customer order moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    /// Browsing the package catalog
    Select,
    /// Filling in panel name, password and WhatsApp number
    Form,
    /// QR code shown, settlement watcher polling
    Payment,
    /// Panel provisioned, credentials handed over
    Success,
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderState::Select => write!(f, "select"),
            OrderState::Form => write!(f, "form"),
            OrderState::Payment => write!(f, "payment"),
            OrderState::Success => write!(f, "success"),
        }
    }
}

impl OrderState {
    /// Get all valid transitions from this state
    pub fn valid_transitions(&self) -> Vec<OrderState> {
        match self {
            OrderState::Select => vec![OrderState::Form],
            // The form is the only step with a backward edge.
            OrderState::Form => vec![OrderState::Select, OrderState::Payment],
            OrderState::Payment => vec![OrderState::Success],
            // Terminal state - no valid transitions
            OrderState::Success => vec![],
        }
    }

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Success)
    }

    /// Check if the state allows retrying the last failed action
    /// (a failed payment intent keeps the customer on the form)
    pub fn allows_retry(&self) -> bool {
        matches!(self, OrderState::Form)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The flow was asked to move along an edge the state machine does not have
    #[error("cannot move from '{from}' to '{to}'")]
    IllegalTransition { from: OrderState, to: OrderState },

    /// Selected package id is not in the catalog
    #[error("unknown package '{package_id}'")]
    PackageNotFound { package_id: String },

    /// The form was submitted without a package selection
    #[error("no package has been selected")]
    NoPackageSelected,

    /// A form field failed validation
    #[error("invalid {field}: {reason}")]
    InvalidOrder { field: &'static str, reason: String },

    /// The gateway refused to create a payment intent; retryable from the form
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Settlement was never observed (watcher cancelled or abandoned)
    #[error("payment for order '{order_id}' was not settled")]
    NotSettled { order_id: String },

    /// Provisioning failed after the payment settled. Terminal for the flow;
    /// the customer's money has moved and support has to step in.
    #[error("provisioning for order '{order_id}' failed after payment: {source}")]
    Provisioning {
        order_id: String,
        #[source]
        source: ProvisionError,
    },
}

impl OrchestratorError {
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::Payment(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Failures after money has moved cannot be resolved by the customer.
    pub fn requires_support(&self) -> bool {
        matches!(self, OrchestratorError::Provisioning { .. })
    }
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        let kind = match &err {
            OrchestratorError::IllegalTransition { from, to } => {
                AppErrorKind::Domain(DomainError::IllegalTransition {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            }
            OrchestratorError::PackageNotFound { package_id } => {
                AppErrorKind::Domain(DomainError::PackageNotFound {
                    package_id: package_id.clone(),
                })
            }
            OrchestratorError::NoPackageSelected => {
                AppErrorKind::Validation(ValidationError::MissingField {
                    field: "packageId".to_string(),
                })
            }
            OrchestratorError::InvalidOrder { field, reason } => {
                AppErrorKind::Validation(ValidationError::InvalidValue {
                    field: field.to_string(),
                    reason: reason.clone(),
                })
            }
            OrchestratorError::Payment(e) => return AppError::from(e.clone()),
            OrchestratorError::NotSettled { .. } => {
                AppErrorKind::Domain(DomainError::IllegalTransition {
                    from: OrderState::Payment.to_string(),
                    to: OrderState::Success.to_string(),
                })
            }
            OrchestratorError::Provisioning { order_id, source } => {
                AppErrorKind::Domain(DomainError::ProvisioningFailed {
                    order_id: order_id.clone(),
                    reason: source.to_string(),
                })
            }
        };
        AppError::new(kind)
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

// ---------------------------------------------------------------------------
// Validated order input
// ---------------------------------------------------------------------------

/// Customer form input, validated and normalized at construction. Holding an
/// `OrderRequest` means the fields are fit for provisioning.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub panel_name: String,
    /// None means the customer wants a generated password.
    pub password: Option<String>,
    /// Digits only, punctuation and country-code prefixes stripped.
    pub whatsapp_number: String,
}

impl OrderRequest {
    pub fn new(
        panel_name: &str,
        password: Option<&str>,
        whatsapp: &str,
    ) -> OrchestratorResult<Self> {
        let name = panel_name.trim();
        if name.is_empty() {
            return Err(OrchestratorError::InvalidOrder {
                field: "panelName",
                reason: "must not be blank".to_string(),
            });
        }
        let name_len = name.chars().count();
        if name_len < 3 {
            return Err(OrchestratorError::InvalidOrder {
                field: "panelName",
                reason: "must be at least 3 characters".to_string(),
            });
        }
        if name_len > 50 {
            return Err(OrchestratorError::InvalidOrder {
                field: "panelName",
                reason: "must be at most 50 characters".to_string(),
            });
        }

        // Blank password means "generate one for me".
        let password = password.map(str::trim).filter(|p| !p.is_empty());
        if let Some(p) = password {
            if p.chars().count() > 32 {
                return Err(OrchestratorError::InvalidOrder {
                    field: "password",
                    reason: "must be at most 32 characters".to_string(),
                });
            }
        }

        let digits: String = whatsapp.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < 10 || digits.len() > 15 {
            return Err(OrchestratorError::InvalidOrder {
                field: "whatsapp",
                reason: "must contain 10 to 15 digits".to_string(),
            });
        }

        Ok(Self {
            panel_name: name.to_string(),
            password: password.map(String::from),
            whatsapp_number: digits,
        })
    }
}

// ---------------------------------------------------------------------------
// Order flow
// ---------------------------------------------------------------------------

/// Everything pinned down once the customer enters the payment step.
#[derive(Debug, Clone)]
struct ActiveOrder {
    package: &'static Package,
    order: OrderRequest,
    intent: PaymentIntent,
}

/// One customer's order session.
///
/// Not shared across tasks: the flow owns its watcher and cancels it on every
/// path out of the payment step. Dropping the flow mid-payment also stops the
/// watcher, because the watcher treats a dropped cancel sender as
/// cancellation.
pub struct OrderFlow {
    gateway: Arc<dyn PaymentGateway>,
    provisioner: Arc<Provisioner>,
    notifications: NotificationService,
    watcher_config: WatcherConfig,
    state: OrderState,
    selected: Option<&'static Package>,
    active: Option<ActiveOrder>,
    panel: Option<ProvisionedPanel>,
    watcher_cancel: Option<watch::Sender<bool>>,
    watcher_handle: Option<JoinHandle<WatchOutcome>>,
}

impl OrderFlow {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        provisioner: Arc<Provisioner>,
        notifications: NotificationService,
        watcher_config: WatcherConfig,
    ) -> Self {
        Self {
            gateway,
            provisioner,
            notifications,
            watcher_config,
            state: OrderState::Select,
            selected: None,
            active: None,
            panel: None,
            watcher_cancel: None,
            watcher_handle: None,
        }
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn selected_package(&self) -> Option<&'static Package> {
        self.selected
    }

    pub fn payment_intent(&self) -> Option<&PaymentIntent> {
        self.active.as_ref().map(|a| &a.intent)
    }

    pub fn panel(&self) -> Option<&ProvisionedPanel> {
        self.panel.as_ref()
    }

    /// Pick a package from the catalog and move to the form. Selecting is
    /// only possible while browsing.
    pub fn select_package(&mut self, package_id: &str) -> OrchestratorResult<&'static Package> {
        if self.state != OrderState::Select {
            return Err(OrchestratorError::IllegalTransition {
                from: self.state,
                to: OrderState::Form,
            });
        }

        let package =
            find_package(package_id).ok_or_else(|| OrchestratorError::PackageNotFound {
                package_id: package_id.to_string(),
            })?;

        self.selected = Some(package);
        self.transition(OrderState::Form)?;
        Ok(package)
    }

    /// Back from the form to the catalog. The selection is kept and simply
    /// overwritten on the next pick.
    pub fn back(&mut self) -> OrchestratorResult<()> {
        self.transition(OrderState::Select)
    }

    /// Submit the form: create a payment intent and enter the payment step.
    ///
    /// A gateway failure leaves the flow on the form so the customer can try
    /// again; nothing about the session is lost.
    pub async fn submit_order(&mut self, order: OrderRequest) -> OrchestratorResult<PaymentIntent> {
        if self.state != OrderState::Form {
            return Err(OrchestratorError::IllegalTransition {
                from: self.state,
                to: OrderState::Payment,
            });
        }
        let package = self.selected.ok_or(OrchestratorError::NoPackageSelected)?;

        let intent = match self.gateway.create_intent(package.price).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(
                    package_id = package.id,
                    error = %e,
                    "payment intent creation failed; staying on the form"
                );
                return Err(OrchestratorError::Payment(e));
            }
        };

        info!(
            order_id = %intent.order_id,
            package_id = package.id,
            amount = intent.amount_to_pay,
            "payment intent created"
        );

        self.spawn_watcher(intent.order_id.clone());
        self.active = Some(ActiveOrder {
            package,
            order,
            intent: intent.clone(),
        });
        self.transition(OrderState::Payment)?;
        Ok(intent)
    }

    /// Wait for the settlement watcher, then provision.
    ///
    /// Cancellation (or abandonment) surfaces as [`OrchestratorError::NotSettled`].
    /// A provisioning failure after settlement is terminal: the flow stays in
    /// the payment state and the error routes the customer to support.
    pub async fn await_settlement(&mut self) -> OrchestratorResult<ProvisionedPanel> {
        if self.state != OrderState::Payment {
            return Err(OrchestratorError::IllegalTransition {
                from: self.state,
                to: OrderState::Success,
            });
        }
        let active = match self.active.clone() {
            Some(active) => active,
            None => {
                return Err(OrchestratorError::IllegalTransition {
                    from: self.state,
                    to: OrderState::Success,
                })
            }
        };
        let order_id = active.intent.order_id.clone();

        let handle = self
            .watcher_handle
            .take()
            .ok_or_else(|| OrchestratorError::NotSettled {
                order_id: order_id.clone(),
            })?;

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "payment watcher task ended abnormally");
                WatchOutcome::Cancelled
            }
        };
        // The watcher is finished either way; drop the cancel sender.
        self.watcher_cancel = None;

        match outcome {
            WatchOutcome::Cancelled => Err(OrchestratorError::NotSettled { order_id }),
            WatchOutcome::Settled => self.provision_settled_order(active).await,
        }
    }

    /// Leave the payment step without settling. Stops the watcher; the flow
    /// stays where it is and a later [`Self::await_settlement`] reports the
    /// order as not settled.
    pub fn abandon(&mut self) {
        self.cancel_watcher();
        info!(state = %self.state, "order flow abandoned");
    }

    async fn provision_settled_order(
        &mut self,
        active: ActiveOrder,
    ) -> OrchestratorResult<ProvisionedPanel> {
        let order_id = active.intent.order_id.clone();
        let request = ProvisionRequest {
            panel_name: active.order.panel_name.clone(),
            password: active.order.password.clone(),
            whatsapp_number: active.order.whatsapp_number.clone(),
            ram_gb: active.package.ram,
            disk_gb: active.package.disk,
            cpu_percent: active.package.cpu,
        };

        let panel = match self.provisioner.provision(&request).await {
            Ok(panel) => panel,
            Err(source) => {
                error!(
                    order_id = %order_id,
                    error = %source,
                    orphaned_user = source.leaves_orphaned_user(),
                    "provisioning failed after settled payment; support has to step in"
                );
                return Err(OrchestratorError::Provisioning { order_id, source });
            }
        };

        self.notifications.notify(provisioning_summary(&ProvisioningNotice {
            panel_name: active.order.panel_name.clone(),
            username: panel.username.clone(),
            ram_gb: active.package.ram,
            disk_gb: active.package.disk,
            cpu_percent: active.package.cpu,
            whatsapp_number: active.order.whatsapp_number.clone(),
            server_id: panel.server_id.clone(),
        }));

        self.panel = Some(panel.clone());
        self.transition(OrderState::Success)?;

        info!(
            order_id = %order_id,
            username = %panel.username,
            server_id = %panel.server_id,
            "order completed"
        );
        Ok(panel)
    }

    fn spawn_watcher(&mut self, order_id: String) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let watcher = PaymentWatcher::new(
            self.gateway.clone(),
            order_id,
            self.watcher_config.clone(),
        );
        self.watcher_cancel = Some(cancel_tx);
        self.watcher_handle = Some(tokio::spawn(watcher.run(cancel_rx)));
    }

    fn cancel_watcher(&mut self) {
        if let Some(cancel) = self.watcher_cancel.take() {
            // The watcher may already be gone; a failed send is fine.
            let _ = cancel.send(true);
        }
    }

    fn transition(&mut self, to: OrderState) -> OrchestratorResult<()> {
        if !self.state.valid_transitions().contains(&to) {
            return Err(OrchestratorError::IllegalTransition {
                from: self.state,
                to,
            });
        }
        info!(from = %self.state, to = %to, "order step changed");
        self.state = to;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
