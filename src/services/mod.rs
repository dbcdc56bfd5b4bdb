//! Services module for business logic and integrations

pub mod notification;
pub mod order_orchestrator;

// Re-export orchestrator types
pub use crate::services::order_orchestrator::{
    OrchestratorError, OrchestratorResult, OrderFlow, OrderRequest, OrderState,
};

// Re-export notification types
pub use crate::services::notification::{
    provisioning_summary, NotificationSender, NotificationService, NotificationWorker,
    ProvisioningNotice, TelegramSender,
};
