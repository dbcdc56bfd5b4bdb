use crate::error::{AppError, AppErrorKind, ExternalError};
use thiserror::Error;

pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Errors from the two-step control-plane provisioning sequence.
///
/// The variants deliberately distinguish which step failed: a user-creation
/// failure leaves nothing behind, while a server-creation failure leaves an
/// orphaned control-plane user that needs manual cleanup.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Failed to create user: {status}")]
    UserCreationFailed { status: u16 },

    #[error("Failed to create server: {status}")]
    ServerCreationFailed { status: u16 },

    #[error("Control plane network error: {message}")]
    NetworkError { message: String },

    #[error("Invalid control plane response: {message}")]
    InvalidResponse { message: String },
}

impl ProvisionError {
    /// Which control-plane operation the error belongs to, for log context.
    pub fn operation(&self) -> &'static str {
        match self {
            ProvisionError::UserCreationFailed { .. } => "create_user",
            ProvisionError::ServerCreationFailed { .. } => "create_server",
            ProvisionError::NetworkError { .. } => "request",
            ProvisionError::InvalidResponse { .. } => "parse_response",
        }
    }

    /// True when a server-creation failure has left a user account behind.
    pub fn leaves_orphaned_user(&self) -> bool {
        matches!(self, ProvisionError::ServerCreationFailed { .. })
    }
}

impl From<ProvisionError> for AppError {
    fn from(err: ProvisionError) -> Self {
        let operation = err.operation().to_string();
        AppError::new(AppErrorKind::External(ExternalError::ControlPlane {
            operation,
            message: err.to_string(),
        }))
    }
}
