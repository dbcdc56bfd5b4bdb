use thiserror::Error;

pub type PaymentResult<T> = Result<T, PaymentError>;

#[derive(Debug, Clone, Error)]
pub enum PaymentError {
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("{message}")]
    GatewayError {
        message: String,
        status: Option<u16>,
        retryable: bool,
    },

    #[error("Invalid gateway response: {message}")]
    InvalidResponse { message: String },
}

impl PaymentError {
    /// Build the upstream-failure error for the deposit call
    pub fn deposit_failed(status: u16) -> Self {
        PaymentError::GatewayError {
            message: format!("Payment API error: {}", status),
            status: Some(status),
            retryable: true,
        }
    }

    /// Build the upstream-failure error for the status call
    pub fn status_failed(status: u16) -> Self {
        PaymentError::GatewayError {
            message: format!("Status API error: {}", status),
            status: Some(status),
            retryable: true,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            PaymentError::ValidationError { .. } => false,
            PaymentError::NetworkError { .. } => true,
            PaymentError::GatewayError { retryable, .. } => *retryable,
            PaymentError::InvalidResponse { .. } => false,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            PaymentError::ValidationError { .. } => 400,
            PaymentError::NetworkError { .. } => 500,
            PaymentError::GatewayError { .. } => 500,
            PaymentError::InvalidResponse { .. } => 500,
        }
    }
}

impl From<PaymentError> for crate::error::AppError {
    fn from(err: PaymentError) -> Self {
        use crate::error::{AppError, AppErrorKind, ExternalError};

        AppError::new(AppErrorKind::External(ExternalError::PaymentGateway {
            message: err.to_string(),
            is_retryable: err.is_retryable(),
        }))
    }
}
