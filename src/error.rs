//! Comprehensive error handling for the depstore backend
//!
//! This module provides a unified error system with proper HTTP status mapping,
//! user-friendly messages, and structured error codes for client handling.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ConfigError;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCode {
    // Domain errors (4xx)
    #[serde(rename = "PACKAGE_NOT_FOUND")]
    PackageNotFound,
    #[serde(rename = "PROVISIONING_FAILED")]
    ProvisioningFailed,
    #[serde(rename = "ILLEGAL_TRANSITION")]
    IllegalTransition,

    // Infrastructure errors (5xx)
    #[serde(rename = "CONFIGURATION_ERROR")]
    ConfigurationError,

    // External errors (502, 504)
    #[serde(rename = "PAYMENT_GATEWAY_ERROR")]
    PaymentGatewayError,
    #[serde(rename = "CONTROL_PLANE_ERROR")]
    ControlPlaneError,
    #[serde(rename = "EXTERNAL_SERVICE_TIMEOUT")]
    ExternalServiceTimeout,

    // Generic
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "VALIDATION_ERROR")]
    ValidationError,
}

/// Domain-specific business logic errors
#[derive(Debug, Clone)]
pub enum DomainError {
    /// Selected package id does not exist in the catalog
    PackageNotFound { package_id: String },
    /// Provisioning failed after payment was captured; requires manual support
    ProvisioningFailed { order_id: String, reason: String },
    /// Order flow asked for a transition its current state does not allow
    IllegalTransition { from: String, to: String },
}

/// Infrastructure-level errors (configuration, startup)
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    /// Missing or invalid configuration
    Configuration { message: String },
}

/// External service errors (payment gateway, control plane)
#[derive(Debug, Clone)]
pub enum ExternalError {
    /// Payment gateway (QRIS deposit/status API) error
    PaymentGateway {
        message: String,
        is_retryable: bool,
    },
    /// Control plane (Pterodactyl) error from one of the two provisioning calls
    ControlPlane { operation: String, message: String },
    /// External service timeout
    Timeout { service: String, timeout_secs: u64 },
}

/// Input validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Required field missing
    MissingField { field: String },
    /// Field value out of acceptable range
    OutOfRange {
        field: String,
        min: Option<String>,
        max: Option<String>,
    },
    /// Field present but malformed
    InvalidValue { field: String, reason: String },
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    External(ExternalError),
    Validation(ValidationError),
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PackageNotFound { .. } => 404,
                DomainError::ProvisioningFailed { .. } => 500,
                DomainError::IllegalTransition { .. } => 409, // Conflict
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Configuration { .. } => 500,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { .. } => 500,
                ExternalError::ControlPlane { .. } => 500,
                ExternalError::Timeout { .. } => 504, // Gateway Timeout
            },
            AppErrorKind::Validation(_) => 400,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PackageNotFound { .. } => ErrorCode::PackageNotFound,
                DomainError::ProvisioningFailed { .. } => ErrorCode::ProvisioningFailed,
                DomainError::IllegalTransition { .. } => ErrorCode::IllegalTransition,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Configuration { .. } => ErrorCode::ConfigurationError,
            },
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { .. } => ErrorCode::PaymentGatewayError,
                ExternalError::ControlPlane { .. } => ErrorCode::ControlPlaneError,
                ExternalError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            },
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PackageNotFound { package_id } => {
                    format!("Package '{}' not found", package_id)
                }
                DomainError::ProvisioningFailed { order_id, reason } => {
                    format!(
                        "Provisioning for order '{}' failed after payment: {}. Support will contact you",
                        order_id, reason
                    )
                }
                DomainError::IllegalTransition { from, to } => {
                    format!("Cannot move from '{}' to '{}'", from, to)
                }
            },
            AppErrorKind::Infrastructure(_) => {
                "Service temporarily unavailable. Please try again later".to_string()
            }
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway {
                    message,
                    is_retryable,
                } => {
                    if *is_retryable {
                        format!("{}. Please try again", message)
                    } else {
                        message.clone()
                    }
                }
                ExternalError::ControlPlane { message, .. } => message.clone(),
                ExternalError::Timeout {
                    service,
                    timeout_secs,
                } => {
                    format!(
                        "{} request timed out after {} seconds. Please try again",
                        service, timeout_secs
                    )
                }
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::OutOfRange { field, min, max } => match (min, max) {
                    (Some(min), Some(max)) => {
                        format!("Field '{}' must be between {} and {}", field, min, max)
                    }
                    (Some(min), None) => {
                        format!("Field '{}' must be at least {}", field, min)
                    }
                    (None, Some(max)) => {
                        format!("Field '{}' must be at most {}", field, max)
                    }
                    (None, None) => {
                        format!("Field '{}' is out of acceptable range", field)
                    }
                },
                ValidationError::InvalidValue { field, reason } => {
                    format!("Invalid value for '{}': {}", field, reason)
                }
            },
        }
    }

    /// Check if error is retryable
    ///
    /// Provisioning failures after a captured payment are deliberately not
    /// retryable: the money is gone and only manual support can resolve them.
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::PackageNotFound { .. } => false,
                DomainError::ProvisioningFailed { .. } => false,
                DomainError::IllegalTransition { .. } => false,
            },
            AppErrorKind::Infrastructure(_) => false,
            AppErrorKind::External(err) => match err {
                ExternalError::PaymentGateway { is_retryable, .. } => *is_retryable,
                ExternalError::ControlPlane { .. } => false,
                ExternalError::Timeout { .. } => true,
            },
            AppErrorKind::Validation(_) => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for AppError {}

// Conversions from specific error types
// From<PaymentError> and From<ProvisionError> live next to their definitions

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(AppErrorKind::Infrastructure(
            InfrastructureError::Configuration {
                message: err.to_string(),
            },
        ))
    }
}

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
