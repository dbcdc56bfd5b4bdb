//! Health check module
//!
//! Liveness only. The service keeps no connections open (the payment
//! gateway and the control plane are reached per request), so there is
//! nothing meaningful to probe without spending money on upstream calls.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

pub const SERVICE_NAME: &str = "depstore-backend";

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: HealthState,
    pub service: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Overall health state
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            status: HealthState::Healthy,
            service: SERVICE_NAME,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthState::Healthy)
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthStatus::new()))
}
