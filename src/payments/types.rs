//! Payment gateway wire types
//!
//! The gateway speaks camelCase JSON; everything here mirrors its vocabulary
//! so responses deserialize without hand mapping.

use serde::{Deserialize, Serialize};

/// A created payment intent: the QR code the customer scans plus the
/// tracking id used for status polling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub order_id: String,
    pub qr_code_url: String,
    pub amount_to_pay: u64,
}

/// Gateway-reported payment status
///
/// `Settlement` is the sole trigger for provisioning. Every other value the
/// gateway may emit is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Settlement,
    Other(String),
}

impl PaymentStatus {
    /// Map the gateway's status string; a missing field reads as pending
    pub fn from_gateway_status(status: Option<&str>) -> Self {
        match status {
            None | Some("") => PaymentStatus::Pending,
            Some("pending") => PaymentStatus::Pending,
            Some("settlement") => PaymentStatus::Settlement,
            Some(other) => PaymentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Settlement => "settlement",
            PaymentStatus::Other(value) => value,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, PaymentStatus::Settlement)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body for the deposit endpoint
#[derive(Debug, Clone, Serialize)]
pub struct DepositRequest {
    pub amount: u64,
}

/// Deposit endpoint response
///
/// The gateway does not always return an order id; the adapter synthesizes
/// a timestamp fallback in that case.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub qr_code_url: Option<String>,
    #[serde(default)]
    pub amount_to_pay: Option<u64>,
}

/// Status endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
}
