use crate::config::PaymentGatewayConfig;
use crate::payments::error::{PaymentError, PaymentResult};
use crate::payments::provider::PaymentGateway;
use crate::payments::types::{
    DepositRequest, DepositResponse, PaymentIntent, PaymentStatus, StatusResponse,
};
use crate::payments::utils::{parse_gateway_json, PaymentHttpClient};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use std::time::Duration;
use tracing::{error, info, warn};

/// QRIS payment gateway client.
///
/// The gateway authenticates with an `apikey` query parameter rather than a
/// header, and its deposit endpoint returns the QR code as a hosted image URL.
pub struct QrisGateway {
    base_url: String,
    api_key: String,
    http: PaymentHttpClient,
}

impl QrisGateway {
    pub fn new(config: &PaymentGatewayConfig) -> PaymentResult<Self> {
        let http = PaymentHttpClient::new(Duration::from_secs(config.request_timeout))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PaymentGateway for QrisGateway {
    async fn create_intent(&self, amount: u64) -> PaymentResult<PaymentIntent> {
        let url = self.endpoint("/api/payment/deposit");
        let payload = serde_json::to_value(DepositRequest { amount }).map_err(|e| {
            PaymentError::InvalidResponse {
                message: format!("Failed to serialize deposit request: {}", e),
            }
        })?;

        let (status, body) = self
            .http
            .send_json(
                Method::POST,
                &url,
                &[("apikey", self.api_key.as_str())],
                Some(&payload),
            )
            .await?;

        if !(200..300).contains(&status) {
            error!(status = status, body = %body, "Payment API error");
            return Err(PaymentError::deposit_failed(status));
        }

        let response: DepositResponse = parse_gateway_json(&body)?;

        let order_id = response
            .order_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(fallback_order_id);
        let intent = PaymentIntent {
            order_id,
            qr_code_url: response.qr_code_url.unwrap_or_default(),
            amount_to_pay: response.amount_to_pay.unwrap_or(amount),
        };

        info!(
            order_id = %intent.order_id,
            amount = intent.amount_to_pay,
            "Payment intent created"
        );
        Ok(intent)
    }

    async fn poll_status(&self, order_id: &str) -> PaymentResult<PaymentStatus> {
        let url = self.endpoint(&format!("/api/payment/status/{}", order_id));

        let (status, body) = self
            .http
            .send_json(
                Method::GET,
                &url,
                &[("apikey", self.api_key.as_str())],
                None,
            )
            .await?;

        if !(200..300).contains(&status) {
            warn!(status = status, order_id = %order_id, "Status API error");
            return Err(PaymentError::status_failed(status));
        }

        let response: StatusResponse = parse_gateway_json(&body)?;
        Ok(PaymentStatus::from_gateway_status(response.status.as_deref()))
    }
}

/// Synthetic order id for gateway responses that omit one. The millisecond
/// timestamp keeps ids unique enough for a single storefront's order volume.
fn fallback_order_id() -> String {
    format!("order_{}", Utc::now().timestamp_millis())
}
