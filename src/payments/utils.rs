use crate::payments::error::{PaymentError, PaymentResult};
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Thin reqwest wrapper with an explicit per-call timeout.
///
/// Single attempt only: the status poll loop is the retry mechanism for this
/// gateway, so failures surface immediately to the caller.
#[derive(Clone)]
pub struct PaymentHttpClient {
    client: Client,
    timeout: Duration,
}

impl PaymentHttpClient {
    pub fn new(timeout: Duration) -> PaymentResult<Self> {
        let client =
            Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| PaymentError::NetworkError {
                    message: format!("failed to initialize HTTP client: {}", e),
                })?;

        Ok(Self { client, timeout })
    }

    /// Send a request and return (status, body text) for the caller to map
    pub async fn send_json(
        &self,
        method: reqwest::Method,
        url: &str,
        query: &[(&str, &str)],
        body: Option<&JsonValue>,
    ) -> PaymentResult<(u16, String)> {
        let mut request = self
            .client
            .request(method, url)
            .timeout(self.timeout)
            .query(query);

        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError {
                message: format!("gateway request failed: {}", e),
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        Ok((status, text))
    }
}

/// Parse a gateway JSON body, mapping parse failures to a payment error
pub fn parse_gateway_json<T: serde::de::DeserializeOwned>(body: &str) -> PaymentResult<T> {
    serde_json::from_str::<T>(body).map_err(|e| PaymentError::InvalidResponse {
        message: format!("invalid gateway JSON response: {}", e),
    })
}
