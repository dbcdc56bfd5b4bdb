//! POST /api/create-payment and GET /api/check-payment: QRIS payment endpoints
//!
//! Thin translations between the storefront's JSON and the payment gateway.
//! Validation here never reaches upstream: a request with missing fields is
//! rejected before any gateway call is attempted.

use crate::api::{attach_request_id, is_missing};
use crate::error::AppError;
use crate::middleware::error::{add_cors_headers, json_error_response};
use crate::payments::provider::PaymentGateway;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct PaymentsState {
    pub gateway: Arc<dyn PaymentGateway>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default, rename = "panelName")]
    pub panel_name: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default, rename = "packageId")]
    pub package_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckPaymentResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckPaymentParams {
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,
}

/// Create a QRIS payment intent for an order.
///
/// The successful body is the intent itself: `qrCodeUrl`, `amountToPay` and
/// `orderId`, with `amountToPay` always equal to the requested amount.
pub async fn create_payment(
    State(state): State<PaymentsState>,
    headers: HeaderMap,
    Json(body): Json<CreatePaymentRequest>,
) -> Response {
    let amount = body.amount.unwrap_or(0);
    if amount == 0
        || is_missing(&body.panel_name)
        || is_missing(&body.whatsapp)
        || is_missing(&body.package_id)
    {
        return json_error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    }

    match state.gateway.create_intent(amount).await {
        Ok(intent) => {
            info!(
                order_id = %intent.order_id,
                amount = intent.amount_to_pay,
                "payment intent created"
            );
            let mut resp_headers = HeaderMap::new();
            add_cors_headers(&mut resp_headers);
            (StatusCode::OK, resp_headers, Json(intent)).into_response()
        }
        Err(e) => attach_request_id(AppError::from(e), &headers).into_response(),
    }
}

/// Report the current gateway status for an order. An order the gateway has
/// no verdict on yet reads as `pending`.
pub async fn check_payment(
    State(state): State<PaymentsState>,
    headers: HeaderMap,
    Query(params): Query<CheckPaymentParams>,
) -> Response {
    let order_id = match params.order_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => return json_error_response(StatusCode::BAD_REQUEST, "Missing orderId"),
    };

    match state.gateway.poll_status(order_id).await {
        Ok(status) => {
            let mut resp_headers = HeaderMap::new();
            add_cors_headers(&mut resp_headers);
            (
                StatusCode::OK,
                resp_headers,
                Json(CheckPaymentResponse {
                    status: status.as_str().to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => attach_request_id(AppError::from(e), &headers).into_response(),
    }
}
