//! Public HTTP API
//!
//! Three stateless endpoints mirror the storefront's order flow: create a
//! payment intent, poll its status, provision a panel. Field checks at this
//! boundary are presence-only (absent, empty or zero means missing); the
//! richer constraints live in the order flow.

pub mod panels;
pub mod payments;

use crate::error::AppError;
use axum::http::HeaderMap;

/// Presence check used by every endpoint: an absent or empty string field
/// counts as missing. Whitespace is accepted; the storefront sends fields
/// as typed.
pub(crate) fn is_missing(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Tag an error with the request id the ingress middleware assigned, when
/// there is one.
pub(crate) fn attach_request_id(error: AppError, headers: &HeaderMap) -> AppError {
    match headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        Some(id) => error.with_request_id(id),
        None => error,
    }
}
