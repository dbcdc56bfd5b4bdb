use crate::payments::error::PaymentResult;
use crate::payments::types::{PaymentIntent, PaymentStatus};
use async_trait::async_trait;

/// Seam between the order pipeline and the QR payment gateway.
///
/// `create_intent` turns an amount into a scannable QR code plus tracking
/// id; `poll_status` is a stateless read of the gateway's view of that id.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, amount: u64) -> PaymentResult<PaymentIntent>;

    async fn poll_status(&self, order_id: &str) -> PaymentResult<PaymentStatus>;
}
