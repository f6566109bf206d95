//! Payment endpoint.

use blossom_core::IdempotencyKey;
use tracing::{info, instrument, warn};

use super::{ApiClient, Call};
use crate::error::ApiError;
use crate::types::{Order, PaymentRequest};
use crate::validate::Validate;

impl ApiClient {
    /// Pay for an order, then return the order as the backend now records it.
    ///
    /// The payment call carries its own idempotency key; reuse it when
    /// retrying the same payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is rejected or the request fails. Once
    /// the payment is accepted, any failure to read the order back is
    /// [`ApiError::Unconfirmed`].
    #[instrument(
        skip(self, request, key),
        fields(order_id = %request.order_id, method = %request.payment_method, idempotency_key = %key)
    )]
    pub async fn pay(&self, request: &PaymentRequest, key: &IdempotencyKey) -> Result<Order, ApiError> {
        request.validate()?;
        self.execute(Call::post("/payments").json(request)?.idempotency_key(key))
            .await?;
        info!("Payment accepted");
        self.order(request.order_id).await.map_err(|e| {
            warn!(error = %e, "Payment accepted but the order could not be read back");
            ApiError::Unconfirmed(format!("payment accepted, order refresh failed: {e}"))
        })
    }
}
