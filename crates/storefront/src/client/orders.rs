//! Order endpoints.
//!
//! Order creation always carries an `Idempotency-Key`. Callers normally go
//! through [`CheckoutAttempt`](crate::checkout::CheckoutAttempt), which owns
//! the key and decides when it may be reused.

use blossom_core::{IdempotencyKey, MemberId, OrderId};
use tracing::{info, instrument};

use super::{ApiClient, Call};
use crate::error::ApiError;
use crate::types::{CreateOrderRequest, Order};
use crate::validate::{Validate, ValidationError};

impl ApiClient {
    /// Order the contents of the member's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is not a valid cart order or the
    /// request fails. An unreadable confirmation is
    /// [`ApiError::Unconfirmed`]: retry with the same key.
    #[instrument(skip(self, request, key), fields(member_id = %request.member_id, idempotency_key = %key))]
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
        key: &IdempotencyKey,
    ) -> Result<Order, ApiError> {
        if request.is_direct_order {
            return Err(ValidationError::new("isDirectOrder", "must be false for a cart order").into());
        }
        self.place_order("/orders", request, key).await
    }

    /// Buy a single product without going through the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is not a valid direct order or the
    /// request fails. An unreadable confirmation is
    /// [`ApiError::Unconfirmed`]: retry with the same key.
    #[instrument(skip(self, request, key), fields(member_id = %request.member_id, idempotency_key = %key))]
    pub async fn create_direct_order(
        &self,
        request: &CreateOrderRequest,
        key: &IdempotencyKey,
    ) -> Result<Order, ApiError> {
        if !request.is_direct_order {
            return Err(ValidationError::new("isDirectOrder", "must be true for a direct order").into());
        }
        self.place_order("/orders/direct", request, key).await
    }

    async fn place_order(
        &self,
        path: &str,
        request: &CreateOrderRequest,
        key: &IdempotencyKey,
    ) -> Result<Order, ApiError> {
        request.validate()?;
        let order: Order = self
            .fetch(Call::post(path).json(request)?.idempotency_key(key))
            .await
            .map_err(ApiError::unconfirmed_if_malformed)?;
        info!(order_id = %order.id, order_no = %order.order_no, "Order created");
        Ok(order)
    }

    /// List a member's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or any order is malformed.
    #[instrument(skip(self))]
    pub async fn my_orders(&self, member_id: MemberId) -> Result<Vec<Order>, ApiError> {
        self.fetch(Call::get("/orders/my").query("memberId", member_id))
            .await
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or is malformed.
    #[instrument(skip(self))]
    pub async fn order(&self, order_id: OrderId) -> Result<Order, ApiError> {
        let path = format!("/orders/{order_id}");
        self.fetch(Call::get(&path)).await
    }

    /// Cancel an order that has not been prepared yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the cancellation.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<(), ApiError> {
        let path = format!("/orders/{order_id}/cancel");
        self.execute(Call::post(&path)).await?;
        info!(%order_id, "Order cancelled");
        Ok(())
    }
}
