//! The order-creation calls a checkout attempt can drive.

use async_trait::async_trait;
use blossom_core::{IdempotencyKey, MemberId, OptionId, OrderId, PaymentMethod, ProductId};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{CreateOrderRequest, DeliveryDetails, Order, PaymentRequest};
use crate::validate::{Validate, ValidationError};

/// One idempotent call that produces an [`Order`].
#[async_trait]
pub trait Submission: Send + Sync {
    /// Short name used in logs and messages.
    fn label(&self) -> &'static str;

    /// Check the payload before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Send the payload with `key` in the `Idempotency-Key` header.
    async fn submit(&self, client: &ApiClient, key: &IdempotencyKey) -> Result<Order, ApiError>;
}

/// Order everything in the member's cart (`POST /orders`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartOrder {
    request: CreateOrderRequest,
}

impl CartOrder {
    #[must_use]
    pub const fn new(member_id: MemberId, delivery: DeliveryDetails) -> Self {
        Self {
            request: CreateOrderRequest::cart(member_id, delivery),
        }
    }

    #[must_use]
    pub const fn request(&self) -> &CreateOrderRequest {
        &self.request
    }
}

#[async_trait]
impl Submission for CartOrder {
    fn label(&self) -> &'static str {
        "cart order"
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.request.validate()
    }

    async fn submit(&self, client: &ApiClient, key: &IdempotencyKey) -> Result<Order, ApiError> {
        client.create_order(&self.request, key).await
    }
}

/// Buy one product immediately (`POST /orders/direct`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectOrder {
    request: CreateOrderRequest,
}

impl DirectOrder {
    #[must_use]
    pub const fn new(
        member_id: MemberId,
        product_id: ProductId,
        quantity: i64,
        option_ids: Vec<OptionId>,
        delivery: DeliveryDetails,
    ) -> Self {
        Self {
            request: CreateOrderRequest::direct(member_id, product_id, quantity, option_ids, delivery),
        }
    }

    #[must_use]
    pub const fn request(&self) -> &CreateOrderRequest {
        &self.request
    }
}

#[async_trait]
impl Submission for DirectOrder {
    fn label(&self) -> &'static str {
        "direct order"
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.request.validate()
    }

    async fn submit(&self, client: &ApiClient, key: &IdempotencyKey) -> Result<Order, ApiError> {
        client.create_direct_order(&self.request, key).await
    }
}

/// Pay for an order that was already created (`POST /payments`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    request: PaymentRequest,
}

impl Payment {
    #[must_use]
    pub const fn new(order_id: OrderId, payment_method: PaymentMethod) -> Self {
        Self {
            request: PaymentRequest {
                order_id,
                payment_method,
            },
        }
    }

    #[must_use]
    pub const fn request(&self) -> &PaymentRequest {
        &self.request
    }
}

#[async_trait]
impl Submission for Payment {
    fn label(&self) -> &'static str {
        "payment"
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.request.validate()
    }

    async fn submit(&self, client: &ApiClient, key: &IdempotencyKey) -> Result<Order, ApiError> {
        client.pay(&self.request, key).await
    }
}
