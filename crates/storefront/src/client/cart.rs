//! Cart endpoints.

use blossom_core::{CartItemId, MemberId, OptionId};
use serde_json::json;
use tracing::instrument;

use super::{ApiClient, Call};
use crate::error::ApiError;
use crate::types::{AddCartItemRequest, Cart};
use crate::validate::{self, Validate};

impl ApiClient {
    /// Fetch a member's cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the cart is malformed.
    #[instrument(skip(self))]
    pub async fn cart(&self, member_id: MemberId) -> Result<Cart, ApiError> {
        self.fetch(Call::get("/carts").query("memberId", member_id))
            .await
    }

    /// Put a product into the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or the backend rejects it.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, quantity = request.quantity))]
    pub async fn add_cart_item(&self, request: &AddCartItemRequest) -> Result<(), ApiError> {
        request.validate()?;
        self.execute(Call::post("/carts/items").json(request)?)
            .await
    }

    /// Change the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the quantity is not positive or the backend rejects it.
    #[instrument(skip(self))]
    pub async fn update_cart_item_quantity(
        &self,
        member_id: MemberId,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<(), ApiError> {
        validate::positive_count("quantity", quantity)?;
        let path = format!("/carts/items/{item_id}");
        self.execute(
            Call::patch(&path)
                .query("memberId", member_id)
                .json(&json!({ "quantity": quantity }))?,
        )
        .await
    }

    /// Replace the options chosen for a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the change.
    #[instrument(skip(self))]
    pub async fn update_cart_item_options(
        &self,
        member_id: MemberId,
        item_id: CartItemId,
        option_ids: &[OptionId],
    ) -> Result<(), ApiError> {
        let path = format!("/carts/items/{item_id}/options");
        self.execute(
            Call::patch(&path)
                .query("memberId", member_id)
                .json(&json!({ "optionIds": option_ids }))?,
        )
        .await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal.
    #[instrument(skip(self))]
    pub async fn remove_cart_item(
        &self,
        member_id: MemberId,
        item_id: CartItemId,
    ) -> Result<(), ApiError> {
        let path = format!("/carts/items/{item_id}");
        self.execute(Call::delete(&path).query("memberId", member_id))
            .await
    }
}
