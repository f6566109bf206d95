//! Cart view with product details merged in.

use blossom_core::{CartItemId, MemberId, OptionId, ProductId};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::checkout::{CartOrder, CheckoutAttempt};
use crate::client::ApiClient;
use crate::error::ApiError;
use crate::types::{AddCartItemRequest, Cart, CartItem, DeliveryDetails, Product};
use crate::validate::ValidationError;

/// Shown for cart lines whose product is no longer listed.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// A cart line with the product's display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item: CartItem,
    pub product_name: String,
    pub thumbnail_url: Option<String>,
}

/// The signed-in member's cart.
#[derive(Debug, Clone)]
pub struct CartView {
    client: ApiClient,
    cart: Option<Cart>,
    lines: Vec<CartLine>,
}

impl CartView {
    /// Load the cart for the session's member.
    ///
    /// Signed-out sessions get an empty cart without touching the network.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart or the product list cannot be fetched.
    pub async fn load(client: &ApiClient) -> Result<Self, ApiError> {
        let mut view = Self {
            client: client.clone(),
            cart: None,
            lines: Vec::new(),
        };
        view.reload().await?;
        Ok(view)
    }

    /// Fetch the cart again.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart or the product list cannot be fetched.
    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<(), ApiError> {
        let Some(member_id) = self.client.session().member_id() else {
            self.cart = None;
            self.lines.clear();
            return Ok(());
        };

        let (cart, products) =
            tokio::try_join!(self.client.cart(member_id), self.client.products())?;
        self.lines = merge(&cart, &products);
        debug!(lines = self.lines.len(), "Cart loaded");
        self.cart = Some(cart);
        Ok(())
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.cart.as_ref().map_or(Decimal::ZERO, |c| c.total_price)
    }

    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.cart.as_ref().map_or(0, |c| c.total_quantity)
    }

    fn member_id(&self) -> Result<MemberId, ApiError> {
        self.client.session().member_id().ok_or(ApiError::NotSignedIn)
    }

    /// Add a product, then reload.
    ///
    /// # Errors
    ///
    /// Returns an error if signed out, the quantity is invalid, or a request fails.
    pub async fn add(
        &mut self,
        product_id: ProductId,
        quantity: i64,
        option_ids: Vec<OptionId>,
    ) -> Result<(), ApiError> {
        let request = AddCartItemRequest {
            member_id: self.member_id()?,
            product_id,
            quantity,
            option_ids,
        };
        self.client.add_cart_item(&request).await?;
        self.reload().await
    }

    /// Change a line's quantity, then reload.
    ///
    /// # Errors
    ///
    /// Returns an error if signed out, the quantity is invalid, or a request fails.
    pub async fn set_quantity(&mut self, item_id: CartItemId, quantity: i64) -> Result<(), ApiError> {
        let member_id = self.member_id()?;
        self.client
            .update_cart_item_quantity(member_id, item_id, quantity)
            .await?;
        self.reload().await
    }

    /// Change a line's options, then reload.
    ///
    /// # Errors
    ///
    /// Returns an error if signed out or a request fails.
    pub async fn set_options(
        &mut self,
        item_id: CartItemId,
        option_ids: &[OptionId],
    ) -> Result<(), ApiError> {
        let member_id = self.member_id()?;
        self.client
            .update_cart_item_options(member_id, item_id, option_ids)
            .await?;
        self.reload().await
    }

    /// Remove a line, then reload.
    ///
    /// # Errors
    ///
    /// Returns an error if signed out or a request fails.
    pub async fn remove(&mut self, item_id: CartItemId) -> Result<(), ApiError> {
        let member_id = self.member_id()?;
        self.client.remove_cart_item(member_id, item_id).await?;
        self.reload().await
    }

    /// Begin a checkout of the whole cart.
    ///
    /// Reload the view after the order succeeds; the backend empties the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if signed out or the cart is empty.
    pub fn checkout(&self, delivery: DeliveryDetails) -> Result<CheckoutAttempt<CartOrder>, ApiError> {
        let member_id = self.member_id()?;
        if self.is_empty() {
            return Err(ValidationError::new("items", "cart is empty").into());
        }
        Ok(CheckoutAttempt::begin(
            self.client.clone(),
            CartOrder::new(member_id, delivery),
        ))
    }
}

fn merge(cart: &Cart, products: &[Product]) -> Vec<CartLine> {
    cart.items
        .iter()
        .map(|item| {
            let product = products.iter().find(|p| p.id == item.product_id);
            CartLine {
                item: item.clone(),
                product_name: product.map_or_else(|| UNKNOWN_PRODUCT.to_string(), |p| p.name.clone()),
                thumbnail_url: product.and_then(|p| p.thumbnail_url.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::config::ClientConfig;
    use crate::session::Session;

    #[test]
    fn test_merge_fills_unknown_products() {
        let cart: Cart = serde_json::from_value(json!({
            "items": [
                {"id": 1, "productId": 10, "quantity": 1},
                {"id": 2, "productId": 99, "quantity": 2}
            ],
            "totalPrice": 30000,
            "totalQuantity": 3
        }))
        .unwrap();
        let products: Vec<Product> = serde_json::from_value(json!([
            {"id": 10, "name": "Tulip", "price": 10000, "stockQuantity": 5, "thumbnailUrl": "/t.jpg"}
        ]))
        .unwrap();

        let lines = merge(&cart, &products);
        assert_eq!(lines[0].product_name, "Tulip");
        assert_eq!(lines[0].thumbnail_url.as_deref(), Some("/t.jpg"));
        assert_eq!(lines[1].product_name, UNKNOWN_PRODUCT);
        assert!(lines[1].thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn test_signed_out_cart_is_empty_without_requests() {
        // Nothing listens on this port; any request would fail.
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let client = ApiClient::new(&config, Session::in_memory()).unwrap();

        let view = CartView::load(&client).await.unwrap();
        assert!(view.is_empty());
        assert_eq!(view.total_price(), Decimal::ZERO);
        assert_eq!(view.total_quantity(), 0);
        assert!(matches!(
            view.checkout(DeliveryDetails::new(
                blossom_core::DeliveryMethod::Pickup,
                "Kim",
                "010",
                "Seoul"
            )),
            Err(ApiError::NotSignedIn)
        ));
    }
}
