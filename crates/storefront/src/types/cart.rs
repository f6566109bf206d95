//! Shopping cart types.

use blossom_core::{CartId, CartItemId, MemberId, OptionId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validate::{self, Validate, ValidationError};

/// A member's cart as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub id: Option<CartId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub total_price: Decimal,
    pub total_quantity: i64,
}

impl Cart {
    /// Whether the cart holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by its ID.
    #[must_use]
    pub fn item(&self, id: CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

impl Validate for Cart {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_negative("totalPrice", self.total_price)?;
        validate::non_negative_count("totalQuantity", self.total_quantity)?;
        validate::each("items", &self.items)
    }
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub option_ids: Vec<OptionId>,
}

impl Validate for CartItem {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::positive_count("quantity", self.quantity)
    }
}

/// Request to put a product into a member's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub member_id: MemberId,
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub option_ids: Vec<OptionId>,
}

impl Validate for AddCartItemRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::positive_count("quantity", self.quantity)
    }
}
