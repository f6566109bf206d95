//! Order and payment types.

use blossom_core::{
    DeliveryMethod, MemberId, OptionId, OrderId, OrderStatus, PaymentMethod, ProductId,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::validate::{self, Validate, ValidationError};

/// An order as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_no: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
}

impl Order {
    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

impl Validate for Order {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("orderNo", &self.order_no)?;
        validate::non_negative("totalAmount", self.total_amount)?;
        validate::each("items", &self.items)
    }
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_ids: Vec<OptionId>,
}

impl Validate for OrderItem {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::positive_count("quantity", self.quantity)?;
        validate::non_negative("price", self.price)
    }
}

/// Where and how an order is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub delivery_method: DeliveryMethod,
    /// Requested pickup or delivery time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_card: Option<String>,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub delivery_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_note: Option<String>,
}

impl DeliveryDetails {
    /// Delivery details with the required fields only.
    #[must_use]
    pub fn new(
        delivery_method: DeliveryMethod,
        delivery_name: impl Into<String>,
        delivery_phone: impl Into<String>,
        delivery_address: impl Into<String>,
    ) -> Self {
        Self {
            delivery_method,
            reserved_at: None,
            message_card: None,
            delivery_address: delivery_address.into(),
            delivery_phone: delivery_phone.into(),
            delivery_name: delivery_name.into(),
            delivery_note: None,
        }
    }
}

impl Validate for DeliveryDetails {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::non_blank("deliveryAddress", &self.delivery_address)?;
        validate::non_blank("deliveryPhone", &self.delivery_phone)?;
        validate::non_blank("deliveryName", &self.delivery_name)?;
        if let Some(reserved_at) = &self.reserved_at
            && timestamp::parse(reserved_at).is_none()
        {
            return Err(ValidationError::new(
                "reservedAt",
                "must be a date-time like 2025-03-01T10:00:00",
            ));
        }
        Ok(())
    }
}

/// Order creation payload shared by cart checkout and direct purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub member_id: MemberId,
    #[serde(default)]
    pub is_direct_order: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_ids: Vec<OptionId>,
    #[serde(flatten)]
    pub delivery: DeliveryDetails,
}

impl CreateOrderRequest {
    /// Order everything in the member's cart.
    #[must_use]
    pub const fn cart(member_id: MemberId, delivery: DeliveryDetails) -> Self {
        Self {
            member_id,
            is_direct_order: false,
            product_id: None,
            quantity: None,
            option_ids: Vec::new(),
            delivery,
        }
    }

    /// Buy one product immediately, bypassing the cart.
    #[must_use]
    pub const fn direct(
        member_id: MemberId,
        product_id: ProductId,
        quantity: i64,
        option_ids: Vec<OptionId>,
        delivery: DeliveryDetails,
    ) -> Self {
        Self {
            member_id,
            is_direct_order: true,
            product_id: Some(product_id),
            quantity: Some(quantity),
            option_ids,
            delivery,
        }
    }
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.is_direct_order {
            if self.product_id.is_none() {
                return Err(ValidationError::new(
                    "productId",
                    "is required for a direct order",
                ));
            }
            match self.quantity {
                Some(quantity) => validate::positive_count("quantity", quantity)?,
                None => {
                    return Err(ValidationError::new(
                        "quantity",
                        "is required for a direct order",
                    ));
                }
            }
        } else if self.product_id.is_some() || self.quantity.is_some() {
            return Err(ValidationError::new(
                "productId",
                "a cart order takes its lines from the cart",
            ));
        }
        self.delivery.validate()
    }
}

/// Payment for an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub payment_method: PaymentMethod,
}

impl Validate for PaymentRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate::positive_count("orderId", self.order_id.as_i64())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn delivery() -> DeliveryDetails {
        DeliveryDetails::new(
            DeliveryMethod::Shipping,
            "Kim Minji",
            "010-1234-5678",
            "Seoul, Gangnam-gu 123",
        )
    }

    fn order_json() -> serde_json::Value {
        json!({
            "id": 42,
            "orderNo": "ORD-20250301-0042",
            "totalAmount": 35000,
            "status": "PENDING",
            "items": [
                {"productId": 1, "productName": "Red Rose", "quantity": 1, "price": 35000}
            ],
            "createdAt": "2025-03-01T10:15:30"
        })
    }

    #[test]
    fn test_order_decodes() {
        let order: Order = serde_json::from_value(order_json()).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_quantity(), 1);
        assert!(order.validate().is_ok());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut value = order_json();
        value["status"] = json!("LOST_IN_TRANSIT");
        assert!(serde_json::from_value::<Order>(value).is_err());
    }

    #[test]
    fn test_missing_order_no_is_rejected() {
        let mut value = order_json();
        value.as_object_mut().unwrap().remove("orderNo");
        assert!(serde_json::from_value::<Order>(value).is_err());
    }

    #[test]
    fn test_negative_quantity_fails_validation() {
        let mut value = order_json();
        value["items"][0]["quantity"] = json!(-1);
        let order: Order = serde_json::from_value(value).unwrap();
        assert_eq!(order.validate().unwrap_err().field, "items[0].quantity");
    }

    #[test]
    fn test_direct_order_wire_shape() {
        let request = CreateOrderRequest::direct(
            MemberId::new(5),
            ProductId::new(1),
            2,
            vec![OptionId::new(10)],
            delivery(),
        );
        assert!(request.validate().is_ok());

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["memberId"], 5);
        assert_eq!(json["isDirectOrder"], true);
        assert_eq!(json["productId"], 1);
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["optionIds"], json!([10]));
        assert_eq!(json["deliveryMethod"], "SHIPPING");
        assert_eq!(json["deliveryName"], "Kim Minji");
        assert!(json.get("messageCard").is_none());
    }

    #[test]
    fn test_cart_order_omits_product() {
        let json = serde_json::to_value(CreateOrderRequest::cart(MemberId::new(5), delivery())).unwrap();
        assert_eq!(json["isDirectOrder"], false);
        assert!(json.get("productId").is_none());
        assert!(json.get("optionIds").is_none());
    }

    #[test]
    fn test_order_request_validation() {
        let mut request = CreateOrderRequest::cart(MemberId::new(5), delivery());
        request.delivery.delivery_address = "  ".to_string();
        assert_eq!(request.validate().unwrap_err().field, "deliveryAddress");

        let mut request = CreateOrderRequest::direct(
            MemberId::new(5),
            ProductId::new(1),
            0,
            Vec::new(),
            delivery(),
        );
        assert_eq!(request.validate().unwrap_err().field, "quantity");
        request.quantity = None;
        assert_eq!(request.validate().unwrap_err().field, "quantity");

        let mut request = CreateOrderRequest::cart(MemberId::new(5), delivery());
        request.product_id = Some(ProductId::new(1));
        assert_eq!(request.validate().unwrap_err().field, "productId");

        let mut request = CreateOrderRequest::cart(MemberId::new(5), delivery());
        request.delivery.reserved_at = Some("tomorrow".to_string());
        assert_eq!(request.validate().unwrap_err().field, "reservedAt");
        request.delivery.reserved_at = Some("2025-03-02T14:00:00".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_payment_request_wire_shape() {
        let request = PaymentRequest {
            order_id: OrderId::new(42),
            payment_method: PaymentMethod::Card,
        };
        assert_eq!(
            serde_json::to_value(request).unwrap(),
            json!({"orderId": 42, "paymentMethod": "CARD"})
        );
    }
}
