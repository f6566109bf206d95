//! Wire types for the storefront REST API.
//!
//! Field names follow the backend's camelCase JSON. Every response type
//! implements [`Validate`](crate::validate::Validate); the client never
//! hands out a value that failed it.

pub mod cart;
pub mod order;
pub mod page;
pub mod product;
pub mod store;
pub mod system;
pub mod user;

pub use cart::{AddCartItemRequest, Cart, CartItem};
pub use order::{CreateOrderRequest, DeliveryDetails, Order, OrderItem, PaymentRequest};
pub use page::{Page, PageRequest};
pub use product::{
    CreateProductRequest, NewProductOption, Product, ProductAddon, ProductListing, ProductOption,
    UpdateProductRequest,
};
pub use store::{CreateStoreRequest, NearbyStoreQuery, Store, StoreWithDistance};
pub use system::{CodeItem, SystemCodes};
pub use user::{LoginRequest, RegisterRequest, User};

/// Backend timestamps.
///
/// The backend emits local date-times without an offset
/// (`2025-03-01T10:15:30` or with fractional seconds). RFC 3339 values with
/// an offset are accepted too and normalized to UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw:?}")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(raw, FORMAT))
            .ok()
    }

}
