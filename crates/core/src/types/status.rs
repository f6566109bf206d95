//! Status and code enums shared with the backend.
//!
//! All enums use the backend's `SCREAMING_SNAKE_CASE` wire names. Unknown
//! values fail deserialization, so a response carrying a status this client
//! does not understand is rejected rather than guessed at.

use serde::{Deserialize, Serialize};

/// Implements `Display` and `FromStr` using the wire names.
macro_rules! wire_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Wire name as sent by the backend.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().replace('-', "_").as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", stringify!($ty), ": {}"), s)),
                }
            }
        }
    };
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Preparing,
    Shipping,
    Delivered,
    Cancelled,
}

wire_names!(OrderStatus {
    Pending => "PENDING",
    Paid => "PAID",
    Preparing => "PREPARING",
    Shipping => "SHIPPING",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

impl OrderStatus {
    /// Whether the order can still be cancelled by the customer.
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }

    /// Whether the order has reached a final state.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    /// Customer collects the order at the store.
    Pickup,
    /// Parcel shipping.
    Shipping,
    /// Same-day quick delivery.
    Quick,
}

wire_names!(DeliveryMethod {
    Pickup => "PICKUP",
    Shipping => "SHIPPING",
    Quick => "QUICK",
});

/// Member role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Full access to the back-office.
    RootAdmin,
    /// Manages the product catalog.
    ProductAdmin,
    /// Manages deliveries.
    DeliveryAdmin,
    /// Regular customer.
    User,
    /// Browsing without an account.
    Guest,
}

wire_names!(UserRole {
    RootAdmin => "ROOT_ADMIN",
    ProductAdmin => "PRODUCT_ADMIN",
    DeliveryAdmin => "DELIVERY_ADMIN",
    User => "USER",
    Guest => "GUEST",
});

impl UserRole {
    /// Whether the role grants access to the back-office.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(
            self,
            Self::RootAdmin | Self::ProductAdmin | Self::DeliveryAdmin
        )
    }
}

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    FlowerBouquet,
    Plant,
    Wreath,
    Orchid,
    Basket,
}

wire_names!(ProductCategory {
    FlowerBouquet => "FLOWER_BOUQUET",
    Plant => "PLANT",
    Wreath => "WREATH",
    Orchid => "ORCHID",
    Basket => "BASKET",
});

/// Which delivery methods a product supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryType {
    Quick,
    Parcel,
    Mixed,
}

wire_names!(DeliveryType {
    Quick => "QUICK",
    Parcel => "PARCEL",
    Mixed => "MIXED",
});

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
}

wire_names!(PaymentMethod {
    Card => "CARD",
    BankTransfer => "BANK_TRANSFER",
});
