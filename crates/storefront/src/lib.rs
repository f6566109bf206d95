//! Blossom Storefront client library.
//!
//! Typed access to the florist storefront backend: catalog, cart, orders,
//! payments, store locator, and member accounts. Order creation and payment
//! go through [`checkout::CheckoutAttempt`], which owns the idempotency key
//! and makes retries safe.
//!
//! # Example
//!
//! ```rust,no_run
//! use blossom_core::{DeliveryMethod, ProductId};
//! use blossom_storefront::checkout::{CheckoutAttempt, DirectOrder, RetryPolicy};
//! use blossom_storefront::types::{DeliveryDetails, LoginRequest};
//! use blossom_storefront::{ApiClient, ClientConfig, Session};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let client = ApiClient::new(&config, Session::from_config(&config))?;
//! let member = client.login(&LoginRequest::new("florist", "secret1")).await?;
//!
//! let delivery = DeliveryDetails::new(DeliveryMethod::Pickup, "Kim", "010-1234-5678", "Seoul");
//! let order = DirectOrder::new(member.id, ProductId::new(1), 1, Vec::new(), delivery);
//! let mut attempt = CheckoutAttempt::begin(client.clone(), order);
//! let placed = attempt.submit_with(&RetryPolicy::from_config(&config)).await?;
//! println!("placed {}", placed.order_no);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bridge;
pub mod cart;
pub mod checkout;
pub mod client;
pub mod codes;
pub mod config;
pub mod error;
pub mod guard;
pub mod session;
pub mod types;
pub mod validate;

pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, FailureKind};
pub use session::{Session, SessionError};
