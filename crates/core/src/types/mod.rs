//! Core types for Blossom.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod idempotency;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use idempotency::{IdempotencyKey, IdempotencyKeyError};
pub use price::{CurrencyCode, Price, format_currency};
pub use status::*;
