//! Blossom Core - Shared types library.
//!
//! This crate provides the domain types shared by every Blossom component:
//! - `storefront` - Typed client for the storefront REST backend
//! - `cli` - Command-line front end built on the client
//! - `integration-tests` - Mock backend and end-to-end checkout tests
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere, including
//! by the mock backend that has to check what the client sends.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, idempotency keys, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
