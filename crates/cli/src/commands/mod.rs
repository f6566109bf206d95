//! Command implementations.
//!
//! Each module groups the commands for one area of the storefront. They all
//! share a [`Context`] built from the environment.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod stores;

use std::fmt::Display;

use blossom_storefront::checkout::CheckoutError;
use blossom_storefront::{ApiClient, ApiError, ClientConfig, ConfigError, Session, SessionError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The checkout did not go through.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The stored session could not be updated.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Configuration and client shared by every command.
pub struct Context {
    pub config: ClientConfig,
    pub client: ApiClient,
}

impl Context {
    /// Load configuration and restore the persisted session.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is missing or invalid.
    pub fn from_env() -> Result<Self, CommandError> {
        let config = ClientConfig::from_env()?;
        let session = Session::from_config(&config);
        let client = ApiClient::new(&config, session)?;
        Ok(Self { config, client })
    }
}

/// Write one line of command output to stdout.
#[allow(clippy::print_stdout)]
pub fn out(line: impl Display) {
    println!("{line}");
}
