//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BLOSSOM_API_URL` - Backend origin (e.g., `https://api.blossom.example`)
//!
//! ## Optional
//! - `BLOSSOM_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `BLOSSOM_USER_AGENT` - User agent, also used for platform detection
//!   (default: `blossom-storefront/<version>`)
//! - `BLOSSOM_SESSION_FILE` - Where the signed-in session is persisted
//! - `BLOSSOM_CATALOG_TTL_SECS` - Product list and system code cache TTL (default: 60)
//! - `BLOSSOM_SUBMIT_RETRIES` - Automatic retries of transient checkout failures (default: 2)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_CATALOG_TTL_SECS: &str = "60";
const DEFAULT_SUBMIT_RETRIES: &str = "2";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin; API paths are resolved against it
    pub api_base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Location of the persisted session, if any
    pub session_file: Option<PathBuf>,
    /// How long catalog responses stay cached
    pub catalog_ttl: Duration,
    /// Automatic retries of transient checkout failures
    pub submit_retries: u32,
}

impl ClientConfig {
    /// Configuration with defaults for everything except the backend URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            timeout: Duration::from_secs(30),
            user_agent: default_user_agent(),
            session_file: None,
            catalog_ttl: Duration::from_secs(60),
            submit_retries: 2,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let raw_url = env.required("BLOSSOM_API_URL")?;
        let api_base_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("BLOSSOM_API_URL".to_string(), e.to_string()))?;
        if api_base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "BLOSSOM_API_URL".to_string(),
                "must be an http(s) origin".to_string(),
            ));
        }

        let timeout = Duration::from_secs(
            env.parsed("BLOSSOM_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        );
        let user_agent = env
            .optional("BLOSSOM_USER_AGENT")
            .unwrap_or_else(default_user_agent);
        let session_file = env.optional("BLOSSOM_SESSION_FILE").map(PathBuf::from);
        let catalog_ttl = Duration::from_secs(
            env.parsed("BLOSSOM_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL_SECS)?,
        );
        let submit_retries = env.parsed("BLOSSOM_SUBMIT_RETRIES", DEFAULT_SUBMIT_RETRIES)?;

        Ok(Self {
            api_base_url,
            timeout,
            user_agent,
            session_file,
            catalog_ttl,
            submit_retries,
        })
    }
}

fn default_user_agent() -> String {
    format!("blossom-storefront/{}", env!("CARGO_PKG_VERSION"))
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Parse a variable, falling back to a default.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ClientConfig::from_lookup(lookup(&[("BLOSSOM_API_URL", "http://localhost:8080")]))
                .unwrap();

        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.catalog_ttl, Duration::from_secs(60));
        assert_eq!(config.submit_retries, 2);
        assert!(config.session_file.is_none());
        assert!(config.user_agent.starts_with("blossom-storefront/"));
    }

    #[test]
    fn test_missing_url() {
        let result = ClientConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(key)) if key == "BLOSSOM_API_URL"));
    }

    #[test]
    fn test_invalid_url() {
        let result = ClientConfig::from_lookup(lookup(&[("BLOSSOM_API_URL", "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));

        let result = ClientConfig::from_lookup(lookup(&[("BLOSSOM_API_URL", "mailto:a@b.c")]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BLOSSOM_API_URL", "https://api.example.com"),
            ("BLOSSOM_HTTP_TIMEOUT_SECS", "5"),
            ("BLOSSOM_USER_AGENT", "Mozilla/5.0 (Linux; Android 14)"),
            ("BLOSSOM_SESSION_FILE", "/tmp/blossom-session.json"),
            ("BLOSSOM_CATALOG_TTL_SECS", "0"),
            ("BLOSSOM_SUBMIT_RETRIES", "4"),
        ]))
        .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "Mozilla/5.0 (Linux; Android 14)");
        assert_eq!(
            config.session_file,
            Some(PathBuf::from("/tmp/blossom-session.json"))
        );
        assert_eq!(config.catalog_ttl, Duration::ZERO);
        assert_eq!(config.submit_retries, 4);
    }

    #[test]
    fn test_invalid_number() {
        let result = ClientConfig::from_lookup(lookup(&[
            ("BLOSSOM_API_URL", "https://api.example.com"),
            ("BLOSSOM_SUBMIT_RETRIES", "many"),
        ]));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar(key, _)) if key == "BLOSSOM_SUBMIT_RETRIES")
        );
    }

    #[test]
    fn test_blank_optional_is_unset() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("BLOSSOM_API_URL", "https://api.example.com"),
            ("BLOSSOM_SESSION_FILE", "  "),
        ]))
        .unwrap();
        assert!(config.session_file.is_none());
    }
}
