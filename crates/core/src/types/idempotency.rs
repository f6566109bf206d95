//! Idempotency keys for order and payment submission.
//!
//! A key identifies one logical checkout attempt. Every HTTP attempt that
//! belongs to the same checkout carries the same key in the
//! [`IdempotencyKey::HEADER`] header, which lets the backend deduplicate
//! retries instead of creating a second order. A new checkout action must
//! mint a new key with [`IdempotencyKey::generate`].

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing an [`IdempotencyKey`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyKeyError {
    /// The header value is empty.
    #[error("idempotency key cannot be empty")]
    Empty,
    /// The header value is not a hyphenated lowercase UUID.
    #[error("idempotency key must be a lowercase hyphenated UUID, got {0:?}")]
    Malformed(String),
}

/// An opaque per-attempt token in UUID-v4 textual form.
///
/// The textual form is always 36 characters of lowercase hex digits and
/// hyphens (`^[0-9a-f-]+$`).
///
/// ## Examples
///
/// ```
/// use blossom_core::IdempotencyKey;
///
/// let key = IdempotencyKey::generate();
/// assert_eq!(key.as_str().len(), IdempotencyKey::LENGTH);
/// assert!(key.as_str().chars().all(|c| matches!(c, '0'..='9' | 'a'..='f' | '-')));
///
/// // A retry reuses the same key; a new checkout mints a new one.
/// let retry = key.clone();
/// assert_eq!(retry, key);
/// assert_ne!(IdempotencyKey::generate(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// HTTP header that carries the key.
    pub const HEADER: &'static str = "Idempotency-Key";

    /// Length of the textual form (32 hex digits and 4 hyphens).
    pub const LENGTH: usize = 36;

    /// Mint a fresh key with 122 bits of randomness (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Parse a key received on the wire (e.g. by a backend checking headers).
    ///
    /// # Errors
    ///
    /// Returns an error if the value is empty, is not exactly 36 characters
    /// of lowercase hex and hyphens, or is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, IdempotencyKeyError> {
        if s.is_empty() {
            return Err(IdempotencyKeyError::Empty);
        }

        let well_formed = s.len() == Self::LENGTH
            && s.bytes()
                .all(|b| b == b'-' || b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
            && Uuid::try_parse(s).is_ok();

        if !well_formed {
            return Err(IdempotencyKeyError::Malformed(s.to_owned()));
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for IdempotencyKey {
    type Err = IdempotencyKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn is_lower_hex_or_hyphen(s: &str) -> bool {
        s.chars()
            .all(|c| c == '-' || c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn test_generated_key_is_uuid_shaped() {
        for _ in 0..100 {
            let key = IdempotencyKey::generate();
            assert_eq!(key.as_str().len(), 36);
            assert!(is_lower_hex_or_hyphen(key.as_str()), "bad key: {key}");
            assert_eq!(key.as_str().matches('-').count(), 4);
        }
    }

    #[test]
    fn test_generated_key_is_version_4() {
        let key = IdempotencyKey::generate();
        let uuid = Uuid::parse_str(key.as_str()).unwrap();
        assert_eq!(uuid.get_version_num(), 4);
    }

    #[test]
    fn test_no_collisions_in_ten_thousand_keys() {
        let keys: HashSet<IdempotencyKey> =
            (0..10_000).map(|_| IdempotencyKey::generate()).collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn test_parse_accepts_generated_key() {
        let key = IdempotencyKey::generate();
        assert_eq!(IdempotencyKey::parse(key.as_str()).unwrap(), key);
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(IdempotencyKey::parse(""), Err(IdempotencyKeyError::Empty));
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        let upper = IdempotencyKey::generate().as_str().to_uppercase();
        assert!(matches!(
            IdempotencyKey::parse(&upper),
            Err(IdempotencyKeyError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(IdempotencyKey::parse("abc-123").is_err());
        assert!(IdempotencyKey::parse("0123456789abcdef0123456789abcdef").is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let key = IdempotencyKey::generate();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"{key}\""));
    }
}
