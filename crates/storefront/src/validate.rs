//! Validation at trust boundaries.
//!
//! Outgoing requests are validated before they touch the network, and every
//! response body is validated after `serde` has decoded it. A value that
//! fails either check is rejected; nothing downstream ever sees it.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// `HH:mm` between 00:00 and 23:59.
static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("Invalid regex"));

/// A value that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Wire name of the offending field.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for a field.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Prefix the field with its container (e.g. `items[2].quantity`).
    #[must_use]
    pub fn within(self, container: &str) -> Self {
        Self {
            field: format!("{container}.{}", self.field),
            message: self.message,
        }
    }
}

/// Types that can check their own invariants.
pub trait Validate {
    /// Check invariants that the type system cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        for (i, item) in self.iter().enumerate() {
            item.validate().map_err(|e| e.within(&format!("[{i}]")))?;
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        self.as_ref().map_or(Ok(()), Validate::validate)
    }
}

/// Validate every element of a nested collection.
///
/// # Errors
///
/// Returns the first failure, with the field path pointing into the collection.
pub fn each<T: Validate>(field: &str, items: &[T]) -> Result<(), ValidationError> {
    for (i, item) in items.iter().enumerate() {
        item.validate()
            .map_err(|e| e.within(&format!("{field}[{i}]")))?;
    }
    Ok(())
}

/// Require a string with at least one non-whitespace character.
///
/// # Errors
///
/// Returns an error if the value is blank.
pub fn non_blank(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

/// Require a string of at least `min` characters.
///
/// # Errors
///
/// Returns an error if the value is shorter than `min` characters.
pub fn min_chars(field: &str, value: &str, min: usize) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(ValidationError::new(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    Ok(())
}

/// Require a decimal amount of zero or more.
///
/// # Errors
///
/// Returns an error if the amount is negative.
pub fn non_negative(field: &str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    Ok(())
}

/// Require an integer count of zero or more.
///
/// # Errors
///
/// Returns an error if the count is negative.
pub fn non_negative_count(field: &str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    Ok(())
}

/// Require an integer count of one or more.
///
/// # Errors
///
/// Returns an error if the count is zero or negative.
pub fn positive_count(field: &str, value: i64) -> Result<(), ValidationError> {
    if value < 1 {
        return Err(ValidationError::new(field, "must be at least 1"));
    }
    Ok(())
}

/// Require a wall-clock time in `HH:mm` form.
///
/// # Errors
///
/// Returns an error if the value is not a valid 24-hour `HH:mm` time.
pub fn clock_time(field: &str, value: &str) -> Result<(), ValidationError> {
    if !CLOCK_TIME.is_match(value) {
        return Err(ValidationError::new(field, "must be a time in HH:mm form"));
    }
    Ok(())
}

/// Require a latitude/longitude pair in range.
///
/// # Errors
///
/// Returns an error if either coordinate is out of range or not finite.
pub fn coordinates(lat: f64, lon: f64) -> Result<(), ValidationError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::new("lat", "must be between -90 and 90"));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(ValidationError::new("lon", "must be between -180 and 180"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_time() {
        assert!(clock_time("openTime", "09:00").is_ok());
        assert!(clock_time("openTime", "23:59").is_ok());
        assert!(clock_time("openTime", "00:00").is_ok());
        assert!(clock_time("openTime", "9:00").is_err());
        assert!(clock_time("closeTime", "25:00").is_err());
        assert!(clock_time("closeTime", "12:60").is_err());
    }

    #[test]
    fn test_min_chars_counts_characters_not_bytes() {
        // Five Hangul syllables are fifteen UTF-8 bytes.
        assert!(min_chars("description", "아름다운꽃", 6).is_err());
        assert!(min_chars("description", "아름다운꽃집", 6).is_ok());
    }

    #[test]
    fn test_non_blank() {
        assert!(non_blank("name", "Rose").is_ok());
        let err = non_blank("name", "   ").unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn test_amounts() {
        assert!(non_negative("price", Decimal::ZERO).is_ok());
        assert!(non_negative("price", Decimal::from(-1)).is_err());
        assert!(positive_count("quantity", 0).is_err());
        assert!(non_negative_count("stockQuantity", 0).is_ok());
    }

    #[test]
    fn test_coordinates() {
        assert!(coordinates(37.4979, 127.0276).is_ok());
        assert!(coordinates(91.0, 0.0).is_err());
        assert!(coordinates(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_within_builds_paths() {
        let err = ValidationError::new("quantity", "must be at least 1").within("items[2]");
        assert_eq!(err.to_string(), "items[2].quantity: must be at least 1");
    }
}
