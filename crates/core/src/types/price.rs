//! Type-safe price representation using decimal arithmetic.
//!
//! The backend sends amounts as plain JSON numbers in Korean won. DTOs keep
//! them as [`Decimal`] and wrap them in [`Price`] for display.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (won, dollars).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Korean won.
    #[must_use]
    pub const fn krw(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::KRW)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minor_units = self.currency_code.minor_units();
        let rounded = self
            .amount
            .round_dp_with_strategy(minor_units, RoundingStrategy::MidpointAwayFromZero);

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        let digits = format!("{:.*}", minor_units as usize, rounded.abs());
        let (whole, fraction) = digits
            .split_once('.')
            .map_or((digits.as_str(), None), |(w, fr)| (w, Some(fr)));

        write!(
            f,
            "{sign}{}{}",
            self.currency_code.symbol(),
            group_thousands(whole)
        )?;
        if let Some(fraction) = fraction {
            write!(f, ".{fraction}")?;
        }
        Ok(())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    KRW,
    USD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::KRW => "₩",
            Self::USD => "$",
        }
    }

    /// Number of decimal places shown for this currency.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::KRW => 0,
            Self::USD => 2,
        }
    }
}

/// Format a won amount for display (e.g. `₩1,000`).
#[must_use]
pub fn format_currency(amount: Decimal) -> String {
    Price::krw(amount).to_string()
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
