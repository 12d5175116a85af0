//! Type-safe price representation using decimal arithmetic.
//!
//! All amounts are kept as [`Decimal`] so that cart totals never pick up
//! floating point drift.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (lira, not kuruş).
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

    /// Create a price in the store currency.
    #[must_use]
    pub const fn lira(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::TRY)
    }

    /// Format for display with two decimals (e.g., `₺49.90`).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{}{rounded:.2}", self.currency_code.symbol())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    TRY,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Currency symbol used in price labels.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::TRY => "₺",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }
}
