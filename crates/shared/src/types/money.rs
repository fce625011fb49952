//! Operation amount with fixed decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Operation values are stored as `NUMERIC(6, 2)`: at most six digits, two
//! of them after the decimal point. This type enforces the same bounds
//! before a value ever reaches the database.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits kept for every amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Total number of significant digits allowed for an amount.
pub const AMOUNT_MAX_DIGITS: u32 = 6;

/// Errors raised when a decimal does not fit the amount column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// More fractional digits than the column keeps.
    #[error("ensure that there are no more than {AMOUNT_SCALE} decimal places")]
    TooManyDecimalPlaces,

    /// Integer part too large for the column.
    #[error("ensure that there are no more than {AMOUNT_MAX_DIGITS} digits in total")]
    TooManyDigits,
}

/// A signed monetary amount with exactly two decimal places.
///
/// Negative amounts are debits, positive amounts are credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Validates a decimal and rescales it to two decimal places.
    ///
    /// Trailing fractional zeros are not counted, so `5.000` is accepted as `5.00`.
    ///
    /// # Errors
    ///
    /// Returns `AmountError` if the value has more than two significant
    /// decimal places or more than four integer digits.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.normalize().scale() > AMOUNT_SCALE {
            return Err(AmountError::TooManyDecimalPlaces);
        }

        let limit = Decimal::from(10_i64.pow(AMOUNT_MAX_DIGITS - AMOUNT_SCALE));
        if value.abs() >= limit {
            return Err(AmountError::TooManyDigits);
        }

        let mut amount = value;
        amount.rescale(AMOUNT_SCALE);
        Ok(Self(amount))
    }

    /// Returns the inner decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
