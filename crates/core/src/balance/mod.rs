//! Balance summation.
//!
//! CRITICAL: balances are summed with `rust_decimal` only. Values come from a
//! `NUMERIC(6, 2)` column and the total is always reported with two decimal
//! places, so an empty account balances to `0.00`.

use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::{AMOUNT_SCALE, AccountId};
use thiserror::Error;

/// Errors raised while summing a balance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    /// The running total no longer fits a `Decimal`.
    #[error("balance overflow after {0} operations")]
    Overflow(u64),
}

/// Exact running total of operation values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAccumulator {
    total: Decimal,
    count: u64,
}

impl Default for BalanceAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceAccumulator {
    /// Starts an empty total.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total: Decimal::ZERO,
            count: 0,
        }
    }

    /// Adds one operation value.
    ///
    /// # Errors
    ///
    /// Returns `BalanceError::Overflow` if the total leaves the `Decimal` range.
    pub fn add(&mut self, value: Decimal) -> Result<(), BalanceError> {
        self.total = self
            .total
            .checked_add(value)
            .ok_or(BalanceError::Overflow(self.count))?;
        self.count += 1;
        Ok(())
    }

    /// Number of values added so far.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Total rescaled to two decimal places.
    #[must_use]
    pub fn total(&self) -> Decimal {
        let mut total = self.total;
        total.rescale(AMOUNT_SCALE);
        total
    }
}

/// Sums operation values exactly.
///
/// # Errors
///
/// Returns `BalanceError::Overflow` if the total leaves the `Decimal` range.
pub fn sum_values<I>(values: I) -> Result<(Decimal, u64), BalanceError>
where
    I: IntoIterator<Item = Decimal>,
{
    let mut acc = BalanceAccumulator::new();
    for value in values {
        acc.add(value)?;
    }
    Ok((acc.total(), acc.count()))
}

/// Balance of one account, or of every calculated account when `account_id`
/// is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Balance {
    /// Account the balance belongs to.
    pub account_id: Option<AccountId>,
    /// Signed total with two decimal places.
    pub total: Decimal,
    /// Number of operations that went into the total.
    pub operation_count: u64,
}

impl Balance {
    /// Builds a balance from a list of operation values.
    ///
    /// # Errors
    ///
    /// Returns `BalanceError::Overflow` if the total leaves the `Decimal` range.
    pub fn from_values<I>(account_id: Option<AccountId>, values: I) -> Result<Self, BalanceError>
    where
        I: IntoIterator<Item = Decimal>,
    {
        let (total, operation_count) = sum_values(values)?;
        Ok(Self {
            account_id,
            total,
            operation_count,
        })
    }
}
