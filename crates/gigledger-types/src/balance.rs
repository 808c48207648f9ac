//! Balance tracking types for the GigLedger escrow model.
//!
//! Every account has an `available` balance (spendable, withdrawable) and an
//! `escrowed` balance (locked in services it posted and not yet settled).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Native-currency balance of a single account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BalanceEntry {
    /// Spendable / withdrawable.
    pub available: Decimal,
    /// Held by the ledger for this account's unsettled services.
    pub escrowed: Decimal,
}

impl BalanceEntry {
    /// Create a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: Decimal::ZERO,
            escrowed: Decimal::ZERO,
        }
    }

    /// Total balance (available + escrowed).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.escrowed
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available.is_zero() && self.escrowed.is_zero()
    }
}

impl Default for BalanceEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_entry_default_is_zero() {
        let entry = BalanceEntry::default();
        assert_eq!(entry.available, Decimal::ZERO);
        assert_eq!(entry.escrowed, Decimal::ZERO);
        assert!(entry.is_zero());
    }

    #[test]
    fn balance_entry_total() {
        let entry = BalanceEntry {
            available: Decimal::new(25, 1),
            escrowed: Decimal::new(15, 1),
        };
        assert_eq!(entry.total(), Decimal::new(4, 0));
        assert!(!entry.is_zero());
    }
}
