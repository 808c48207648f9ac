//! Supply conservation invariant checker.
//!
//! Invariant enforced after every ledger transition:
//! ```text
//! Σ(available + escrowed) == Σ(deposits) - Σ(withdrawals)
//! ```
//!
//! Escrow capture, payout, and refund only move value between accounts.
//! If the sum ever drifts, value was created or destroyed by a bug.

use gigledger_types::{GigError, Result};
use rust_decimal::Decimal;

/// Tracks money entering and leaving the ledger.
pub struct SupplyConservation {
    deposits: Decimal,
    withdrawals: Decimal,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self {
            deposits: Decimal::ZERO,
            withdrawals: Decimal::ZERO,
        }
    }

    /// Check that recording `amount` would keep the deposit total finite.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the running total would overflow.
    pub fn check_deposit(&self, amount: Decimal) -> Result<()> {
        self.deposits
            .checked_add(amount)
            .map(|_| ())
            .ok_or_else(|| GigError::InvalidInput {
                reason: format!("deposit of {amount} overflows total supply"),
            })
    }

    pub fn record_deposit(&mut self, amount: Decimal) {
        self.deposits += amount;
    }

    pub fn record_withdrawal(&mut self, amount: Decimal) {
        self.withdrawals += amount;
    }

    /// Expected total supply: deposits - withdrawals.
    #[must_use]
    pub fn expected_supply(&self) -> Decimal {
        self.deposits - self.withdrawals
    }

    /// Compare the actual supply (sum of all balances) against expectations.
    ///
    /// # Errors
    /// Returns [`GigError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, actual_supply: Decimal) -> Result<()> {
        let expected = self.expected_supply();
        if actual_supply != expected {
            return Err(GigError::SupplyInvariantViolation {
                reason: format!(
                    "actual supply {actual_supply} != expected {expected} \
                     (deposits={}, withdrawals={})",
                    self.deposits, self.withdrawals
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_deposits(&self) -> Decimal {
        self.deposits
    }

    #[must_use]
    pub fn total_withdrawals(&self) -> Decimal {
        self.withdrawals
    }
}

impl Default for SupplyConservation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_supply_is_zero() {
        let sc = SupplyConservation::new();
        assert_eq!(sc.expected_supply(), Decimal::ZERO);
        assert!(sc.verify(Decimal::ZERO).is_ok());
    }

    #[test]
    fn deposits_and_withdrawals() {
        let mut sc = SupplyConservation::new();
        sc.record_deposit(Decimal::new(1000, 0));
        sc.record_deposit(Decimal::new(500, 0));
        sc.record_withdrawal(Decimal::new(300, 0));
        assert_eq!(sc.expected_supply(), Decimal::new(1200, 0));
        assert_eq!(sc.total_deposits(), Decimal::new(1500, 0));
        assert_eq!(sc.total_withdrawals(), Decimal::new(300, 0));
    }

    #[test]
    fn deposit_total_overflow_detected() {
        let mut sc = SupplyConservation::new();
        sc.record_deposit(Decimal::MAX);
        assert!(sc.check_deposit(Decimal::ONE).is_err());
        assert!(SupplyConservation::new().check_deposit(Decimal::MAX).is_ok());
    }

    #[test]
    fn verify_fails_when_imbalanced() {
        let mut sc = SupplyConservation::new();
        sc.record_deposit(Decimal::new(10, 0));
        let err = sc.verify(Decimal::new(11, 0)).unwrap_err();
        assert!(matches!(err, GigError::SupplyInvariantViolation { .. }));
    }
}
