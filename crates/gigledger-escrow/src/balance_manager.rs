//! Native-currency balances with available/escrowed accounting.
//!
//! All mutations are atomic: either the full operation succeeds or the
//! balances are unchanged. Transfers validate both sides before touching
//! either.

use std::collections::{HashMap, HashSet};

use gigledger_types::{AccountId, BalanceEntry, GigError, Result};
use rust_decimal::Decimal;

/// Manages account balances.
///
/// The BalanceManager is the source of truth for all funds. The
/// EscrowLedger calls into it to lock funds when a service is created and
/// to pay out or refund them when the service settles.
pub struct BalanceManager {
    balances: HashMap<AccountId, BalanceEntry>,
    /// Accounts that refuse incoming transfers.
    blocked: HashSet<AccountId>,
}

impl BalanceManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
            blocked: HashSet::new(),
        }
    }

    /// Deposit funds (increases available balance).
    ///
    /// # Errors
    /// - `InvalidAmount` unless `amount > 0`
    /// - `InvalidInput` if the balance would overflow
    pub fn deposit(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        require_positive(amount)?;
        let current = self.balance(account).available;
        let available = current
            .checked_add(amount)
            .ok_or_else(|| GigError::InvalidInput {
                reason: format!("deposit of {amount} overflows balance {current}"),
            })?;
        self.balances.entry(account).or_default().available = available;
        Ok(())
    }

    /// Withdraw funds from the available balance.
    ///
    /// # Errors
    /// - `InvalidAmount` unless `amount > 0`
    /// - `InsufficientBalance` if available < amount
    pub fn withdraw(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        require_positive(amount)?;
        let entry = self.available_entry(account, amount)?;
        entry.available -= amount;
        Ok(())
    }

    /// Lock funds for a new service (available → escrowed).
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if available < amount.
    pub fn escrow(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        let entry = self.available_entry(account, amount)?;
        entry.available -= amount;
        entry.escrowed += amount;
        Ok(())
    }

    /// Return escrowed funds to their owner (escrowed → available).
    ///
    /// # Errors
    /// Returns `InsufficientEscrow` if escrowed < amount.
    pub fn refund(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        let entry = self.escrowed_entry(account, amount)?;
        entry.escrowed -= amount;
        entry.available += amount;
        Ok(())
    }

    /// Pay escrowed funds of `from` into the available balance of `to`.
    ///
    /// # Errors
    /// - `TransferFailed` if `to` refuses incoming transfers
    /// - `InsufficientEscrow` if `from` has less than `amount` escrowed
    pub fn transfer_escrowed(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        if self.blocked.contains(&to) {
            return Err(GigError::TransferFailed {
                to,
                reason: "recipient refuses transfers".into(),
            });
        }
        self.escrowed_entry(from, amount)?.escrowed -= amount;
        self.balances.entry(to).or_default().available += amount;
        Ok(())
    }

    /// Make `account` refuse incoming transfers.
    pub fn block_recipient(&mut self, account: AccountId) {
        self.blocked.insert(account);
    }

    pub fn unblock_recipient(&mut self, account: AccountId) {
        self.blocked.remove(&account);
    }

    #[must_use]
    pub fn is_blocked(&self, account: &AccountId) -> bool {
        self.blocked.contains(account)
    }

    #[must_use]
    pub fn balance(&self, account: AccountId) -> BalanceEntry {
        self.balances.get(&account).cloned().unwrap_or_default()
    }

    /// Sum of available + escrowed across all accounts.
    #[must_use]
    pub fn total_supply(&self) -> Decimal {
        self.balances.values().map(BalanceEntry::total).sum()
    }

    /// Sum of escrowed balances across all accounts.
    #[must_use]
    pub fn total_escrowed(&self) -> Decimal {
        self.balances.values().map(|e| e.escrowed).sum()
    }

    fn available_entry(&mut self, account: AccountId, amount: Decimal) -> Result<&mut BalanceEntry> {
        let entry = self
            .balances
            .get_mut(&account)
            .ok_or(GigError::InsufficientBalance {
                needed: amount,
                available: Decimal::ZERO,
            })?;
        if entry.available < amount {
            return Err(GigError::InsufficientBalance {
                needed: amount,
                available: entry.available,
            });
        }
        Ok(entry)
    }

    fn escrowed_entry(&mut self, account: AccountId, amount: Decimal) -> Result<&mut BalanceEntry> {
        let entry = self
            .balances
            .get_mut(&account)
            .ok_or(GigError::InsufficientEscrow)?;
        if entry.escrowed < amount {
            return Err(GigError::InsufficientEscrow);
        }
        Ok(entry)
    }
}

/// Amounts entering or leaving the ledger must be strictly positive.
pub(crate) fn require_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(GigError::InvalidAmount {
            amount,
            minimum: Decimal::ZERO,
        });
    }
    Ok(())
}

impl Default for BalanceManager {
    fn default() -> Self {
        Self::new()
    }
}
