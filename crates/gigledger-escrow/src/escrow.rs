//! Escrow ledger: holds service funds from creation until settlement.
//!
//! Funds are captured when a service is created and leave escrow exactly
//! once: paid to the approved provider after the requester verifies the
//! completion proof, or refunded to the requester on cancellation.
//!
//! The completion transitions (`submit_completion_proof`,
//! `reject_completion_proof`, `verify_and_release`, `cancel`) are pure
//! functions over the service record, like the handshake transitions.

use std::collections::HashMap;

use gigledger_types::{
    AccountId, ContentHash, Engagement, GigError, ReceiptTokenId, Result, Service, ServiceId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::balance_manager::BalanceManager;
use crate::handshake::{require_requester, wrong_state};

/// Settlement state of one service's escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldState {
    Held,
    Released { to: AccountId },
    Refunded,
}

/// Funds held for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowHold {
    pub depositor: AccountId,
    pub amount: Decimal,
    pub state: HoldState,
}

/// Per-service escrow accounting on top of the [`BalanceManager`].
pub struct EscrowLedger {
    holds: HashMap<ServiceId, EscrowHold>,
}

impl EscrowLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            holds: HashMap::new(),
        }
    }

    /// Lock `amount` of `depositor`'s funds for `service_id`.
    ///
    /// # Errors
    /// - `InsufficientBalance` if the depositor cannot cover the amount
    /// - `Internal` if the service already has a hold
    pub fn capture(
        &mut self,
        balances: &mut BalanceManager,
        service_id: ServiceId,
        depositor: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        if self.holds.contains_key(&service_id) {
            return Err(GigError::Internal(format!(
                "escrow for {service_id} already captured"
            )));
        }
        balances.escrow(depositor, amount)?;
        self.holds.insert(
            service_id,
            EscrowHold {
                depositor,
                amount,
                state: HoldState::Held,
            },
        );
        Ok(())
    }

    /// Pay the held funds to `provider`.
    ///
    /// # Errors
    /// - `EscrowAlreadySettled` if the funds already left escrow
    /// - `TransferFailed` if the provider refuses the transfer; the hold is
    ///   left untouched so the release can be retried
    pub fn release(
        &mut self,
        balances: &mut BalanceManager,
        service_id: ServiceId,
        provider: AccountId,
    ) -> Result<Decimal> {
        let hold = self.held_mut(service_id)?;
        balances.transfer_escrowed(hold.depositor, provider, hold.amount)?;
        hold.state = HoldState::Released { to: provider };
        Ok(hold.amount)
    }

    /// Return the held funds to the depositor.
    ///
    /// # Errors
    /// Returns `EscrowAlreadySettled` if the funds already left escrow.
    pub fn refund(
        &mut self,
        balances: &mut BalanceManager,
        service_id: ServiceId,
    ) -> Result<Decimal> {
        let hold = self.held_mut(service_id)?;
        balances.refund(hold.depositor, hold.amount)?;
        hold.state = HoldState::Refunded;
        Ok(hold.amount)
    }

    /// Check that `service_id` still has funds in escrow.
    ///
    /// # Errors
    /// Returns `EscrowAlreadySettled` otherwise.
    pub fn ensure_held(&self, service_id: ServiceId) -> Result<()> {
        match self.holds.get(&service_id) {
            Some(hold) if hold.state == HoldState::Held => Ok(()),
            _ => Err(GigError::EscrowAlreadySettled(service_id)),
        }
    }

    #[must_use]
    pub fn hold(&self, service_id: ServiceId) -> Option<&EscrowHold> {
        self.holds.get(&service_id)
    }

    /// Amount still held for `service_id`, zero once settled.
    #[must_use]
    pub fn held_for(&self, service_id: ServiceId) -> Decimal {
        self.holds
            .get(&service_id)
            .filter(|h| h.state == HoldState::Held)
            .map_or(Decimal::ZERO, |h| h.amount)
    }

    /// Total amount currently held across all services.
    #[must_use]
    pub fn held_total(&self) -> Decimal {
        self.holds
            .values()
            .filter(|h| h.state == HoldState::Held)
            .map(|h| h.amount)
            .sum()
    }

    fn held_mut(&mut self, service_id: ServiceId) -> Result<&mut EscrowHold> {
        match self.holds.get_mut(&service_id) {
            Some(hold) if hold.state == HoldState::Held => Ok(hold),
            _ => Err(GigError::EscrowAlreadySettled(service_id)),
        }
    }
}

impl Default for EscrowLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Completion transitions
// ---------------------------------------------------------------------------

/// `Accepted | ProofSubmitted → ProofSubmitted { proof }`, by the provider.
///
/// Resubmitting before verification replaces the earlier proof.
///
/// # Errors
/// - `WrongState` unless a provider has been approved and the service is
///   not completed
/// - `Unauthorized` unless the caller is the approved provider
pub fn submit_completion_proof(
    service: &Service,
    caller: AccountId,
    proof: ContentHash,
) -> Result<Engagement> {
    let (provider, token_id) = match service.engagement {
        Engagement::Accepted { provider, token_id }
        | Engagement::ProofSubmitted {
            provider, token_id, ..
        } => (provider, token_id),
        _ => return Err(wrong_state("submit_completion_proof", service)),
    };
    if caller != provider {
        return Err(GigError::Unauthorized {
            operation: "submit_completion_proof",
            caller,
        });
    }
    Ok(Engagement::ProofSubmitted {
        provider,
        token_id,
        proof,
    })
}

/// `ProofSubmitted → Accepted`, by the requester. Provider and token stay.
///
/// # Errors
/// - `WrongState` unless a proof is awaiting verification
/// - `Unauthorized` unless the caller is the requester
pub fn reject_completion_proof(
    service: &Service,
    caller: AccountId,
) -> Result<(Engagement, ContentHash)> {
    let Engagement::ProofSubmitted {
        provider,
        token_id,
        proof,
    } = service.engagement
    else {
        return Err(wrong_state("reject_completion_proof", service));
    };
    require_requester(service, caller, "reject_completion_proof")?;
    Ok((Engagement::Accepted { provider, token_id }, proof))
}

/// What `verify_and_release` must do once the transition is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Release {
    pub engagement: Engagement,
    pub provider: AccountId,
    pub token_id: ReceiptTokenId,
}

/// `ProofSubmitted → Completed`, by the requester.
///
/// # Errors
/// - `WrongState` unless a proof is awaiting verification
/// - `Unauthorized` unless the caller is the requester
pub fn verify_and_release(service: &Service, caller: AccountId) -> Result<Release> {
    let Engagement::ProofSubmitted {
        provider,
        token_id,
        proof,
    } = service.engagement
    else {
        return Err(wrong_state("verify_and_release", service));
    };
    require_requester(service, caller, "verify_and_release")?;
    Ok(Release {
        engagement: Engagement::Completed { provider, proof },
        provider,
        token_id,
    })
}

/// `Open | PendingApproval → Cancelled`, by the requester.
///
/// Once a provider has been approved the service can no longer be cancelled.
///
/// # Errors
/// - `Unauthorized` unless the caller is the requester
/// - `WrongState` once a provider is approved or the service is terminal
pub fn cancel(service: &Service, caller: AccountId) -> Result<Engagement> {
    require_requester(service, caller, "cancel_service")?;
    match service.engagement {
        Engagement::Open | Engagement::PendingApproval { .. } => Ok(Engagement::Cancelled),
        _ => Err(wrong_state("cancel_service", service)),
    }
}
