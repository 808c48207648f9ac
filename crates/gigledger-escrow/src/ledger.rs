//! The service ledger: single writer over all protocol state.
//!
//! Every write follows the same shape:
//! 1. Look up the service and run the pure transition for (record, caller, inputs)
//! 2. Check every remaining fallible side effect (token mint/burn, escrow)
//! 3. Apply the side effects and commit the new engagement
//! 4. Append a [`LedgerEvent`]
//!
//! A rejection at steps 1–2 leaves the ledger untouched. Step 3 contains
//! exactly one fallible operation whose own failure is atomic (the escrow
//! capture, release, or refund), and it runs first.

use chrono::Utc;
use gigledger_types::{
    AccountId, BalanceEntry, ContentHash, Engagement, GigError, LedgerConfig, LedgerEvent,
    LedgerEventKind, ReceiptToken, ReceiptTokenId, Result, Service, ServiceId, ServiceStatus, TxId,
};
use rust_decimal::Decimal;

use crate::balance_manager::BalanceManager;
use crate::escrow::{self, EscrowLedger};
use crate::handshake;
use crate::registry::{NewService, ServiceRegistry};
use crate::supply_conservation::SupplyConservation;
use crate::token_ledger::ReceiptTokenLedger;

/// The complete protocol state.
pub struct ServiceLedger {
    config: LedgerConfig,
    registry: ServiceRegistry,
    tokens: ReceiptTokenLedger,
    escrow: EscrowLedger,
    balances: BalanceManager,
    supply: SupplyConservation,
    events: Vec<LedgerEvent>,
}

impl ServiceLedger {
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            registry: ServiceRegistry::new(),
            tokens: ReceiptTokenLedger::new(),
            escrow: EscrowLedger::new(),
            balances: BalanceManager::new(),
            supply: SupplyConservation::new(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // =================================================================
    // Funds
    // =================================================================

    /// Credit native currency to an account.
    ///
    /// # Errors
    /// `InvalidAmount` unless `amount > 0`, `InvalidInput` on overflow.
    pub fn deposit(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        self.supply.check_deposit(amount)?;
        self.balances.deposit(account, amount)?;
        self.supply.record_deposit(amount);
        Ok(())
    }

    /// Take native currency out of the ledger.
    ///
    /// # Errors
    /// - `InvalidAmount` unless `amount > 0`
    /// - `InsufficientBalance` if the available balance is too small
    pub fn withdraw(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        self.balances.withdraw(account, amount)?;
        self.supply.record_withdrawal(amount);
        Ok(())
    }

    /// Make `account` refuse incoming payouts.
    pub fn block_recipient(&mut self, account: AccountId) {
        self.balances.block_recipient(account);
    }

    pub fn unblock_recipient(&mut self, account: AccountId) {
        self.balances.unblock_recipient(account);
    }

    #[must_use]
    pub fn balance(&self, account: AccountId) -> BalanceEntry {
        self.balances.balance(account)
    }

    // =================================================================
    // ServiceRegistry
    // =================================================================

    /// Post a new service, moving `amount` from the caller into escrow.
    ///
    /// # Errors
    /// - `InvalidAmount` / `InvalidInput` if the listing fails validation
    /// - `InsufficientBalance` if the caller cannot fund the escrow
    pub fn create_service(
        &mut self,
        caller: AccountId,
        new: NewService,
        amount: Decimal,
    ) -> Result<ServiceId> {
        let id = self.registry.next_id();
        new.validate(amount, &self.config)
            .and_then(|()| self.escrow.capture(&mut self.balances, id, caller, amount))
            .inspect_err(|e| reject("create_service", id, caller, e))?;

        let created = self.registry.create(caller, new, amount);
        debug_assert_eq!(created, id);

        tracing::info!(service = %id, requester = %caller, %amount, "Service created");
        self.record(id, caller, LedgerEventKind::ServiceCreated { amount });
        Ok(id)
    }

    /// Look up a service.
    ///
    /// # Errors
    /// Returns `ServiceNotFound` for an unknown ID.
    pub fn get_service(&self, id: ServiceId) -> Result<&Service> {
        self.registry.get(id)
    }

    /// All service IDs in creation order.
    #[must_use]
    pub fn all_service_ids(&self) -> Vec<ServiceId> {
        self.registry.all_ids()
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.registry.iter()
    }

    #[must_use]
    pub fn services_by_requester(&self, account: AccountId) -> Vec<&Service> {
        self.registry.by_requester(account)
    }

    #[must_use]
    pub fn services_by_provider(&self, account: AccountId) -> Vec<&Service> {
        self.registry.by_provider(account)
    }

    // =================================================================
    // ApprovalHandshake
    // =================================================================

    /// Ask to fulfil an `Open` service.
    ///
    /// # Errors
    /// `SelfDealing` for the requester, `WrongState` unless `Open`.
    pub fn request_acceptance(&mut self, caller: AccountId, id: ServiceId) -> Result<()> {
        let next = self
            .registry
            .get(id)
            .and_then(|svc| handshake::request_acceptance(svc, caller))
            .inspect_err(|e| reject("request_acceptance", id, caller, e))?;
        self.registry.commit(id, next)?;

        tracing::info!(service = %id, acceptor = %caller, "Acceptance requested");
        self.record(
            id,
            caller,
            LedgerEventKind::AcceptanceRequested { acceptor: caller },
        );
        Ok(())
    }

    /// Approve the pending acceptor and mint their receipt token.
    ///
    /// # Errors
    /// `WrongState` unless `PendingApproval`, `Unauthorized` unless requester.
    pub fn approve_acceptance(
        &mut self,
        caller: AccountId,
        id: ServiceId,
    ) -> Result<ReceiptTokenId> {
        let token_id = self.tokens.next_id();
        let next = self
            .registry
            .get(id)
            .and_then(|svc| handshake::approve_acceptance(svc, caller, token_id))
            .and_then(|next| self.tokens.ensure_mintable(id).map(|()| next))
            .inspect_err(|e| reject("approve_acceptance", id, caller, e))?;
        let Engagement::Accepted { provider, .. } = next else {
            return Err(GigError::Internal(format!(
                "approve_acceptance produced {}",
                next.status()
            )));
        };

        let minted = after_side_effect("approve_acceptance", id, self.tokens.mint(provider, id))?;
        debug_assert_eq!(minted, token_id);
        after_side_effect("approve_acceptance", id, self.registry.commit(id, next))?;

        tracing::info!(service = %id, provider = %provider, token = %token_id, "Acceptance approved");
        self.record(
            id,
            caller,
            LedgerEventKind::AcceptanceApproved { provider, token_id },
        );
        Ok(token_id)
    }

    /// Turn down the pending acceptor; the service reopens.
    ///
    /// # Errors
    /// `WrongState` unless `PendingApproval`, `Unauthorized` unless requester.
    pub fn reject_acceptance(&mut self, caller: AccountId, id: ServiceId) -> Result<()> {
        let (next, acceptor) = self
            .registry
            .get(id)
            .and_then(|svc| handshake::reject_acceptance(svc, caller))
            .inspect_err(|e| reject("reject_acceptance", id, caller, e))?;
        self.registry.commit(id, next)?;

        tracing::info!(service = %id, acceptor = %acceptor, "Acceptance rejected");
        self.record(id, caller, LedgerEventKind::AcceptanceRejected { acceptor });
        Ok(())
    }

    /// Pending acceptor backs out; the service reopens.
    ///
    /// # Errors
    /// `WrongState` unless `PendingApproval`, `Unauthorized` unless the
    /// caller is the pending acceptor.
    pub fn withdraw_acceptance(&mut self, caller: AccountId, id: ServiceId) -> Result<()> {
        let next = self
            .registry
            .get(id)
            .and_then(|svc| handshake::withdraw_acceptance(svc, caller))
            .inspect_err(|e| reject("withdraw_acceptance", id, caller, e))?;
        self.registry.commit(id, next)?;

        tracing::info!(service = %id, acceptor = %caller, "Acceptance withdrawn");
        self.record(
            id,
            caller,
            LedgerEventKind::AcceptanceWithdrawn { acceptor: caller },
        );
        Ok(())
    }

    // =================================================================
    // EscrowLedger
    // =================================================================

    /// Record the provider's completion proof.
    ///
    /// # Errors
    /// `WrongState` before approval or after completion, `Unauthorized`
    /// unless the caller is the approved provider.
    pub fn submit_completion_proof(
        &mut self,
        caller: AccountId,
        id: ServiceId,
        proof: ContentHash,
    ) -> Result<()> {
        let next = self
            .registry
            .get(id)
            .and_then(|svc| escrow::submit_completion_proof(svc, caller, proof))
            .inspect_err(|e| reject("submit_completion_proof", id, caller, e))?;
        self.registry.commit(id, next)?;

        tracing::info!(service = %id, provider = %caller, %proof, "Completion proof submitted");
        self.record(id, caller, LedgerEventKind::ProofSubmitted { proof });
        Ok(())
    }

    /// Send a submitted proof back to the provider.
    ///
    /// # Errors
    /// `WrongState` unless a proof is pending, `Unauthorized` unless requester.
    pub fn reject_completion_proof(&mut self, caller: AccountId, id: ServiceId) -> Result<()> {
        let (next, proof) = self
            .registry
            .get(id)
            .and_then(|svc| escrow::reject_completion_proof(svc, caller))
            .inspect_err(|e| reject("reject_completion_proof", id, caller, e))?;
        self.registry.commit(id, next)?;

        tracing::info!(service = %id, %proof, "Completion proof rejected");
        self.record(id, caller, LedgerEventKind::ProofRejected { proof });
        Ok(())
    }

    /// Verify the proof: burn the receipt token and pay the provider.
    ///
    /// If the payout fails nothing changes; the service stays
    /// `ProofSubmitted` with its token live and funds in escrow.
    ///
    /// # Errors
    /// - `WrongState` unless a proof is pending
    /// - `Unauthorized` unless the caller is the requester
    /// - `TransferFailed` if the provider cannot receive the funds
    pub fn verify_and_release(&mut self, caller: AccountId, id: ServiceId) -> Result<Decimal> {
        let release = self
            .registry
            .get(id)
            .and_then(|svc| escrow::verify_and_release(svc, caller))
            .and_then(|release| self.tokens.ensure_live(release.token_id).map(|_| release))
            .and_then(|release| self.escrow.ensure_held(id).map(|()| release))
            .inspect_err(|e| reject("verify_and_release", id, caller, e))?;

        let amount = self
            .escrow
            .release(&mut self.balances, id, release.provider)
            .inspect_err(|e| reject("verify_and_release", id, caller, e))?;
        after_side_effect("verify_and_release", id, self.tokens.burn(release.token_id))?;
        after_side_effect(
            "verify_and_release",
            id,
            self.registry.commit(id, release.engagement),
        )?;

        tracing::info!(
            service = %id,
            provider = %release.provider,
            %amount,
            token = %release.token_id,
            "Funds released"
        );
        self.record(
            id,
            caller,
            LedgerEventKind::FundsReleased {
                provider: release.provider,
                amount,
                token_id: release.token_id,
            },
        );
        Ok(amount)
    }

    /// Withdraw a service that has no approved provider yet and refund it.
    ///
    /// # Errors
    /// `Unauthorized` unless requester, `WrongState` once approved.
    pub fn cancel_service(&mut self, caller: AccountId, id: ServiceId) -> Result<Decimal> {
        let next = self
            .registry
            .get(id)
            .and_then(|svc| escrow::cancel(svc, caller))
            .and_then(|next| self.escrow.ensure_held(id).map(|()| next))
            .inspect_err(|e| reject("cancel_service", id, caller, e))?;

        let refund = self.escrow.refund(&mut self.balances, id)?;
        after_side_effect("cancel_service", id, self.registry.commit(id, next))?;

        tracing::info!(service = %id, %refund, "Service cancelled");
        self.record(id, caller, LedgerEventKind::ServiceCancelled { refund });
        Ok(refund)
    }

    #[must_use]
    pub fn held_for(&self, id: ServiceId) -> Decimal {
        self.escrow.held_for(id)
    }

    #[must_use]
    pub fn held_total(&self) -> Decimal {
        self.escrow.held_total()
    }

    // =================================================================
    // ReceiptToken
    // =================================================================

    #[must_use]
    pub fn token(&self, token_id: ReceiptTokenId) -> Option<&ReceiptToken> {
        self.tokens.get(token_id)
    }

    #[must_use]
    pub fn owner_of(&self, token_id: ReceiptTokenId) -> Option<AccountId> {
        self.tokens.owner_of(token_id)
    }

    #[must_use]
    pub fn live_token_for(&self, id: ServiceId) -> Option<ReceiptTokenId> {
        self.tokens.live_token_for(id)
    }

    #[must_use]
    pub fn tokens_of(&self, owner: AccountId) -> Vec<&ReceiptToken> {
        self.tokens.tokens_of(owner)
    }

    // =================================================================
    // Events & invariants
    // =================================================================

    /// Events with `seq >= from`, oldest first.
    #[must_use]
    pub fn events_since(&self, from: u64) -> &[LedgerEvent] {
        let start = usize::try_from(from).map_or(self.events.len(), |s| s.min(self.events.len()));
        &self.events[start..]
    }

    /// Sequence number the next event will get.
    #[must_use]
    pub fn next_event_seq(&self) -> u64 {
        self.events.len() as u64
    }

    /// Check supply conservation.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` if value was created or destroyed.
    pub fn verify_supply(&self) -> Result<()> {
        self.supply.verify(self.balances.total_supply())
    }

    /// Cross-check every structural invariant between the components.
    ///
    /// # Errors
    /// Returns `Internal` describing the first inconsistency found, or
    /// `SupplyInvariantViolation`.
    pub fn check_invariants(&self) -> Result<()> {
        for svc in self.registry.iter() {
            let live = self.tokens.live_token_for(svc.id);
            if live != svc.receipt_token_id() {
                return Err(GigError::Internal(format!(
                    "{}: record token {:?} but live token {:?}",
                    svc.id,
                    svc.receipt_token_id(),
                    live
                )));
            }
            if let Some(token_id) = live {
                if self.tokens.owner_of(token_id) != svc.accepted_by() {
                    return Err(GigError::Internal(format!(
                        "{}: token {token_id} not owned by provider",
                        svc.id
                    )));
                }
            }
            let expected_hold = if svc.status().is_terminal() {
                Decimal::ZERO
            } else {
                svc.amount
            };
            if self.escrow.held_for(svc.id) != expected_hold {
                return Err(GigError::Internal(format!(
                    "{}: {} holds {} but should hold {expected_hold}",
                    svc.id,
                    svc.status(),
                    self.escrow.held_for(svc.id)
                )));
            }
        }
        if self.escrow.held_total() != self.balances.total_escrowed() {
            return Err(GigError::Internal(format!(
                "escrow holds {} but balances show {} escrowed",
                self.escrow.held_total(),
                self.balances.total_escrowed()
            )));
        }
        self.verify_supply()
    }

    fn record(&mut self, service_id: ServiceId, actor: AccountId, kind: LedgerEventKind) {
        let event = LedgerEvent {
            seq: self.events.len() as u64,
            tx_id: TxId::new(),
            service_id,
            actor,
            kind,
            at: Utc::now(),
        };
        tracing::debug!(seq = event.seq, tx = %event.tx_id, kind = %event.kind, "Event recorded");
        self.events.push(event);
    }
}

impl Default for ServiceLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

fn reject(operation: &'static str, id: ServiceId, caller: AccountId, err: &GigError) {
    tracing::warn!(operation, service = %id, caller = %caller, error = %err, "Transition rejected");
}

/// Wrap a step that runs after funds or tokens already moved.
///
/// Every such step was checked before the side effect, so it cannot fail
/// unless those checks and the mutation disagree. That is a ledger bug, not
/// a rejected transition.
fn after_side_effect<T>(operation: &'static str, id: ServiceId, step: Result<T>) -> Result<T> {
    debug_assert!(
        step.is_ok(),
        "{operation} on {id}: pre-checked step failed after side effects"
    );
    step.map_err(|err| {
        tracing::error!(operation, service = %id, error = %err, "Pre-checked step failed after side effects");
        GigError::Internal(format!(
            "{operation} on {id}: pre-checked step failed after side effects: {err}"
        ))
    })
}

/// Count services per status, for dashboards and tests.
#[must_use]
pub fn status_counts(ledger: &ServiceLedger) -> Vec<(ServiceStatus, usize)> {
    let all = [
        ServiceStatus::Open,
        ServiceStatus::PendingApproval,
        ServiceStatus::Accepted,
        ServiceStatus::ProofSubmitted,
        ServiceStatus::Completed,
        ServiceStatus::Cancelled,
    ];
    all.into_iter()
        .map(|status| {
            (
                status,
                ledger.services().filter(|s| s.status() == status).count(),
            )
        })
        .collect()
}
