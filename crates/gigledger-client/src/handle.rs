//! Shared access to the single-writer ledger.
//!
//! Every method takes the lock for exactly one transition or one read, so
//! transitions from concurrent tasks are strictly ordered. Two tasks racing
//! to accept the same `Open` service: the first to get the lock wins, the
//! second sees `PendingApproval` and fails cleanly.

use std::sync::Arc;

use gigledger_escrow::{NewService, ServiceLedger};
use gigledger_types::{
    AccountId, BalanceEntry, ContentHash, LedgerConfig, LedgerEvent, ReceiptTokenId, Result,
    Service, ServiceId,
};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct LedgerHandle {
    inner: Arc<Mutex<ServiceLedger>>,
}

impl LedgerHandle {
    #[must_use]
    pub fn new(ledger: ServiceLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    #[must_use]
    pub fn with_config(config: LedgerConfig) -> Self {
        Self::new(ServiceLedger::new(config))
    }

    // --- writes -----------------------------------------------------------

    pub async fn deposit(&self, account: AccountId, amount: Decimal) -> Result<()> {
        self.inner.lock().await.deposit(account, amount)
    }

    pub async fn create_service(
        &self,
        caller: AccountId,
        new: NewService,
        amount: Decimal,
    ) -> Result<ServiceId> {
        self.inner.lock().await.create_service(caller, new, amount)
    }

    pub async fn request_acceptance(&self, caller: AccountId, id: ServiceId) -> Result<()> {
        self.inner.lock().await.request_acceptance(caller, id)
    }

    pub async fn approve_acceptance(
        &self,
        caller: AccountId,
        id: ServiceId,
    ) -> Result<ReceiptTokenId> {
        self.inner.lock().await.approve_acceptance(caller, id)
    }

    pub async fn reject_acceptance(&self, caller: AccountId, id: ServiceId) -> Result<()> {
        self.inner.lock().await.reject_acceptance(caller, id)
    }

    pub async fn withdraw_acceptance(&self, caller: AccountId, id: ServiceId) -> Result<()> {
        self.inner.lock().await.withdraw_acceptance(caller, id)
    }

    pub async fn submit_completion_proof(
        &self,
        caller: AccountId,
        id: ServiceId,
        proof: ContentHash,
    ) -> Result<()> {
        self.inner
            .lock()
            .await
            .submit_completion_proof(caller, id, proof)
    }

    pub async fn reject_completion_proof(&self, caller: AccountId, id: ServiceId) -> Result<()> {
        self.inner.lock().await.reject_completion_proof(caller, id)
    }

    pub async fn verify_and_release(&self, caller: AccountId, id: ServiceId) -> Result<Decimal> {
        self.inner.lock().await.verify_and_release(caller, id)
    }

    pub async fn cancel_service(&self, caller: AccountId, id: ServiceId) -> Result<Decimal> {
        self.inner.lock().await.cancel_service(caller, id)
    }

    // --- reads ------------------------------------------------------------

    pub async fn get_service(&self, id: ServiceId) -> Result<Service> {
        self.inner.lock().await.get_service(id).cloned()
    }

    pub async fn all_service_ids(&self) -> Vec<ServiceId> {
        self.inner.lock().await.all_service_ids()
    }

    /// Every service plus the next event sequence, read under one lock.
    pub async fn read_all(&self) -> (Vec<Service>, u64) {
        let ledger = self.inner.lock().await;
        (ledger.services().cloned().collect(), ledger.next_event_seq())
    }

    pub async fn events_since(&self, from: u64) -> Vec<LedgerEvent> {
        self.inner.lock().await.events_since(from).to_vec()
    }

    pub async fn balance(&self, account: AccountId) -> BalanceEntry {
        self.inner.lock().await.balance(account)
    }

    /// Run `f` with exclusive access, e.g. for invariant checks in tests.
    pub async fn with_ledger<T>(&self, f: impl FnOnce(&mut ServiceLedger) -> T) -> T {
        f(&mut *self.inner.lock().await)
    }
}

impl Default for LedgerHandle {
    fn default() -> Self {
        Self::new(ServiceLedger::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> NewService {
        NewService {
            title: "Walk the dog".into(),
            start_location: "Park Lane".into(),
            end_location: "Park Lane".into(),
            image_hash: ContentHash::of(b"dog.jpg"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_first_writer_wins() {
        let handle = LedgerHandle::default();
        let requester = AccountId::random();
        handle.deposit(requester, Decimal::TEN).await.unwrap();
        let id = handle
            .create_service(requester, listing(), Decimal::ONE)
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let h = handle.clone();
            tasks.push(tokio::spawn(async move {
                let me = AccountId::random();
                h.request_acceptance(me, id).await.map(|()| me)
            }));
        }

        let mut winners = Vec::new();
        for task in tasks {
            if let Ok(me) = task.await.unwrap() {
                winners.push(me);
            }
        }
        assert_eq!(winners.len(), 1);

        let svc = handle.get_service(id).await.unwrap();
        assert_eq!(svc.pending_acceptor(), Some(winners[0]));
        assert_eq!(handle.events_since(0).await.len(), 2);
    }

    #[tokio::test]
    async fn read_all_is_consistent() {
        let handle = LedgerHandle::default();
        let requester = AccountId::random();
        handle.deposit(requester, Decimal::TEN).await.unwrap();
        handle
            .create_service(requester, listing(), Decimal::ONE)
            .await
            .unwrap();
        let (services, seq) = handle.read_all().await;
        assert_eq!(services.len(), 1);
        assert_eq!(seq, 1);
        handle
            .with_ledger(|l| l.check_invariants())
            .await
            .unwrap();
    }
}
