//! # `GigClient`: one identity's view of the ledger
//!
//! Ties the off-ledger collaborators to the ledger handle:
//!
//! 1. Photos go to the [`ContentStore`] first. Only a successful upload yields
//!    the hash that is then submitted; an upload failure never touches the
//!    ledger.
//! 2. Each transition is submitted through the shared [`LedgerHandle`].
//! 3. The poller is refreshed right after, so the caller's own change is
//!    visible without waiting for the next tick.
//!
//! Map data ([`GigClient::map_view`]) is best-effort: unresolvable places
//! have no pin and a failed route is simply not drawn.

use std::sync::Arc;

use gigledger_escrow::NewService;
use gigledger_types::{
    AccountId, BalanceEntry, ContentHash, ReceiptTokenId, Result, Service, ServiceAction,
    ServiceId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    content_store::ContentStore,
    geo::{Coordinates, Route},
    geocode::Geocoder,
    handle::LedgerHandle,
    poller::{LedgerSnapshot, ServicePoller},
    routing::{RouteProvider, route_or_none},
};

/// What a requester fills in to post a service.
#[derive(Debug, Clone)]
pub struct ServiceDraft {
    pub title: String,
    pub start_location: String,
    pub end_location: String,
    /// Raw photo bytes; uploaded before the service is created.
    pub photo: Vec<u8>,
    pub amount: Decimal,
}

/// Map data for one service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub service_id: ServiceId,
    pub start: Option<Coordinates>,
    pub end: Option<Coordinates>,
    /// Present only if both ends resolved and routing succeeded.
    pub route: Option<Route>,
}

pub struct GigClient<S, G, R> {
    account: AccountId,
    ledger: LedgerHandle,
    store: Arc<S>,
    geocoder: Arc<G>,
    router: Arc<R>,
    poller: ServicePoller,
}

impl<S, G, R> GigClient<S, G, R>
where
    S: ContentStore,
    G: Geocoder,
    R: RouteProvider,
{
    /// Collaborators are shared so several identities can use the same
    /// store and map services.
    pub fn new(
        account: AccountId,
        ledger: LedgerHandle,
        store: Arc<S>,
        geocoder: Arc<G>,
        router: Arc<R>,
    ) -> Self {
        let poller = ServicePoller::new(ledger.clone());
        Self {
            account,
            ledger,
            store,
            geocoder,
            router,
            poller,
        }
    }

    #[must_use]
    pub fn account(&self) -> AccountId {
        self.account
    }

    #[must_use]
    pub fn poller(&self) -> &ServicePoller {
        &self.poller
    }

    #[must_use]
    pub fn snapshot(&self) -> Arc<LedgerSnapshot> {
        self.poller.latest()
    }

    pub async fn balance(&self) -> BalanceEntry {
        self.ledger.balance(self.account).await
    }

    // ========================================================================
    // Requester
    // ========================================================================

    /// Upload the photo, then create the service with its hash.
    ///
    /// # Errors
    /// `Upload` if the photo could not be stored (nothing is created),
    /// otherwise whatever `create_service` rejects.
    pub async fn post_service(&self, draft: ServiceDraft) -> Result<ServiceId> {
        let stored = self.store.put(draft.photo).await?;
        let new = NewService {
            title: draft.title,
            start_location: draft.start_location,
            end_location: draft.end_location,
            image_hash: stored.hash,
        };
        let id = self
            .ledger
            .create_service(self.account, new, draft.amount)
            .await?;
        tracing::info!(service = %id, photo = %stored.url, "Service posted");
        self.poller.refresh().await;
        Ok(id)
    }

    /// # Errors
    /// As [`ServiceLedger::approve_acceptance`](gigledger_escrow::ServiceLedger::approve_acceptance).
    pub async fn approve(&self, id: ServiceId) -> Result<ReceiptTokenId> {
        let token = self.ledger.approve_acceptance(self.account, id).await?;
        self.poller.refresh().await;
        Ok(token)
    }

    /// # Errors
    /// `WrongState` unless pending, `Unauthorized` unless the requester.
    pub async fn reject(&self, id: ServiceId) -> Result<()> {
        self.ledger.reject_acceptance(self.account, id).await?;
        self.poller.refresh().await;
        Ok(())
    }

    /// # Errors
    /// `WrongState` unless a proof is awaiting review.
    pub async fn reject_proof(&self, id: ServiceId) -> Result<()> {
        self.ledger.reject_completion_proof(self.account, id).await?;
        self.poller.refresh().await;
        Ok(())
    }

    /// Accept the submitted proof and pay the provider.
    ///
    /// # Errors
    /// As [`ServiceLedger::verify_and_release`](gigledger_escrow::ServiceLedger::verify_and_release).
    pub async fn verify(&self, id: ServiceId) -> Result<Decimal> {
        let paid = self.ledger.verify_and_release(self.account, id).await?;
        self.poller.refresh().await;
        Ok(paid)
    }

    /// # Errors
    /// `WrongState` once a provider has been approved.
    pub async fn cancel(&self, id: ServiceId) -> Result<Decimal> {
        let refund = self.ledger.cancel_service(self.account, id).await?;
        self.poller.refresh().await;
        Ok(refund)
    }

    // ========================================================================
    // Provider
    // ========================================================================

    /// # Errors
    /// `WrongState` unless open, `SelfDealing` for the requester.
    pub async fn request(&self, id: ServiceId) -> Result<()> {
        self.ledger.request_acceptance(self.account, id).await?;
        self.poller.refresh().await;
        Ok(())
    }

    /// # Errors
    /// `WrongState` unless pending, `Unauthorized` for anyone but the acceptor.
    pub async fn withdraw(&self, id: ServiceId) -> Result<()> {
        self.ledger.withdraw_acceptance(self.account, id).await?;
        self.poller.refresh().await;
        Ok(())
    }

    /// Upload the completion photo, then submit its hash as proof.
    ///
    /// # Errors
    /// `Upload` leaves the service untouched; otherwise as
    /// [`ServiceLedger::submit_completion_proof`](gigledger_escrow::ServiceLedger::submit_completion_proof).
    pub async fn submit_proof(&self, id: ServiceId, photo: Vec<u8>) -> Result<ContentHash> {
        let stored = self.store.put(photo).await?;
        self.ledger
            .submit_completion_proof(self.account, id, stored.hash)
            .await?;
        self.poller.refresh().await;
        Ok(stored.hash)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Fresh read of one service.
    ///
    /// # Errors
    /// `ServiceNotFound`.
    pub async fn service(&self, id: ServiceId) -> Result<Service> {
        self.ledger.get_service(id).await
    }

    /// What this identity may do to `id`, based on the latest snapshot.
    #[must_use]
    pub fn actions(&self, id: ServiceId) -> Vec<ServiceAction> {
        self.poller
            .latest()
            .service(id)
            .map(|s| s.available_actions(self.account))
            .unwrap_or_default()
    }

    /// Geocode both ends and, if both resolve, ask for a route.
    ///
    /// # Errors
    /// `ServiceNotFound`, or `Geocoding` if a lookup itself failed. A place
    /// that simply has no match is not an error.
    pub async fn map_view(&self, id: ServiceId) -> Result<MapView> {
        let service = self.ledger.get_service(id).await?;
        let start = self.geocoder.geocode(&service.start_location).await?;
        let end = self.geocoder.geocode(&service.end_location).await?;
        let route = match (start, end) {
            (Some(from), Some(to)) => route_or_none(&*self.router, from, to).await,
            _ => None,
        };
        tracing::debug!(
            service = %id,
            start = start.is_some(),
            end = end.is_some(),
            routed = route.is_some(),
            "Map view built"
        );
        Ok(MapView {
            service_id: id,
            start,
            end,
            route,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryContentStore, StaticGeocoder, StraightLineRouter};

    type Client = GigClient<MemoryContentStore, StaticGeocoder, StraightLineRouter>;

    fn client(ledger: &LedgerHandle, geocoder: StaticGeocoder) -> Client {
        GigClient::new(
            AccountId::random(),
            ledger.clone(),
            Arc::new(MemoryContentStore::default()),
            Arc::new(geocoder),
            Arc::new(StraightLineRouter::default()),
        )
    }

    fn draft(start: &str, end: &str) -> ServiceDraft {
        ServiceDraft {
            title: "Move a sofa".into(),
            start_location: start.into(),
            end_location: end.into(),
            photo: b"sofa.jpg".to_vec(),
            amount: Decimal::ONE,
        }
    }

    #[tokio::test]
    async fn post_refreshes_snapshot() {
        let ledger = LedgerHandle::default();
        let alice = client(&ledger, StaticGeocoder::new());
        ledger.deposit(alice.account(), Decimal::TEN).await.unwrap();

        let id = alice.post_service(draft("a", "b")).await.unwrap();
        assert!(alice.snapshot().service(id).is_some());
        assert_eq!(alice.actions(id), vec![ServiceAction::Cancel]);
        assert_eq!(
            alice.service(id).await.unwrap().image_hash,
            ContentHash::of(b"sofa.jpg")
        );
    }

    #[tokio::test]
    async fn map_view_without_matches_has_no_route() {
        let ledger = LedgerHandle::default();
        let alice = client(&ledger, StaticGeocoder::new());
        ledger.deposit(alice.account(), Decimal::TEN).await.unwrap();
        let id = alice.post_service(draft("Nowhere", "0.5, 0.5")).await.unwrap();

        let view = alice.map_view(id).await.unwrap();
        assert!(view.start.is_none());
        assert!(view.end.is_some());
        assert!(view.route.is_none());
    }

    #[tokio::test]
    async fn map_view_routes_between_known_places() {
        let ledger = LedgerHandle::default();
        let geocoder = StaticGeocoder::new()
            .with_place("Depot", Coordinates::new(10.0, 10.0).unwrap())
            .with_place("Market", Coordinates::new(10.1, 10.1).unwrap());
        let alice = client(&ledger, geocoder);
        ledger.deposit(alice.account(), Decimal::TEN).await.unwrap();
        let id = alice.post_service(draft("Depot", "Market")).await.unwrap();

        let route = alice.map_view(id).await.unwrap().route.unwrap();
        assert!(route.distance_m > 10_000.0);
    }
}
