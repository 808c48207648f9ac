//! End-to-end client flows over a shared ledger.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use gigledger_client::{
    ContentStore, Coordinates, GigClient, LedgerHandle, MemoryContentStore, Route, RouteProvider,
    ServiceDraft, StaticGeocoder, StoredContent, StraightLineRouter,
};
use gigledger_types::{AccountId, ContentHash, GigError, Result, ServiceAction, ServiceStatus};
use rust_decimal::Decimal;

/// Fails every upload while `down` is set.
#[derive(Default)]
struct FlakyStore {
    down: AtomicBool,
    inner: MemoryContentStore,
}

impl ContentStore for FlakyStore {
    async fn put(&self, content: Vec<u8>) -> Result<StoredContent> {
        if self.down.load(Ordering::SeqCst) {
            return Err(GigError::Upload {
                reason: "gateway unavailable".into(),
            });
        }
        self.inner.put(content).await
    }

    async fn get(&self, hash: ContentHash) -> Result<Option<Arc<[u8]>>> {
        self.inner.get(hash).await
    }
}

struct BrokenRouter;

impl RouteProvider for BrokenRouter {
    async fn route(&self, _from: Coordinates, _to: Coordinates) -> Result<Route> {
        Err(GigError::Routing {
            reason: "service down".into(),
        })
    }
}

fn draft(amount: i64) -> ServiceDraft {
    ServiceDraft {
        title: "Pick up groceries".into(),
        start_location: "52.0, 4.0".into(),
        end_location: "52.1, 4.1".into(),
        photo: b"list.jpg".to_vec(),
        amount: Decimal::from(amount),
    }
}

struct Town<R> {
    ledger: LedgerHandle,
    store: Arc<FlakyStore>,
    requester: GigClient<FlakyStore, StaticGeocoder, R>,
    provider: GigClient<FlakyStore, StaticGeocoder, R>,
}

async fn town<R: RouteProvider>(router: R) -> Town<R> {
    let ledger = LedgerHandle::default();
    let store = Arc::new(FlakyStore::default());
    let geocoder = Arc::new(StaticGeocoder::new());
    let router = Arc::new(router);
    let make = || {
        GigClient::new(
            AccountId::random(),
            ledger.clone(),
            Arc::clone(&store),
            Arc::clone(&geocoder),
            Arc::clone(&router),
        )
    };
    let requester = make();
    let provider = make();
    ledger.deposit(requester.account(), Decimal::from(50)).await.unwrap();
    Town {
        ledger,
        store,
        requester,
        provider,
    }
}

#[tokio::test]
async fn full_lifecycle_through_clients() {
    let t = town(StraightLineRouter::default()).await;
    let id = t.requester.post_service(draft(20)).await.unwrap();

    t.provider.request(id).await.unwrap();
    assert_eq!(t.requester.actions(id), vec![ServiceAction::Cancel]);
    t.requester.poller().refresh().await;
    assert_eq!(t.requester.actions(id).len(), 3);

    let token = t.requester.approve(id).await.unwrap();
    assert_eq!(
        t.provider.snapshot().service(id).unwrap().receipt_token_id(),
        None,
        "provider's snapshot is stale until it refreshes"
    );
    t.provider.poller().refresh().await;
    assert_eq!(
        t.provider.snapshot().service(id).unwrap().receipt_token_id(),
        Some(token)
    );
    assert_eq!(
        t.provider.actions(id),
        vec![ServiceAction::SubmitCompletionProof]
    );

    let proof = t.provider.submit_proof(id, b"done.jpg".to_vec()).await.unwrap();
    assert_eq!(proof, ContentHash::of(b"done.jpg"));
    assert_eq!(t.requester.verify(id).await.unwrap(), Decimal::from(20));

    let svc = t.requester.service(id).await.unwrap();
    assert_eq!(svc.status(), ServiceStatus::Completed);
    assert_eq!(t.provider.balance().await.available, Decimal::from(20));
    assert_eq!(t.requester.balance().await.available, Decimal::from(30));
    t.ledger
        .with_ledger(|l| l.check_invariants())
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_upload_has_no_ledger_effect() {
    let t = town(StraightLineRouter::default()).await;
    t.store.down.store(true, Ordering::SeqCst);

    let err = t.requester.post_service(draft(20)).await.unwrap_err();
    assert!(matches!(err, GigError::Upload { .. }));
    assert!(err.is_retryable());
    assert!(t.ledger.all_service_ids().await.is_empty());
    assert!(t.ledger.events_since(0).await.is_empty());
    assert_eq!(t.requester.balance().await.available, Decimal::from(50));

    t.store.down.store(false, Ordering::SeqCst);
    let id = t.requester.post_service(draft(20)).await.unwrap();
    t.provider.request(id).await.unwrap();
    t.requester.approve(id).await.unwrap();

    t.store.down.store(true, Ordering::SeqCst);
    assert!(t.provider.submit_proof(id, b"done".to_vec()).await.is_err());
    let svc = t.ledger.get_service(id).await.unwrap();
    assert_eq!(svc.status(), ServiceStatus::Accepted);
    assert!(!svc.completion_submitted());
}

#[tokio::test]
async fn routing_failure_degrades_map_view() {
    let t = town(BrokenRouter).await;
    let id = t.requester.post_service(draft(5)).await.unwrap();

    let view = t.requester.map_view(id).await.unwrap();
    assert!(view.start.is_some());
    assert!(view.end.is_some());
    assert!(view.route.is_none());
}

#[tokio::test]
async fn cancel_refunds_through_client() {
    let t = town(StraightLineRouter::default()).await;
    let id = t.requester.post_service(draft(15)).await.unwrap();
    assert_eq!(t.requester.balance().await.escrowed, Decimal::from(15));

    t.provider.request(id).await.unwrap();
    t.provider.withdraw(id).await.unwrap();
    assert_eq!(t.requester.cancel(id).await.unwrap(), Decimal::from(15));

    let balance = t.requester.balance().await;
    assert_eq!(balance.available, Decimal::from(50));
    assert_eq!(balance.escrowed, Decimal::ZERO);
    assert!(t.provider.request(id).await.is_err());
}
