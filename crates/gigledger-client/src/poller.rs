//! Periodic re-read of ledger state.
//!
//! The ledger never pushes updates. The poller re-reads every service on a
//! fixed interval and publishes an immutable [`LedgerSnapshot`] over a
//! `watch` channel. Readers always see a complete snapshot, possibly stale;
//! anyone who just submitted a transition calls [`ServicePoller::refresh`]
//! instead of waiting for the next tick.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use gigledger_types::{AccountId, Service, ServiceId};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::handle::LedgerHandle;

/// One consistent read of every service.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub services: Vec<Service>,
    /// Ledger event sequence at the time of the read.
    pub event_seq: u64,
    pub fetched_at: DateTime<Utc>,
}

impl LedgerSnapshot {
    fn empty() -> Self {
        Self {
            services: Vec::new(),
            event_seq: 0,
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<ServiceId> {
        self.services.iter().map(|s| s.id).collect()
    }

    /// Services `account` posted or is fulfilling.
    #[must_use]
    pub fn involving(&self, account: AccountId) -> Vec<&Service> {
        self.services
            .iter()
            .filter(|s| s.requester == account || s.accepted_by() == Some(account))
            .collect()
    }
}

#[derive(Clone)]
pub struct ServicePoller {
    ledger: LedgerHandle,
    tx: Arc<watch::Sender<Arc<LedgerSnapshot>>>,
}

impl ServicePoller {
    #[must_use]
    pub fn new(ledger: LedgerHandle) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(LedgerSnapshot::empty()));
        Self {
            ledger,
            tx: Arc::new(tx),
        }
    }

    /// Read the ledger now and publish the result.
    ///
    /// Returns the snapshot that is current after publishing, which is the
    /// fresh read unless a concurrent refresh already published a newer one.
    pub async fn refresh(&self) -> Arc<LedgerSnapshot> {
        let (services, event_seq) = self.ledger.read_all().await;
        let snapshot = Arc::new(LedgerSnapshot {
            services,
            event_seq,
            fetched_at: Utc::now(),
        });
        let published = self.publish(Arc::clone(&snapshot));
        tracing::debug!(
            services = snapshot.services.len(),
            event_seq,
            published,
            "Ledger polled"
        );
        if published { snapshot } else { self.latest() }
    }

    /// Publish `snapshot` unless a newer one is already out.
    fn publish(&self, snapshot: Arc<LedgerSnapshot>) -> bool {
        self.tx.send_if_modified(|current| {
            if current.event_seq <= snapshot.event_seq {
                *current = snapshot;
                true
            } else {
                false
            }
        })
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> Arc<LedgerSnapshot> {
        Arc::clone(&self.tx.borrow())
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<LedgerSnapshot>> {
        self.tx.subscribe()
    }

    /// Poll every `period` until the returned task is stopped.
    #[must_use]
    pub fn spawn(&self, period: Duration) -> PollerTask {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let poller = self.clone();
        let join = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        poller.refresh().await;
                    }
                    _ = stop_rx.changed() => break,
                }
            }
            tracing::debug!("Poller stopped");
        });
        PollerTask { stop: stop_tx, join }
    }
}

/// A running background poll loop.
pub struct PollerTask {
    stop: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl PollerTask {
    /// Stop polling and wait for the loop to exit.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.join.await {
            tracing::warn!(error = %err, "Poller task ended abnormally");
        }
    }
}
