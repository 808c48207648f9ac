//! # gigledger-client
//!
//! Everything that lives off the ledger:
//!
//! - [`ContentStore`]: content-addressed photo uploads ([`MemoryContentStore`])
//! - [`Geocoder`]: free-text place to coordinates ([`StaticGeocoder`])
//! - [`RouteProvider`]: path between two points ([`StraightLineRouter`])
//! - [`LedgerHandle`]: the shared single-writer ledger
//! - [`ServicePoller`]: periodic snapshots of every service
//! - [`GigClient`]: upload, submit, refresh, for one identity
//!
//! ## Ordering
//!
//! ```text
//! photo ──▶ ContentStore::put ──▶ hash ──▶ LedgerHandle (one lock, one transition)
//!                                                   │
//!                                                   ▼
//!                                   ServicePoller::refresh ──▶ watch subscribers
//! ```

pub mod client;
pub mod content_store;
pub mod geo;
pub mod geocode;
pub mod handle;
pub mod poller;
pub mod routing;

pub use client::{GigClient, MapView, ServiceDraft};
pub use content_store::{ContentStore, MemoryContentStore, StoredContent};
pub use geo::{Coordinates, Route};
pub use geocode::{Geocoder, StaticGeocoder};
pub use handle::LedgerHandle;
pub use poller::{LedgerSnapshot, PollerTask, ServicePoller};
pub use routing::{RouteProvider, StraightLineRouter, route_or_none};
