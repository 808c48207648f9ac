//! # gigledger-types
//!
//! Shared types, errors, and configuration for the **GigLedger** service
//! escrow protocol.
//!
//! This crate is the leaf dependency of the workspace: every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`ServiceId`], [`ReceiptTokenId`], [`TxId`], [`ContentHash`]
//! - **Service model**: [`Service`], [`Engagement`], [`ServiceStatus`], [`ServiceAction`]
//! - **Receipt token model**: [`ReceiptToken`], [`TokenState`]
//! - **Balance model**: [`BalanceEntry`]
//! - **Event model**: [`LedgerEvent`], [`LedgerEventKind`]
//! - **Configuration**: [`LedgerConfig`], [`ContentStoreConfig`], [`ClientConfig`]
//! - **Errors**: [`GigError`] with `GM_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod receipt_token;
pub mod service;

// Re-export all primary types at crate root for ergonomic imports:
//   use gigledger_types::{Service, Engagement, AccountId, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use receipt_token::*;
pub use service::*;

// Constants are accessed via `gigledger_types::constants::FOO`
// (not re-exported to avoid name collisions).
