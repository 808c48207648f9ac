//! Ledger events: the append-only record of committed transitions.
//!
//! Clients never get pushed updates. They poll `events_since(seq)` (or the
//! full service list) and discover new service IDs and transitions from here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, ContentHash, ReceiptTokenId, ServiceId, TxId};

/// What a committed transition did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEventKind {
    /// A service was created and `amount` moved into escrow.
    ServiceCreated { amount: Decimal },
    AcceptanceRequested { acceptor: AccountId },
    AcceptanceApproved {
        provider: AccountId,
        token_id: ReceiptTokenId,
    },
    AcceptanceRejected { acceptor: AccountId },
    AcceptanceWithdrawn { acceptor: AccountId },
    ProofSubmitted { proof: ContentHash },
    ProofRejected { proof: ContentHash },
    /// Proof verified, token burned, funds paid out.
    FundsReleased {
        provider: AccountId,
        amount: Decimal,
        token_id: ReceiptTokenId,
    },
    /// Service cancelled before approval; escrow refunded.
    ServiceCancelled { refund: Decimal },
}

impl std::fmt::Display for LedgerEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ServiceCreated { .. } => "SERVICE_CREATED",
            Self::AcceptanceRequested { .. } => "ACCEPTANCE_REQUESTED",
            Self::AcceptanceApproved { .. } => "ACCEPTANCE_APPROVED",
            Self::AcceptanceRejected { .. } => "ACCEPTANCE_REJECTED",
            Self::AcceptanceWithdrawn { .. } => "ACCEPTANCE_WITHDRAWN",
            Self::ProofSubmitted { .. } => "PROOF_SUBMITTED",
            Self::ProofRejected { .. } => "PROOF_REJECTED",
            Self::FundsReleased { .. } => "FUNDS_RELEASED",
            Self::ServiceCancelled { .. } => "SERVICE_CANCELLED",
        };
        write!(f, "{name}")
    }
}

/// One committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Position in the log, starting at 0. Gap-free.
    pub seq: u64,
    pub tx_id: TxId,
    pub service_id: ServiceId,
    /// The caller that submitted the transition.
    pub actor: AccountId,
    pub kind: LedgerEventKind,
    pub at: DateTime<Utc>,
}
