//! # Service: the central escrowed unit of work
//!
//! A requester posts a service with funds attached. Acceptance is a two-step
//! handshake (request → approve), after which the approved provider holds a
//! receipt token until the requester verifies the completion proof.
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐ request  ┌─────────────────┐ approve  ┌──────────┐ proof  ┌────────────────┐ verify ┌───────────┐
//!   │ OPEN ├─────────▶│ PENDING_APPROVAL├─────────▶│ ACCEPTED ├───────▶│ PROOF_SUBMITTED├───────▶│ COMPLETED │
//!   └─┬──▲─┘          └────────┬────────┘          └────▲─────┘        └───────┬────────┘        └───────────┘
//!     │  └──reject/withdraw────┘                        └──── reject proof ────┘
//!     │ cancel (also from PENDING_APPROVAL)
//!     ▼
//!   ┌───────────┐
//!   │ CANCELLED │
//!   └───────────┘
//! ```
//!
//! The engagement is an explicit enum rather than a set of flags, so a proof
//! without a provider, or a token without an approval, cannot be expressed.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, ContentHash, ReceiptTokenId, ServiceId};

/// Where a service is in its acceptance and completion lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engagement {
    /// Nobody has asked to fulfil the service yet.
    Open,
    /// `acceptor` asked to fulfil the service and awaits the requester.
    PendingApproval { acceptor: AccountId },
    /// `provider` was approved and holds receipt token `token_id`.
    Accepted {
        provider: AccountId,
        token_id: ReceiptTokenId,
    },
    /// `provider` submitted `proof`; the requester has not verified it yet.
    ProofSubmitted {
        provider: AccountId,
        token_id: ReceiptTokenId,
        proof: ContentHash,
    },
    /// Proof verified, token burned, funds released to `provider`. Terminal.
    Completed {
        provider: AccountId,
        proof: ContentHash,
    },
    /// Requester withdrew the service before approval and was refunded. Terminal.
    Cancelled,
}

impl Engagement {
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        match self {
            Self::Open => ServiceStatus::Open,
            Self::PendingApproval { .. } => ServiceStatus::PendingApproval,
            Self::Accepted { .. } => ServiceStatus::Accepted,
            Self::ProofSubmitted { .. } => ServiceStatus::ProofSubmitted,
            Self::Completed { .. } => ServiceStatus::Completed,
            Self::Cancelled => ServiceStatus::Cancelled,
        }
    }
}

/// Fieldless view of [`Engagement`], used in errors, logs, and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceStatus {
    Open,
    PendingApproval,
    Accepted,
    ProofSubmitted,
    Completed,
    Cancelled,
}

impl ServiceStatus {
    /// Terminal states never change again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Can a service move directly from `self` to `target`?
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::PendingApproval | Self::Cancelled)
                | (
                    Self::PendingApproval,
                    Self::Open | Self::Accepted | Self::Cancelled
                )
                | (Self::Accepted | Self::ProofSubmitted, Self::ProofSubmitted)
                | (Self::ProofSubmitted, Self::Accepted | Self::Completed)
        )
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::PendingApproval => write!(f, "PENDING_APPROVAL"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::ProofSubmitted => write!(f, "PROOF_SUBMITTED"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Something a given identity may do to a service right now.
///
/// Clients use this to decide which controls to offer; the ledger still
/// re-checks every precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceAction {
    RequestAcceptance,
    ApproveAcceptance,
    RejectAcceptance,
    WithdrawAcceptance,
    SubmitCompletionProof,
    RejectCompletionProof,
    VerifyAndRelease,
    Cancel,
}

/// A service record as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Ledger-assigned identifier.
    pub id: ServiceId,
    /// The identity that created the service and posted the funds.
    pub requester: AccountId,
    /// Short description of the job.
    pub title: String,
    /// Free-text pickup location.
    pub start_location: String,
    /// Free-text drop-off location.
    pub end_location: String,
    /// Content address of the requester's photo.
    pub image_hash: ContentHash,
    /// Value escrowed at creation.
    pub amount: Decimal,
    /// Acceptance / completion state.
    pub engagement: Engagement,
    /// When the service was created.
    pub created_at: DateTime<Utc>,
    /// When the engagement last changed.
    pub updated_at: DateTime<Utc>,
}

impl Service {
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        self.engagement.status()
    }

    /// Identity waiting for the requester's approval, if any.
    #[must_use]
    pub fn pending_acceptor(&self) -> Option<AccountId> {
        match self.engagement {
            Engagement::PendingApproval { acceptor } => Some(acceptor),
            _ => None,
        }
    }

    /// The approved provider. Once set, it never changes.
    #[must_use]
    pub fn accepted_by(&self) -> Option<AccountId> {
        match self.engagement {
            Engagement::Accepted { provider, .. }
            | Engagement::ProofSubmitted { provider, .. }
            | Engagement::Completed { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// The live receipt token, present only while accepted and not completed.
    #[must_use]
    pub fn receipt_token_id(&self) -> Option<ReceiptTokenId> {
        match self.engagement {
            Engagement::Accepted { token_id, .. } | Engagement::ProofSubmitted { token_id, .. } => {
                Some(token_id)
            }
            _ => None,
        }
    }

    /// The provider's completion proof, once submitted.
    #[must_use]
    pub fn completion_image_hash(&self) -> Option<ContentHash> {
        match self.engagement {
            Engagement::ProofSubmitted { proof, .. } | Engagement::Completed { proof, .. } => {
                Some(proof)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn completion_submitted(&self) -> bool {
        self.completion_image_hash().is_some()
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        matches!(self.engagement, Engagement::Completed { .. })
    }

    /// Actions `viewer` may attempt on this service in its current state.
    #[must_use]
    pub fn available_actions(&self, viewer: AccountId) -> Vec<ServiceAction> {
        let is_requester = viewer == self.requester;
        match self.engagement {
            Engagement::Open if is_requester => vec![ServiceAction::Cancel],
            Engagement::Open => vec![ServiceAction::RequestAcceptance],
            Engagement::PendingApproval { .. } if is_requester => vec![
                ServiceAction::ApproveAcceptance,
                ServiceAction::RejectAcceptance,
                ServiceAction::Cancel,
            ],
            Engagement::PendingApproval { acceptor } if acceptor == viewer => {
                vec![ServiceAction::WithdrawAcceptance]
            }
            Engagement::Accepted { provider, .. } if provider == viewer => {
                vec![ServiceAction::SubmitCompletionProof]
            }
            Engagement::ProofSubmitted { .. } if is_requester => vec![
                ServiceAction::VerifyAndRelease,
                ServiceAction::RejectCompletionProof,
            ],
            Engagement::ProofSubmitted { provider, .. } if provider == viewer => {
                vec![ServiceAction::SubmitCompletionProof]
            }
            _ => Vec::new(),
        }
    }
}

/// Dummy service for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Service {
    /// Create an `Open` service with placeholder text.
    pub fn dummy(id: ServiceId, requester: AccountId, amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id,
            requester,
            title: "Deliver parcel".to_string(),
            start_location: "Central Station".to_string(),
            end_location: "Harbour Gate".to_string(),
            image_hash: ContentHash::of(b"dummy-photo"),
            amount,
            engagement: Engagement::Open,
            created_at: now,
            updated_at: now,
        }
    }
}
