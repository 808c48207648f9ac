//! # ReceiptToken: proof of an active engagement
//!
//! A non-fungible token minted when the requester approves a provider and
//! burned when the requester verifies the completion proof. While it is
//! live, it is the provider's capability for that service.
//!
//! ## State Machine
//!
//! ```text
//!   ┌──────┐  verify & release  ┌────────┐
//!   │ LIVE ├───────────────────▶│ BURNED │
//!   └──────┘                    └────────┘
//! ```
//!
//! `Live → Burned` is irreversible; token IDs are never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, GigError, ReceiptTokenId, ServiceId};

/// Lifecycle state of a receipt token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenState {
    /// The engagement is in progress.
    Live,
    /// The engagement completed. **Irreversible.**
    Burned,
}

impl TokenState {
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!((self, target), (Self::Live, Self::Burned))
    }
}

impl std::fmt::Display for TokenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "LIVE"),
            Self::Burned => write!(f, "BURNED"),
        }
    }
}

/// A receipt token bound to exactly one service and one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptToken {
    pub id: ReceiptTokenId,
    /// The service this token is an engagement receipt for.
    pub service_id: ServiceId,
    /// The approved provider.
    pub owner: AccountId,
    pub state: TokenState,
    pub minted_at: DateTime<Utc>,
    pub burned_at: Option<DateTime<Utc>>,
}

impl ReceiptToken {
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state == TokenState::Live
    }

    /// Transition to BURNED.
    ///
    /// # Errors
    /// Returns `TokenAlreadyBurned` if the token is not live.
    pub fn mark_burned(&mut self) -> crate::Result<()> {
        if !self.state.can_transition_to(TokenState::Burned) {
            return Err(GigError::TokenAlreadyBurned(self.id));
        }
        self.state = TokenState::Burned;
        self.burned_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_token() -> ReceiptToken {
        ReceiptToken {
            id: ReceiptTokenId(1),
            service_id: ServiceId(1),
            owner: AccountId::random(),
            state: TokenState::Live,
            minted_at: Utc::now(),
            burned_at: None,
        }
    }

    #[test]
    fn state_transitions() {
        assert!(TokenState::Live.can_transition_to(TokenState::Burned));
        assert!(!TokenState::Burned.can_transition_to(TokenState::Live));
        assert!(!TokenState::Burned.can_transition_to(TokenState::Burned));
        assert!(!TokenState::Live.can_transition_to(TokenState::Live));
    }

    #[test]
    fn burn_once() {
        let mut token = make_token();
        token.mark_burned().unwrap();
        assert!(!token.is_live());
        assert!(token.burned_at.is_some());

        let err = token.mark_burned().unwrap_err();
        assert!(matches!(err, GigError::TokenAlreadyBurned(id) if id == ReceiptTokenId(1)));
    }

    #[test]
    fn serde_roundtrip() {
        let token = make_token();
        let json = serde_json::to_string(&token).unwrap();
        let back: ReceiptToken = serde_json::from_str(&json).unwrap();
        assert_eq!(token, back);
    }
}
