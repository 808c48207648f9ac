//! Receipt token ledger: mints and burns engagement receipts.
//!
//! At most one live token exists per service. Minting is driven only by an
//! approved handshake and burning only by a verified release; the
//! `ServiceLedger` is the sole caller.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use gigledger_types::{
    AccountId, GigError, ReceiptToken, ReceiptTokenId, Result, ServiceId, TokenState, constants,
};

/// All receipt tokens ever minted.
pub struct ReceiptTokenLedger {
    tokens: BTreeMap<ReceiptTokenId, ReceiptToken>,
    /// Live token per service.
    live_by_service: HashMap<ServiceId, ReceiptTokenId>,
    next_id: ReceiptTokenId,
}

impl ReceiptTokenLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: BTreeMap::new(),
            live_by_service: HashMap::new(),
            next_id: ReceiptTokenId(constants::FIRST_TOKEN_ID),
        }
    }

    /// The ID the next successful `mint` will assign.
    #[must_use]
    pub fn next_id(&self) -> ReceiptTokenId {
        self.next_id
    }

    /// Check that a token could be minted for `service_id` right now.
    ///
    /// # Errors
    /// Returns `TokenAlreadyLive` if the service already has a live token.
    pub fn ensure_mintable(&self, service_id: ServiceId) -> Result<()> {
        if self.live_by_service.contains_key(&service_id) {
            return Err(GigError::TokenAlreadyLive(service_id));
        }
        Ok(())
    }

    /// Mint a live token for `owner` on `service_id`.
    ///
    /// # Errors
    /// Returns `TokenAlreadyLive` if the service already has a live token.
    pub fn mint(&mut self, owner: AccountId, service_id: ServiceId) -> Result<ReceiptTokenId> {
        self.ensure_mintable(service_id)?;

        let id = self.next_id;
        self.tokens.insert(
            id,
            ReceiptToken {
                id,
                service_id,
                owner,
                state: TokenState::Live,
                minted_at: Utc::now(),
                burned_at: None,
            },
        );
        self.live_by_service.insert(service_id, id);
        self.next_id = id.next();

        tracing::debug!(token = %id, service = %service_id, owner = %owner, "Receipt token minted");
        Ok(id)
    }

    /// Check that `token_id` exists and is live.
    ///
    /// # Errors
    /// - `TokenNotFound` if it was never minted
    /// - `TokenAlreadyBurned` if it is no longer live
    pub fn ensure_live(&self, token_id: ReceiptTokenId) -> Result<&ReceiptToken> {
        let token = self
            .tokens
            .get(&token_id)
            .ok_or(GigError::TokenNotFound(token_id))?;
        if !token.is_live() {
            return Err(GigError::TokenAlreadyBurned(token_id));
        }
        Ok(token)
    }

    /// Burn a live token.
    ///
    /// # Errors
    /// - `TokenNotFound` if it was never minted
    /// - `TokenAlreadyBurned` if it was already burned
    pub fn burn(&mut self, token_id: ReceiptTokenId) -> Result<()> {
        let token = self
            .tokens
            .get_mut(&token_id)
            .ok_or(GigError::TokenNotFound(token_id))?;
        token.mark_burned()?;
        self.live_by_service.remove(&token.service_id);

        tracing::debug!(token = %token_id, service = %token.service_id, "Receipt token burned");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, token_id: ReceiptTokenId) -> Option<&ReceiptToken> {
        self.tokens.get(&token_id)
    }

    /// Owner of a live token.
    #[must_use]
    pub fn owner_of(&self, token_id: ReceiptTokenId) -> Option<AccountId> {
        self.tokens
            .get(&token_id)
            .filter(|t| t.is_live())
            .map(|t| t.owner)
    }

    #[must_use]
    pub fn live_token_for(&self, service_id: ServiceId) -> Option<ReceiptTokenId> {
        self.live_by_service.get(&service_id).copied()
    }

    /// Live tokens held by `owner`.
    #[must_use]
    pub fn tokens_of(&self, owner: AccountId) -> Vec<&ReceiptToken> {
        self.tokens
            .values()
            .filter(|t| t.owner == owner && t.is_live())
            .collect()
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live_by_service.len()
    }

    /// Number of tokens ever minted, live or burned.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tokens.len()
    }
}

impl Default for ReceiptTokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_creates_live_token() {
        let mut tl = ReceiptTokenLedger::new();
        let owner = AccountId::random();
        let id = tl.mint(owner, ServiceId(1)).unwrap();
        assert_eq!(id, ReceiptTokenId(1));
        assert_eq!(tl.owner_of(id), Some(owner));
        assert_eq!(tl.live_token_for(ServiceId(1)), Some(id));
        assert_eq!(tl.live_count(), 1);
        assert_eq!(tl.tokens_of(owner).len(), 1);
    }

    #[test]
    fn second_live_token_for_service_refused() {
        let mut tl = ReceiptTokenLedger::new();
        tl.mint(AccountId::random(), ServiceId(1)).unwrap();
        let err = tl.mint(AccountId::random(), ServiceId(1)).unwrap_err();
        assert!(matches!(err, GigError::TokenAlreadyLive(ServiceId(1))));
        assert_eq!(tl.count(), 1);
        assert_eq!(tl.next_id(), ReceiptTokenId(2));
    }

    #[test]
    fn burn_clears_live_index() {
        let mut tl = ReceiptTokenLedger::new();
        let owner = AccountId::random();
        let id = tl.mint(owner, ServiceId(4)).unwrap();
        tl.burn(id).unwrap();

        assert!(tl.owner_of(id).is_none());
        assert!(tl.live_token_for(ServiceId(4)).is_none());
        assert_eq!(tl.get(id).unwrap().state, TokenState::Burned);
        assert!(tl.tokens_of(owner).is_empty());
        assert_eq!(tl.live_count(), 0);
        assert_eq!(tl.count(), 1);
    }

    #[test]
    fn double_burn_fails() {
        let mut tl = ReceiptTokenLedger::new();
        let id = tl.mint(AccountId::random(), ServiceId(1)).unwrap();
        tl.burn(id).unwrap();
        assert!(matches!(
            tl.burn(id).unwrap_err(),
            GigError::TokenAlreadyBurned(_)
        ));
        assert!(matches!(
            tl.ensure_live(id).unwrap_err(),
            GigError::TokenAlreadyBurned(_)
        ));
    }

    #[test]
    fn unknown_token_not_found() {
        let mut tl = ReceiptTokenLedger::new();
        assert!(matches!(
            tl.burn(ReceiptTokenId(5)).unwrap_err(),
            GigError::TokenNotFound(ReceiptTokenId(5))
        ));
    }

    #[test]
    fn ids_never_reused() {
        let mut tl = ReceiptTokenLedger::new();
        let first = tl.mint(AccountId::random(), ServiceId(1)).unwrap();
        tl.burn(first).unwrap();
        let second = tl.mint(AccountId::random(), ServiceId(2)).unwrap();
        assert_ne!(first, second);
    }
}
