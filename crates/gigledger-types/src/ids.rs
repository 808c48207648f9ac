//! Identifiers used throughout GigLedger.
//!
//! Ledger-assigned IDs (`ServiceId`, `ReceiptTokenId`) are monotonic
//! counters. Accounts are identified by their ed25519 public key, and every
//! committed transition gets a time-ordered UUIDv7 `TxId`.

use std::fmt;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity of a ledger participant: the raw ed25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    #[must_use]
    pub fn from_pubkey(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<&VerifyingKey> for AccountId {
    fn from(key: &VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", hex::encode(&self.0[..8]))
    }
}

/// Random account IDs for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>())
    }
}

// ---------------------------------------------------------------------------
// ServiceId
// ---------------------------------------------------------------------------

/// Ledger-assigned service identifier. Monotonically increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ServiceId(pub u64);

impl ServiceId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "svc:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ReceiptTokenId
// ---------------------------------------------------------------------------

/// Identifier of a non-fungible receipt token. Monotonic, never reused,
/// even after the token is burned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ReceiptTokenId(pub u64);

impl ReceiptTokenId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ReceiptTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rt:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TxId
// ---------------------------------------------------------------------------

/// Identifier of one committed ledger transition. UUIDv7 for time ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxId(pub Uuid);

impl TxId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ContentHash
// ---------------------------------------------------------------------------

/// Content address of an uploaded file: SHA-256 over the raw bytes.
///
/// Identical content always yields the same hash, which is what makes
/// uploads idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Hash the given bytes.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Parse a 64-character hex string.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the string is not 32 bytes of hex.
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let raw = hex::decode(s).map_err(|e| crate::GigError::InvalidInput {
            reason: format!("content hash is not hex: {e}"),
        })?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| crate::GigError::InvalidInput {
                reason: "content hash must be 32 bytes".into(),
            })?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    #[test]
    fn service_id_next() {
        assert_eq!(ServiceId(5).next(), ServiceId(6));
    }

    #[test]
    fn token_id_next() {
        assert_eq!(ReceiptTokenId(1).next(), ReceiptTokenId(2));
    }

    #[test]
    fn tx_id_ordering() {
        let a = TxId::new();
        let b = TxId::new();
        assert!(a < b);
    }

    #[test]
    fn account_from_verifying_key() {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let verifying = signing.verifying_key();
        let account = AccountId::from(&verifying);
        assert_eq!(account.as_bytes(), verifying.as_bytes());
    }

    #[test]
    fn account_display_is_prefixed() {
        let account = AccountId([0xab; 32]);
        assert_eq!(format!("{account}"), "acct:abababababababab");
        assert_eq!(account.short(), "abababab");
    }

    #[test]
    fn content_hash_is_stable() {
        let a = ContentHash::of(b"photo bytes");
        let b = ContentHash::of(b"photo bytes");
        let c = ContentHash::of(b"other bytes");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn content_hash_known_vector() {
        // SHA-256("abc")
        let h = ContentHash::of(b"abc");
        assert_eq!(
            h.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn content_hash_hex_parse() {
        let h = ContentHash::of(b"abc");
        assert_eq!(ContentHash::from_hex(&h.to_hex()).unwrap(), h);
        assert!(ContentHash::from_hex("zz").is_err());
        assert!(ContentHash::from_hex("abcd").is_err());
    }

    #[test]
    fn serde_roundtrips() {
        let id = ServiceId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: ServiceId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);

        let account = AccountId::random();
        let json = serde_json::to_string(&account).unwrap();
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(account, back);
    }
}
