//! Configuration types for the GigLedger ledger and client.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{GigError, Result, constants};

/// Validation limits enforced by the ledger on `create_service`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum title length in characters.
    pub max_title_len: usize,
    /// Maximum length of each location string in characters.
    pub max_location_len: usize,
    /// Smallest escrow accepted. Always strictly positive.
    pub min_amount: Decimal,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_title_len: constants::DEFAULT_MAX_TITLE_LEN,
            max_location_len: constants::DEFAULT_MAX_LOCATION_LEN,
            min_amount: Decimal::new(1, constants::DEFAULT_MIN_AMOUNT_SCALE),
        }
    }
}

/// Content store settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentStoreConfig {
    /// Prefix for retrieval URLs; the hex content hash is appended.
    pub gateway_url: String,
    /// Uploads larger than this are rejected before hashing.
    pub max_upload_bytes: usize,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            gateway_url: constants::DEFAULT_GATEWAY_URL.to_string(),
            max_upload_bytes: constants::DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// How often the poller re-reads ledger state.
    pub poll_interval_ms: u64,
    pub ledger: LedgerConfig,
    pub content_store: ContentStoreConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            ledger: LedgerConfig::default(),
            content_store: ContentStoreConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    /// `Serialization` for malformed JSON, `Configuration` for bad values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse, and validate a JSON config file.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`Self::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns `Configuration` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(GigError::Configuration(
                "poll_interval_ms must be > 0".into(),
            ));
        }
        if self.ledger.min_amount <= Decimal::ZERO {
            return Err(GigError::Configuration(format!(
                "ledger.min_amount must be > 0, got {}",
                self.ledger.min_amount
            )));
        }
        if self.ledger.max_title_len == 0 || self.ledger.max_location_len == 0 {
            return Err(GigError::Configuration(
                "ledger text limits must be > 0".into(),
            ));
        }
        if self.content_store.max_upload_bytes == 0 {
            return Err(GigError::Configuration(
                "content_store.max_upload_bytes must be > 0".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ClientConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.poll_interval_ms, 5_000);
        assert_eq!(cfg.content_store.gateway_url, "ipfs://");
        assert!(cfg.ledger.min_amount > Decimal::ZERO);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let cfg = ClientConfig::from_json_str(r#"{ "poll_interval_ms": 250 }"#).unwrap();
        assert_eq!(cfg.poll_interval_ms, 250);
        assert_eq!(cfg.ledger, LedgerConfig::default());
    }

    #[test]
    fn nested_override() {
        let cfg = ClientConfig::from_json_str(
            r#"{ "ledger": { "max_title_len": 10, "min_amount": "0.5" } }"#,
        )
        .unwrap();
        assert_eq!(cfg.ledger.max_title_len, 10);
        assert_eq!(cfg.ledger.min_amount, Decimal::new(5, 1));
        assert_eq!(
            cfg.ledger.max_location_len,
            constants::DEFAULT_MAX_LOCATION_LEN
        );
    }

    #[test]
    fn zero_interval_rejected() {
        let err = ClientConfig::from_json_str(r#"{ "poll_interval_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, GigError::Configuration(_)));
    }

    #[test]
    fn non_positive_min_amount_rejected() {
        let err =
            ClientConfig::from_json_str(r#"{ "ledger": { "min_amount": "0" } }"#).unwrap_err();
        assert!(matches!(err, GigError::Configuration(_)));
    }

    #[test]
    fn malformed_json_is_serialization_error() {
        let err = ClientConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, GigError::Serialization(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ClientConfig::from_json_file("/nonexistent/gigledger.json").unwrap_err();
        assert!(matches!(err, GigError::Io(_)));
    }
}
