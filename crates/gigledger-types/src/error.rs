//! Error types for the GigLedger protocol.
//!
//! All errors use the `GM_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Registry / input validation errors
//! - 2xx: Balance and escrow funds errors
//! - 3xx: Handshake / lifecycle errors
//! - 4xx: Receipt token errors
//! - 5xx: External I/O errors (upload, geocoding, routing)
//! - 9xx: General / internal errors
//!
//! Every 1xx–4xx error is a rejected precondition: the ledger guarantees that
//! no state was mutated when one is returned.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, ReceiptTokenId, ServiceId, ServiceStatus};

/// Central error enum for all GigLedger operations.
#[derive(Debug, Error)]
pub enum GigError {
    // =================================================================
    // Registry / Input Errors (1xx)
    // =================================================================
    /// No service with this ID exists.
    #[error("GM_ERR_100: Service not found: {0}")]
    ServiceNotFound(ServiceId),

    /// The escrow amount is zero, negative, or below the configured minimum.
    #[error("GM_ERR_101: Invalid amount {amount}: must be at least {minimum}")]
    InvalidAmount { amount: Decimal, minimum: Decimal },

    /// A text field or hash failed validation.
    #[error("GM_ERR_102: Invalid input: {reason}")]
    InvalidInput { reason: String },

    // =================================================================
    // Balance / Escrow Errors (2xx)
    // =================================================================
    /// Not enough available balance to post the escrow or withdraw.
    #[error("GM_ERR_200: Insufficient available balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    /// Not enough escrowed balance to refund or release.
    #[error("GM_ERR_201: Insufficient escrowed balance")]
    InsufficientEscrow,

    /// The escrow for this service was already released or refunded.
    #[error("GM_ERR_202: Escrow for {0} already settled")]
    EscrowAlreadySettled(ServiceId),

    /// The payout to the provider could not be delivered.
    #[error("GM_ERR_203: Transfer to {to} failed: {reason}")]
    TransferFailed { to: AccountId, reason: String },

    // =================================================================
    // Handshake / Lifecycle Errors (3xx)
    // =================================================================
    /// The operation is not valid in the service's current state.
    #[error("GM_ERR_300: Wrong service state for {operation}: service is {actual}")]
    WrongState {
        operation: &'static str,
        actual: ServiceStatus,
    },

    /// The caller is not allowed to perform this operation.
    #[error("GM_ERR_301: Unauthorized caller {caller} for {operation}")]
    Unauthorized {
        operation: &'static str,
        caller: AccountId,
    },

    /// The requester tried to accept their own service.
    #[error("GM_ERR_302: Self-dealing forbidden: requester cannot accept own service")]
    SelfDealing,

    // =================================================================
    // Receipt Token Errors (4xx)
    // =================================================================
    /// No receipt token with this ID exists.
    #[error("GM_ERR_400: Receipt token not found: {0}")]
    TokenNotFound(ReceiptTokenId),

    /// A live receipt token already exists for the service.
    #[error("GM_ERR_401: Service {0} already has a live receipt token")]
    TokenAlreadyLive(ServiceId),

    /// The token has already been burned.
    #[error("GM_ERR_402: Receipt token {0} already burned")]
    TokenAlreadyBurned(ReceiptTokenId),

    // =================================================================
    // External I/O Errors (5xx)
    // =================================================================
    /// Content upload failed.
    #[error("GM_ERR_500: Upload failed: {reason}")]
    Upload { reason: String },

    /// Geocoding request failed (distinct from "no result").
    #[error("GM_ERR_501: Geocoding failed for {query:?}: {reason}")]
    Geocoding { query: String, reason: String },

    /// Routing request failed.
    #[error("GM_ERR_502: Routing failed: {reason}")]
    Routing { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("GM_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("GM_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("GM_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("GM_ERR_903: I/O error: {0}")]
    Io(String),

    /// Supply conservation invariant violated: critical safety alert.
    #[error("GM_ERR_904: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },
}

impl GigError {
    /// Whether retrying the same call unchanged may succeed.
    ///
    /// External I/O failures and payout failures are transient from the
    /// caller's point of view; precondition violations are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Upload { .. }
                | Self::Geocoding { .. }
                | Self::Routing { .. }
                | Self::TransferFailed { .. }
                | Self::Io(_)
        )
    }

    /// Whether this error is a rejected ledger precondition.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::ServiceNotFound(_)
                | Self::InvalidAmount { .. }
                | Self::InvalidInput { .. }
                | Self::InsufficientBalance { .. }
                | Self::InsufficientEscrow
                | Self::EscrowAlreadySettled(_)
                | Self::WrongState { .. }
                | Self::Unauthorized { .. }
                | Self::SelfDealing
                | Self::TokenNotFound(_)
                | Self::TokenAlreadyLive(_)
                | Self::TokenAlreadyBurned(_)
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, GigError>;

impl From<std::io::Error> for GigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
