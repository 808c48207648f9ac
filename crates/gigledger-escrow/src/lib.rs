//! # gigledger-escrow
//!
//! **Service escrow ledger**: the serial, single-writer state machine behind
//! the GigLedger marketplace.
//!
//! ## Architecture
//!
//! 1. **ServiceRegistry**: arena of [`Service`](gigledger_types::Service) records keyed by monotonic ID
//! 2. **Handshake**: pure request → approve transitions (no unilateral acceptance)
//! 3. **ReceiptTokenLedger**: mints a receipt on approval, burns it on release
//! 4. **EscrowLedger**: captures funds at creation, releases or refunds exactly once
//! 5. **BalanceManager**: available/escrowed accounting per account
//! 6. **ServiceLedger**: composes the above; every operation is all-or-nothing
//!
//! ## Lifecycle
//!
//! ```text
//! create_service → request_acceptance → approve_acceptance (mint)
//!     → submit_completion_proof → verify_and_release (burn + pay)
//! ```

pub mod balance_manager;
pub mod escrow;
pub mod handshake;
pub mod ledger;
pub mod registry;
pub mod supply_conservation;
pub mod token_ledger;

pub use balance_manager::BalanceManager;
pub use escrow::{EscrowHold, EscrowLedger, HoldState};
pub use ledger::{ServiceLedger, status_counts};
pub use registry::{NewService, ServiceRegistry};
pub use supply_conservation::SupplyConservation;
pub use token_ledger::ReceiptTokenLedger;
