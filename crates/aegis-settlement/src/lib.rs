//! Aegis settlement layer.
//!
//! Orchestrates verification-gated settlements with at-most-once execution,
//! and defines the narrow interface to the external escrow ledger (policy
//! state machine plus fund transfer).

pub mod adapters;
pub mod coordinator;
pub mod error;
pub mod traits;
pub mod types;

pub use adapters::escrow::EscrowLedger;
pub use coordinator::SettlementCoordinator;
pub use error::{LedgerError, SettlementError};
pub use traits::{PayoutRail, PolicyLedger};
pub use types::{ProofOutcome, Settlement, SettlementId};
