use uuid::Uuid;

use aegis_core::state_machine::PolicyState;
use aegis_core::types::PolicyId;

/// Escrow-ledger rejections.
///
/// Every rejection carries a specific reason; callers never need to guess
/// why a proof was refused.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("policy not found: {0}")]
    PolicyNotFound(PolicyId),

    #[error("policy {id} is not active (status: {status})")]
    PolicyNotActive { id: PolicyId, status: PolicyState },

    #[error("trip id hash does not match policy {0}")]
    TripIdMismatch(PolicyId),

    #[error("invalid proof: {0}")]
    InvalidProof(String),

    #[error("policy {0} deadline has not passed")]
    DeadlineNotPassed(PolicyId),

    #[error("escrow transfer failed: {0}")]
    TransferFailed(String),

    #[error("insufficient escrow: available {available}, required {required}")]
    InsufficientEscrow { available: u128, required: u128 },

    #[error("amount {0} exceeds ledger capacity")]
    AmountOverflow(u128),
}

/// Settlement-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("settlement requires a successful verification")]
    VerificationRequired,

    #[error("settlement already executed: {0}")]
    AlreadyExecuted(Uuid),

    #[error("settlement not found: {0}")]
    NotFound(Uuid),

    #[error("no settlement for booking: {0}")]
    BookingNotFound(String),

    #[error("settlement already exists for booking: {0}")]
    BookingAlreadySettling(String),

    #[error("payout submission failed: {0}")]
    PayoutFailed(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
