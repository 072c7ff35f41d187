use aegis_settlement::error::{LedgerError, SettlementError};
use aegis_verify::error::VerifyError;

/// Node-level error taxonomy, mapped onto HTTP status codes at the API.
#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    /// Malformed input — caller's fault, not retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Policy, booking, or settlement absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// State conflict (policy not active, settlement already executed).
    /// Surfaced, not retried.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unverified or tampered data — hard stop, no settlement created.
    #[error("verification failed: {0}")]
    VerificationFailure(String),

    /// Ledger or rail unavailable — the claim should be retried later.
    #[error("upstream unavailable: {0}")]
    Upstream(String),
}

impl From<LedgerError> for ClaimError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::PolicyNotFound(id) => Self::NotFound(format!("policy {id}")),
            LedgerError::PolicyNotActive { .. } | LedgerError::DeadlineNotPassed(_) => {
                Self::Conflict(e.to_string())
            }
            LedgerError::TripIdMismatch(_)
            | LedgerError::InvalidProof(_)
            | LedgerError::AmountOverflow(_) => Self::Validation(e.to_string()),
            LedgerError::TransferFailed(_) | LedgerError::InsufficientEscrow { .. } => {
                Self::Upstream(e.to_string())
            }
        }
    }
}

impl From<SettlementError> for ClaimError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::VerificationRequired => Self::VerificationFailure(e.to_string()),
            SettlementError::AlreadyExecuted(_) | SettlementError::BookingAlreadySettling(_) => {
                Self::Conflict(e.to_string())
            }
            SettlementError::NotFound(_) | SettlementError::BookingNotFound(_) => {
                Self::NotFound(e.to_string())
            }
            SettlementError::PayoutFailed(_) => Self::Upstream(e.to_string()),
            SettlementError::Ledger(inner) => inner.into(),
        }
    }
}

impl From<VerifyError> for ClaimError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::NotFound(id) => Self::NotFound(format!("verification {id}")),
            VerifyError::NotImplemented => Self::Upstream(e.to_string()),
            VerifyError::InvalidRate(_) => Self::Validation(e.to_string()),
        }
    }
}
