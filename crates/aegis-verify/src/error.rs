use crate::types::VerificationId;

/// Verification-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("verification result not found: {0}")]
    NotFound(VerificationId),

    #[error("real verifier is not implemented; configure the mock verifier")]
    NotImplemented,

    #[error("invalid failure rate {0}: must be within 0.0..=1.0")]
    InvalidRate(f64),
}
