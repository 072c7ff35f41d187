/// Attestation-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum AttestError {
    #[error("attestation not found: {0}")]
    NotFound(String),

    #[error("attestation malformed: {0}")]
    Malformed(String),
}
