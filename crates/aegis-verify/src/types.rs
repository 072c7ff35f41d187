use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a verification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationId(pub Uuid);

impl VerificationId {
    /// Create a new random verification ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for VerificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integrity judgement over the verified data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataIntegrity {
    /// Data checks out.
    Valid,
    /// Data was altered between observation and verification.
    Tampered,
    /// The verification provider could not be reached.
    Unverifiable,
}

impl fmt::Display for DataIntegrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Tampered => write!(f, "tampered"),
            Self::Unverifiable => write!(f, "unverifiable"),
        }
    }
}

/// The outcome of a verification attempt. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Whether settlement may proceed on this data.
    pub verified: bool,
    /// Cache key for this result.
    pub verification_id: VerificationId,
    /// Integrity judgement.
    pub data_integrity: DataIntegrity,
    /// Hash bound to the verified attestation, present on success.
    pub attestation_hash: Option<String>,
    /// Failure explanation, present on failure.
    pub error_reason: Option<String>,
}
