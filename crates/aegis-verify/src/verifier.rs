use dashmap::DashMap;

use aegis_core::types::TripStatus;

use crate::error::VerifyError;
use crate::failure::{FailureOutcome, FailureSimulator};
use crate::types::{DataIntegrity, VerificationId, VerificationResult};

/// Simulated data verifier.
///
/// Stands in for an independent verification network: it draws failures
/// from the injected [`FailureSimulator`] and caches every result by
/// verification id.
pub struct MockVerifier {
    results: DashMap<VerificationId, VerificationResult>,
    failures: FailureSimulator,
}

impl MockVerifier {
    /// Create a verifier with production-like failure rates.
    pub fn new() -> Self {
        Self::with_failures(FailureSimulator::realistic())
    }

    /// Create a verifier with an explicit failure strategy.
    pub fn with_failures(failures: FailureSimulator) -> Self {
        Self {
            results: DashMap::new(),
            failures,
        }
    }

    /// Verify a trip status against its data-source hash.
    ///
    /// Every call produces and caches a fresh, immutable result.
    pub fn verify(&self, trip_status: &TripStatus, data_source_hash: &str) -> VerificationResult {
        let verification_id = VerificationId::new();

        let result = match self.failures.draw() {
            FailureOutcome::ProviderUnavailable => VerificationResult {
                verified: false,
                verification_id,
                data_integrity: DataIntegrity::Unverifiable,
                attestation_hash: None,
                error_reason: Some("verification provider unavailable".into()),
            },
            FailureOutcome::DataTampered => VerificationResult {
                verified: false,
                verification_id,
                data_integrity: DataIntegrity::Tampered,
                attestation_hash: None,
                error_reason: Some("data integrity check failed".into()),
            },
            FailureOutcome::Pass => {
                let mut hasher = blake3::Hasher::new();
                hasher.update(data_source_hash.as_bytes());
                hasher.update(trip_status.trip_id.as_str().as_bytes());
                hasher.update(verification_id.0.as_bytes());
                VerificationResult {
                    verified: true,
                    verification_id,
                    data_integrity: DataIntegrity::Valid,
                    attestation_hash: Some(hex::encode(hasher.finalize().as_bytes())),
                    error_reason: None,
                }
            }
        };

        tracing::info!(
            verification_id = %verification_id,
            verified = result.verified,
            integrity = %result.data_integrity,
            trip_id = %trip_status.trip_id,
            "verification completed"
        );

        self.results.insert(verification_id, result.clone());
        result
    }

    /// Retrieve a cached result.
    pub fn get_verification(&self, id: VerificationId) -> Option<VerificationResult> {
        self.results.get(&id).map(|r| r.clone())
    }
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Placeholder for a genuine trust-minimized verifier.
///
/// Deliberately unimplemented: every call fails fast with
/// [`VerifyError::NotImplemented`] rather than silently degrading, keeping a
/// clean swap point that does not touch callers.
pub struct RealVerifier;

impl RealVerifier {
    pub fn verify(
        &self,
        _trip_status: &TripStatus,
        _data_source_hash: &str,
    ) -> Result<VerificationResult, VerifyError> {
        Err(VerifyError::NotImplemented)
    }

    pub fn get_verification(
        &self,
        _id: VerificationId,
    ) -> Result<VerificationResult, VerifyError> {
        Err(VerifyError::NotImplemented)
    }
}

/// The verification gate, selected once at composition time.
///
/// An explicit tagged variant — never inferred per call.
pub enum VerificationGate {
    Mock(MockVerifier),
    Real(RealVerifier),
}

impl VerificationGate {
    /// A mock gate with the given failure strategy.
    pub fn mock(failures: FailureSimulator) -> Self {
        Self::Mock(MockVerifier::with_failures(failures))
    }

    /// The unimplemented real gate.
    pub fn real() -> Self {
        Self::Real(RealVerifier)
    }

    /// Verify a trip status against its data-source hash.
    pub fn verify(
        &self,
        trip_status: &TripStatus,
        data_source_hash: &str,
    ) -> Result<VerificationResult, VerifyError> {
        match self {
            Self::Mock(verifier) => Ok(verifier.verify(trip_status, data_source_hash)),
            Self::Real(verifier) => verifier.verify(trip_status, data_source_hash),
        }
    }

    /// Retrieve a cached result by id.
    pub fn get_verification(&self, id: VerificationId) -> Result<VerificationResult, VerifyError> {
        match self {
            Self::Mock(verifier) => verifier
                .get_verification(id)
                .ok_or(VerifyError::NotFound(id)),
            Self::Real(verifier) => verifier.get_verification(id),
        }
    }
}
