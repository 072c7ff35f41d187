//! Aegis verification gate.
//!
//! Independently confirms attestation/data integrity before settlement is
//! allowed. The mock verifier simulates real-world unreliability through an
//! injectable failure strategy; the real verifier is a declared swap point
//! that fails fast until a trust-minimized backend exists.

pub mod error;
pub mod failure;
pub mod types;
pub mod verifier;

pub use error::VerifyError;
pub use failure::FailureSimulator;
pub use types::{DataIntegrity, VerificationId, VerificationResult};
pub use verifier::{MockVerifier, RealVerifier, VerificationGate};
