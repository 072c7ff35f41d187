//! Aegis attestation layer.
//!
//! Produces unique attestations binding a trip-status snapshot to an
//! identifier. Attestations here simulate an external consensus round: they
//! carry realistic latency and a proof chain, but no cryptographic guarantee.

pub mod error;
pub mod service;
pub mod types;

pub use error::AttestError;
pub use service::{AttestationConfig, AttestationService};
pub use types::{Attestation, StatusSnapshot};
