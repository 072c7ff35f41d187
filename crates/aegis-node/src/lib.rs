//! The Aegis claim node.
//!
//! Ties together all layers: status resolution, attestation, verification,
//! settlement, and the escrow ledger. Constructed once at startup from a
//! [`config::NodeConfig`] and served over HTTP.

pub mod api;
pub mod bookings;
pub mod config;
pub mod error;
pub mod service;

pub use bookings::{Booking, BookingRegistry};
pub use config::NodeConfig;
pub use error::ClaimError;
pub use service::{ClaimDecision, ClaimOutcome, ClaimService};
