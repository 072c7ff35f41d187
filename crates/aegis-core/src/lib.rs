//! Aegis core layer.
//!
//! Domain types shared by every crate in the workspace, the pure refund
//! policy engine, and the policy lifecycle state machine.

pub mod error;
pub mod refund;
pub mod state_machine;
pub mod types;

pub use error::CoreError;
pub use refund::{RefundCalculation, RefundPolicyEngine, RefundTier, TierRule};
pub use state_machine::{PolicyEvent, PolicyState, PolicyStateMachine};
pub use types::{
    Amount, BookingId, Currency, DataSource, Policy, PolicyId, TripId, TripStatus,
    TripStatusKind, TripType,
};
