use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aegis_core::refund::RefundCalculation;
use aegis_core::state_machine::PolicyState;
use aegis_core::types::{BookingId, PolicyId, TripId, TripStatus, TripType};
use aegis_verify::types::VerificationResult;

/// Unique identifier for a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementId(pub Uuid);

impl SettlementId {
    /// Create a new random settlement ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SettlementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SettlementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A computed, eventually executed refund outcome tied to one booking.
///
/// Exists only downstream of a `verified == true` verification result;
/// `executed` transitions false→true exactly once and never reverts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    /// Settlement identifier.
    pub id: SettlementId,
    /// Booking this settlement resolves.
    pub booking_id: BookingId,
    /// The covered trip.
    pub trip_id: TripId,
    /// Mode of transport.
    pub trip_type: TripType,
    /// The status observation the settlement was computed from.
    pub trip_status: TripStatus,
    /// The verification that gated this settlement.
    pub verification: VerificationResult,
    /// The refund split.
    pub calculation: RefundCalculation,
    /// Whether the payout has been submitted and confirmed.
    pub executed: bool,
    /// Transaction reference on the payout rail, set on execution.
    pub transaction_hash: Option<String>,
    /// When the settlement was created.
    pub created_at: DateTime<Utc>,
    /// When the settlement was executed.
    pub executed_at: Option<DateTime<Utc>>,
}

/// The ledger's answer to an accepted trip proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofOutcome {
    /// The policy the proof settled.
    pub policy_id: PolicyId,
    /// Terminal policy status (Claimed or Rejected).
    pub new_status: PolicyState,
    /// The refund split applied to the escrowed amount.
    pub calculation: RefundCalculation,
    /// Transfer reference for the escrow release.
    pub transaction_ref: String,
}
