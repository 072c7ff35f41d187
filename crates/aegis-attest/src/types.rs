use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The status facts an attestation binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Hex BLAKE3 hash of the trip id.
    pub trip_id_hash: String,
    /// Date of travel.
    pub travel_date: NaiveDate,
    /// Whether the trip was cancelled.
    pub cancelled: bool,
    /// Observed delay in minutes.
    pub delay_minutes: u32,
}

/// A generated identifier plus opaque proof binding a status snapshot.
///
/// The proof is a fixed-length hash chain with no cryptographic weight in
/// the mock consensus — callers must treat it as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attestation {
    /// Globally unique identifier (hex BLAKE3).
    pub attestation_id: String,
    /// Ordered hash chain accompanying the id.
    pub merkle_proof: Vec<String>,
    /// The facts this attestation binds.
    pub snapshot: StatusSnapshot,
    /// When the snapshot was observed.
    pub observed_at: DateTime<Utc>,
}
