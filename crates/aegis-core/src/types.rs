use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;
use crate::state_machine::PolicyState;

/// Value in atomic units (cents, token base units, etc.) represented as u128.
///
/// All refund arithmetic is exact integer math on `value`; decimal rendering
/// only ever happens at display time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Value in the smallest unit of the currency.
    pub value: u128,
    /// The currency of this amount.
    pub currency: Currency,
}

impl Amount {
    /// Create a new amount.
    pub fn new(value: u128, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Check if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Render the amount in major units with two decimal places.
    ///
    /// Rounding is half-up on the third decimal, applied only here — the
    /// stored `value` is never rounded.
    pub fn display_major(&self) -> String {
        let scale = 10u128.pow(self.currency.decimals());
        let hundredths = {
            let num = self.value * 100;
            let q = num / scale;
            let rem = num % scale;
            if rem * 2 >= scale {
                q + 1
            } else {
                q
            }
        };
        format!("{}.{:02}", hundredths / 100, hundredths % 100)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// Currencies an escrow policy can be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    BRL,
    JPY,
    /// Stablecoin escrow (6 decimal base units).
    USDC,
}

impl Currency {
    /// Currency code.
    pub fn code(&self) -> &str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::BRL => "BRL",
            Self::JPY => "JPY",
            Self::USDC => "USDC",
        }
    }

    /// Number of decimal places in one major unit.
    pub fn decimals(&self) -> u32 {
        match self {
            Self::JPY => 0,
            Self::USDC => 6,
            _ => 2,
        }
    }

    /// Parse from code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "USD" => Some(Self::USD),
            "EUR" => Some(Self::EUR),
            "GBP" => Some(Self::GBP),
            "BRL" => Some(Self::BRL),
            "JPY" => Some(Self::JPY),
            "USDC" => Some(Self::USDC),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Mode of transport covered by a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    Flight,
    Train,
    Bus,
    Ferry,
}

impl TripType {
    /// Lowercase wire label.
    pub fn label(&self) -> &str {
        match self {
            Self::Flight => "flight",
            Self::Train => "train",
            Self::Bus => "bus",
            Self::Ferry => "ferry",
        }
    }

    /// Parse from the wire label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "flight" => Some(Self::Flight),
            "train" => Some(Self::Train),
            "bus" => Some(Self::Bus),
            "ferry" => Some(Self::Ferry),
            _ => None,
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Carrier-assigned trip identifier (e.g. "AF1234", "ICE-702").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripId(pub String);

impl TripId {
    /// Create a new trip id. Must be non-empty ASCII without whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::InvalidTripId("trip id must not be empty".into()));
        }
        if id.chars().any(|c| c.is_whitespace() || !c.is_ascii()) {
            return Err(CoreError::InvalidTripId(format!(
                "trip id must be ASCII without whitespace, got: {id:?}"
            )));
        }
        Ok(Self(id))
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// BLAKE3 hash of the identifier, hex-encoded.
    ///
    /// Policies store only this hash so the ledger never learns the trip.
    pub fn hash(&self) -> String {
        hex::encode(blake3::hash(self.0.as_bytes()).as_bytes())
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a policy held in escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolicyId(pub Uuid);

impl PolicyId {
    /// Create a new random policy ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for PolicyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Booking reference used by the booking-based settlement flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

impl BookingId {
    /// Create a new booking id. Must be non-empty.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::ValidationError(
                "booking id must not be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    /// The raw reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a trip status observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Live upstream provider.
    Upstream,
    /// Deterministic synthetic fallback.
    Synthetic,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream => write!(f, "upstream"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Real-world outcome of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatusKind {
    OnTime,
    Delayed,
    Cancelled,
    Diverted,
    Unknown,
}

impl fmt::Display for TripStatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnTime => write!(f, "on_time"),
            Self::Delayed => write!(f, "delayed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Diverted => write!(f, "diverted"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A fresh observation of a trip's status.
///
/// Produced per query by the transit resolver; the core never persists it
/// (callers may cache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripStatus {
    /// The trip this status describes.
    pub trip_id: TripId,
    /// Mode of transport.
    pub trip_type: TripType,
    /// Observed outcome.
    pub status: TripStatusKind,
    /// Scheduled departure time.
    pub scheduled_departure: DateTime<Utc>,
    /// Actual departure time, if the trip departed.
    pub actual_departure: Option<DateTime<Utc>>,
    /// Delay in minutes (0 when on time or cancelled before departure).
    pub delay_minutes: u32,
    /// Origin of this observation.
    pub data_source: DataSource,
}

impl TripStatus {
    /// Whether the trip was cancelled outright.
    pub fn is_cancelled(&self) -> bool {
        self.status == TripStatusKind::Cancelled
    }

    /// Hex BLAKE3 hash of the trip id, for matching against a policy.
    pub fn trip_id_hash(&self) -> String {
        self.trip_id.hash()
    }
}

/// An escrowed insurance policy tied to one trip.
///
/// Owned by the escrow ledger; the core only reads it and submits proofs.
/// `status` is mutated exactly once by the ledger, terminal states are
/// immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Unique identifier.
    pub id: PolicyId,
    /// Account that purchased the policy and receives the refund.
    pub owner: String,
    /// Mode of transport covered.
    pub trip_type: TripType,
    /// BLAKE3 hash of the covered trip id (hex).
    pub trip_id_hash: String,
    /// Date of travel.
    pub travel_date: NaiveDate,
    /// Minimum delay (minutes) before the policy pays out.
    pub threshold_minutes: u32,
    /// Escrowed amount at stake.
    pub payout_amount: Amount,
    /// Deadline after which the policy can be expired.
    pub deadline: DateTime<Utc>,
    /// Lifecycle state.
    pub status: PolicyState,
    /// When the policy was purchased.
    pub created_at: DateTime<Utc>,
}

impl Policy {
    /// Whether the policy can still be claimed against.
    pub fn is_active(&self) -> bool {
        self.status == PolicyState::Active
    }
}
