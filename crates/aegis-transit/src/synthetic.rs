use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rand::Rng;

use aegis_core::types::{DataSource, TripId, TripStatus, TripStatusKind, TripType};

use crate::error::StatusError;
use crate::traits::StatusProvider;

/// Deterministic synthetic status source.
///
/// Derives a status from `blake3(salt ‖ trip_id ‖ date)`, so the same
/// `(trip_id, date)` pair always yields the same observation within one
/// process lifetime. The salt is drawn at construction, which keeps demos
/// reproducible during a run without pinning outcomes across restarts.
pub struct SyntheticStatusProvider {
    salt: u64,
}

impl SyntheticStatusProvider {
    /// Create a provider with a fresh per-process salt.
    pub fn new() -> Self {
        Self {
            salt: rand::thread_rng().gen(),
        }
    }

    /// Create a provider with a fixed salt, for fully pinned test outcomes.
    pub fn with_salt(salt: u64) -> Self {
        Self { salt }
    }

    fn digest(&self, trip_id: &TripId, date: NaiveDate) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.salt.to_le_bytes());
        hasher.update(trip_id.as_str().as_bytes());
        hasher.update(date.to_string().as_bytes());
        *hasher.finalize().as_bytes()
    }

    fn synthesize(
        &self,
        trip_id: &TripId,
        trip_type: TripType,
        date: NaiveDate,
    ) -> TripStatus {
        let digest = self.digest(trip_id, date);

        // Departure hour between 05:00 and 22:59.
        let hour = 5 + (digest[1] % 18) as u32;
        let minute = (digest[2] % 60) as u32;
        let scheduled_departure = Utc
            .from_utc_datetime(&date.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap()));

        let (status, delay_minutes) = match digest[0] % 100 {
            // Most trips run on time.
            0..=54 => (TripStatusKind::OnTime, 0),
            // Delays span minor slips through multi-day disruptions.
            55..=84 => {
                let delay = 15 + u16::from_le_bytes([digest[3], digest[4]]) % 2400;
                (TripStatusKind::Delayed, delay as u32)
            }
            85..=91 => (TripStatusKind::Cancelled, 0),
            92..=96 => {
                let delay = 30 + (digest[3] % 180) as u32;
                (TripStatusKind::Diverted, delay)
            }
            _ => (TripStatusKind::Unknown, 0),
        };

        let actual_departure = match status {
            TripStatusKind::Cancelled | TripStatusKind::Unknown => None,
            _ => Some(scheduled_departure + Duration::minutes(delay_minutes as i64)),
        };

        TripStatus {
            trip_id: trip_id.clone(),
            trip_type,
            status,
            scheduled_departure,
            actual_departure,
            delay_minutes,
            data_source: DataSource::Synthetic,
        }
    }
}

impl Default for SyntheticStatusProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusProvider for SyntheticStatusProvider {
    async fn fetch_status(
        &self,
        trip_id: &TripId,
        trip_type: TripType,
        reference_date: NaiveDate,
    ) -> Result<TripStatus, StatusError> {
        Ok(self.synthesize(trip_id, trip_type, reference_date))
    }

    fn provider_id(&self) -> &str {
        "sp-synthetic"
    }
}
