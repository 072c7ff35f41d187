use async_trait::async_trait;
use chrono::NaiveDate;

use aegis_core::types::{TripId, TripStatus, TripType};

use crate::error::StatusError;

/// A source of trip status observations.
///
/// Implementations bridge to a concrete data source (live API, synthetic
/// generator, recorded fixtures in tests).
#[async_trait]
pub trait StatusProvider: Send + Sync {
    /// Fetch the status of a trip on a given date.
    async fn fetch_status(
        &self,
        trip_id: &TripId,
        trip_type: TripType,
        reference_date: NaiveDate,
    ) -> Result<TripStatus, StatusError>;

    /// Return the unique identifier of this provider (e.g. "sp-synthetic").
    fn provider_id(&self) -> &str;
}
