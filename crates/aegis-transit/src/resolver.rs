use chrono::NaiveDate;
use std::sync::Arc;

use aegis_core::types::{TripId, TripStatus, TripType};

use crate::synthetic::SyntheticStatusProvider;
use crate::traits::StatusProvider;

/// Resolves trip status with a guaranteed answer.
///
/// Tries the live provider first (when configured) and falls back to the
/// synthetic provider on any failure. Upstream failures are logged, never
/// propagated: `get_status` always returns a [`TripStatus`].
pub struct StatusResolver {
    live: Option<Arc<dyn StatusProvider>>,
    synthetic: SyntheticStatusProvider,
}

impl StatusResolver {
    /// Create a resolver with a live provider and synthetic fallback.
    pub fn new(live: Arc<dyn StatusProvider>) -> Self {
        Self {
            live: Some(live),
            synthetic: SyntheticStatusProvider::new(),
        }
    }

    /// Create a resolver that only uses the synthetic provider.
    pub fn synthetic_only() -> Self {
        Self {
            live: None,
            synthetic: SyntheticStatusProvider::new(),
        }
    }

    /// Create a synthetic-only resolver with a pinned salt (tests/demos).
    pub fn synthetic_with_salt(salt: u64) -> Self {
        Self {
            live: None,
            synthetic: SyntheticStatusProvider::with_salt(salt),
        }
    }

    /// Obtain the status of a trip. Infallible toward the caller.
    pub async fn get_status(
        &self,
        trip_id: &TripId,
        trip_type: TripType,
        reference_date: NaiveDate,
    ) -> TripStatus {
        if let Some(ref live) = self.live {
            match live.fetch_status(trip_id, trip_type, reference_date).await {
                Ok(status) => {
                    tracing::debug!(
                        trip_id = %trip_id,
                        provider = live.provider_id(),
                        status = %status.status,
                        "resolved trip status from live provider"
                    );
                    return status;
                }
                Err(e) => {
                    tracing::warn!(
                        trip_id = %trip_id,
                        provider = live.provider_id(),
                        error = %e,
                        "live status provider failed, falling back to synthetic"
                    );
                }
            }
        }

        // Infallible by construction.
        self.synthetic
            .fetch_status(trip_id, trip_type, reference_date)
            .await
            .unwrap_or_else(|_| unreachable!("synthetic provider cannot fail"))
    }
}
