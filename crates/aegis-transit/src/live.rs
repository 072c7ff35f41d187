use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::time::Duration;

use aegis_core::types::{DataSource, TripId, TripStatus, TripStatusKind, TripType};

use crate::error::StatusError;
use crate::traits::StatusProvider;

/// Upper bound on any upstream status request.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Wire shape returned by the upstream status API.
#[derive(Debug, Deserialize)]
struct UpstreamPayload {
    status: String,
    scheduled_departure: DateTime<Utc>,
    #[serde(default)]
    actual_departure: Option<DateTime<Utc>>,
    #[serde(default)]
    delay_minutes: u32,
}

/// Live status provider backed by an upstream HTTP API.
///
/// Requests carry a hard 10s timeout. Timeouts, non-2xx responses, and empty
/// payloads surface as [`StatusError`] so the resolver can fall back — they
/// are never shown to pipeline callers.
pub struct LiveStatusProvider {
    client: reqwest::Client,
    base_url: String,
}

impl LiveStatusProvider {
    /// Create a provider against the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn parse_kind(raw: &str) -> TripStatusKind {
        match raw {
            "on_time" => TripStatusKind::OnTime,
            "delayed" => TripStatusKind::Delayed,
            "cancelled" => TripStatusKind::Cancelled,
            "diverted" => TripStatusKind::Diverted,
            _ => TripStatusKind::Unknown,
        }
    }
}

#[async_trait]
impl StatusProvider for LiveStatusProvider {
    async fn fetch_status(
        &self,
        trip_id: &TripId,
        trip_type: TripType,
        reference_date: NaiveDate,
    ) -> Result<TripStatus, StatusError> {
        let url = format!(
            "{}/v1/status/{}/{}?date={}",
            self.base_url, trip_type, trip_id, reference_date
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                StatusError::Timeout
            } else {
                StatusError::Request(e)
            }
        })?;

        let code = response.status();
        if !code.is_success() {
            return Err(StatusError::HttpStatus(code.as_u16()));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(StatusError::EmptyPayload);
        }

        let payload: UpstreamPayload = serde_json::from_str(&body)
            .map_err(|e| StatusError::Malformed(e.to_string()))?;

        Ok(TripStatus {
            trip_id: trip_id.clone(),
            trip_type,
            status: Self::parse_kind(&payload.status),
            scheduled_departure: payload.scheduled_departure,
            actual_departure: payload.actual_departure,
            delay_minutes: payload.delay_minutes,
            data_source: DataSource::Upstream,
        })
    }

    fn provider_id(&self) -> &str {
        "sp-live"
    }
}
