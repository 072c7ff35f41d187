use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::AttestError;
use crate::types::{Attestation, StatusSnapshot};

/// Number of links in the proof chain.
const PROOF_CHAIN_LENGTH: usize = 4;

/// Latency simulation bounds for attestation creation.
#[derive(Debug, Clone, Copy)]
pub struct AttestationConfig {
    /// Minimum simulated consensus latency.
    pub min_latency: Duration,
    /// Maximum simulated consensus latency.
    pub max_latency: Duration,
}

impl AttestationConfig {
    /// No simulated latency — for tests.
    pub fn instant() -> Self {
        Self {
            min_latency: Duration::ZERO,
            max_latency: Duration::ZERO,
        }
    }
}

impl Default for AttestationConfig {
    fn default() -> Self {
        // An external consensus round takes on the order of seconds.
        Self {
            min_latency: Duration::from_millis(1000),
            max_latency: Duration::from_millis(2000),
        }
    }
}

/// Produces unique, structurally-verifiable attestations.
///
/// Identifiers fold an atomically incremented counter and the wall clock
/// into the hash input, so two structurally identical requests — even
/// concurrent ones — never collide.
///
/// Thread-safe: uses `DashMap` for retention and an atomic counter.
pub struct AttestationService {
    attestations: DashMap<String, Attestation>,
    counter: AtomicU64,
    config: AttestationConfig,
}

impl AttestationService {
    /// Create a service with default (realistic) latency simulation.
    pub fn new() -> Self {
        Self::with_config(AttestationConfig::default())
    }

    /// Create a service with explicit latency bounds.
    pub fn with_config(config: AttestationConfig) -> Self {
        Self {
            attestations: DashMap::new(),
            counter: AtomicU64::new(0),
            config,
        }
    }

    /// Create an attestation for a status snapshot.
    ///
    /// Suspends for a simulated consensus round (does not block other
    /// in-flight claims); then derives the id from the snapshot fields, the
    /// counter, and the wall clock, and chains the proof from it.
    pub async fn create_attestation(
        &self,
        trip_id_hash: &str,
        travel_date: NaiveDate,
        cancelled: bool,
        delay_minutes: u32,
    ) -> Attestation {
        let latency = self.draw_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let sequence = self.counter.fetch_add(1, Ordering::SeqCst);
        let observed_at = Utc::now();

        let mut hasher = blake3::Hasher::new();
        hasher.update(trip_id_hash.as_bytes());
        hasher.update(travel_date.to_string().as_bytes());
        hasher.update(&[cancelled as u8]);
        hasher.update(&delay_minutes.to_le_bytes());
        hasher.update(&sequence.to_le_bytes());
        hasher.update(&observed_at.timestamp_nanos_opt().unwrap_or(0).to_le_bytes());
        let attestation_id = hex::encode(hasher.finalize().as_bytes());

        let merkle_proof = Self::chain_proof(&attestation_id, trip_id_hash);

        let attestation = Attestation {
            attestation_id: attestation_id.clone(),
            merkle_proof,
            snapshot: StatusSnapshot {
                trip_id_hash: trip_id_hash.to_string(),
                travel_date,
                cancelled,
                delay_minutes,
            },
            observed_at,
        };

        self.attestations
            .insert(attestation_id.clone(), attestation.clone());
        tracing::info!(attestation_id = %attestation_id, sequence, "attestation created");
        attestation
    }

    /// Structural validation ONLY.
    ///
    /// Checks that the attestation exists, has a non-empty id, and carries a
    /// proof chain of the expected length. This is NOT a cryptographic
    /// check: the mock consensus offers no integrity guarantee, and callers
    /// must not treat a passing result as proof of data authenticity.
    pub fn verify_attestation(&self, attestation_id: &str) -> Result<bool, AttestError> {
        let entry = self
            .attestations
            .get(attestation_id)
            .ok_or_else(|| AttestError::NotFound(attestation_id.to_string()))?;

        if entry.attestation_id.is_empty() {
            return Err(AttestError::Malformed("empty attestation id".into()));
        }
        if entry.merkle_proof.len() != PROOF_CHAIN_LENGTH {
            return Err(AttestError::Malformed(format!(
                "proof chain has {} links, expected {}",
                entry.merkle_proof.len(),
                PROOF_CHAIN_LENGTH
            )));
        }
        if entry.merkle_proof.iter().any(|h| h.is_empty()) {
            return Err(AttestError::Malformed("empty proof link".into()));
        }

        Ok(true)
    }

    /// Fetch a previously created attestation.
    pub fn get_attestation(&self, attestation_id: &str) -> Option<Attestation> {
        self.attestations.get(attestation_id).map(|a| a.clone())
    }

    /// Number of attestations created so far.
    pub fn attestation_count(&self) -> usize {
        self.attestations.len()
    }

    /// Fixed-length hash chain seeded from the id and the trip-id hash.
    fn chain_proof(attestation_id: &str, trip_id_hash: &str) -> Vec<String> {
        let mut links = Vec::with_capacity(PROOF_CHAIN_LENGTH);
        let mut hasher = blake3::Hasher::new();
        hasher.update(attestation_id.as_bytes());
        hasher.update(trip_id_hash.as_bytes());
        let mut link = *hasher.finalize().as_bytes();
        links.push(hex::encode(link));

        for i in 1..PROOF_CHAIN_LENGTH {
            let mut hasher = blake3::Hasher::new();
            hasher.update(&link);
            hasher.update(&(i as u64).to_le_bytes());
            link = *hasher.finalize().as_bytes();
            links.push(hex::encode(link));
        }

        links
    }

    fn draw_latency(&self) -> Duration {
        if self.config.max_latency <= self.config.min_latency {
            return self.config.min_latency;
        }
        let min = self.config.min_latency.as_millis() as u64;
        let max = self.config.max_latency.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl Default for AttestationService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn service() -> AttestationService {
        AttestationService::with_config(AttestationConfig::instant())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[tokio::test]
    async fn test_identical_requests_yield_unique_ids() {
        let service = service();
        let a = service.create_attestation("hash", date(), false, 300).await;
        let b = service.create_attestation("hash", date(), false, 300).await;
        assert_ne!(a.attestation_id, b.attestation_id);
    }

    #[tokio::test]
    async fn test_concurrent_creation_never_collides() {
        let service = Arc::new(service());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.create_attestation("hash", date(), true, 0).await
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for handle in handles {
            let attestation = handle.await.unwrap();
            assert!(ids.insert(attestation.attestation_id));
        }
        assert_eq!(ids.len(), 32);
        assert_eq!(service.attestation_count(), 32);
    }

    #[tokio::test]
    async fn test_proof_chain_shape() {
        let service = service();
        let attestation = service.create_attestation("hash", date(), false, 45).await;
        assert_eq!(attestation.merkle_proof.len(), PROOF_CHAIN_LENGTH);
        for link in &attestation.merkle_proof {
            assert_eq!(link.len(), 64);
        }
        // Chained, not repeated.
        assert_ne!(attestation.merkle_proof[0], attestation.merkle_proof[1]);
    }

    #[tokio::test]
    async fn test_structural_verification_passes() {
        let service = service();
        let attestation = service.create_attestation("hash", date(), false, 200).await;
        assert!(service.verify_attestation(&attestation.attestation_id).unwrap());
    }

    #[tokio::test]
    async fn test_verification_of_unknown_id_fails() {
        let service = service();
        let result = service.verify_attestation("deadbeef");
        assert!(matches!(result, Err(AttestError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let service = service();
        let attestation = service.create_attestation("abc123", date(), true, 0).await;
        let fetched = service.get_attestation(&attestation.attestation_id).unwrap();
        assert_eq!(fetched.snapshot.trip_id_hash, "abc123");
        assert!(fetched.snapshot.cancelled);
        assert_eq!(fetched.snapshot.delay_minutes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_simulation_suspends() {
        let service = AttestationService::new();
        let start = tokio::time::Instant::now();
        service.create_attestation("hash", date(), false, 0).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(1000));
        assert!(elapsed <= Duration::from_millis(2100));
    }
}
