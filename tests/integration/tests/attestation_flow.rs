//! Integration test: Attestation lifecycle feeding the escrow ledger.
//!
//! Confirms that attestations are unique under concurrency, carry a
//! verifiable proof chain, and are accepted by the ledger only after
//! registration.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use aegis_attest::{AttestError, AttestationConfig, AttestationService};
use aegis_core::types::{
    Amount, Currency, DataSource, TripId, TripStatus, TripStatusKind, TripType,
};
use aegis_settlement::{EscrowLedger, LedgerError, PolicyLedger};

fn travel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn cancelled_status(trip_id: &TripId) -> TripStatus {
    TripStatus {
        trip_id: trip_id.clone(),
        trip_type: TripType::Train,
        status: TripStatusKind::Cancelled,
        scheduled_departure: Utc::now(),
        actual_departure: None,
        delay_minutes: 0,
        data_source: DataSource::Synthetic,
    }
}

// =========================================================================
// Uniqueness and proof structure
// =========================================================================

#[tokio::test]
async fn test_identical_inputs_yield_distinct_attestations() {
    let service = AttestationService::with_config(AttestationConfig::instant());
    let hash = TripId::new("TGV-8412").unwrap().hash();

    let first = service
        .create_attestation(&hash, travel_date(), false, 90)
        .await;
    let second = service
        .create_attestation(&hash, travel_date(), false, 90)
        .await;

    assert_ne!(first.attestation_id, second.attestation_id);
    assert_eq!(service.attestation_count(), 2);
}

#[tokio::test]
async fn test_concurrent_attestations_are_unique() {
    let service = Arc::new(AttestationService::with_config(AttestationConfig::instant()));
    let hash = TripId::new("TGV-8412").unwrap().hash();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        let hash = hash.clone();
        handles.push(tokio::spawn(async move {
            service
                .create_attestation(&hash, travel_date(), false, 90)
                .await
                .attestation_id
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
}

#[tokio::test]
async fn test_attestation_proof_verifies() {
    let service = AttestationService::with_config(AttestationConfig::instant());
    let hash = TripId::new("TGV-8412").unwrap().hash();

    let attestation = service
        .create_attestation(&hash, travel_date(), true, 0)
        .await;
    assert!(!attestation.merkle_proof.is_empty());
    assert!(attestation.snapshot.cancelled);

    assert!(service
        .verify_attestation(&attestation.attestation_id)
        .unwrap());
}

#[tokio::test]
async fn test_unknown_attestation_is_not_found() {
    let service = AttestationService::with_config(AttestationConfig::instant());
    let result = service.verify_attestation("no-such-attestation");
    assert!(matches!(result, Err(AttestError::NotFound(_))));
}

// =========================================================================
// Registration gates proof acceptance on the ledger
// =========================================================================

#[tokio::test]
async fn test_ledger_accepts_proof_only_after_registration() {
    let ledger = EscrowLedger::new();
    let attestor = AttestationService::with_config(AttestationConfig::instant());
    let trip = TripId::new("TGV-8412").unwrap();
    let status = cancelled_status(&trip);

    let policy = ledger
        .seed_policy(
            "bob",
            TripType::Train,
            trip.hash(),
            travel_date(),
            180,
            Amount::new(300, Currency::EUR),
            Utc::now() + Duration::days(14),
        )
        .unwrap();

    let attestation = attestor
        .create_attestation(&trip.hash(), travel_date(), true, 0)
        .await;

    // Unregistered: rejected without touching the policy.
    let early = ledger
        .submit_trip_proof(policy.id, &status, &attestation)
        .await;
    assert!(matches!(early, Err(LedgerError::InvalidProof(_))));

    ledger
        .register_attestation(&attestation.attestation_id)
        .await
        .unwrap();

    // Registered: the cancellation refunds the full payout amount.
    let outcome = ledger
        .submit_trip_proof(policy.id, &status, &attestation)
        .await
        .unwrap();
    assert_eq!(outcome.calculation.refund_percent, 100);
    assert_eq!(ledger.balance_of("bob"), 300);
}
