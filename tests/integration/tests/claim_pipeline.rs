//! Integration test: Full claim pipeline across crates.
//!
//! Drives status resolution, attestation, verification, and escrow
//! settlement together through the claim service, inspecting the shared
//! ledger to confirm funds only ever move when every stage passed.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use aegis_attest::{AttestationConfig, AttestationService};
use aegis_core::types::{Amount, Currency, TripId, TripType};
use aegis_node::service::{ClaimDecision, ClaimService};
use aegis_node::ClaimError;
use aegis_settlement::EscrowLedger;
use aegis_transit::StatusResolver;
use aegis_verify::FailureSimulator;
use aegis_verify::VerificationGate;

fn travel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

/// Helper: build a service around a shared ledger so tests can inspect
/// balances after the pipeline runs.
fn service_with_ledger(gate: VerificationGate) -> (ClaimService, Arc<EscrowLedger>) {
    let ledger = Arc::new(EscrowLedger::new());
    let service = ClaimService::new(
        StatusResolver::synthetic_with_salt(42),
        AttestationService::with_config(AttestationConfig::instant()),
        gate,
        Arc::clone(&ledger),
    );
    (service, ledger)
}

fn seed(service: &ClaimService, payout: u128) -> aegis_core::types::Policy {
    service
        .seed_policy(
            "alice",
            TripId::new("AF1234").unwrap(),
            TripType::Flight,
            travel_date(),
            180,
            Amount::new(payout, Currency::USD),
            Utc::now() + Duration::days(30),
        )
        .unwrap()
}

// =========================================================================
// Happy path: verified claim settles the policy exactly once
// =========================================================================

#[tokio::test]
async fn test_claim_settles_and_conserves_funds() {
    let (service, ledger) = service_with_ledger(VerificationGate::mock(FailureSimulator::disabled()));
    let policy = seed(&service, 200);

    let outcome = service.initiate_claim(policy.id).await.unwrap();

    // Decision and refund percentage must agree.
    match outcome.outcome {
        ClaimDecision::Claimed => assert!(outcome.refund_percent > 0),
        ClaimDecision::Rejected => assert_eq!(outcome.refund_percent, 0),
    }

    // Escrow fully released: owner share plus provider share equals the
    // original payout amount.
    let owner = ledger.balance_of("alice");
    let provider = ledger.balance_of("provider");
    assert_eq!(owner + provider, 200);
    assert_eq!(owner as u128, outcome.refund_amount.value);

    // Policy reached a terminal state.
    let stored = service.get_policy(policy.id).await.unwrap();
    assert!(stored.status.is_final());
}

#[tokio::test]
async fn test_claim_is_single_shot() {
    let (service, _ledger) = service_with_ledger(VerificationGate::mock(FailureSimulator::disabled()));
    let policy = seed(&service, 200);

    service.initiate_claim(policy.id).await.unwrap();
    let second = service.initiate_claim(policy.id).await;
    assert!(matches!(second, Err(ClaimError::Conflict(_))));
}

#[tokio::test]
async fn test_claim_registers_attestation_before_proof() {
    let (service, ledger) = service_with_ledger(VerificationGate::mock(FailureSimulator::disabled()));
    let policy = seed(&service, 200);

    service.initiate_claim(policy.id).await.unwrap();
    // The proof was accepted, so its attestation must be on the ledger.
    assert_eq!(ledger.attestation_count(), 1);
}

// =========================================================================
// Verification gate: failed verification is a hard stop
// =========================================================================

#[tokio::test]
async fn test_tampered_data_never_reaches_ledger() {
    let (service, ledger) =
        service_with_ledger(VerificationGate::mock(FailureSimulator::always_tampered()));
    let policy = seed(&service, 200);

    let result = service.initiate_claim(policy.id).await;
    assert!(matches!(result, Err(ClaimError::VerificationFailure(_))));

    // Nothing moved and nothing was registered.
    let stored = service.get_policy(policy.id).await.unwrap();
    assert!(stored.is_active());
    assert_eq!(ledger.balance_of("alice"), 0);
    assert_eq!(ledger.balance_of("provider"), 0);
    assert_eq!(ledger.attestation_count(), 0);
}

#[tokio::test]
async fn test_unavailable_verifier_stops_claim() {
    let (service, _ledger) =
        service_with_ledger(VerificationGate::mock(FailureSimulator::always_unavailable()));
    let policy = seed(&service, 200);

    let result = service.initiate_claim(policy.id).await;
    assert!(matches!(result, Err(ClaimError::VerificationFailure(_))));

    // The failed attempt changed nothing, so the policy stays claimable.
    let stored = service.get_policy(policy.id).await.unwrap();
    assert!(stored.is_active());
}

#[tokio::test]
async fn test_real_verifier_declines_every_claim() {
    let (service, _ledger) = service_with_ledger(VerificationGate::real());
    let policy = seed(&service, 200);

    let result = service.initiate_claim(policy.id).await;
    assert!(matches!(result, Err(ClaimError::Upstream(_))));
    let stored = service.get_policy(policy.id).await.unwrap();
    assert!(stored.is_active());
}

// =========================================================================
// Synthetic determinism and expiry
// =========================================================================

#[tokio::test]
async fn test_same_trip_same_status_within_process() {
    let (service, _ledger) = service_with_ledger(VerificationGate::mock(FailureSimulator::disabled()));
    let trip = TripId::new("LH0455").unwrap();

    let (first, _) = service
        .verify_trip(trip.clone(), TripType::Flight, travel_date())
        .await
        .unwrap();
    let (second, _) = service
        .verify_trip(trip, TripType::Flight, travel_date())
        .await
        .unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(first.delay_minutes, second.delay_minutes);
}

#[tokio::test]
async fn test_expired_policy_rejects_claims() {
    let (service, ledger) = service_with_ledger(VerificationGate::mock(FailureSimulator::disabled()));
    let policy = service
        .seed_policy(
            "alice",
            TripId::new("AF1234").unwrap(),
            TripType::Flight,
            travel_date(),
            180,
            Amount::new(200, Currency::USD),
            Utc::now() - Duration::hours(1),
        )
        .unwrap();

    let expired = service.expire_policy(policy.id).await.unwrap();
    assert!(expired.status.is_final());
    // Unclaimed escrow went back to the provider.
    assert_eq!(ledger.balance_of("provider"), 200);

    let claim = service.initiate_claim(policy.id).await;
    assert!(matches!(claim, Err(ClaimError::Conflict(_))));
}
