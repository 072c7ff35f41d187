//! Integration test: Settlement lifecycle against the payout rail.
//!
//! Exercises the coordinator together with the escrow ledger and a flaky
//! rail double: verification gating at creation, at-most-once execution
//! under concurrency, and recovery after a failed payout.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use aegis_core::types::{
    Amount, BookingId, Currency, DataSource, TripId, TripStatus, TripStatusKind, TripType,
};
use aegis_settlement::{EscrowLedger, PayoutRail, SettlementCoordinator, SettlementError};
use aegis_verify::{FailureSimulator, MockVerifier};

fn delayed_status(trip_id: &TripId, delay_minutes: u32) -> TripStatus {
    TripStatus {
        trip_id: trip_id.clone(),
        trip_type: TripType::Flight,
        status: if delay_minutes > 0 {
            TripStatusKind::Delayed
        } else {
            TripStatusKind::OnTime
        },
        scheduled_departure: Utc::now(),
        actual_departure: None,
        delay_minutes,
        data_source: DataSource::Synthetic,
    }
}

fn usd(value: u128) -> Amount {
    Amount::new(value, Currency::USD)
}

/// Rail double that counts payouts and optionally fails the first attempt.
struct FlakyRail {
    payouts: AtomicU32,
    failures_left: AtomicU32,
}

impl FlakyRail {
    fn reliable() -> Self {
        Self {
            payouts: AtomicU32::new(0),
            failures_left: AtomicU32::new(0),
        }
    }

    fn failing_once() -> Self {
        Self {
            payouts: AtomicU32::new(0),
            failures_left: AtomicU32::new(1),
        }
    }
}

#[async_trait]
impl PayoutRail for FlakyRail {
    async fn submit_payout(
        &self,
        booking_id: &BookingId,
        _amount: &Amount,
    ) -> Result<String, SettlementError> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(SettlementError::PayoutFailed("rail offline".into()));
        }
        self.payouts.fetch_add(1, Ordering::SeqCst);
        Ok(format!("tx-{booking_id}"))
    }
}

// =========================================================================
// Creation is gated on verification
// =========================================================================

#[tokio::test]
async fn test_failed_verification_blocks_creation() {
    let rail = Arc::new(FlakyRail::reliable());
    let coordinator = SettlementCoordinator::new(Arc::clone(&rail) as Arc<dyn PayoutRail>);
    let trip = TripId::new("AF1234").unwrap();
    let status = delayed_status(&trip, 300);

    let verifier = MockVerifier::with_failures(FailureSimulator::always_tampered());
    let verification = verifier.verify(&status, "source-hash");
    assert!(!verification.verified);

    let result = coordinator.create_settlement(
        BookingId::new("BK-1").unwrap(),
        trip,
        TripType::Flight,
        usd(500),
        status,
        verification,
    );
    assert!(matches!(result, Err(SettlementError::VerificationRequired)));
    assert_eq!(coordinator.settlement_count(), 0);
    assert_eq!(rail.payouts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_one_settlement_per_booking() {
    let coordinator =
        SettlementCoordinator::new(Arc::new(FlakyRail::reliable()) as Arc<dyn PayoutRail>);
    let trip = TripId::new("AF1234").unwrap();
    let status = delayed_status(&trip, 300);
    let verifier = MockVerifier::with_failures(FailureSimulator::disabled());

    coordinator
        .create_settlement(
            BookingId::new("BK-1").unwrap(),
            trip.clone(),
            TripType::Flight,
            usd(500),
            status.clone(),
            verifier.verify(&status, "h1"),
        )
        .unwrap();

    let duplicate = coordinator.create_settlement(
        BookingId::new("BK-1").unwrap(),
        trip,
        TripType::Flight,
        usd(500),
        status.clone(),
        verifier.verify(&status, "h2"),
    );
    assert!(matches!(
        duplicate,
        Err(SettlementError::BookingAlreadySettling(_))
    ));
}

// =========================================================================
// At-most-once execution
// =========================================================================

#[tokio::test]
async fn test_concurrent_execution_pays_once() {
    let rail = Arc::new(FlakyRail::reliable());
    let coordinator = Arc::new(SettlementCoordinator::new(
        Arc::clone(&rail) as Arc<dyn PayoutRail>
    ));
    let trip = TripId::new("AF1234").unwrap();
    let status = delayed_status(&trip, 300);
    let verifier = MockVerifier::with_failures(FailureSimulator::disabled());

    let settlement = coordinator
        .create_settlement(
            BookingId::new("BK-1").unwrap(),
            trip,
            TripType::Flight,
            usd(500),
            status.clone(),
            verifier.verify(&status, "h"),
        )
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let coordinator = Arc::clone(&coordinator);
        let id = settlement.id;
        handles.push(tokio::spawn(
            async move { coordinator.execute_settlement(id).await },
        ));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(rail.payouts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_payout_allows_retry() {
    let rail = Arc::new(FlakyRail::failing_once());
    let coordinator = SettlementCoordinator::new(Arc::clone(&rail) as Arc<dyn PayoutRail>);
    let trip = TripId::new("AF1234").unwrap();
    let status = delayed_status(&trip, 300);
    let verifier = MockVerifier::with_failures(FailureSimulator::disabled());

    let settlement = coordinator
        .create_settlement(
            BookingId::new("BK-1").unwrap(),
            trip,
            TripType::Flight,
            usd(500),
            status.clone(),
            verifier.verify(&status, "h"),
        )
        .unwrap();

    let first = coordinator.execute_settlement(settlement.id).await;
    assert!(matches!(first, Err(SettlementError::PayoutFailed(_))));

    // The settlement survived the failure unexecuted and can be retried.
    let stored = coordinator.get_settlement(settlement.id).await.unwrap();
    assert!(!stored.executed);

    let retried = coordinator.execute_settlement(settlement.id).await.unwrap();
    assert!(retried.executed);
    assert!(retried.transaction_hash.is_some());
    assert_eq!(rail.payouts.load(Ordering::SeqCst), 1);
}

// =========================================================================
// Escrow ledger as the payout rail
// =========================================================================

#[tokio::test]
async fn test_escrow_rail_records_transfer() {
    let ledger = Arc::new(EscrowLedger::new());
    let coordinator = SettlementCoordinator::new(Arc::clone(&ledger) as Arc<dyn PayoutRail>);
    let trip = TripId::new("AF1234").unwrap();
    let status = delayed_status(&trip, 1500);
    let verifier = MockVerifier::with_failures(FailureSimulator::disabled());

    let settlement = coordinator
        .create_settlement(
            BookingId::new("BK-9").unwrap(),
            trip,
            TripType::Flight,
            usd(400),
            status.clone(),
            verifier.verify(&status, "h"),
        )
        .unwrap();
    // A day-long delay refunds half of the booking total.
    assert_eq!(settlement.calculation.refund_percent, 50);

    let executed = coordinator.execute_settlement(settlement.id).await.unwrap();
    assert!(executed.executed);
    assert_eq!(ledger.balance_of("booking:BK-9"), 200);
}
