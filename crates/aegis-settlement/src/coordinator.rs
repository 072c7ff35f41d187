use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use aegis_core::refund::RefundPolicyEngine;
use aegis_core::types::{Amount, BookingId, TripId, TripStatus, TripType};
use aegis_verify::types::VerificationResult;

use crate::error::SettlementError;
use crate::traits::PayoutRail;
use crate::types::{Settlement, SettlementId};

/// Orchestrates settlement records with at-most-once execution.
///
/// Records live behind a per-settlement async mutex so the payout
/// submission and the executed-flag transition form one critical section,
/// even though the rail call suspends. Concurrent executions of the same
/// settlement serialize on that lock; the loser observes `executed == true`
/// and fails with `AlreadyExecuted` without submitting a second payout.
pub struct SettlementCoordinator {
    settlements: DashMap<Uuid, Arc<Mutex<Settlement>>>,
    by_booking: DashMap<BookingId, SettlementId>,
    rail: Arc<dyn PayoutRail>,
}

impl SettlementCoordinator {
    /// Create a coordinator submitting payouts through the given rail.
    pub fn new(rail: Arc<dyn PayoutRail>) -> Self {
        Self {
            settlements: DashMap::new(),
            by_booking: DashMap::new(),
            rail,
        }
    }

    /// Create a settlement for a booking.
    ///
    /// Precondition: `verification.verified == true`. A failed verification
    /// is rejected with `VerificationRequired` and nothing is persisted; a
    /// brand-new verification attempt is required, never an override.
    pub fn create_settlement(
        &self,
        booking_id: BookingId,
        trip_id: TripId,
        trip_type: TripType,
        total_amount: Amount,
        trip_status: TripStatus,
        verification: VerificationResult,
    ) -> Result<Settlement, SettlementError> {
        if !verification.verified {
            tracing::warn!(
                booking_id = %booking_id,
                integrity = %verification.data_integrity,
                "settlement rejected: verification did not pass"
            );
            return Err(SettlementError::VerificationRequired);
        }

        let calculation = RefundPolicyEngine::calculate(
            &total_amount,
            trip_status.delay_minutes,
            trip_status.is_cancelled(),
        );

        let id = SettlementId::new();
        let settlement = Settlement {
            id,
            booking_id: booking_id.clone(),
            trip_id,
            trip_type,
            trip_status,
            verification,
            calculation,
            executed: false,
            transaction_hash: None,
            created_at: Utc::now(),
            executed_at: None,
        };

        // Claim the booking slot first so two concurrent creates for the
        // same booking cannot both insert a record.
        match self.by_booking.entry(booking_id.clone()) {
            Entry::Occupied(_) => {
                return Err(SettlementError::BookingAlreadySettling(
                    booking_id.0.clone(),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        self.settlements
            .insert(id.0, Arc::new(Mutex::new(settlement.clone())));

        tracing::info!(
            settlement_id = %id,
            booking_id = %booking_id,
            refund_percent = settlement.calculation.refund_percent,
            "settlement created"
        );
        Ok(settlement)
    }

    /// Execute a settlement's payout exactly once.
    ///
    /// A rail failure leaves the record unexecuted and safe to retry; the
    /// record is never marked executed without a confirmed transaction.
    pub async fn execute_settlement(
        &self,
        settlement_id: SettlementId,
    ) -> Result<Settlement, SettlementError> {
        let record = self
            .settlements
            .get(&settlement_id.0)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(SettlementError::NotFound(settlement_id.0))?;

        let mut settlement = record.lock().await;

        if settlement.executed {
            return Err(SettlementError::AlreadyExecuted(settlement_id.0));
        }

        let tx_hash = self
            .rail
            .submit_payout(&settlement.booking_id, &settlement.calculation.user_refund)
            .await?;

        settlement.executed = true;
        settlement.transaction_hash = Some(tx_hash);
        settlement.executed_at = Some(Utc::now());

        tracing::info!(
            settlement_id = %settlement_id,
            tx = settlement.transaction_hash.as_deref().unwrap_or(""),
            "settlement executed"
        );
        Ok(settlement.clone())
    }

    /// Fetch a settlement snapshot by id.
    pub async fn get_settlement(
        &self,
        settlement_id: SettlementId,
    ) -> Result<Settlement, SettlementError> {
        let record = self
            .settlements
            .get(&settlement_id.0)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(SettlementError::NotFound(settlement_id.0))?;
        let settlement = record.lock().await;
        Ok(settlement.clone())
    }

    /// Fetch a settlement snapshot by booking reference.
    pub async fn get_settlement_by_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Settlement, SettlementError> {
        let id = self
            .by_booking
            .get(booking_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| SettlementError::BookingNotFound(booking_id.0.clone()))?;
        self.get_settlement(id).await
    }

    /// Number of settlements held.
    pub fn settlement_count(&self) -> usize {
        self.settlements.len()
    }
}
