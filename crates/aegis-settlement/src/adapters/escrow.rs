use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use aegis_attest::types::Attestation;
use aegis_core::refund::RefundPolicyEngine;
use aegis_core::state_machine::{PolicyEvent, PolicyState, PolicyStateMachine};
use aegis_core::types::{Amount, BookingId, Policy, PolicyId, TripStatus, TripType};

use crate::error::{LedgerError, SettlementError};
use crate::traits::{PayoutRail, PolicyLedger};
use crate::types::ProofOutcome;

/// Account holding the operator's payout float for booking settlements.
const OPERATOR_FLOAT: &str = "operator-float";
/// Account receiving the provider's share of released escrow.
const PROVIDER: &str = "provider";

/// In-memory escrow ledger.
///
/// Implements the [`PolicyLedger`] policy state machine with double-entry
/// balance bookkeeping, and doubles as the [`PayoutRail`] for booking-based
/// settlements so demos and tests run against a single ledger. A real
/// escrow contract or custodial rail slots in behind the same traits.
///
/// Thread-safe: uses `DashMap` for concurrent access; proof submission
/// holds the policy entry for its whole critical section (no suspension
/// points inside).
pub struct EscrowLedger {
    policies: DashMap<Uuid, Policy>,
    /// Registered attestation ids and when they were first seen.
    attestations: DashMap<String, DateTime<Utc>>,
    /// Signed balances per account.
    balances: DashMap<String, i128>,
}

impl EscrowLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            policies: DashMap::new(),
            attestations: DashMap::new(),
            balances: DashMap::new(),
        }
    }

    /// Seed a freshly purchased policy and fund its escrow account.
    ///
    /// Purchase itself (premium pricing, payment collection) is outside the
    /// core; this mirrors its end state. Amounts beyond the signed balance
    /// range are rejected before anything is stored.
    #[allow(clippy::too_many_arguments)]
    pub fn seed_policy(
        &self,
        owner: impl Into<String>,
        trip_type: TripType,
        trip_id_hash: impl Into<String>,
        travel_date: NaiveDate,
        threshold_minutes: u32,
        payout_amount: Amount,
        deadline: DateTime<Utc>,
    ) -> Result<Policy, LedgerError> {
        let escrowed = i128::try_from(payout_amount.value)
            .map_err(|_| LedgerError::AmountOverflow(payout_amount.value))?;

        let policy = Policy {
            id: PolicyId::new(),
            owner: owner.into(),
            trip_type,
            trip_id_hash: trip_id_hash.into(),
            travel_date,
            threshold_minutes,
            payout_amount,
            deadline,
            status: PolicyState::Active,
            created_at: Utc::now(),
        };

        self.credit(&Self::escrow_account(policy.id), escrowed);
        self.policies.insert(policy.id.0, policy.clone());
        tracing::info!(policy_id = %policy.id, "policy seeded into escrow");
        Ok(policy)
    }

    /// Current signed balance of an account.
    pub fn balance_of(&self, account: &str) -> i128 {
        self.balances.get(account).map(|b| *b).unwrap_or(0)
    }

    /// Whether an attestation id has been registered.
    pub fn attestation_registered(&self, attestation_id: &str) -> bool {
        self.attestations.contains_key(attestation_id)
    }

    /// Number of registered attestations.
    pub fn attestation_count(&self) -> usize {
        self.attestations.len()
    }

    fn escrow_account(policy_id: PolicyId) -> String {
        format!("escrow:{policy_id}")
    }

    fn credit(&self, account: &str, value: i128) {
        self.balances
            .entry(account.to_string())
            .and_modify(|b| *b += value)
            .or_insert(value);
    }

    fn debit(&self, account: &str, value: i128) {
        self.credit(account, -value);
    }

    /// Release escrowed funds: refund share to the owner, remainder to the
    /// provider. Fails without touching any balance if the escrow account
    /// cannot cover the total.
    fn release_escrow(
        &self,
        policy: &Policy,
        user_refund: &Amount,
        provider_payment: &Amount,
    ) -> Result<(), LedgerError> {
        let escrow_account = Self::escrow_account(policy.id);
        let total_value = user_refund.value + provider_payment.value;
        let total =
            i128::try_from(total_value).map_err(|_| LedgerError::AmountOverflow(total_value))?;
        let available = self.balance_of(&escrow_account);
        if available < total {
            return Err(LedgerError::InsufficientEscrow {
                available: available.max(0) as u128,
                required: total as u128,
            });
        }

        self.debit(&escrow_account, total);
        self.credit(&policy.owner, user_refund.value as i128);
        self.credit(PROVIDER, provider_payment.value as i128);
        Ok(())
    }

    fn validate_proof(proof: &Attestation) -> Result<(), LedgerError> {
        if proof.attestation_id.is_empty() {
            return Err(LedgerError::InvalidProof("empty attestation id".into()));
        }
        if proof.merkle_proof.is_empty() || proof.merkle_proof.iter().any(|h| h.is_empty()) {
            return Err(LedgerError::InvalidProof("malformed proof chain".into()));
        }
        Ok(())
    }
}

impl Default for EscrowLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyLedger for EscrowLedger {
    async fn get_policy(&self, id: PolicyId) -> Result<Policy, LedgerError> {
        self.policies
            .get(&id.0)
            .map(|p| p.clone())
            .ok_or(LedgerError::PolicyNotFound(id))
    }

    async fn register_attestation(&self, attestation_id: &str) -> Result<(), LedgerError> {
        // Idempotent: re-registration keeps the first-seen timestamp.
        self.attestations
            .entry(attestation_id.to_string())
            .or_insert_with(Utc::now);
        Ok(())
    }

    async fn submit_trip_proof(
        &self,
        policy_id: PolicyId,
        trip_status: &TripStatus,
        proof: &Attestation,
    ) -> Result<ProofOutcome, LedgerError> {
        // Hold the policy entry for the whole proof evaluation so the
        // status change and the transfer are atomic per policy.
        let mut entry = self
            .policies
            .get_mut(&policy_id.0)
            .ok_or(LedgerError::PolicyNotFound(policy_id))?;
        let policy = entry.value_mut();

        if policy.status != PolicyState::Active {
            return Err(LedgerError::PolicyNotActive {
                id: policy_id,
                status: policy.status,
            });
        }

        if !self.attestation_registered(&proof.attestation_id) {
            return Err(LedgerError::InvalidProof(
                "attestation not registered".into(),
            ));
        }
        Self::validate_proof(proof)?;

        let status_hash = trip_status.trip_id_hash();
        if status_hash != policy.trip_id_hash || proof.snapshot.trip_id_hash != policy.trip_id_hash
        {
            return Err(LedgerError::TripIdMismatch(policy_id));
        }

        let calculation = RefundPolicyEngine::calculate(
            &policy.payout_amount,
            trip_status.delay_minutes,
            trip_status.is_cancelled(),
        );

        // Transfer before the state flip: a failed transfer must leave the
        // policy Active.
        self.release_escrow(
            policy,
            &calculation.user_refund,
            &calculation.provider_payment,
        )?;

        let event = if calculation.refund_percent > 0 {
            PolicyEvent::ProofAccepted
        } else {
            PolicyEvent::ProofRejected
        };
        policy.status = PolicyStateMachine::transition(policy.status, event)
            .map_err(|e| LedgerError::TransferFailed(e.to_string()))?;

        let transaction_ref = format!("escrow-{}", Uuid::now_v7());
        tracing::info!(
            policy_id = %policy_id,
            new_status = %policy.status,
            refund_percent = calculation.refund_percent,
            tx = %transaction_ref,
            "trip proof settled"
        );

        Ok(ProofOutcome {
            policy_id,
            new_status: policy.status,
            calculation,
            transaction_ref,
        })
    }

    async fn expire_policy(&self, id: PolicyId) -> Result<Policy, LedgerError> {
        let mut entry = self
            .policies
            .get_mut(&id.0)
            .ok_or(LedgerError::PolicyNotFound(id))?;
        let policy = entry.value_mut();

        if policy.status != PolicyState::Active {
            return Err(LedgerError::PolicyNotActive {
                id,
                status: policy.status,
            });
        }
        if Utc::now() <= policy.deadline {
            return Err(LedgerError::DeadlineNotPassed(id));
        }

        // Unclaimed escrow returns to the provider.
        let escrow_account = Self::escrow_account(id);
        let remaining = self.balance_of(&escrow_account);
        self.debit(&escrow_account, remaining);
        self.credit(PROVIDER, remaining);

        policy.status = PolicyStateMachine::transition(policy.status, PolicyEvent::DeadlinePassed)
            .map_err(|e| LedgerError::TransferFailed(e.to_string()))?;

        tracing::info!(policy_id = %id, "policy expired, escrow returned");
        Ok(policy.clone())
    }
}

#[async_trait]
impl PayoutRail for EscrowLedger {
    async fn submit_payout(
        &self,
        booking_id: &BookingId,
        amount: &Amount,
    ) -> Result<String, SettlementError> {
        let recipient = format!("booking:{booking_id}");
        let value = i128::try_from(amount.value).map_err(|_| {
            SettlementError::PayoutFailed(format!("amount {} exceeds rail capacity", amount.value))
        })?;
        self.debit(OPERATOR_FLOAT, value);
        self.credit(&recipient, value);

        let mut hasher = blake3::Hasher::new();
        hasher.update(booking_id.as_str().as_bytes());
        hasher.update(&Utc::now().timestamp_nanos_opt().unwrap_or(0).to_le_bytes());
        let tx_hash = hex::encode(hasher.finalize().as_bytes());

        tracing::info!(booking_id = %booking_id, tx = %tx_hash, "payout submitted");
        Ok(tx_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_attest::{AttestationConfig, AttestationService};
    use aegis_core::types::{Currency, DataSource, TripId, TripStatusKind};
    use chrono::Duration;

    fn usd(value: u128) -> Amount {
        Amount::new(value, Currency::USD)
    }

    fn trip() -> TripId {
        TripId::new("AF1234").unwrap()
    }

    fn travel_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn status_for(trip_id: &TripId, delay_minutes: u32, cancelled: bool) -> TripStatus {
        TripStatus {
            trip_id: trip_id.clone(),
            trip_type: TripType::Flight,
            status: if cancelled {
                TripStatusKind::Cancelled
            } else if delay_minutes > 0 {
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

    fn seed(ledger: &EscrowLedger, amount: u128) -> Policy {
        ledger
            .seed_policy(
                "alice",
                TripType::Flight,
                trip().hash(),
                travel_date(),
                180,
                usd(amount),
                Utc::now() + Duration::days(30),
            )
            .unwrap()
    }

    async fn attested(
        ledger: &EscrowLedger,
        status: &TripStatus,
    ) -> aegis_attest::types::Attestation {
        let service = AttestationService::with_config(AttestationConfig::instant());
        let attestation = service
            .create_attestation(
                &status.trip_id_hash(),
                travel_date(),
                status.is_cancelled(),
                status.delay_minutes,
            )
            .await;
        ledger
            .register_attestation(&attestation.attestation_id)
            .await
            .unwrap();
        attestation
    }

    #[tokio::test]
    async fn test_claim_moves_funds_and_status() {
        let ledger = EscrowLedger::new();
        let policy = seed(&ledger, 200);
        let status = status_for(&trip(), 300, false);
        let proof = attested(&ledger, &status).await;

        let outcome = ledger
            .submit_trip_proof(policy.id, &status, &proof)
            .await
            .unwrap();

        assert_eq!(outcome.new_status, PolicyState::Claimed);
        assert_eq!(outcome.calculation.refund_percent, 20);
        assert_eq!(ledger.balance_of("alice"), 40);
        assert_eq!(ledger.balance_of(PROVIDER), 160);
        assert_eq!(
            ledger.balance_of(&EscrowLedger::escrow_account(policy.id)),
            0
        );
    }

    #[tokio::test]
    async fn test_zero_refund_rejects_policy() {
        let ledger = EscrowLedger::new();
        let policy = seed(&ledger, 100);
        let status = status_for(&trip(), 45, false);
        let proof = attested(&ledger, &status).await;

        let outcome = ledger
            .submit_trip_proof(policy.id, &status, &proof)
            .await
            .unwrap();

        assert_eq!(outcome.new_status, PolicyState::Rejected);
        assert_eq!(ledger.balance_of("alice"), 0);
        assert_eq!(ledger.balance_of(PROVIDER), 100);
    }

    #[tokio::test]
    async fn test_cancellation_pays_everything() {
        let ledger = EscrowLedger::new();
        let policy = seed(&ledger, 250);
        let status = status_for(&trip(), 0, true);
        let proof = attested(&ledger, &status).await;

        let outcome = ledger
            .submit_trip_proof(policy.id, &status, &proof)
            .await
            .unwrap();

        assert_eq!(outcome.calculation.refund_percent, 100);
        assert_eq!(ledger.balance_of("alice"), 250);
        assert_eq!(ledger.balance_of(PROVIDER), 0);
    }

    #[tokio::test]
    async fn test_trip_id_mismatch_leaves_policy_active() {
        let ledger = EscrowLedger::new();
        let policy = seed(&ledger, 200);
        let other_trip = TripId::new("LH9999").unwrap();
        let status = status_for(&other_trip, 300, false);
        let proof = attested(&ledger, &status).await;

        let result = ledger.submit_trip_proof(policy.id, &status, &proof).await;
        assert!(matches!(result, Err(LedgerError::TripIdMismatch(_))));

        let stored = ledger.get_policy(policy.id).await.unwrap();
        assert_eq!(stored.status, PolicyState::Active);
        assert_eq!(ledger.balance_of("alice"), 0);
    }

    #[tokio::test]
    async fn test_unregistered_attestation_rejected() {
        let ledger = EscrowLedger::new();
        let policy = seed(&ledger, 200);
        let status = status_for(&trip(), 300, false);

        let service = AttestationService::with_config(AttestationConfig::instant());
        let proof = service
            .create_attestation(&status.trip_id_hash(), travel_date(), false, 300)
            .await;
        // Deliberately not registered.

        let result = ledger.submit_trip_proof(policy.id, &status, &proof).await;
        assert!(matches!(result, Err(LedgerError::InvalidProof(_))));
        let stored = ledger.get_policy(policy.id).await.unwrap();
        assert_eq!(stored.status, PolicyState::Active);
    }

    #[tokio::test]
    async fn test_second_proof_rejected() {
        let ledger = EscrowLedger::new();
        let policy = seed(&ledger, 200);
        let status = status_for(&trip(), 300, false);
        let proof = attested(&ledger, &status).await;

        ledger
            .submit_trip_proof(policy.id, &status, &proof)
            .await
            .unwrap();
        let second = ledger.submit_trip_proof(policy.id, &status, &proof).await;
        assert!(matches!(second, Err(LedgerError::PolicyNotActive { .. })));
        // Funds moved exactly once.
        assert_eq!(ledger.balance_of("alice"), 40);
    }

    #[tokio::test]
    async fn test_register_attestation_is_idempotent() {
        let ledger = EscrowLedger::new();
        ledger.register_attestation("att-1").await.unwrap();
        ledger.register_attestation("att-1").await.unwrap();
        assert_eq!(ledger.attestation_count(), 1);
        assert!(ledger.attestation_registered("att-1"));
    }

    #[tokio::test]
    async fn test_expire_before_deadline_rejected() {
        let ledger = EscrowLedger::new();
        let policy = seed(&ledger, 200);
        let result = ledger.expire_policy(policy.id).await;
        assert!(matches!(result, Err(LedgerError::DeadlineNotPassed(_))));
        let stored = ledger.get_policy(policy.id).await.unwrap();
        assert_eq!(stored.status, PolicyState::Active);
    }

    #[tokio::test]
    async fn test_expire_after_deadline_returns_escrow() {
        let ledger = EscrowLedger::new();
        let policy = ledger
            .seed_policy(
                "alice",
                TripType::Flight,
                trip().hash(),
                travel_date(),
                180,
                usd(200),
                Utc::now() - Duration::hours(1),
            )
            .unwrap();

        let expired = ledger.expire_policy(policy.id).await.unwrap();
        assert_eq!(expired.status, PolicyState::Expired);
        assert_eq!(ledger.balance_of(PROVIDER), 200);
        assert_eq!(
            ledger.balance_of(&EscrowLedger::escrow_account(policy.id)),
            0
        );
    }

    #[tokio::test]
    async fn test_get_policy_not_found() {
        let ledger = EscrowLedger::new();
        let result = ledger.get_policy(PolicyId::new()).await;
        assert!(matches!(result, Err(LedgerError::PolicyNotFound(_))));
    }

    #[test]
    fn test_seed_rejects_oversized_amount() {
        let ledger = EscrowLedger::new();
        let result = ledger.seed_policy(
            "alice",
            TripType::Flight,
            trip().hash(),
            travel_date(),
            180,
            usd(u128::MAX),
            Utc::now() + Duration::days(30),
        );
        assert!(matches!(result, Err(LedgerError::AmountOverflow(_))));
        assert_eq!(ledger.balance_of(PROVIDER), 0);
    }

    #[tokio::test]
    async fn test_payout_rail_rejects_oversized_amount() {
        let ledger = EscrowLedger::new();
        let booking = BookingId::new("BK-8").unwrap();
        let result = ledger.submit_payout(&booking, &usd(u128::MAX)).await;
        assert!(matches!(result, Err(SettlementError::PayoutFailed(_))));
        assert_eq!(ledger.balance_of("booking:BK-8"), 0);
        assert_eq!(ledger.balance_of(OPERATOR_FLOAT), 0);
    }

    #[tokio::test]
    async fn test_payout_rail_moves_float() {
        let ledger = EscrowLedger::new();
        let booking = BookingId::new("BK-7").unwrap();
        let tx = ledger.submit_payout(&booking, &usd(75)).await.unwrap();
        assert_eq!(tx.len(), 64);
        assert_eq!(ledger.balance_of("booking:BK-7"), 75);
        assert_eq!(ledger.balance_of(OPERATOR_FLOAT), -75);
    }
}
