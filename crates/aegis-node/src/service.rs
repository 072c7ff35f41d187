use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use aegis_attest::{AttestationConfig, AttestationService};
use aegis_core::types::{Amount, BookingId, Policy, PolicyId, TripId, TripStatus, TripType};
use aegis_settlement::coordinator::SettlementCoordinator;
use aegis_settlement::error::SettlementError;
use aegis_settlement::traits::{PayoutRail, PolicyLedger};
use aegis_settlement::types::Settlement;
use aegis_settlement::EscrowLedger;
use aegis_transit::{LiveStatusProvider, StatusResolver};
use aegis_verify::failure::FailureSimulator;
use aegis_verify::types::{VerificationId, VerificationResult};
use aegis_verify::verifier::VerificationGate;

use crate::bookings::{Booking, BookingRegistry};
use crate::config::{NodeConfig, VerifierMode};
use crate::error::ClaimError;

/// Final decision of a claim pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimDecision {
    Claimed,
    Rejected,
}

/// What the caller learns from a completed claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimOutcome {
    /// Whether the policy paid out.
    pub outcome: ClaimDecision,
    /// Observed delay in minutes.
    pub delay_minutes: u32,
    /// Refund percentage applied.
    pub refund_percent: u8,
    /// Amount refunded to the policyholder.
    pub refund_amount: Amount,
    /// Escrow transfer reference.
    pub transaction_ref: String,
}

/// The claim pipeline composition root.
///
/// Built exactly once at startup from [`NodeConfig`] with every dependency
/// injected — no ambient global state, no init-order coupling. Each claim
/// runs as an independent pipeline instance; the only shared state lives in
/// the injected stores, which are individually synchronized.
pub struct ClaimService {
    resolver: StatusResolver,
    attestor: AttestationService,
    gate: VerificationGate,
    coordinator: SettlementCoordinator,
    ledger: Arc<EscrowLedger>,
    bookings: BookingRegistry,
    /// Trip-id preimages for policies: the ledger only ever sees the hash.
    trips: DashMap<String, TripId>,
}

impl ClaimService {
    /// Build the service from configuration. Invalid config aborts here.
    pub fn from_config(config: &NodeConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let resolver = if config.transit.upstream_url.is_empty() {
            StatusResolver::synthetic_only()
        } else {
            StatusResolver::new(Arc::new(LiveStatusProvider::new(
                config.transit.upstream_url.clone(),
            )))
        };

        let attestor = AttestationService::with_config(AttestationConfig {
            min_latency: Duration::from_millis(config.attestation.min_latency_ms),
            max_latency: Duration::from_millis(config.attestation.max_latency_ms),
        });

        let gate = match config.verification.mode {
            VerifierMode::Mock => VerificationGate::mock(FailureSimulator::with_rates(
                config.verification.unavailable_rate,
                config.verification.tamper_rate,
            )?),
            VerifierMode::Real => VerificationGate::real(),
        };

        let ledger = Arc::new(EscrowLedger::new());
        let coordinator =
            SettlementCoordinator::new(Arc::clone(&ledger) as Arc<dyn PayoutRail>);

        Ok(Self {
            resolver,
            attestor,
            gate,
            coordinator,
            ledger,
            bookings: BookingRegistry::new(),
            trips: DashMap::new(),
        })
    }

    /// Assemble a service from explicit parts (tests, demos).
    pub fn new(
        resolver: StatusResolver,
        attestor: AttestationService,
        gate: VerificationGate,
        ledger: Arc<EscrowLedger>,
    ) -> Self {
        let rail = Arc::clone(&ledger) as Arc<dyn PayoutRail>;
        Self::with_rail(resolver, attestor, gate, ledger, rail)
    }

    /// Assemble a service with an explicit payout rail (tests, demos).
    pub fn with_rail(
        resolver: StatusResolver,
        attestor: AttestationService,
        gate: VerificationGate,
        ledger: Arc<EscrowLedger>,
        rail: Arc<dyn PayoutRail>,
    ) -> Self {
        Self {
            resolver,
            attestor,
            gate,
            coordinator: SettlementCoordinator::new(rail),
            ledger,
            bookings: BookingRegistry::new(),
            trips: DashMap::new(),
        }
    }

    /// Seed a policy into the escrow, remembering the trip-id preimage so
    /// later claims can resolve the trip's status.
    #[allow(clippy::too_many_arguments)]
    pub fn seed_policy(
        &self,
        owner: impl Into<String>,
        trip_id: TripId,
        trip_type: TripType,
        travel_date: NaiveDate,
        threshold_minutes: u32,
        payout_amount: Amount,
        deadline: DateTime<Utc>,
    ) -> Result<Policy, ClaimError> {
        let trip_id_hash = trip_id.hash();
        let policy = self.ledger.seed_policy(
            owner,
            trip_type,
            trip_id_hash.clone(),
            travel_date,
            threshold_minutes,
            payout_amount,
            deadline,
        )?;
        self.trips.insert(trip_id_hash, trip_id);
        Ok(policy)
    }

    /// Register a booking for the settle flow.
    pub fn register_booking(&self, booking: Booking) {
        self.bookings.register(booking);
    }

    /// Drive the full claim pipeline against a single active policy.
    ///
    /// Status resolution → attestation → verification → attestation
    /// registration → proof submission. The attestation is registered on
    /// the ledger strictly before the proof references it, and nothing on
    /// the ledger changes unless the final submission succeeds.
    pub async fn initiate_claim(&self, policy_id: PolicyId) -> Result<ClaimOutcome, ClaimError> {
        let policy = self.ledger.get_policy(policy_id).await?;
        let trip_id = self
            .trips
            .get(&policy.trip_id_hash)
            .map(|t| t.clone())
            .ok_or_else(|| {
                ClaimError::NotFound(format!("trip for policy {policy_id} is unknown to this node"))
            })?;

        let status = self
            .resolver
            .get_status(&trip_id, policy.trip_type, policy.travel_date)
            .await;

        let attestation = self
            .attestor
            .create_attestation(
                &policy.trip_id_hash,
                policy.travel_date,
                status.is_cancelled(),
                status.delay_minutes,
            )
            .await;

        let verification = self.gate.verify(&status, &attestation.attestation_id)?;
        if !verification.verified {
            let reason = verification
                .error_reason
                .unwrap_or_else(|| "verification did not pass".into());
            tracing::warn!(policy_id = %policy_id, %reason, "claim aborted at verification gate");
            return Err(ClaimError::VerificationFailure(reason));
        }

        // Registration must complete before the proof references the id.
        self.ledger
            .register_attestation(&attestation.attestation_id)
            .await?;
        let outcome = self
            .ledger
            .submit_trip_proof(policy_id, &status, &attestation)
            .await?;

        let decision = if outcome.calculation.refund_percent > 0 {
            ClaimDecision::Claimed
        } else {
            ClaimDecision::Rejected
        };

        tracing::info!(
            policy_id = %policy_id,
            decision = ?decision,
            refund_percent = outcome.calculation.refund_percent,
            "claim pipeline completed"
        );

        Ok(ClaimOutcome {
            outcome: decision,
            delay_minutes: status.delay_minutes,
            refund_percent: outcome.calculation.refund_percent,
            refund_amount: outcome.calculation.user_refund,
            transaction_ref: outcome.transaction_ref,
        })
    }

    /// Resolve and verify a trip without settling anything.
    pub async fn verify_trip(
        &self,
        trip_id: TripId,
        trip_type: TripType,
        date: NaiveDate,
    ) -> Result<(TripStatus, VerificationResult), ClaimError> {
        let status = self.resolver.get_status(&trip_id, trip_type, date).await;
        let source_hash = hex::encode(
            blake3::hash(
                serde_json::to_string(&status)
                    .map_err(|e| ClaimError::Validation(e.to_string()))?
                    .as_bytes(),
            )
            .as_bytes(),
        );
        let verification = self.gate.verify(&status, &source_hash)?;
        Ok((status, verification))
    }

    /// Drive create + execute for a registered booking.
    ///
    /// A settlement whose payout failed stays created; re-driving the same
    /// booking executes that record instead of creating a duplicate.
    pub async fn settle_booking(&self, booking_id: BookingId) -> Result<Settlement, ClaimError> {
        match self.coordinator.get_settlement_by_booking(&booking_id).await {
            Ok(existing) if !existing.executed => {
                tracing::info!(
                    booking_id = %booking_id,
                    settlement_id = %existing.id,
                    "retrying unexecuted settlement"
                );
                return Ok(self.coordinator.execute_settlement(existing.id).await?);
            }
            Ok(existing) => {
                return Err(SettlementError::AlreadyExecuted(existing.id.0).into());
            }
            Err(SettlementError::BookingNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let booking = self
            .bookings
            .get(&booking_id)
            .ok_or_else(|| ClaimError::NotFound(format!("booking {booking_id}")))?;

        let status = self
            .resolver
            .get_status(&booking.trip_id, booking.trip_type, booking.travel_date)
            .await;

        let attestation = self
            .attestor
            .create_attestation(
                &booking.trip_id.hash(),
                booking.travel_date,
                status.is_cancelled(),
                status.delay_minutes,
            )
            .await;

        let verification = self.gate.verify(&status, &attestation.attestation_id)?;

        let settlement = self.coordinator.create_settlement(
            booking.booking_id.clone(),
            booking.trip_id.clone(),
            booking.trip_type,
            booking.total_amount.clone(),
            status,
            verification,
        )?;

        let executed = self.coordinator.execute_settlement(settlement.id).await?;
        Ok(executed)
    }

    /// Fetch a settlement by booking reference.
    pub async fn get_settlement(&self, booking_id: &BookingId) -> Result<Settlement, ClaimError> {
        Ok(self.coordinator.get_settlement_by_booking(booking_id).await?)
    }

    /// Fetch a policy.
    pub async fn get_policy(&self, policy_id: PolicyId) -> Result<Policy, ClaimError> {
        Ok(self.ledger.get_policy(policy_id).await?)
    }

    /// Expire a policy whose deadline has passed.
    pub async fn expire_policy(&self, policy_id: PolicyId) -> Result<Policy, ClaimError> {
        Ok(self.ledger.expire_policy(policy_id).await?)
    }

    /// Fetch a cached verification result.
    pub fn get_verification(&self, id: VerificationId) -> Result<VerificationResult, ClaimError> {
        Ok(self.gate.get_verification(id)?)
    }

    /// Number of settlements held by the coordinator.
    pub fn settlement_count(&self) -> usize {
        self.coordinator.settlement_count()
    }

    /// Number of registered bookings.
    pub fn booking_count(&self) -> usize {
        self.bookings.count()
    }
}
