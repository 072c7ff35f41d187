use async_trait::async_trait;

use aegis_attest::types::Attestation;
use aegis_core::types::{Amount, BookingId, Policy, PolicyId, TripStatus};

use crate::error::{LedgerError, SettlementError};
use crate::types::ProofOutcome;

/// Narrow interface to the external escrow ledger.
///
/// The ledger owns the policy state machine and the escrowed funds; the
/// core only reads policies and submits proofs. Implementations bridge to a
/// concrete escrow (smart contract, custodial account, in-memory test
/// ledger).
#[async_trait]
pub trait PolicyLedger: Send + Sync {
    /// Fetch a policy by id.
    async fn get_policy(&self, id: PolicyId) -> Result<Policy, LedgerError>;

    /// Register an attestation id ahead of proof submission.
    ///
    /// Idempotent: registering an already-registered id is a benign no-op,
    /// never an error.
    async fn register_attestation(&self, attestation_id: &str) -> Result<(), LedgerError>;

    /// Submit a trip proof against an active policy.
    ///
    /// Requires the policy to be Active, the attestation to be registered,
    /// and the status's trip-id hash to match the policy's. On success the
    /// ledger atomically moves the policy to Claimed (refund > 0) or
    /// Rejected (refund == 0) AND transfers the corresponding funds; a
    /// failed transfer leaves the status untouched.
    async fn submit_trip_proof(
        &self,
        policy_id: PolicyId,
        trip_status: &TripStatus,
        proof: &Attestation,
    ) -> Result<ProofOutcome, LedgerError>;

    /// Expire an active policy whose deadline has passed.
    async fn expire_policy(&self, id: PolicyId) -> Result<Policy, LedgerError>;
}

/// Payment rail the coordinator submits settlement payouts through.
#[async_trait]
pub trait PayoutRail: Send + Sync {
    /// Submit one payout instruction. Returns the rail's transaction
    /// reference on confirmation.
    async fn submit_payout(
        &self,
        booking_id: &BookingId,
        amount: &Amount,
    ) -> Result<String, SettlementError>;
}
