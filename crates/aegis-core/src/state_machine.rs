use std::fmt;

use crate::error::CoreError;

/// The lifecycle states of an escrowed policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PolicyState {
    /// Policy is escrowed and claimable.
    Active,
    /// A trip proof was accepted and the refund paid. Final state.
    Claimed,
    /// A trip proof was evaluated and no refund was owed. Final state.
    Rejected,
    /// The deadline passed without a claim; escrow returned. Final state.
    Expired,
}

impl PolicyState {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Claimed | Self::Rejected | Self::Expired)
    }
}

impl fmt::Display for PolicyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Claimed => write!(f, "Claimed"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

/// Events that trigger policy state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyEvent {
    /// A trip proof was accepted with a non-zero refund.
    ProofAccepted,
    /// A trip proof was evaluated and the refund was zero.
    ProofRejected,
    /// The claim deadline passed.
    DeadlinePassed,
}

/// Manages policy state transitions.
///
/// Valid transitions:
/// - Active → Claimed (ProofAccepted)
/// - Active → Rejected (ProofRejected)
/// - Active → Expired (DeadlinePassed)
///
/// Every other transition is invalid — terminal states are immutable, and a
/// policy's status changes exactly once.
pub struct PolicyStateMachine;

impl PolicyStateMachine {
    /// Attempt a state transition based on an event.
    /// Returns the new state on success, or an error for invalid transitions.
    pub fn transition(current: PolicyState, event: PolicyEvent) -> Result<PolicyState, CoreError> {
        let new_state = match (current, event) {
            (PolicyState::Active, PolicyEvent::ProofAccepted) => PolicyState::Claimed,
            (PolicyState::Active, PolicyEvent::ProofRejected) => PolicyState::Rejected,
            (PolicyState::Active, PolicyEvent::DeadlinePassed) => PolicyState::Expired,
            _ => {
                let target = match event {
                    PolicyEvent::ProofAccepted => PolicyState::Claimed,
                    PolicyEvent::ProofRejected => PolicyState::Rejected,
                    PolicyEvent::DeadlinePassed => PolicyState::Expired,
                };
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "policy state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: PolicyState, event: PolicyEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
