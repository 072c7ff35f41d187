use crate::state_machine::PolicyState;

/// Core domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        from: PolicyState,
        to: PolicyState,
    },

    #[error("validation failed: {0}")]
    ValidationError(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid trip identifier: {0}")]
    InvalidTripId(String),
}
