use rand::Rng;

use crate::error::VerifyError;

/// Injectable failure strategy for the mock verifier.
///
/// Models two independent real-world failure modes with tunable rates, so
/// tests can force deterministic success or failure paths instead of
/// relying on ad-hoc probability checks.
#[derive(Debug, Clone, Copy)]
pub struct FailureSimulator {
    unavailable_rate: f64,
    tamper_rate: f64,
}

/// What the simulator decided for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    Pass,
    ProviderUnavailable,
    DataTampered,
}

impl FailureSimulator {
    /// Default production-like rates: ~2% unavailable, ~1% tampered.
    pub fn realistic() -> Self {
        Self {
            unavailable_rate: 0.02,
            tamper_rate: 0.01,
        }
    }

    /// Build with explicit rates. Each must be within `0.0..=1.0`.
    pub fn with_rates(unavailable_rate: f64, tamper_rate: f64) -> Result<Self, VerifyError> {
        for rate in [unavailable_rate, tamper_rate] {
            if !(0.0..=1.0).contains(&rate) || rate.is_nan() {
                return Err(VerifyError::InvalidRate(rate));
            }
        }
        Ok(Self {
            unavailable_rate,
            tamper_rate,
        })
    }

    /// Never fail — deterministic success path for tests.
    pub fn disabled() -> Self {
        Self {
            unavailable_rate: 0.0,
            tamper_rate: 0.0,
        }
    }

    /// Always report the provider as unavailable.
    pub fn always_unavailable() -> Self {
        Self {
            unavailable_rate: 1.0,
            tamper_rate: 0.0,
        }
    }

    /// Always report the data as tampered.
    pub fn always_tampered() -> Self {
        Self {
            unavailable_rate: 0.0,
            tamper_rate: 1.0,
        }
    }

    /// Draw an outcome for one request.
    ///
    /// Unavailability is checked first; tampering is drawn only among the
    /// remaining requests, matching two independent failure modes.
    pub fn draw(&self) -> FailureOutcome {
        let mut rng = rand::thread_rng();
        if self.unavailable_rate > 0.0 && rng.gen::<f64>() < self.unavailable_rate {
            return FailureOutcome::ProviderUnavailable;
        }
        if self.tamper_rate > 0.0 && rng.gen::<f64>() < self.tamper_rate {
            return FailureOutcome::DataTampered;
        }
        FailureOutcome::Pass
    }
}

impl Default for FailureSimulator {
    fn default() -> Self {
        Self::realistic()
    }
}
