//! Tiered refund policy engine.
//!
//! Pure calculator: no I/O, no side effects. This is the audit source of
//! truth for every payout amount in the system.

use serde::{Deserialize, Serialize};

use crate::types::Amount;

/// Delay at which the 50% tier starts (24 hours).
const SEVERE_DELAY_MINUTES: u32 = 1440;
/// Delay at which the 20% tier starts (3 hours).
const MAJOR_DELAY_MINUTES: u32 = 180;

/// A discrete refund-percentage band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundTier {
    /// Trip cancelled — full refund regardless of delay.
    Cancellation,
    /// Delay of 24 hours or more.
    SevereDelay,
    /// Delay of 3 hours or more.
    MajorDelay,
    /// Below the compensation threshold.
    NoRefund,
}

impl std::fmt::Display for RefundTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancellation => write!(f, "cancellation"),
            Self::SevereDelay => write!(f, "severe_delay"),
            Self::MajorDelay => write!(f, "major_delay"),
            Self::NoRefund => write!(f, "no_refund"),
        }
    }
}

/// One row of the published tier table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierRule {
    /// The tier this rule selects.
    pub tier: RefundTier,
    /// Human-readable condition.
    pub condition: String,
    /// Refund percentage applied when the rule matches.
    pub refund_percent: u8,
}

/// The outcome of a refund calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundCalculation {
    /// Percentage of the escrowed amount refunded to the policyholder.
    pub refund_percent: u8,
    /// Amount returned to the policyholder.
    pub user_refund: Amount,
    /// Remainder released to the provider.
    pub provider_payment: Amount,
    /// Which tier matched.
    pub tier: RefundTier,
    /// Why that tier matched.
    pub reason: String,
}

/// Pure tiered percentage calculator.
///
/// The tier table is ordered and the first match wins; cancellation overrides
/// any delay. Refunds are computed with truncating integer division on atomic
/// units, so indivisible currencies never accumulate rounding drift.
pub struct RefundPolicyEngine;

impl RefundPolicyEngine {
    /// Calculate the refund split for an escrowed amount.
    pub fn calculate(total: &Amount, delay_minutes: u32, cancelled: bool) -> RefundCalculation {
        let (tier, refund_percent, reason) = if cancelled {
            (
                RefundTier::Cancellation,
                100,
                "trip cancelled".to_string(),
            )
        } else if delay_minutes >= SEVERE_DELAY_MINUTES {
            (
                RefundTier::SevereDelay,
                50,
                format!("delayed {delay_minutes} minutes (>= {SEVERE_DELAY_MINUTES})"),
            )
        } else if delay_minutes >= MAJOR_DELAY_MINUTES {
            (
                RefundTier::MajorDelay,
                20,
                format!("delayed {delay_minutes} minutes (>= {MAJOR_DELAY_MINUTES})"),
            )
        } else {
            (
                RefundTier::NoRefund,
                0,
                format!("delayed {delay_minutes} minutes (< {MAJOR_DELAY_MINUTES})"),
            )
        };

        // Truncating division: the provider keeps the remainder unit.
        let refund_value = total.value * refund_percent as u128 / 100;
        let user_refund = Amount::new(refund_value, total.currency);
        let provider_payment = Amount::new(total.value - refund_value, total.currency);

        RefundCalculation {
            refund_percent,
            user_refund,
            provider_payment,
            tier,
            reason,
        }
    }

    /// The full tier table, in evaluation order, for transparency/audit.
    pub fn policy_breakdown() -> Vec<TierRule> {
        vec![
            TierRule {
                tier: RefundTier::Cancellation,
                condition: "trip cancelled".into(),
                refund_percent: 100,
            },
            TierRule {
                tier: RefundTier::SevereDelay,
                condition: format!("delay >= {SEVERE_DELAY_MINUTES} minutes"),
                refund_percent: 50,
            },
            TierRule {
                tier: RefundTier::MajorDelay,
                condition: format!("delay >= {MAJOR_DELAY_MINUTES} minutes"),
                refund_percent: 20,
            },
            TierRule {
                tier: RefundTier::NoRefund,
                condition: format!("delay < {MAJOR_DELAY_MINUTES} minutes"),
                refund_percent: 0,
            },
        ]
    }
}
