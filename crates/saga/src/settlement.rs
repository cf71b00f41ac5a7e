//! Injectable settlement decision.
//!
//! The simulated settlement is a single uniform draw. Production wiring
//! uses [`RandomSettlement`]; tests pin the branch with [`FixedSettlement`].

use rand::Rng;

/// Outcome of a settlement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    Approved,
    Declined,
}

/// Decides whether a settlement attempt succeeds.
pub trait SettlementStrategy: Send + Sync {
    /// Produces the outcome for one settlement attempt.
    fn decide(&self) -> SettlementOutcome;
}

/// Approves with a fixed probability per attempt.
#[derive(Debug, Clone)]
pub struct RandomSettlement {
    success_rate: f64,
}

impl RandomSettlement {
    /// Creates a strategy approving with the given probability, clamped to
    /// `[0, 1]`.
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

impl Default for RandomSettlement {
    fn default() -> Self {
        Self::new(0.9)
    }
}

impl SettlementStrategy for RandomSettlement {
    fn decide(&self) -> SettlementOutcome {
        if rand::thread_rng().gen_bool(self.success_rate) {
            SettlementOutcome::Approved
        } else {
            SettlementOutcome::Declined
        }
    }
}

/// Always produces the same outcome.
#[derive(Debug, Clone, Copy)]
pub struct FixedSettlement(SettlementOutcome);

impl FixedSettlement {
    /// A strategy that approves every attempt.
    pub fn always_approve() -> Self {
        Self(SettlementOutcome::Approved)
    }

    /// A strategy that declines every attempt.
    pub fn always_decline() -> Self {
        Self(SettlementOutcome::Declined)
    }
}

impl SettlementStrategy for FixedSettlement {
    fn decide(&self) -> SettlementOutcome {
        self.0
    }
}
