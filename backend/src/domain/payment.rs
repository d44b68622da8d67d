//! Simulated payment authorisation.

use rand::Rng;

/// Outcome of a payment authorisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentDecision {
    /// Funds captured.
    Approved,
    /// Card declined.
    Declined,
}

/// Authorises a checkout payment.
#[cfg_attr(test, mockall::automock)]
pub trait PaymentGate: Send + Sync {
    /// Decide whether the payment goes through.
    fn authorize(&self) -> PaymentDecision;
}

/// Declines a configurable fraction of payments at random.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedPaymentGate {
    decline_rate: f64,
}

impl SimulatedPaymentGate {
    /// Decline rate used when none is configured.
    pub const DEFAULT_DECLINE_RATE: f64 = 0.03;

    /// Build a gate; the rate is clamped into `[0, 1]` and NaN means zero.
    #[must_use]
    pub fn new(decline_rate: f64) -> Self {
        let decline_rate = if decline_rate.is_nan() {
            0.0
        } else {
            decline_rate.clamp(0.0, 1.0)
        };
        Self { decline_rate }
    }

    /// Configured decline probability.
    #[must_use]
    pub const fn decline_rate(&self) -> f64 {
        self.decline_rate
    }
}

impl Default for SimulatedPaymentGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DECLINE_RATE)
    }
}

impl PaymentGate for SimulatedPaymentGate {
    fn authorize(&self) -> PaymentDecision {
        if rand::thread_rng().gen_bool(self.decline_rate) {
            PaymentDecision::Declined
        } else {
            PaymentDecision::Approved
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, PaymentDecision::Approved)]
    #[case(1.0, PaymentDecision::Declined)]
    #[case(-4.0, PaymentDecision::Approved)]
    #[case(7.5, PaymentDecision::Declined)]
    #[case(f64::NAN, PaymentDecision::Approved)]
    fn extreme_rates_are_deterministic(#[case] rate: f64, #[case] expected: PaymentDecision) {
        let gate = SimulatedPaymentGate::new(rate);
        for _ in 0..50 {
            assert_eq!(gate.authorize(), expected);
        }
    }
}
