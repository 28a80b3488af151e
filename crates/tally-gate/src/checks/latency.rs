use std::thread;
use std::time::Duration;

use crate::check::{CheckDecision, PendingTransaction, ValidityCheck};
use crate::error::GateError;

/// Placeholder for real validation: sleeps for a fixed, non-interruptible
/// delay and always passes.
pub struct SimulatedLatencyCheck {
    latency: Duration,
}

impl SimulatedLatencyCheck {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl ValidityCheck for SimulatedLatencyCheck {
    fn name(&self) -> &str {
        "simulated-latency"
    }

    fn evaluate(&self, _pending: &PendingTransaction) -> Result<CheckDecision, GateError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        Ok(CheckDecision::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tally_types::{AccountId, Decimal, TransactionType};

    fn pending() -> PendingTransaction {
        PendingTransaction::new(
            TransactionType::Withdraw,
            AccountId::new(2),
            "Ricky",
            Decimal::new(200, 0),
            "HKD",
            Decimal::new(500, 0),
        )
    }

    #[test]
    fn always_passes() {
        let check = SimulatedLatencyCheck::new(Duration::ZERO);
        assert!(check.evaluate(&pending()).unwrap().is_pass());
    }

    #[test]
    fn waits_at_least_the_configured_latency() {
        let check = SimulatedLatencyCheck::new(Duration::from_millis(20));
        let start = Instant::now();
        check.evaluate(&pending()).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
