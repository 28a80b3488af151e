use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_types::Decimal;

/// Configuration for the commit gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Delay of the simulated validity check, in milliseconds.
    pub check_latency_ms: u64,
    /// Largest single amount accepted; `None` disables the limit check.
    pub max_amount: Option<Decimal>,
    /// When `true`, every check is skipped and all transactions are accepted.
    pub permissive: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            check_latency_ms: 100,
            max_amount: None,
            permissive: false,
        }
    }
}

impl GateConfig {
    /// Skip all checks.
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Default::default()
        }
    }

    /// Run the default checks without the simulated delay.
    pub fn immediate() -> Self {
        Self {
            check_latency_ms: 0,
            ..Default::default()
        }
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.check_latency_ms)
    }
}
