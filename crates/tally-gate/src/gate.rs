use std::time::{Duration, Instant};

use tracing::debug;

use crate::check::{CheckDecision, CheckResult, PendingTransaction, ValidityCheck};
use crate::checks::{AmountLimitCheck, SimulatedLatencyCheck};
use crate::config::GateConfig;
use crate::error::GateError;

// ---------------------------------------------------------------------------
// Verdict / GateVerdict
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected { reason: String },
}

/// The outcome of running a pending transaction through the full pipeline.
#[derive(Clone, Debug)]
pub struct GateVerdict {
    pub verdict: Verdict,
    /// Per-check results in evaluation order.
    pub check_results: Vec<CheckResult>,
    /// Total wall-clock time for the pipeline evaluation.
    pub elapsed: Duration,
}

impl GateVerdict {
    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accepted
    }

    /// Rejection reason, if rejected.
    pub fn reason(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Accepted => None,
            Verdict::Rejected { reason } => Some(reason),
        }
    }
}

// ---------------------------------------------------------------------------
// CommitGate
// ---------------------------------------------------------------------------

/// The commit gate: a pipeline of checks that every transaction passes
/// through before the ledger mutates any balance.
pub struct CommitGate {
    checks: Vec<Box<dyn ValidityCheck>>,
    config: GateConfig,
}

impl CommitGate {
    /// Create a gate with an empty pipeline.
    pub fn new(config: GateConfig) -> Self {
        Self {
            checks: Vec::new(),
            config,
        }
    }

    /// Create a gate with the default pipeline:
    /// amount limit (when configured) -> simulated latency.
    pub fn with_default_checks(config: GateConfig) -> Self {
        let mut gate = Self::new(config);
        if let Some(max_amount) = gate.config.max_amount {
            gate.add_check(Box::new(AmountLimitCheck::new(max_amount)));
        }
        gate.add_check(Box::new(SimulatedLatencyCheck::new(gate.config.latency())));
        gate
    }

    /// Append a check to the end of the pipeline.
    pub fn add_check(&mut self, check: Box<dyn ValidityCheck>) {
        self.checks.push(check);
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    /// Evaluate a pending transaction through the full pipeline.
    ///
    /// The pipeline is **fail-fast**: the first failing check stops
    /// evaluation and produces a `Rejected` verdict.
    pub fn evaluate(&self, pending: &PendingTransaction) -> Result<GateVerdict, GateError> {
        let pipeline_start = Instant::now();

        if self.config.permissive {
            return Ok(GateVerdict {
                verdict: Verdict::Accepted,
                check_results: Vec::new(),
                elapsed: pipeline_start.elapsed(),
            });
        }

        let mut check_results = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            let check_start = Instant::now();
            let decision = check.evaluate(pending)?;

            let reason = match &decision {
                CheckDecision::Pass => None,
                CheckDecision::Fail { reason } => Some(reason.clone()),
            };
            check_results.push(CheckResult {
                check_name: check.name().to_string(),
                passed: decision.is_pass(),
                reason,
                elapsed: check_start.elapsed(),
            });

            if let CheckDecision::Fail { reason } = decision {
                debug!(check = check.name(), %reason, kind = %pending.kind, "gate rejected");
                return Ok(GateVerdict {
                    verdict: Verdict::Rejected { reason },
                    check_results,
                    elapsed: pipeline_start.elapsed(),
                });
            }
        }

        Ok(GateVerdict {
            verdict: Verdict::Accepted,
            check_results,
            elapsed: pipeline_start.elapsed(),
        })
    }
}
