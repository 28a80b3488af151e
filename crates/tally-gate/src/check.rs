use std::time::Duration;

use tally_types::{temporal, AccountId, Counterparty, Decimal, Timestamp, TransactionType};

use crate::error::GateError;

// ---------------------------------------------------------------------------
// PendingTransaction
// ---------------------------------------------------------------------------

/// A transaction leg that has been validated by the ledger's own rules
/// (amount sign, funds) but not yet committed.
///
/// Carries everything a check needs to decide. Nothing has been mutated
/// or written when a check sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    pub kind: TransactionType,
    pub account_id: AccountId,
    pub display_name: String,
    pub amount: Decimal,
    pub currency: String,
    /// Balance of `account_id` before this transaction.
    pub balance_before: Decimal,
    /// The other account of a transfer.
    pub counterparty: Option<Counterparty>,
    /// When validation began; becomes the row's `started_at`.
    pub started_at: Timestamp,
}

impl PendingTransaction {
    pub fn new(
        kind: TransactionType,
        account_id: AccountId,
        display_name: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        balance_before: Decimal,
    ) -> Self {
        Self {
            kind,
            account_id,
            display_name: display_name.into(),
            amount,
            currency: currency.into(),
            balance_before,
            counterparty: None,
            started_at: temporal::now(),
        }
    }

    pub fn with_counterparty(mut self, counterparty: Counterparty) -> Self {
        self.counterparty = Some(counterparty);
        self
    }

    /// Balance of `account_id` if this transaction commits, or `None` when
    /// it would exceed the representable range.
    pub fn balance_after(&self) -> Option<Decimal> {
        self.balance_before.checked_add(self.kind.sign() * self.amount)
    }
}

// ---------------------------------------------------------------------------
// CheckDecision / CheckResult
// ---------------------------------------------------------------------------

/// The outcome of a single check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckDecision {
    Pass,
    Fail { reason: String },
}

impl CheckDecision {
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Fail {
            reason: reason.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Recorded result from a completed check.
#[derive(Clone, Debug)]
pub struct CheckResult {
    pub check_name: String,
    pub passed: bool,
    /// Populated on failure.
    pub reason: Option<String>,
    /// Wall-clock time the check took.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// ValidityCheck trait
// ---------------------------------------------------------------------------

/// A single check in the gate pipeline.
///
/// Checks run in order and synchronously; a check may block (the simulated
/// check sleeps). `Send + Sync` so a gate can live inside a shared ledger.
pub trait ValidityCheck: Send + Sync {
    /// Human-readable name (e.g. "simulated-latency").
    fn name(&self) -> &str;

    fn evaluate(&self, pending: &PendingTransaction) -> Result<CheckDecision, GateError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_after_follows_direction() {
        let deposit = PendingTransaction::new(
            TransactionType::Deposit,
            AccountId::new(1),
            "Ben",
            Decimal::new(500, 0),
            "HKD",
            Decimal::new(1000, 0),
        );
        assert_eq!(deposit.balance_after(), Some(Decimal::new(1500, 0)));

        let transfer = PendingTransaction {
            kind: TransactionType::TransferTo,
            ..deposit
        };
        assert_eq!(transfer.balance_after(), Some(Decimal::new(500, 0)));
    }

    #[test]
    fn balance_after_reports_overflow() {
        let pending = PendingTransaction::new(
            TransactionType::Deposit,
            AccountId::new(1),
            "Ben",
            Decimal::ONE,
            "HKD",
            Decimal::MAX,
        );
        assert_eq!(pending.balance_after(), None);
    }

    #[test]
    fn fail_helper_carries_reason() {
        let decision = CheckDecision::fail("limit exceeded");
        assert!(!decision.is_pass());
        assert_eq!(
            decision,
            CheckDecision::Fail {
                reason: "limit exceeded".into()
            }
        );
    }
}
