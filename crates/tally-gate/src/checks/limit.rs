use tally_types::Decimal;

use crate::check::{CheckDecision, PendingTransaction, ValidityCheck};
use crate::error::GateError;

/// Rejects any single transaction larger than a fixed amount.
pub struct AmountLimitCheck {
    max_amount: Decimal,
}

impl AmountLimitCheck {
    pub fn new(max_amount: Decimal) -> Self {
        Self { max_amount }
    }
}

impl ValidityCheck for AmountLimitCheck {
    fn name(&self) -> &str {
        "amount-limit"
    }

    fn evaluate(&self, pending: &PendingTransaction) -> Result<CheckDecision, GateError> {
        if pending.amount > self.max_amount {
            return Ok(CheckDecision::fail(format!(
                "amount {} {} exceeds limit of {}",
                pending.currency, pending.amount, self.max_amount
            )));
        }
        Ok(CheckDecision::Pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::{AccountId, TransactionType};

    fn deposit(amount: i64) -> PendingTransaction {
        PendingTransaction::new(
            TransactionType::Deposit,
            AccountId::new(1),
            "Ben",
            Decimal::new(amount, 0),
            "HKD",
            Decimal::ZERO,
        )
    }

    #[test]
    fn limit_is_inclusive() {
        let check = AmountLimitCheck::new(Decimal::new(1000, 0));
        assert!(check.evaluate(&deposit(1000)).unwrap().is_pass());
    }

    #[test]
    fn larger_amount_fails_with_reason() {
        let check = AmountLimitCheck::new(Decimal::new(1000, 0));
        match check.evaluate(&deposit(1001)).unwrap() {
            CheckDecision::Fail { reason } => assert!(reason.contains("exceeds limit of 1000")),
            CheckDecision::Pass => panic!("expected failure"),
        }
    }
}
