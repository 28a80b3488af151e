use std::fmt;

use serde::Serialize;
use tally_types::{AccountId, Counterparty, Decimal};

use crate::error::{LedgerError, LedgerResult};
use crate::summary::format_amount;

/// An account as currently materialized in memory.
///
/// Only the engine changes a balance, and only after the row describing the
/// change has been appended to the logs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Account {
    id: AccountId,
    display_name: String,
    balance: Decimal,
    currency: String,
}

impl Account {
    pub(crate) fn new(
        id: AccountId,
        display_name: impl Into<String>,
        balance: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            balance,
            currency: currency.into(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn current_balance(&self) -> Decimal {
        self.balance
    }

    /// Add a signed delta to the balance and return the new balance.
    ///
    /// Fails without changing anything when the result would be negative or
    /// out of `Decimal` range.
    pub(crate) fn apply_delta(&mut self, delta: Decimal) -> LedgerResult<Decimal> {
        let next = self.balance.checked_add(delta).ok_or(LedgerError::BalanceOverflow {
            account: self.id,
            balance: self.balance,
            delta,
        })?;
        if next < Decimal::ZERO {
            return Err(LedgerError::NegativeBalance {
                account: self.id,
                balance: self.balance,
                delta,
            });
        }
        self.balance = next;
        Ok(next)
    }

    pub(crate) fn as_counterparty(&self) -> Counterparty {
        Counterparty {
            account_id: self.id,
            display_name: self.display_name.clone(),
        }
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account no. {} - {}: {} ${}",
            self.id,
            self.display_name,
            self.currency,
            format_amount(self.balance)
        )
    }
}
