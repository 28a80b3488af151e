use std::fmt;

use serde::Serialize;
use tally_types::Decimal;

use crate::account::Account;
use crate::error::{LedgerError, LedgerResult};

/// Render an amount with two decimals and comma-grouped thousands.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = rounded.abs().to_string();
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped}.{frac:0<2}")
}

/// Sum of the current balances, failing instead of overflowing.
pub(crate) fn total_of<'a>(accounts: impl IntoIterator<Item = &'a Account>) -> LedgerResult<Decimal> {
    accounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, account| {
            total.checked_add(account.current_balance())
        })
        .ok_or(LedgerError::TotalOverflow)
}

/// Snapshot of every account plus the ledger-wide aggregates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LedgerSummary {
    /// Accounts in ascending id order.
    pub accounts: Vec<Account>,
    pub total_accounts: usize,
    pub total_balance: Decimal,
    pub average_balance: Decimal,
    /// Label used when printing the aggregates.
    pub currency: String,
}

impl LedgerSummary {
    pub(crate) fn from_accounts(
        mut accounts: Vec<Account>,
        currency: impl Into<String>,
    ) -> LedgerResult<Self> {
        accounts.sort_by_key(Account::id);
        let total_accounts = accounts.len();
        let total_balance = total_of(&accounts)?;
        let average_balance = if total_accounts == 0 {
            Decimal::ZERO
        } else {
            total_balance / Decimal::from(total_accounts)
        };
        Ok(Self {
            accounts,
            total_accounts,
            total_balance,
            average_balance,
            currency: currency.into(),
        })
    }
}

impl fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for account in &self.accounts {
            writeln!(f, "{account}")?;
        }
        writeln!(f)?;
        writeln!(f, "Total No. of Accounts: {}", self.total_accounts)?;
        writeln!(
            f,
            "Total Balance: {} ${}",
            self.currency,
            format_amount(self.total_balance)
        )?;
        write!(
            f,
            "Average Account Balance: {} ${}",
            self.currency,
            format_amount(self.average_balance)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_types::AccountId;

    #[test]
    fn format_amount_pads_and_groups() {
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
        assert_eq!(format_amount(Decimal::new(5, 1)), "0.50");
        assert_eq!(format_amount(Decimal::new(999, 0)), "999.00");
        assert_eq!(format_amount(Decimal::new(1000, 0)), "1,000.00");
        assert_eq!(format_amount(Decimal::new(-12345678, 1)), "-1,234,567.80");
        assert_eq!(format_amount(Decimal::new(1_005, 3)), "1.00");
    }

    #[test]
    fn summary_of_no_accounts_has_zero_average() {
        let summary = LedgerSummary::from_accounts(Vec::new(), "HKD").unwrap();
        assert_eq!(summary.total_accounts, 0);
        assert_eq!(summary.average_balance, Decimal::ZERO);
    }

    #[test]
    fn summary_sorts_and_aggregates() {
        let summary = LedgerSummary::from_accounts(
            vec![
                Account::new(AccountId::new(2), "Ricky", Decimal::new(500, 0), "HKD"),
                Account::new(AccountId::new(1), "Ben", Decimal::new(1000, 0), "HKD"),
            ],
            "HKD",
        )
        .unwrap();
        assert_eq!(summary.accounts[0].display_name(), "Ben");
        assert_eq!(summary.total_balance, Decimal::new(1500, 0));
        assert_eq!(summary.average_balance, Decimal::new(750, 0));

        let text = summary.to_string();
        assert!(text.starts_with("Account no. 1 - Ben: HKD $1,000.00\n"));
        assert!(text.contains("Total No. of Accounts: 2"));
        assert!(text.ends_with("Average Account Balance: HKD $750.00"));
    }

    #[test]
    fn summary_reports_overflowing_total() {
        let err = LedgerSummary::from_accounts(
            vec![
                Account::new(AccountId::new(1), "Ben", Decimal::MAX, "HKD"),
                Account::new(AccountId::new(2), "Ricky", Decimal::MAX, "HKD"),
            ],
            "HKD",
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::TotalOverflow));
    }
}
