//! Flat row shapes of the log files and their conversion to domain types.
//!
//! CSV rows cannot nest, so the optional counterparty of a transfer leg is
//! spread across two nullable columns here. Amounts and timestamps are kept
//! as text and parsed explicitly so that a bad value names itself in the error.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tally_types::{
    temporal, AccountId, Counterparty, Decimal, ReferenceNumber, RegistryEntry, TransactionId,
    TransactionRecord, TransactionStatus, TransactionType, TypeError,
};

/// One row of the system log or of a per-account log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LogRow {
    pub transaction_id: TransactionId,
    pub started_at: String,
    pub account_id: Option<AccountId>,
    pub display_name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: String,
    pub currency: String,
    pub resulting_balance: String,
    pub counterparty_account_id: Option<AccountId>,
    pub counterparty_display_name: Option<String>,
    pub reference_number: Option<ReferenceNumber>,
    pub completed_at: String,
    pub status: String,
    pub remarks: Option<String>,
}

impl From<&TransactionRecord> for LogRow {
    fn from(record: &TransactionRecord) -> Self {
        let (counterparty_account_id, counterparty_display_name) = match &record.counterparty {
            Some(c) => (Some(c.account_id), Some(c.display_name.clone())),
            None => (None, None),
        };
        Self {
            transaction_id: record.transaction_id,
            started_at: temporal::format(&record.started_at),
            account_id: record.account_id,
            display_name: record.display_name.clone(),
            kind: record.kind,
            amount: record.amount.to_string(),
            currency: record.currency.clone(),
            resulting_balance: record.resulting_balance.to_string(),
            counterparty_account_id,
            counterparty_display_name,
            reference_number: record.reference_number,
            completed_at: temporal::format(&record.completed_at),
            status: record.status.as_str().to_string(),
            remarks: record.remarks.clone(),
        }
    }
}

impl TryFrom<LogRow> for TransactionRecord {
    type Error = TypeError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let counterparty = row.counterparty_account_id.map(|account_id| Counterparty {
            account_id,
            display_name: row.counterparty_display_name.unwrap_or_default(),
        });
        Ok(Self {
            transaction_id: row.transaction_id,
            started_at: temporal::parse(&row.started_at)?,
            account_id: row.account_id,
            display_name: row.display_name,
            kind: row.kind,
            amount: parse_decimal(&row.amount)?,
            currency: row.currency,
            resulting_balance: parse_decimal(&row.resulting_balance)?,
            counterparty,
            reference_number: row.reference_number,
            completed_at: temporal::parse(&row.completed_at)?,
            status: TransactionStatus::from_str(&row.status)?,
            remarks: row.remarks.filter(|r| !r.is_empty()),
        })
    }
}

/// One row of the account registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct RegistryRow {
    pub account_id: AccountId,
    pub display_name: String,
    pub created_at: String,
}

impl From<&RegistryEntry> for RegistryRow {
    fn from(entry: &RegistryEntry) -> Self {
        Self {
            account_id: entry.account_id,
            display_name: entry.display_name.clone(),
            created_at: temporal::format(&entry.created_at),
        }
    }
}

/// Parse a logged amount. Plain decimals and scientific notation are accepted.
pub(crate) fn parse_decimal(text: &str) -> Result<Decimal, TypeError> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| TypeError::InvalidAmount(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_leg() -> TransactionRecord {
        let now = temporal::parse("2024-05-01T09:30:00.123456Z").unwrap();
        TransactionRecord {
            transaction_id: TransactionId::new(7),
            started_at: now,
            account_id: Some(AccountId::new(1)),
            display_name: "Ben".into(),
            kind: TransactionType::TransferTo,
            amount: Decimal::new(30000, 2),
            currency: "HKD".into(),
            resulting_balance: Decimal::new(70000, 2),
            counterparty: Some(Counterparty {
                account_id: AccountId::new(2),
                display_name: "Ricky".into(),
            }),
            reference_number: Some(ReferenceNumber::new(5)),
            completed_at: now,
            status: TransactionStatus::Completed,
            remarks: None,
        }
    }

    #[test]
    fn counterparty_spreads_over_two_columns() {
        let row = LogRow::from(&transfer_leg());
        assert_eq!(row.counterparty_account_id, Some(AccountId::new(2)));
        assert_eq!(row.counterparty_display_name.as_deref(), Some("Ricky"));
        assert_eq!(row.status, "completed");
        assert_eq!(row.amount, "300.00");
    }

    #[test]
    fn row_converts_back_to_the_same_record() {
        let record = transfer_leg();
        let back = TransactionRecord::try_from(LogRow::from(&record)).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn legacy_values_are_accepted() {
        let mut row = LogRow::from(&transfer_leg());
        row.status = "Completed".into();
        row.amount = "300.0".into();
        row.resulting_balance = "7e2".into();
        let record = TransactionRecord::try_from(row).unwrap();
        assert_eq!(record.status, TransactionStatus::Completed);
        assert_eq!(record.resulting_balance, Decimal::new(700, 0));
    }

    #[test]
    fn bad_amount_is_named_in_error() {
        let mut row = LogRow::from(&transfer_leg());
        row.amount = "three hundred".into();
        let err = TransactionRecord::try_from(row).unwrap_err();
        assert!(err.to_string().contains("three hundred"));
    }
}
