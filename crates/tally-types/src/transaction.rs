use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{AccountId, ReferenceNumber, TransactionId};
use crate::temporal::Timestamp;

/// What a single log row records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Account opened with its opening balance.
    CreateAccount,
    Deposit,
    Withdraw,
    /// Debit leg of a transfer.
    TransferTo,
    /// Credit leg of a transfer.
    ReceiveFrom,
}

impl TransactionType {
    pub const ALL: [Self; 5] = [
        Self::CreateAccount,
        Self::Deposit,
        Self::Withdraw,
        Self::TransferTo,
        Self::ReceiveFrom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateAccount => "create_account",
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::TransferTo => "transfer_to",
            Self::ReceiveFrom => "receive_from",
        }
    }

    /// Returns `true` for the two legs of a transfer.
    pub fn is_transfer_leg(self) -> bool {
        matches!(self, Self::TransferTo | Self::ReceiveFrom)
    }

    /// Sign applied to `amount` when this row moves the balance.
    pub fn sign(self) -> Decimal {
        match self {
            Self::Withdraw | Self::TransferTo => Decimal::NEGATIVE_ONE,
            Self::CreateAccount | Self::Deposit | Self::ReceiveFrom => Decimal::ONE,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| TypeError::UnknownTransactionType(s.to_string()))
    }
}

/// Outcome of the commit gate for a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older logs capitalized the status.
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(TypeError::UnknownStatus(s.to_string())),
        }
    }
}

/// The account on the other side of a transfer leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub account_id: AccountId,
    pub display_name: String,
}

/// One leg of a transaction, exactly as appended to the logs.
///
/// Records are immutable once written. `resulting_balance` is the account
/// balance after this row and is what recovery trusts as the materialized
/// current balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    pub started_at: Timestamp,
    /// Absent only on a failed `create_account` row: no account was assigned.
    pub account_id: Option<AccountId>,
    pub display_name: String,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub currency: String,
    pub resulting_balance: Decimal,
    /// Present only on `transfer_to` / `receive_from` rows.
    pub counterparty: Option<Counterparty>,
    /// Absent on failed rows.
    pub reference_number: Option<ReferenceNumber>,
    pub completed_at: Timestamp,
    pub status: TransactionStatus,
    /// Failure explanation; absent on completed rows.
    pub remarks: Option<String>,
}

impl TransactionRecord {
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// Balance change this row applied (zero for failed rows).
    pub fn signed_amount(&self) -> Decimal {
        if self.is_completed() {
            self.kind.sign() * self.amount
        } else {
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal;

    fn record(kind: TransactionType, status: TransactionStatus) -> TransactionRecord {
        let now = temporal::now();
        TransactionRecord {
            transaction_id: TransactionId::new(3),
            started_at: now,
            account_id: Some(AccountId::new(1)),
            display_name: "Ben".into(),
            kind,
            amount: Decimal::new(2500, 2),
            currency: "HKD".into(),
            resulting_balance: Decimal::new(10000, 2),
            counterparty: None,
            reference_number: Some(ReferenceNumber::new(2)),
            completed_at: now,
            status,
            remarks: None,
        }
    }

    #[test]
    fn type_names_round_trip_through_from_str() {
        for kind in TransactionType::ALL {
            assert_eq!(kind.as_str().parse::<TransactionType>().unwrap(), kind);
        }
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    fn serde_uses_log_spelling() {
        let json = serde_json::to_string(&TransactionType::ReceiveFrom).unwrap();
        assert_eq!(json, "\"receive_from\"");
        let json = serde_json::to_string(&TransactionStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(
            "Completed".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Completed
        );
        assert!("pending".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn only_transfer_legs_are_legs() {
        assert!(TransactionType::TransferTo.is_transfer_leg());
        assert!(TransactionType::ReceiveFrom.is_transfer_leg());
        assert!(!TransactionType::Deposit.is_transfer_leg());
    }

    #[test]
    fn signed_amount_follows_direction() {
        let debit = record(TransactionType::Withdraw, TransactionStatus::Completed);
        assert_eq!(debit.signed_amount(), Decimal::new(-2500, 2));

        let credit = record(TransactionType::ReceiveFrom, TransactionStatus::Completed);
        assert_eq!(credit.signed_amount(), Decimal::new(2500, 2));
    }

    #[test]
    fn failed_rows_move_nothing() {
        let failed = record(TransactionType::Deposit, TransactionStatus::Failed);
        assert_eq!(failed.signed_amount(), Decimal::ZERO);
    }
}
