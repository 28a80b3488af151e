use std::path::PathBuf;

use tally_gate::GateError;
use tally_store::StoreError;
use tally_types::{AccountId, Decimal, TransactionId};

use crate::lifecycle::LedgerPhase;

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("account with display name {0:?} already exists")]
    DuplicateAccount(String),

    #[error("no account found with display name {0:?}")]
    AccountNotFound(String),

    #[error("invalid amount {0}")]
    InvalidAmount(Decimal),

    #[error("insufficient funds or invalid amount for {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("account {account} would go negative: balance {balance}, delta {delta}")]
    NegativeBalance {
        account: AccountId,
        balance: Decimal,
        delta: Decimal,
    },

    #[error("balance of account {account} overflows: balance {balance}, delta {delta}")]
    BalanceOverflow {
        account: AccountId,
        balance: Decimal,
        delta: Decimal,
    },

    #[error("total balance across accounts overflows")]
    TotalOverflow,

    #[error("corrupt ledger for account {account}: {reason}")]
    CorruptLedger { account: String, reason: String },

    #[error("corrupt log {}: {reason}", .path.display())]
    CorruptLog { path: PathBuf, reason: String },

    #[error("invalid {field}: {value:?}")]
    InvalidName { field: &'static str, value: String },

    #[error("cannot transfer between currencies {from_currency} and {to_currency}")]
    CurrencyMismatch {
        from_currency: String,
        to_currency: String,
    },

    #[error("cannot transfer from {0:?} to itself")]
    SelfTransfer(String),

    #[error("transaction {transaction_id} failed validity check: {reason}")]
    CheckFailed {
        transaction_id: TransactionId,
        reason: String,
    },

    #[error("ledger is not ready (phase: {0})")]
    NotReady(LedgerPhase),

    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: LedgerPhase, to: LedgerPhase },

    #[error("ledger lock poisoned")]
    LockPoisoned,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("gate error: {0}")]
    Gate(#[from] GateError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
