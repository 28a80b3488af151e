use thiserror::Error;

/// Errors produced when decoding textual log values into typed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0:?}")]
    InvalidId(String),

    #[error("unknown transaction type: {0:?}")]
    UnknownTransactionType(String),

    #[error("unknown transaction status: {0:?}")]
    UnknownStatus(String),

    #[error("invalid decimal amount: {0:?}")]
    InvalidAmount(String),

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}
