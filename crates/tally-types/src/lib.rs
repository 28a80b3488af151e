//! Foundation types for the Tally ledger.
//!
//! Every other Tally crate depends on `tally-types`. Nothing here touches
//! the filesystem; the types describe what a row of each log means.
//!
//! # Key Types
//!
//! - [`AccountId`], [`TransactionId`], [`ReferenceNumber`]: monotonic identifiers
//! - [`TransactionRecord`]: one leg of a transaction as written to the logs
//! - [`TransactionType`] / [`TransactionStatus`]: row classification
//! - [`Counterparty`]: the other side of a transfer leg
//! - [`RegistryEntry`]: one row of the account registry
//! - [`schema`]: column names of the three log files

pub mod error;
pub mod ids;
pub mod registry;
pub mod schema;
pub mod temporal;
pub mod transaction;

pub use error::TypeError;
pub use ids::{AccountId, ReferenceNumber, TransactionId};
pub use registry::RegistryEntry;
pub use temporal::Timestamp;
pub use transaction::{Counterparty, TransactionRecord, TransactionStatus, TransactionType};

/// Monetary amounts are exact decimals; floating point never touches a balance.
pub use rust_decimal::Decimal;
