//! Ledger engine for Tally.
//!
//! Account balances are derived entirely from append-only transaction logs
//! stored as flat files. There is no separate balance table: on startup the
//! engine reconstructs every account and its monotonic counters from the
//! last recorded row of each log.
//!
//! This crate provides:
//! - [`Ledger`]: the engine (create accounts, deposit, withdraw, transfer,
//!   query balances and aggregates, list an account's history)
//! - [`Account`]: in-memory account entity, mutated only by the engine
//! - Recovery from the account registry and per-account logs
//! - [`TransferAudit`]: detects transfers whose two legs were not both written
//! - [`LedgerConfig`]: file layout, default currency, gate settings
//!
//! # Files
//!
//! | file                         | contents                                  |
//! |------------------------------|-------------------------------------------|
//! | `system_accounts.csv`        | one row per created account               |
//! | `system_transactions.csv`    | every transaction leg, system-wide        |
//! | `{account_id}_transactions.csv` | the legs of one account                |

pub mod account;
pub mod audit;
mod codec;
pub mod config;
pub mod counters;
pub mod engine;
pub mod error;
pub mod history;
pub mod lifecycle;
mod recovery;
pub mod summary;

pub use account::Account;
pub use audit::{audit_transfer_legs, TransferAudit, UnmatchedLeg};
pub use config::LedgerConfig;
pub use counters::Counters;
pub use engine::{Ledger, TransferRecord};
pub use error::{LedgerError, LedgerResult};
pub use history::TransactionHistory;
pub use lifecycle::LedgerPhase;
pub use summary::{format_amount, LedgerSummary};
