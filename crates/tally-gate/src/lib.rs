//! Commit gate for the Tally ledger.
//!
//! Every mutating ledger operation is described as a [`PendingTransaction`]
//! and run through the [`CommitGate`] before any balance changes. The gate
//! runs a configurable pipeline of [`ValidityCheck`]s and produces a final
//! accept/reject verdict with per-check results.
//!
//! The default pipeline holds a single [`SimulatedLatencyCheck`], a stand-in
//! for real validation that always passes after a fixed delay. Real checks
//! plug in through [`CommitGate::add_check`].
//!
//! # Quick Start
//!
//! ```rust
//! use tally_gate::{CommitGate, GateConfig, PendingTransaction};
//! use tally_types::{AccountId, Decimal, TransactionType};
//!
//! let gate = CommitGate::with_default_checks(GateConfig::immediate());
//! let pending = PendingTransaction::new(
//!     TransactionType::Deposit,
//!     AccountId::new(1),
//!     "Ben",
//!     Decimal::new(500, 0),
//!     "HKD",
//!     Decimal::new(1000, 0),
//! );
//! assert!(gate.evaluate(&pending).unwrap().is_accepted());
//! ```

pub mod check;
pub mod checks;
pub mod config;
pub mod error;
pub mod gate;

pub use check::{CheckDecision, CheckResult, PendingTransaction, ValidityCheck};
pub use checks::{AmountLimitCheck, FnCheck, SimulatedLatencyCheck};
pub use config::GateConfig;
pub use error::GateError;
pub use gate::{CommitGate, GateVerdict, Verdict};
