//! Flat-file storage for the Tally ledger.
//!
//! All persistent state is a set of plain delimited text files with a header
//! row. This crate knows nothing about accounts or money; it provides:
//!
//! - [`RowLog`]: an append-only log that writes its header on first use
//! - [`TailReader`]: recovers the most recent row of a log without reading
//!   the whole file
//! - [`RowIter`]: lazy, forward-only typed iteration over a log's rows

pub mod error;
pub mod log;
pub mod rows;
pub mod tail;

pub use error::{StoreError, StoreResult};
pub use log::{RowLog, SyncMode};
pub use rows::{read_rows, RowIter};
pub use tail::{extract_last_record, LastRecord, ScanStrategy, TailReader};
