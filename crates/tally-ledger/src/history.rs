use std::path::{Path, PathBuf};

use tally_store::{read_rows, RowIter, StoreError};
use tally_types::TransactionRecord;

use crate::codec::LogRow;
use crate::error::{LedgerError, LedgerResult};

/// Streaming iterator over one log, oldest row first.
///
/// The file is opened when the history is created and read lazily after
/// that, so a long history never has to fit in memory. A log that does not
/// exist yields nothing.
pub struct TransactionHistory {
    path: PathBuf,
    rows: Option<RowIter<LogRow>>,
}

impl TransactionHistory {
    pub(crate) fn open(path: &Path) -> LedgerResult<Self> {
        let rows = match read_rows(path) {
            Ok(rows) => Some(rows),
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            rows,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for TransactionHistory {
    type Item = LedgerResult<TransactionRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.as_mut()?.next()?;
        Some(row.map_err(LedgerError::from).and_then(|row| {
            TransactionRecord::try_from(row).map_err(|e| LedgerError::CorruptLog {
                path: self.path.clone(),
                reason: e.to_string(),
            })
        }))
    }
}
