use std::io;
use std::path::PathBuf;

/// Errors from log storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The log file does not exist.
    #[error("log file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The log file has no header row.
    #[error("log file {} is empty or has no header", .0.display())]
    EmptyFile(PathBuf),

    /// The header exists but no data row follows it.
    #[error("log file {} has no data rows", .0.display())]
    NoDataRows(PathBuf),

    /// One or more requested columns are absent from the header.
    #[error("columns not found in {}: {}", .path.display(), .columns.join(", "))]
    UnknownColumn { path: PathBuf, columns: Vec<String> },

    /// A tail read was requested with an empty column list.
    #[error("at least one column must be requested")]
    NoColumnsRequested,

    /// The file is readable but a row does not match its header.
    #[error("malformed log {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Delimited-text encoding or decoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Map a failed open into [`StoreError::NotFound`] when the file is missing.
pub(crate) fn open_error(path: &std::path::Path, error: io::Error) -> StoreError {
    if error.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(path.to_path_buf())
    } else {
        StoreError::Io(error)
    }
}
