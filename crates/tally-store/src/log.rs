use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use csv::{Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreResult;
use crate::rows::{read_rows, RowIter};
use crate::tail::{LastRecord, TailReader};

/// Flush/sync strategy for appended rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every row (safest, highest latency).
    EveryWrite,
    /// Flush to the OS after every row and rely on page-cache buffering.
    #[default]
    OsDefault,
}

/// An append-only delimited log with a fixed header.
///
/// The file is created with its header on the first append if it does not
/// exist; otherwise rows are appended after the existing content. Rows are
/// never rewritten or removed. The write handle is opened lazily and kept
/// until [`RowLog::close`] or drop.
pub struct RowLog {
    path: PathBuf,
    header: Vec<String>,
    sync_mode: SyncMode,
    writer: Option<Writer<File>>,
}

impl RowLog {
    pub fn new<S: AsRef<str>>(path: impl Into<PathBuf>, header: &[S], sync_mode: SyncMode) -> Self {
        Self {
            path: path.into(),
            header: header.iter().map(|h| h.as_ref().to_string()).collect(),
            sync_mode,
            writer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Returns `true` once the file exists on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Append one row. Field order follows the serialized struct's field order,
    /// which must match the header.
    pub fn append<T: Serialize>(&mut self, row: &T) -> StoreResult<()> {
        let sync_mode = self.sync_mode;
        let writer = self.writer()?;
        writer.serialize(row)?;
        writer.flush()?;
        if sync_mode == SyncMode::EveryWrite {
            writer.get_ref().sync_all()?;
        }

        debug!(path = %self.path.display(), "row appended");
        Ok(())
    }

    /// Flush and release the write handle. A later append reopens the file.
    pub fn close(&mut self) -> StoreResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            if self.sync_mode == SyncMode::EveryWrite {
                writer.get_ref().sync_all()?;
            }
        }
        Ok(())
    }

    /// Lazily iterate the rows currently in the file, oldest first.
    pub fn rows<T: serde::de::DeserializeOwned>(&self) -> StoreResult<RowIter<T>> {
        read_rows(&self.path)
    }

    /// Values of `columns` from the most recent row.
    pub fn tail<S: AsRef<str>>(&self, columns: &[S]) -> StoreResult<LastRecord> {
        TailReader::default().extract_last_record(&self.path, columns)
    }

    fn writer(&mut self) -> StoreResult<&mut Writer<File>> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => self.open()?,
        };
        Ok(self.writer.insert(writer))
    }

    fn open(&self) -> StoreResult<Writer<File>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let fresh = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if fresh {
            writer.write_record(&self.header)?;
            writer.flush()?;
            debug!(path = %self.path.display(), "log created");
        }
        Ok(writer)
    }
}

impl Drop for RowLog {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::warn!(path = %self.path.display(), %error, "failed to flush log on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        name: String,
        note: Option<String>,
    }

    fn row(id: u64, name: &str, note: Option<&str>) -> Row {
        Row {
            id,
            name: name.into(),
            note: note.map(String::from),
        }
    }

    const HEADER: [&str; 3] = ["id", "name", "note"];

    #[test]
    fn first_append_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("log.csv");
        let mut log = RowLog::new(&path, &HEADER, SyncMode::default());
        assert!(!log.exists());

        log.append(&row(1, "Ben", None)).unwrap();
        log.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "id,name,note\n1,Ben,\n");
    }

    #[test]
    fn reopening_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");

        let mut first = RowLog::new(&path, &HEADER, SyncMode::default());
        first.append(&row(1, "Ben", None)).unwrap();
        drop(first);

        let mut second = RowLog::new(&path, &HEADER, SyncMode::EveryWrite);
        second.append(&row(2, "Ricky", Some("hello, world"))).unwrap();
        drop(second);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("id,name,note").count(), 1);
        assert!(contents.ends_with("2,Ricky,\"hello, world\"\n"));
    }

    #[test]
    fn rows_iterate_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RowLog::new(dir.path().join("log.csv"), &HEADER, SyncMode::default());
        log.append(&row(1, "Ben", None)).unwrap();
        log.append(&row(2, "Ricky", Some("x"))).unwrap();

        let rows: Vec<Row> = log.rows().unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, vec![row(1, "Ben", None), row(2, "Ricky", Some("x"))]);
    }

    #[test]
    fn tail_sees_latest_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RowLog::new(dir.path().join("log.csv"), &HEADER, SyncMode::default());
        log.append(&row(1, "Ben", None)).unwrap();
        log.append(&row(2, "Ricky", None)).unwrap();

        let last = log.tail(&["id", "name"]).unwrap();
        assert_eq!(last["id"], "2");
        assert_eq!(last["name"], "Ricky");
    }

    #[test]
    fn tail_of_unwritten_log_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let log = RowLog::new(dir.path().join("log.csv"), &HEADER, SyncMode::default());
        assert!(matches!(log.tail(&["id"]), Err(StoreError::NotFound(_))));
    }
}
