use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::{open_error, StoreError, StoreResult};

/// Column name to value, taken from the last data row of a log.
pub type LastRecord = BTreeMap<String, String>;

/// First window read from the end of the file (grows by doubling).
const DEFAULT_INITIAL_CHUNK: usize = 4 * 1024;

/// How the final row is located.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Read backward from the end of the file in growing windows until the
    /// last complete line is isolated. Cost is proportional to the length of
    /// the final row, not the file.
    #[default]
    BackwardChunks,
    /// Parse every row front-to-back and keep the last. O(n), used as the
    /// reference behaviour and for files whose rows span several lines.
    FullScan,
}

/// Recovers the most recent row of a log without replaying it.
///
/// The header is always read from the front of the file. When
/// [`ScanStrategy::BackwardChunks`] finds a final line that is not a whole
/// row (an unbalanced quote or the wrong field count), it falls back to a
/// full scan.
#[derive(Clone, Debug)]
pub struct TailReader {
    strategy: ScanStrategy,
    initial_chunk: usize,
}

impl Default for TailReader {
    fn default() -> Self {
        Self {
            strategy: ScanStrategy::default(),
            initial_chunk: DEFAULT_INITIAL_CHUNK,
        }
    }
}

impl TailReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: ScanStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Size of the first backward window in bytes (clamped to at least 1).
    pub fn with_initial_chunk(mut self, bytes: usize) -> Self {
        self.initial_chunk = bytes.max(1);
        self
    }

    pub fn strategy(&self) -> ScanStrategy {
        self.strategy
    }

    /// Return the last data row's values for `columns`.
    ///
    /// Errors, in the order they are checked: [`StoreError::NoColumnsRequested`],
    /// [`StoreError::NotFound`], [`StoreError::EmptyFile`],
    /// [`StoreError::NoDataRows`], [`StoreError::UnknownColumn`] (listing every
    /// missing column).
    pub fn extract_last_record<S: AsRef<str>>(
        &self,
        path: &Path,
        columns: &[S],
    ) -> StoreResult<LastRecord> {
        if columns.is_empty() {
            return Err(StoreError::NoColumnsRequested);
        }

        let file = File::open(path).map_err(|e| open_error(path, e))?;
        let (header, last) = match self.strategy {
            ScanStrategy::BackwardChunks => read_backward(path, &file, self.initial_chunk)?,
            ScanStrategy::FullScan => read_full(path, &file)?,
        };

        let record = select(path, &header, &last, columns)?;
        debug!(path = %path.display(), strategy = ?self.strategy, "tail read");
        Ok(record)
    }
}

/// Tail a log with the default backward-chunk reader.
pub fn extract_last_record<S: AsRef<str>>(path: &Path, columns: &[S]) -> StoreResult<LastRecord> {
    TailReader::default().extract_last_record(path, columns)
}

fn read_backward(
    path: &Path,
    file: &File,
    initial_chunk: usize,
) -> StoreResult<(StringRecord, StringRecord)> {
    let (header, body_start) = read_header(path, file)?;
    let len = file.metadata()?.len();

    let line = last_line(file, body_start, len, initial_chunk)?
        .ok_or_else(|| StoreError::NoDataRows(path.to_path_buf()))?;
    let record = parse_line(&line)?.ok_or_else(|| StoreError::NoDataRows(path.to_path_buf()))?;

    // The final physical line may be the tail of a quoted multi-line field.
    let open_quotes = line.iter().filter(|&&b| b == b'"').count() % 2 == 1;
    if open_quotes || record.len() != header.len() {
        debug!(
            path = %path.display(),
            fields = record.len(),
            expected = header.len(),
            "last line is not a whole row; rescanning from the start"
        );
        return read_full(path, file);
    }
    Ok((header, record))
}

fn read_full(path: &Path, mut file: &File) -> StoreResult<(StringRecord, StringRecord)> {
    file.rewind()?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut header = None;
    let mut last = None;
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let row = std::mem::replace(&mut record, StringRecord::new());
        if header.is_none() {
            header = Some(row);
        } else {
            last = Some(row);
        }
    }

    let header = header.ok_or_else(|| StoreError::EmptyFile(path.to_path_buf()))?;
    let last = last.ok_or_else(|| StoreError::NoDataRows(path.to_path_buf()))?;
    Ok((header, last))
}

/// Parse the header and return the byte offset where the body begins.
/// Leading blank lines are skipped, as the CSV parser does.
fn read_header(path: &Path, file: &File) -> StoreResult<(StringRecord, u64)> {
    let mut reader = BufReader::new(file);
    let mut offset = 0u64;
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = reader.read_until(b'\n', &mut line)?;
        if read == 0 {
            return Err(StoreError::EmptyFile(path.to_path_buf()));
        }
        offset += read as u64;

        if let Some(header) = parse_line(&line)? {
            return Ok((header, offset));
        }
    }
}

/// Locate the final non-empty line in `[body_start, len)`, scanning backward.
fn last_line(
    mut file: &File,
    body_start: u64,
    len: u64,
    initial_chunk: usize,
) -> std::io::Result<Option<Vec<u8>>> {
    if len <= body_start {
        return Ok(None);
    }

    let mut window = initial_chunk as u64;
    loop {
        let start = len.saturating_sub(window).max(body_start);
        let mut buf = vec![0u8; (len - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(&mut buf)?;

        let body = &buf[..content_end(&buf)];
        if let Some(newline) = body.iter().rposition(|&b| b == b'\n') {
            return Ok(Some(body[newline + 1..].to_vec()));
        }
        if start == body_start {
            return Ok((!body.is_empty()).then(|| body.to_vec()));
        }

        window = window.saturating_mul(2);
    }
}

/// Length of `buf` with trailing line terminators removed.
fn content_end(buf: &[u8]) -> usize {
    buf.iter()
        .rposition(|&b| b != b'\n' && b != b'\r')
        .map_or(0, |i| i + 1)
}

fn parse_line(line: &[u8]) -> StoreResult<Option<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line);
    let mut record = StringRecord::new();
    Ok(reader.read_record(&mut record)?.then_some(record))
}

fn select<S: AsRef<str>>(
    path: &Path,
    header: &StringRecord,
    row: &StringRecord,
    columns: &[S],
) -> StoreResult<LastRecord> {
    let index: HashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim(), i))
        .collect();

    let requested: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    let missing: Vec<String> = requested
        .iter()
        .filter(|c| !index.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::UnknownColumn {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let mut record = LastRecord::new();
    for column in requested {
        let position = index[column];
        let value = row.get(position).ok_or_else(|| StoreError::Malformed {
            path: path.to_path_buf(),
            reason: format!(
                "last row has {} fields but column {column:?} is field {}",
                row.len(),
                position + 1
            ),
        })?;
        record.insert(column.to_string(), value.to_string());
    }
    Ok(record)
}
