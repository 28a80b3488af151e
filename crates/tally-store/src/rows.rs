use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::{DeserializeRecordsIntoIter, ReaderBuilder};
use serde::de::DeserializeOwned;

use crate::error::{open_error, StoreError, StoreResult};

/// Forward-only, single-pass iterator over the typed rows of a log.
///
/// Rows are decoded one at a time as the iterator advances; the file is
/// never loaded whole. The iterator is finite and stops at end of file.
/// Calling [`read_rows`] again starts a fresh pass from the first row.
pub struct RowIter<T> {
    path: PathBuf,
    inner: DeserializeRecordsIntoIter<BufReader<File>, T>,
}

impl<T> RowIter<T> {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: DeserializeOwned> Iterator for RowIter<T> {
    type Item = StoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|row| row.map_err(StoreError::from))
    }
}

/// Open `path` for typed iteration. Columns are matched by header name.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> StoreResult<RowIter<T>> {
    let file = File::open(path).map_err(|e| open_error(path, e))?;
    let inner = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::new(file))
        .into_deserialize();

    Ok(RowIter {
        path: path.to_path_buf(),
        inner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        value: u32,
        key: String,
    }

    #[test]
    fn columns_are_matched_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.csv");
        fs::write(&path, "key,value\na,1\nb,2\n").unwrap();

        let rows: Vec<Pair> = read_rows(&path).unwrap().map(Result::unwrap).collect();
        assert_eq!(
            rows,
            vec![
                Pair { value: 1, key: "a".into() },
                Pair { value: 2, key: "b".into() },
            ]
        );
    }

    #[test]
    fn each_call_restarts_from_the_top() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.csv");
        fs::write(&path, "key,value\na,1\nb,2\n").unwrap();

        let mut first = read_rows::<Pair>(&path).unwrap();
        assert_eq!(first.next().unwrap().unwrap().key, "a");

        let mut second = read_rows::<Pair>(&path).unwrap();
        assert_eq!(second.next().unwrap().unwrap().key, "a");
        assert_eq!(first.next().unwrap().unwrap().key, "b");
        assert!(first.next().is_none());
    }

    #[test]
    fn bad_row_surfaces_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pairs.csv");
        fs::write(&path, "key,value\na,notanumber\n").unwrap();

        let mut rows = read_rows::<Pair>(&path).unwrap();
        assert!(matches!(rows.next(), Some(Err(StoreError::Csv(_)))));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_rows::<Pair>(&dir.path().join("none.csv"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
