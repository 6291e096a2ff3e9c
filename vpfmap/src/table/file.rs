//! Table file access and row iteration.
//!
//! A `TableFile` reads a whole table into memory (VPF tile tables are
//! small) and streams decoded rows. Damaged rows are skipped with a logged
//! warning when the table has a fixed row width; for variable-width tables
//! a damaged row ends iteration, since the stream cannot be resynchronized.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::{Buf, Bytes};
use tracing::warn;

use crate::error::DataError;
use crate::table::header::TableHeader;
use crate::table::row::{read_row, Row};

/// An open VPF table.
#[derive(Debug)]
pub struct TableFile {
    name: String,
    header: TableHeader,
    data: Bytes,
}

impl TableFile {
    /// Open and parse a table file.
    ///
    /// The whole file is read up front; row iteration is pure in-memory
    /// decoding afterwards.
    pub fn open(path: &Path) -> Result<Self, DataError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let raw = fs::read(path)?;
        let mut buf = Bytes::from(raw);
        let header = TableHeader::parse(&mut buf, &name)?;
        Ok(Self {
            name,
            header,
            data: buf,
        })
    }

    /// Table file name (e.g. `edg`, `tileref.aft`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.column_index(name)
    }

    /// Iterate rows in file order.
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            header: &self.header,
            name: &self.name,
            buf: self.data.clone(),
            fixed_row_len: self.header.fixed_row_len(),
        }
    }
}

/// Row iterator over a table.
pub struct Rows<'a> {
    header: &'a TableHeader,
    name: &'a str,
    buf: Bytes,
    fixed_row_len: Option<usize>,
}

impl Iterator for Rows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        loop {
            if !self.buf.has_remaining() {
                return None;
            }

            let mut attempt = self.buf.clone();
            match read_row(&mut attempt, self.header) {
                Ok(row) => {
                    self.buf = attempt;
                    return Some(row);
                }
                Err(err) => match self.fixed_row_len {
                    Some(len) if self.buf.remaining() >= len => {
                        warn!(table = self.name, %err, "skipping malformed row");
                        self.buf.advance(len);
                    }
                    _ => {
                        warn!(
                            table = self.name,
                            %err,
                            trailing_bytes = self.buf.remaining(),
                            "abandoning row iteration"
                        );
                        return None;
                    }
                },
            }
        }
    }
}

/// Table opener with read-count instrumentation.
///
/// Every table open is counted, which lets callers (and the cutoff-scale
/// tests) verify that a suppressed query touched no storage at all.
#[derive(Debug, Default)]
pub struct Storage {
    reads: AtomicU64,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a table, counting the read.
    pub fn open_table(&self, path: &Path) -> Result<TableFile, DataError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        TableFile::open(path)
    }

    /// Number of table files opened so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_table(dir: &Path, name: &str, header_text: &str, rows: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(&(header_text.len() as u32).to_le_bytes())
            .unwrap();
        file.write_all(header_text.as_bytes()).unwrap();
        file.write_all(rows).unwrap();
        path
    }

    #[test]
    fn test_open_and_iterate_fixed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut rows = Vec::new();
        for id in [1i32, 2, 3] {
            rows.extend_from_slice(&id.to_le_bytes());
        }
        let path = write_table(dir.path(), "cat", "L;Coverages;-;id=I,1,P,-,:;", &rows);

        let table = TableFile::open(&path).unwrap();
        let ids: Vec<i32> = table.rows().map(|r| r.int(0).unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_trailing_garbage_fixed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut rows = Vec::new();
        rows.extend_from_slice(&9i32.to_le_bytes());
        rows.extend_from_slice(&[0xAA, 0xBB]); // half a row
        let path = write_table(dir.path(), "cat", "L;Coverages;-;id=I,1,P,-,:;", &rows);

        let table = TableFile::open(&path).unwrap();
        let ids: Vec<i32> = table.rows().map(|r| r.int(0).unwrap()).collect();
        assert_eq!(ids, vec![9]);
    }

    #[test]
    fn test_variable_rows_stop_on_damage() {
        let dir = tempfile::tempdir().unwrap();
        let mut rows = Vec::new();
        // One good row: 1 coordinate pair.
        rows.extend_from_slice(&1u32.to_le_bytes());
        rows.extend_from_slice(&0.5f32.to_le_bytes());
        rows.extend_from_slice(&1.5f32.to_le_bytes());
        // Damaged row: claims 100 pairs, provides none.
        rows.extend_from_slice(&100u32.to_le_bytes());
        let path = write_table(dir.path(), "edg", "L;Edges;-;coordinates=C,*,N,-,:;", &rows);

        let table = TableFile::open(&path).unwrap();
        let decoded: Vec<Row> = table.rows().collect();
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TableFile::open(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }

    #[test]
    fn test_storage_counts_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), "cat", "L;Coverages;-;id=I,1,P,-,:;", &[]);

        let storage = Storage::new();
        assert_eq!(storage.reads(), 0);
        storage.open_table(&path).unwrap();
        let _ = storage.open_table(&dir.path().join("absent"));
        assert_eq!(storage.reads(), 2);
    }
}
