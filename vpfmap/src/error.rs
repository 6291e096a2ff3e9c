//! Error types for VPF data access.
//!
//! The taxonomy is deliberately small: only structural failures at
//! initialization time are surfaced as hard errors. Damage to individual
//! records is logged and skipped so that partial datasets still render,
//! and a query suppressed by the cutoff scale is a success value
//! (`QueryStatus::Suppressed`), not an error.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while opening or reading VPF data.
#[derive(Debug, Error)]
pub enum DataError {
    /// None of the supplied root paths contained a library attribute table.
    ///
    /// A valid VPF root directory contains a `lat` (or `lat.`) file.
    #[error("no VPF library attribute table (\"lat\") found under any of: {0:?}")]
    InvalidPath(Vec<PathBuf>),

    /// A table header or index structure is malformed.
    ///
    /// Fatal only for the coverage (or library) the table belongs to;
    /// other coverages in the same selection table remain usable.
    #[error("malformed VPF table {table}: {reason}")]
    Parse { table: String, reason: String },

    /// I/O failure while reading a table file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Convenience constructor for table parse failures.
    pub fn parse(table: impl Into<String>, reason: impl Into<String>) -> Self {
        DataError::Parse {
            table: table.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the layer facade.
///
/// Separates "not configured yet" from data-quality failures.
#[derive(Debug, Error)]
pub enum LayerError {
    /// `prepare()` was called before a successful `configure()`.
    #[error("layer is not configured")]
    NotConfigured,

    /// A data access failure from the underlying selection table.
    #[error(transparent)]
    Data(#[from] DataError),
}
