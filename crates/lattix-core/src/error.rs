//! Error types for lattix-core.

use thiserror::Error;

/// Error type for triple and table operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Triple parsing error.
    #[error("Failed to parse triple: {0}")]
    ParseTriple(String),

    /// A schema referenced a column the table does not have.
    #[error("Column not found in table: {0}")]
    MissingColumn(String),

    /// A row had a different number of cells than the table has columns.
    #[error("Row {row} has {found} cells but the table has {expected} columns")]
    RowLength {
        /// Zero-based row index.
        row: usize,
        /// Number of columns in the table.
        expected: usize,
        /// Number of cells in the offending row.
        found: usize,
    },

    /// CSV decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for lattix-core operations.
pub type Result<T> = std::result::Result<T, Error>;
