//! Error types for IES table parsing and building

use super::column::IesColumnType;
use crate::cursor::CursorError;
use thiserror::Error;

/// Errors that can occur when reading or writing IES tables
#[derive(Error, Debug)]
pub enum IesError {
    /// Column type id outside the known set
    #[error("Unknown column type id: {0}")]
    UnknownColumnType(i16),

    /// Header aggregates disagree with each other or with the body
    #[error("Inconsistent header: {0}")]
    InconsistentHeader(String),

    /// Two columns share a key
    #[error("Duplicate column key: {0}")]
    DuplicateColumnKey(String),

    /// Row has a different number of values than the table has columns
    #[error("Row {row_id} has {actual} values, table has {expected} columns")]
    RowShape {
        /// Id of the offending row
        row_id: i32,
        /// Column count of the table
        expected: usize,
        /// Value count of the row
        actual: usize,
    },

    /// Value type does not match the declared column type
    #[error("Row {row_id}, column '{column}': expected {expected:?} value")]
    TypeMismatch {
        /// Id of the offending row
        row_id: i32,
        /// Key of the column
        column: String,
        /// Declared column type
        expected: IesColumnType,
    },

    /// A count or size does not fit its on-disk field
    #[error("{what} of {value} does not fit the on-disk field")]
    Overflow {
        /// Which quantity overflowed
        what: &'static str,
        /// The value that did not fit
        value: usize,
    },

    /// Low-level read or write failure
    #[error("Binary layout error: {0}")]
    Cursor(#[from] CursorError),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IesError {
    /// Whether the error describes malformed table data rather than I/O
    pub fn is_format_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Result type for IES operations
pub type IesResult<T> = std::result::Result<T, IesError>;
