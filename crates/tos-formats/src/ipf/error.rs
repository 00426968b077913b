//! Error types for IPF archive reading and building

use thiserror::Error;

/// Errors that can occur when reading, extracting or building IPF archives
#[derive(Error, Debug)]
pub enum IpfError {
    /// Structural problem in the footer, file table or element descriptor
    #[error("Invalid archive: {0}")]
    InvalidFormat(String),

    /// Element payload failed to decrypt or inflate to its recorded size
    #[error("Corrupt element '{path}': {reason}")]
    Corrupt {
        /// Path of the element
        path: String,
        /// What went wrong
        reason: String,
    },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `BinRW` parsing/writing error
    #[error("Binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// Worker pool could not be started
    #[error("Worker pool error: {0}")]
    Pool(String),

    /// One or more tasks of a parallel batch failed
    #[error("{} of {} items failed", .0.failures.len(), .0.total)]
    Batch(BatchFailure),
}

impl IpfError {
    /// Whether the archive structure itself is malformed
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::InvalidFormat(_) | Self::BinRw(_))
    }

    /// Whether an element payload failed to decode
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }

    /// Whether the file system failed
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// A failed task inside a batch
#[derive(Debug)]
pub struct ItemFailure {
    /// Element path or source file the task worked on
    pub item: String,
    /// Why it failed
    pub error: IpfError,
}

/// Every failure of a batch, collected after all tasks finished
#[derive(Debug)]
pub struct BatchFailure {
    /// Number of tasks in the batch
    pub total: usize,
    /// Failed tasks, in input order
    pub failures: Vec<ItemFailure>,
}

/// Result type for IPF operations
pub type IpfResult<T> = std::result::Result<T, IpfError>;
