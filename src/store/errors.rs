//! Error types for the record store

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::mode::Mode;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by store operations.
///
/// Every error is returned synchronously by the call that detects it;
/// there is no retry logic. Filesystem failures are passed through as
/// [`StoreError::Io`].
#[derive(Debug, Error)]
pub enum StoreError {
    // Open errors
    #[error("invalid mode '{flags}': {reason}")]
    InvalidMode { flags: String, reason: String },

    #[error("store directory already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("corrupt lengths index at line {line}: {reason}")]
    CorruptIndex { line: usize, reason: String },

    // Capability errors
    #[error("{op} requires {required} capability, store was opened with mode '{mode}'")]
    Mode {
        op: &'static str,
        required: &'static str,
        mode: Mode,
    },

    // Read errors
    #[error("entry index {index} out of range for store of {count} entries")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("short read of entry {index}: index promises {expected} bytes, entries blob held {actual}")]
    ShortRead {
        index: usize,
        expected: u64,
        actual: u64,
    },

    #[error("entries blob holds {actual} bytes but the lengths index accounts for {expected}")]
    BlobMismatch { expected: u64, actual: u64 },

    #[error("entry {index} is not valid UTF-8")]
    InvalidText {
        index: usize,
        #[source]
        source: std::string::FromUtf8Error,
    },

    // I/O
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
