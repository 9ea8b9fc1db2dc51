//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::store::StoreError;

/// Result type for CLI commands
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced by CLI commands.
///
/// Store errors pass through unchanged so the operator sees the same
/// message a library caller would.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
