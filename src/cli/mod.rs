//! CLI module for recstore
//!
//! Provides the command-line interface:
//! - append: commit one entry from a file or stdin
//! - get: print one entry by index
//! - count: print the entry count
//! - cat: print every entry in order
//! - verify: check index/blob consistency

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{append, cat, count, get, run, run_command, verify};
pub use errors::{CliError, CliResult};
