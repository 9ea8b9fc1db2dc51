//! CLI argument definitions using clap
//!
//! Commands:
//! - recstore append <dir> [--input <path>]
//! - recstore get <dir> <index>
//! - recstore count <dir>
//! - recstore cat <dir>
//! - recstore verify <dir>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// recstore - an append-only, randomly addressable record store
#[derive(Parser, Debug)]
#[command(name = "recstore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Append one entry and print its index
    Append {
        /// Store directory (created if missing)
        directory: PathBuf,

        /// Read the entry from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Print one entry's bytes to stdout
    Get {
        /// Store directory
        directory: PathBuf,

        /// Zero-based entry index
        index: usize,
    },

    /// Print the number of entries
    Count {
        /// Store directory
        directory: PathBuf,
    },

    /// Print every entry to stdout, in order
    Cat {
        /// Store directory
        directory: PathBuf,
    },

    /// Check that the lengths index and the entries blob agree
    Verify {
        /// Store directory
        directory: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
