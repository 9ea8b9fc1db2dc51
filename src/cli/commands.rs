//! CLI command implementations
//!
//! Every command is a thin wrapper over the store's public contract:
//! open with the narrowest mode the command needs, do the one
//! operation, close. Entry bytes go to stdout untouched; status output
//! goes through `println!` so it stays scriptable.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::store::{IndexedStore, Mode};

use super::args::{Cli, Command};
use super::errors::CliResult;

/// Parse arguments, install the log subscriber, and dispatch.
pub fn run() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse_args();
    run_command(cli.command)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Dispatch a parsed command.
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Append { directory, input } => append(&directory, input.as_deref()),
        Command::Get { directory, index } => get(&directory, index),
        Command::Count { directory } => count(&directory),
        Command::Cat { directory } => cat(&directory),
        Command::Verify { directory } => verify(&directory),
    }
}

/// Append one entry read from `input` (or stdin) and print its index.
pub fn append(directory: &Path, input: Option<&Path>) -> CliResult<()> {
    let data = match input {
        Some(path) => fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let mut store = IndexedStore::open(directory, Mode::append().binary())?;
    store.write_entry(&data)?;
    let index = store.len() - 1;
    store.close()?;

    println!("{}", index);
    Ok(())
}

/// Print entry `index` to stdout, bytes untouched.
pub fn get(directory: &Path, index: usize) -> CliResult<()> {
    let mut store = IndexedStore::open(directory, Mode::read_only().binary())?;
    let entry = store.read(index)?;
    io::stdout().write_all(&entry)?;
    Ok(())
}

/// Print the number of committed entries.
pub fn count(directory: &Path) -> CliResult<()> {
    let store = IndexedStore::open(directory, Mode::read_only().binary())?;
    println!("{}", store.len());
    Ok(())
}

/// Stream every entry to stdout, in index order.
pub fn cat(directory: &Path) -> CliResult<()> {
    let mut store = IndexedStore::open(directory, Mode::read_only().binary())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for entry in store.entries() {
        out.write_all(&entry?)?;
    }
    out.flush()?;
    Ok(())
}

/// Check index/blob consistency and report the store's shape.
pub fn verify(directory: &Path) -> CliResult<()> {
    let mut store = IndexedStore::open(directory, Mode::read_only().binary())?;
    store.verify()?;
    println!("ok: {} entries, {} bytes", store.len(), store.total_bytes());
    Ok(())
}
