//! recstore - an append-only, randomly addressable record store
//!
//! A store is a directory holding two files:
//! - `entries.data`: every entry's bytes concatenated, in entry order
//! - `lengths.txt`: one decimal byte length per line, in entry order
//!
//! The lengths file is the authoritative index. At open time it is
//! scanned once into an in-memory table of cumulative offsets, after
//! which any entry can be read with a single seek. Entries are opaque
//! byte sequences; once committed they are never rewritten.

pub mod cli;
pub mod store;

pub use store::{Entries, IndexedStore, Mode, StoreError, StoreResult};
