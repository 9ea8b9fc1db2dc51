//! The indexed store engine
//!
//! One handle owns two file streams and the in-memory offset table:
//! - the entries blob, holding every entry's bytes back to back
//! - the lengths file, one decimal byte count per line
//!
//! The store is append-only. Committed entries are never rewritten,
//! so a reader's offset table stays valid for the lifetime of its
//! handle. All durable mutation funnels through [`IndexedStore::end_entry`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};
use super::mode::Mode;
use super::offsets::OffsetTable;

/// An append-only record store addressed by sequential entry index.
///
/// Writes are buffered: [`write`](IndexedStore::write) accumulates
/// bytes for the entry under construction and touches no disk until
/// [`end_entry`](IndexedStore::end_entry) commits the buffer as one
/// entry. Reads seek straight to the entry's byte range.
///
/// A handle is open for as long as it exists. Dropping it commits any
/// pending entry best-effort; [`close`](IndexedStore::close) does the
/// same and surfaces the errors dropping has to swallow.
pub struct IndexedStore {
    directory: PathBuf,
    mode: Mode,
    /// Entries blob stream, shared by the read and commit paths.
    entries: File,
    /// Lengths stream; present exactly when the mode is write-capable.
    lengths: Option<File>,
    offsets: OffsetTable,
    /// Entry under construction, absent when nothing is buffered.
    pending: Option<Vec<u8>>,
}

impl IndexedStore {
    const ENTRIES_FILE: &'static str = "entries.data";
    const LENGTHS_FILE: &'static str = "lengths.txt";

    /// Opens (or creates) the store at `directory`.
    ///
    /// A write-capable mode creates the directory if it is missing
    /// (the immediate directory only, parents must exist) and creates
    /// both store files. [`Mode::write`] starts the store empty;
    /// [`Mode::append`] extends whatever is there. The offset table is
    /// rebuilt by scanning the lengths file; a store that has no
    /// lengths file yet holds zero entries.
    ///
    /// # Errors
    ///
    /// - [`StoreError::AlreadyExists`] for a create-exclusive open of
    ///   an existing directory
    /// - [`StoreError::CorruptIndex`] for a malformed lengths line
    /// - [`StoreError::Io`] for filesystem failures, including opening
    ///   a missing store read-only
    pub fn open(directory: impl Into<PathBuf>, mode: Mode) -> StoreResult<Self> {
        let directory = directory.into();

        if mode.is_create_exclusive() && directory.exists() {
            return Err(StoreError::AlreadyExists(directory));
        }
        if mode.is_write_capable() && !directory.exists() {
            fs::create_dir(&directory)?;
        }

        let entries_path = directory.join(Self::ENTRIES_FILE);
        let lengths_path = directory.join(Self::LENGTHS_FILE);

        // The write handle is opened first so a truncating mode has
        // already emptied the lengths file when the rebuild scan runs.
        let lengths = if mode.is_write_capable() {
            Some(Self::open_for_write(&lengths_path, mode)?)
        } else {
            None
        };

        let entries = {
            let mut options = OpenOptions::new();
            options.read(mode.can_read());
            if mode.is_write_capable() {
                options.write(true).truncate(mode.truncates());
                if mode.is_create_exclusive() {
                    options.create_new(true);
                } else {
                    options.create(true);
                }
            }
            options.open(&entries_path)?
        };

        let offsets = match File::open(&lengths_path) {
            Ok(file) => OffsetTable::from_lengths_reader(BufReader::new(file))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => OffsetTable::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            directory = %directory.display(),
            mode = %mode,
            entries = offsets.entry_count(),
            "opened store"
        );

        Ok(Self {
            directory,
            mode,
            entries,
            lengths,
            offsets,
            pending: None,
        })
    }

    fn open_for_write(path: &Path, mode: Mode) -> StoreResult<File> {
        let mut options = OpenOptions::new();
        options.write(true).truncate(mode.truncates());
        if mode.is_create_exclusive() {
            options.create_new(true);
        } else {
            options.create(true);
        }
        Ok(options.open(path)?)
    }

    /// The store directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The capabilities this handle was opened with.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Number of committed entries.
    ///
    /// Buffered-but-uncommitted bytes do not count: the length grows
    /// only when an entry is committed.
    pub fn len(&self) -> usize {
        self.offsets.entry_count()
    }

    /// Whether the store holds no committed entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total committed bytes in the entries blob.
    pub fn total_bytes(&self) -> u64 {
        self.offsets.total_bytes()
    }

    /// Reads entry `index` as raw bytes.
    ///
    /// Seeks to the entry's offset and reads exactly its length,
    /// looping on partial reads from the underlying stream. Hitting
    /// end-of-file early means the index and the blob disagree
    /// (external truncation, for instance) and fails with
    /// [`StoreError::ShortRead`] rather than returning undersized data.
    pub fn read(&mut self, index: usize) -> StoreResult<Vec<u8>> {
        if !self.mode.can_read() {
            return Err(StoreError::Mode {
                op: "read",
                required: "read",
                mode: self.mode,
            });
        }

        let (offset, length) = self
            .offsets
            .span(index)
            .ok_or(StoreError::IndexOutOfRange {
                index,
                count: self.offsets.entry_count(),
            })?;

        self.entries.seek(SeekFrom::Start(offset))?;

        let mut buf = vec![0u8; length as usize];
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.entries.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(StoreError::ShortRead {
                        index,
                        expected: length,
                        actual: filled as u64,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(buf)
    }

    /// Reads entry `index` and decodes it as UTF-8 text.
    ///
    /// Requires text mode; a store opened binary fails with
    /// [`StoreError::Mode`].
    pub fn read_text(&mut self, index: usize) -> StoreResult<String> {
        if !self.mode.is_text() {
            return Err(StoreError::Mode {
                op: "read_text",
                required: "text",
                mode: self.mode,
            });
        }
        let bytes = self.read(index)?;
        String::from_utf8(bytes).map_err(|source| StoreError::InvalidText { index, source })
    }

    /// Appends `data` to the entry under construction.
    ///
    /// Touches no disk. Successive calls concatenate in call order, so
    /// one entry can be assembled field by field before
    /// [`end_entry`](IndexedStore::end_entry) commits it.
    pub fn write(&mut self, data: &[u8]) -> StoreResult<()> {
        if !self.mode.is_write_capable() {
            return Err(StoreError::Mode {
                op: "write",
                required: "write",
                mode: self.mode,
            });
        }
        self.pending.get_or_insert_with(Vec::new).extend_from_slice(data);
        Ok(())
    }

    /// Commits `data` as one complete entry.
    pub fn write_entry(&mut self, data: &[u8]) -> StoreResult<()> {
        self.write(data)?;
        self.end_entry()
    }

    /// Commits `text` plus a trailing newline as one entry.
    ///
    /// The terminator is `\n` on every platform, so a store written on
    /// one platform reads identically on another. Requires text mode.
    pub fn write_line_entry(&mut self, text: &str) -> StoreResult<()> {
        if !self.mode.is_text() {
            return Err(StoreError::Mode {
                op: "write_line_entry",
                required: "text",
                mode: self.mode,
            });
        }
        let mut line = Vec::with_capacity(text.len() + 1);
        line.extend_from_slice(text.as_bytes());
        line.push(b'\n');
        self.write_entry(&line)
    }

    /// Commits the pending buffer as one entry.
    ///
    /// This is the sole mutation point for durable state: both streams
    /// are seeked to end-of-file, the entry bytes go to the blob, its
    /// decimal length plus newline goes to the lengths file, and the
    /// offset table grows by one. A call with nothing pending is a
    /// no-op.
    pub fn end_entry(&mut self) -> StoreResult<()> {
        let lengths = match self.lengths.as_mut() {
            Some(file) => file,
            None => {
                return Err(StoreError::Mode {
                    op: "end_entry",
                    required: "write",
                    mode: self.mode,
                });
            }
        };

        let entry = match self.pending.take() {
            Some(entry) => entry,
            None => return Ok(()),
        };

        self.entries.seek(SeekFrom::End(0))?;
        lengths.seek(SeekFrom::End(0))?;

        self.entries.write_all(&entry)?;
        lengths.write_all(format!("{}\n", entry.len()).as_bytes())?;

        self.offsets.push(entry.len() as u64);

        tracing::trace!(
            index = self.offsets.entry_count() - 1,
            bytes = entry.len(),
            "committed entry"
        );

        Ok(())
    }

    /// Iterates committed entries in index order.
    pub fn entries(&mut self) -> Entries<'_> {
        Entries {
            store: self,
            index: 0,
        }
    }

    /// Reads every committed entry into memory, in index order.
    pub fn read_all(&mut self) -> StoreResult<Vec<Vec<u8>>> {
        self.entries().collect()
    }

    /// Checks that the lengths index and the entries blob agree.
    ///
    /// Compares the blob's on-disk size against the offset table's
    /// total, then reads every entry back at its promised length.
    ///
    /// # Errors
    ///
    /// - [`StoreError::BlobMismatch`] if the blob size differs from
    ///   what the index accounts for
    /// - [`StoreError::ShortRead`] if an entry cannot be read in full
    pub fn verify(&mut self) -> StoreResult<()> {
        let expected = self.offsets.total_bytes();
        let actual = self.entries.metadata()?.len();
        if actual != expected {
            return Err(StoreError::BlobMismatch { expected, actual });
        }
        for index in 0..self.len() {
            self.read(index)?;
        }
        Ok(())
    }

    /// Forces both streams to disk.
    pub fn sync(&mut self) -> StoreResult<()> {
        self.entries.sync_all()?;
        if let Some(lengths) = self.lengths.as_ref() {
            lengths.sync_all()?;
        }
        Ok(())
    }

    /// Commits any pending entry, syncs, and closes the store.
    ///
    /// Callers must not rely on uncommitted trailing data being
    /// discarded: a non-empty pending buffer is always flushed as one
    /// final entry. Dropping the handle does the same commit
    /// best-effort; `close` exists so the caller sees the errors.
    pub fn close(mut self) -> StoreResult<()> {
        self.commit_pending()?;
        if self.mode.is_write_capable() {
            self.sync()?;
        }
        tracing::debug!(directory = %self.directory.display(), "closed store");
        Ok(())
    }

    fn commit_pending(&mut self) -> StoreResult<()> {
        if self.pending.is_some() {
            self.end_entry()
        } else {
            Ok(())
        }
    }
}

impl Drop for IndexedStore {
    fn drop(&mut self) {
        if self.pending.is_some() {
            if let Err(error) = self.end_entry() {
                tracing::error!(
                    directory = %self.directory.display(),
                    %error,
                    "failed to commit pending entry while dropping store"
                );
            }
        }
    }
}

/// Iterator over committed entries, yielding `Result<Vec<u8>>`.
///
/// Created by [`IndexedStore::entries`]. Entries committed through
/// this same handle after the iterator was created are not visited.
pub struct Entries<'a> {
    store: &'a mut IndexedStore,
    index: usize,
}

impl Iterator for Entries<'_> {
    type Item = StoreResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.store.len() {
            return None;
        }
        let item = self.store.read(self.index);
        self.index += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_dir(temp: &TempDir) -> PathBuf {
        temp.path().join("store")
    }

    #[test]
    fn test_write_read_cycle() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write().and_read()).unwrap();

        store.write_entry(b"first").unwrap();
        store.write_entry(b"second entry").unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.read(0).unwrap(), b"first");
        assert_eq!(store.read(1).unwrap(), b"second entry");
    }

    #[test]
    fn test_split_writes_commit_as_one_entry() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write().and_read()).unwrap();

        store.write(b"head:").unwrap();
        store.write(b"body:").unwrap();
        store.write(b"tail").unwrap();
        assert_eq!(store.len(), 0, "buffered writes must not count");
        store.end_entry().unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.read(0).unwrap(), b"head:body:tail");
    }

    #[test]
    fn test_end_entry_without_pending_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write()).unwrap();

        store.end_entry().unwrap();
        store.end_entry().unwrap();
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_empty_entry_is_committed() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write().and_read()).unwrap();

        store.write_entry(b"").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.read(0).unwrap(), b"");
    }

    #[test]
    fn test_read_requires_read_capability() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write()).unwrap();

        store.write_entry(b"data").unwrap();
        let err = store.read(0).unwrap_err();
        assert!(matches!(err, StoreError::Mode { op: "read", .. }));
    }

    #[test]
    fn test_write_requires_write_capability() {
        let temp = TempDir::new().unwrap();
        IndexedStore::open(store_dir(&temp), Mode::write())
            .unwrap()
            .close()
            .unwrap();

        let mut store = IndexedStore::open(store_dir(&temp), Mode::read_only()).unwrap();
        assert!(matches!(
            store.write(b"nope").unwrap_err(),
            StoreError::Mode { op: "write", .. }
        ));
        assert!(matches!(
            store.end_entry().unwrap_err(),
            StoreError::Mode { op: "end_entry", .. }
        ));
    }

    #[test]
    fn test_out_of_range_read() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write().and_read()).unwrap();

        store.write_entry(b"only").unwrap();
        match store.read(1).unwrap_err() {
            StoreError::IndexOutOfRange { index, count } => {
                assert_eq!(index, 1);
                assert_eq!(count, 1);
            }
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_entries_iterator() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write().and_read()).unwrap();

        for payload in [b"a".as_slice(), b"bb", b"ccc"] {
            store.write_entry(payload).unwrap();
        }

        let collected = store.read_all().unwrap();
        assert_eq!(collected, vec![b"a".to_vec(), b"bb".to_vec(), b"ccc".to_vec()]);
    }

    #[test]
    fn test_line_entries_and_text_reads() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write().and_read()).unwrap();

        store.write_line_entry("hello").unwrap();
        assert_eq!(store.read_text(0).unwrap(), "hello\n");
        assert_eq!(store.read(0).unwrap(), b"hello\n");
    }

    #[test]
    fn test_binary_mode_rejects_text_helpers() {
        let temp = TempDir::new().unwrap();
        let mut store =
            IndexedStore::open(store_dir(&temp), Mode::write().and_read().binary()).unwrap();

        store.write_entry(b"raw").unwrap();
        assert!(matches!(
            store.write_line_entry("x").unwrap_err(),
            StoreError::Mode { op: "write_line_entry", .. }
        ));
        assert!(matches!(
            store.read_text(0).unwrap_err(),
            StoreError::Mode { op: "read_text", .. }
        ));
    }

    #[test]
    fn test_read_text_rejects_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write().and_read()).unwrap();

        store.write_entry(&[0xff, 0xfe]).unwrap();
        assert!(matches!(
            store.read_text(0).unwrap_err(),
            StoreError::InvalidText { index: 0, .. }
        ));
    }

    #[test]
    fn test_verify_clean_store() {
        let temp = TempDir::new().unwrap();
        let mut store = IndexedStore::open(store_dir(&temp), Mode::write().and_read()).unwrap();

        store.write_entry(b"one").unwrap();
        store.write_entry(b"two").unwrap();
        store.verify().unwrap();
    }
}
