//! In-memory cumulative offset table
//!
//! The lengths file is scanned once at open and folded into a vector
//! of cumulative byte offsets, one element more than the number of
//! entries. Entry `i` occupies `[offsets[i], offsets[i+1])` in the
//! entries blob, so both the seek position and the byte count of any
//! entry come out of two adjacent elements.

use std::io::BufRead;

use super::errors::{StoreError, StoreResult};

/// Cumulative byte offsets for every committed entry.
///
/// Always holds at least the leading `0` sentinel. Appending an entry
/// of `n` bytes pushes `last + n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    offsets: Vec<u64>,
}

impl OffsetTable {
    /// An empty table: zero entries, zero bytes.
    pub fn new() -> Self {
        Self { offsets: vec![0] }
    }

    /// Rebuilds the table from a lengths stream.
    ///
    /// Each line must be a non-negative decimal integer, one per
    /// entry, in entry order. A malformed line fails with
    /// [`StoreError::CorruptIndex`] carrying the 1-based line number.
    pub fn from_lengths_reader<R: BufRead>(reader: R) -> StoreResult<Self> {
        let mut offsets = vec![0u64];
        let mut total = 0u64;

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let length: u64 = line.trim().parse().map_err(|_| StoreError::CorruptIndex {
                line: line_no + 1,
                reason: format!("expected a non-negative integer, found {:?}", line),
            })?;
            total += length;
            offsets.push(total);
        }

        Ok(Self { offsets })
    }

    /// Number of committed entries.
    pub fn entry_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total byte length the entries blob must have.
    pub fn total_bytes(&self) -> u64 {
        *self.offsets.last().unwrap_or(&0)
    }

    /// Extends the table with one committed entry of `length` bytes.
    pub fn push(&mut self, length: u64) {
        self.offsets.push(self.total_bytes() + length);
    }

    /// Byte range of entry `index` as `(offset, length)`.
    ///
    /// Returns `None` when `index` is past the last entry.
    pub fn span(&self, index: usize) -> Option<(u64, u64)> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some((start, end - start))
    }
}

impl Default for OffsetTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_empty_table() {
        let table = OffsetTable::new();
        assert_eq!(table.entry_count(), 0);
        assert_eq!(table.total_bytes(), 0);
        assert_eq!(table.span(0), None);
    }

    #[test]
    fn test_rebuild_accumulates() {
        let table = OffsetTable::from_lengths_reader(Cursor::new("3\n5\n2\n")).unwrap();
        assert_eq!(table.entry_count(), 3);
        assert_eq!(table.total_bytes(), 10);
        assert_eq!(table.span(0), Some((0, 3)));
        assert_eq!(table.span(1), Some((3, 5)));
        assert_eq!(table.span(2), Some((8, 2)));
        assert_eq!(table.span(3), None);
    }

    #[test]
    fn test_rebuild_empty_stream() {
        let table = OffsetTable::from_lengths_reader(Cursor::new("")).unwrap();
        assert_eq!(table.entry_count(), 0);
    }

    #[test]
    fn test_rebuild_zero_length_entry() {
        let table = OffsetTable::from_lengths_reader(Cursor::new("0\n4\n")).unwrap();
        assert_eq!(table.span(0), Some((0, 0)));
        assert_eq!(table.span(1), Some((0, 4)));
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let err = OffsetTable::from_lengths_reader(Cursor::new("3\nnot-a-number\n")).unwrap_err();
        match err {
            StoreError::CorruptIndex { line, .. } => assert_eq!(line, 2),
            other => panic!("expected CorruptIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_length_is_corrupt() {
        let err = OffsetTable::from_lengths_reader(Cursor::new("-4\n")).unwrap_err();
        assert!(matches!(err, StoreError::CorruptIndex { line: 1, .. }));
    }

    #[test]
    fn test_push_extends() {
        let mut table = OffsetTable::new();
        table.push(7);
        table.push(0);
        table.push(3);
        assert_eq!(table.entry_count(), 3);
        assert_eq!(table.span(1), Some((7, 0)));
        assert_eq!(table.span(2), Some((7, 3)));
        assert_eq!(table.total_bytes(), 10);
    }
}
