//! Scan results.
//!
//! A scan yields one [`FileDelta`] per tracked file that has unread bytes,
//! collected into a [`DeltaBatch`] in file name order.
//!
//! # Event Flow
//!
//! ```text
//! DirectoryWatcher::poll
//!        │
//!        ▼
//!   FileDelta per grown file (name order)
//!        │
//!        ▼
//!   DirectoryWatcher::consume ──► Chunk ──► classifiers
//! ```

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Unread bytes waiting in one tracked file.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use th_watcher::FileDelta;
///
/// let delta = FileDelta {
///     name: "yohoho_1001.log".to_owned(),
///     path: Utf8PathBuf::from("/logs/yohoho_1001.log"),
///     offset: 0,
///     new_bytes: 42,
///     truncated: false,
/// };
/// assert_eq!(delta.end_offset(), 42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDelta {
    /// File name relative to the watched root.
    pub name: String,

    /// Full path of the file.
    pub path: Utf8PathBuf,

    /// Offset the unread bytes start at.
    pub offset: u64,

    /// Number of unread bytes.
    pub new_bytes: u64,

    /// `true` if the file was truncated or rotated and is reread from zero.
    pub truncated: bool,
}

impl FileDelta {
    /// Returns the offset just past the unread bytes.
    #[inline]
    #[must_use]
    pub const fn end_offset(&self) -> u64 {
        self.offset.saturating_add(self.new_bytes)
    }
}

/// Counters describing one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files tracked after the scan.
    pub tracked: usize,

    /// Files seen for the first time.
    pub discovered: usize,

    /// Cursors dropped because their file vanished.
    pub removed: usize,

    /// Files reported with unread bytes.
    pub changed: usize,

    /// Files that were truncated or rotated.
    pub truncated: usize,
}

/// The deltas produced by one scan, in file name order.
///
/// Uses [`SmallVec`] with inline storage for a few deltas, since a tick
/// usually sees one active log per root.
#[derive(Debug, Clone, Default)]
pub struct DeltaBatch {
    /// The deltas, sorted by file name.
    pub deltas: SmallVec<[FileDelta; 4]>,

    /// Counters for the scan.
    pub stats: ScanStats,
}

impl DeltaBatch {
    /// Creates an empty batch.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a delta to the batch.
    #[inline]
    pub fn push(&mut self, delta: FileDelta) {
        self.deltas.push(delta);
    }

    /// Returns the number of deltas.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Returns `true` if no file has unread bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Returns an iterator over the deltas.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &FileDelta> {
        self.deltas.iter()
    }

    /// Returns the total unread bytes across all deltas.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.deltas.iter().map(|d| d.new_bytes).sum()
    }
}

impl IntoIterator for DeltaBatch {
    type Item = FileDelta;
    type IntoIter = smallvec::IntoIter<[FileDelta; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.deltas.into_iter()
    }
}

impl<'a> IntoIterator for &'a DeltaBatch {
    type Item = &'a FileDelta;
    type IntoIter = std::slice::Iter<'a, FileDelta>;

    fn into_iter(self) -> Self::IntoIter {
        self.deltas.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(name: &str, new_bytes: u64) -> FileDelta {
        FileDelta {
            name: name.to_owned(),
            path: Utf8PathBuf::from("/logs").join(name),
            offset: 10,
            new_bytes,
            truncated: false,
        }
    }

    #[test]
    fn test_batch_push_and_totals() {
        let mut batch = DeltaBatch::new();
        assert!(batch.is_empty());
        batch.push(delta("a.txt", 3));
        batch.push(delta("b.txt", 4));
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.total_bytes(), 7);

        let names: Vec<_> = batch.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.txt"]);
    }

    #[test]
    fn test_end_offset() {
        assert_eq!(delta("a", 5).end_offset(), 15);
    }

    #[test]
    fn test_scan_stats_serialize() {
        let stats = ScanStats {
            tracked: 2,
            discovered: 1,
            ..ScanStats::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains(r#""discovered":1"#));
    }
}
