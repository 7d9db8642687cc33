//! Per-file read cursors.
//!
//! A [`FileCursor`] remembers how far into a file the pipeline has read.
//! Each scan feeds it the file's current [`FileStat`] and gets back an
//! [`Observation`] saying how many new bytes are waiting.
//!
//! # Lifecycle
//!
//! ```text
//! first seen ──► offset = size (history skipped)
//!     │
//!     ▼
//! observe(stat) ──► Grew { n }      read n bytes, advance(n)
//!               ├─► Truncated { n } offset reset to 0, read from start
//!               ├─► Unchanged
//!               └─► Removed         cursor dropped by the watcher
//! ```
//!
//! Truncation covers both a file that shrank below the offset and, on Unix,
//! a file whose device/inode changed under the same name.

use std::fs::{self, Metadata};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

/// Device and inode pair identifying a file independently of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    /// Creates an identity from raw device and inode numbers.
    #[inline]
    #[must_use]
    pub const fn new(dev: u64, ino: u64) -> Self {
        Self { dev, ino }
    }

    /// Reads the identity from file metadata.
    ///
    /// Returns `None` on platforms without stable inode numbers.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self::new(metadata.dev(), metadata.ino()))
    }

    /// Reads the identity from file metadata.
    ///
    /// Returns `None` on platforms without stable inode numbers.
    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

/// The parts of a file's metadata a cursor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Current size in bytes.
    pub size: u64,
    /// Identity, when the platform provides one.
    pub identity: Option<FileIdentity>,
}

impl FileStat {
    /// Creates a stat with only a size.
    #[inline]
    #[must_use]
    pub const fn with_size(size: u64) -> Self {
        Self {
            size,
            identity: None,
        }
    }

    /// Extracts size and identity from metadata.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            size: metadata.len(),
            identity: FileIdentity::from_metadata(metadata),
        }
    }

    /// Stats the file at `path`, following symlinks.
    pub fn of(path: &Utf8Path) -> io::Result<Self> {
        fs::metadata(path).map(|metadata| Self::from_metadata(&metadata))
    }
}

/// What a cursor saw when observing its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The file no longer exists.
    Removed,
    /// No new bytes.
    Unchanged,
    /// The file grew past the offset.
    Grew {
        /// Bytes available after the offset.
        new_bytes: u64,
    },
    /// The file shrank or was replaced; the offset was reset to zero.
    Truncated {
        /// Bytes available from the start of the file.
        new_bytes: u64,
    },
}

impl Observation {
    /// Returns the number of bytes waiting to be read.
    #[inline]
    #[must_use]
    pub const fn new_bytes(&self) -> u64 {
        match self {
            Self::Grew { new_bytes } | Self::Truncated { new_bytes } => *new_bytes,
            Self::Removed | Self::Unchanged => 0,
        }
    }
}

/// Read position within one tailed file.
///
/// The offset never exceeds the size last observed.
///
/// # Examples
///
/// ```
/// use th_watcher::{FileCursor, FileStat, Observation};
///
/// let mut cursor = FileCursor::at_end("chat.txt", FileStat::with_size(100));
/// assert_eq!(cursor.last_offset(), 100);
///
/// assert_eq!(
///     cursor.observe(Some(FileStat::with_size(130))),
///     Observation::Grew { new_bytes: 30 }
/// );
/// cursor.advance(30);
/// assert_eq!(cursor.last_offset(), 130);
///
/// assert_eq!(
///     cursor.observe(Some(FileStat::with_size(12))),
///     Observation::Truncated { new_bytes: 12 }
/// );
/// assert_eq!(cursor.last_offset(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCursor {
    path: Utf8PathBuf,
    last_offset: u64,
    last_size: u64,
    identity: Option<FileIdentity>,
}

impl FileCursor {
    /// Creates a cursor positioned at the end of a newly seen file.
    ///
    /// Existing content is never replayed.
    #[must_use]
    pub fn at_end(path: impl Into<Utf8PathBuf>, stat: FileStat) -> Self {
        Self {
            path: path.into(),
            last_offset: stat.size,
            last_size: stat.size,
            identity: stat.identity,
        }
    }

    /// Returns the tracked file's path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the byte offset of the next unread byte.
    #[inline]
    #[must_use]
    pub const fn last_offset(&self) -> u64 {
        self.last_offset
    }

    /// Returns the size recorded by the latest observation.
    #[inline]
    #[must_use]
    pub const fn last_size(&self) -> u64 {
        self.last_size
    }

    /// Compares the file's current state with the cursor.
    ///
    /// `None` means the file could not be found. A size below the offset, or
    /// a changed identity, resets the offset to zero so the whole current
    /// content is reported as new.
    pub fn observe(&mut self, stat: Option<FileStat>) -> Observation {
        let Some(stat) = stat else {
            return Observation::Removed;
        };

        let replaced = match (self.identity, stat.identity) {
            (Some(old), Some(new)) => old != new,
            _ => false,
        };
        self.last_size = stat.size;

        if replaced || stat.size < self.last_offset {
            tracing::debug!(
                path = %self.path,
                previous_offset = self.last_offset,
                size = stat.size,
                replaced,
                "file truncated or rotated, rereading from start"
            );
            self.last_offset = 0;
            self.identity = stat.identity;
            return Observation::Truncated {
                new_bytes: stat.size,
            };
        }

        if self.identity.is_none() {
            self.identity = stat.identity;
        }

        match stat.size - self.last_offset {
            0 => Observation::Unchanged,
            new_bytes => Observation::Grew { new_bytes },
        }
    }

    /// Moves the offset forward by the bytes actually consumed.
    ///
    /// Clamped to the size last observed.
    pub fn advance(&mut self, consumed: u64) {
        self.last_offset = self
            .last_offset
            .saturating_add(consumed)
            .min(self.last_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(size: u64) -> FileCursor {
        FileCursor::at_end("log.txt", FileStat::with_size(size))
    }

    #[test]
    fn test_first_sight_skips_history() {
        let cursor = cursor(4096);
        assert_eq!(cursor.last_offset(), 4096);
        assert_eq!(cursor.last_size(), 4096);
    }

    #[test]
    fn test_unchanged() {
        let mut cursor = cursor(10);
        assert_eq!(cursor.observe(Some(FileStat::with_size(10))), Observation::Unchanged);
    }

    #[test]
    fn test_removed_keeps_offset() {
        let mut cursor = cursor(10);
        assert_eq!(cursor.observe(None), Observation::Removed);
        assert_eq!(cursor.last_offset(), 10);
    }

    #[test]
    fn test_growth_then_advance() {
        let mut cursor = cursor(0);
        let seen = cursor.observe(Some(FileStat::with_size(25)));
        assert_eq!(seen, Observation::Grew { new_bytes: 25 });
        assert_eq!(seen.new_bytes(), 25);
        cursor.advance(20);
        assert_eq!(
            cursor.observe(Some(FileStat::with_size(25))),
            Observation::Grew { new_bytes: 5 }
        );
    }

    #[test]
    fn test_advance_is_clamped_to_observed_size() {
        let mut cursor = cursor(0);
        cursor.observe(Some(FileStat::with_size(8)));
        cursor.advance(100);
        assert_eq!(cursor.last_offset(), 8);
    }

    #[test]
    fn test_shrink_then_grow_resets_to_zero() {
        let mut cursor = cursor(50);
        assert_eq!(
            cursor.observe(Some(FileStat::with_size(5))),
            Observation::Truncated { new_bytes: 5 }
        );
        assert_eq!(cursor.last_offset(), 0);

        cursor.advance(5);
        assert_eq!(
            cursor.observe(Some(FileStat::with_size(60))),
            Observation::Grew { new_bytes: 55 }
        );
    }

    #[test]
    fn test_truncated_to_empty() {
        let mut cursor = cursor(50);
        let seen = cursor.observe(Some(FileStat::with_size(0)));
        assert_eq!(seen, Observation::Truncated { new_bytes: 0 });
        assert_eq!(seen.new_bytes(), 0);
    }

    #[test]
    fn test_identity_change_is_rotation() {
        let mut cursor = FileCursor::at_end(
            "yohoho_1.log",
            FileStat {
                size: 100,
                identity: Some(FileIdentity::new(1, 10)),
            },
        );
        let seen = cursor.observe(Some(FileStat {
            size: 200,
            identity: Some(FileIdentity::new(1, 11)),
        }));
        assert_eq!(seen, Observation::Truncated { new_bytes: 200 });

        // New identity is adopted.
        let seen = cursor.observe(Some(FileStat {
            size: 200,
            identity: Some(FileIdentity::new(1, 11)),
        }));
        assert_eq!(seen, Observation::Grew { new_bytes: 200 });
    }

    #[test]
    fn test_missing_identity_falls_back_to_size() {
        let mut cursor = FileCursor::at_end(
            "yohoho_1.log",
            FileStat {
                size: 100,
                identity: Some(FileIdentity::new(1, 10)),
            },
        );
        assert_eq!(
            cursor.observe(Some(FileStat::with_size(120))),
            Observation::Grew { new_bytes: 20 }
        );
    }

    #[test]
    fn test_stat_of_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("a.log")).unwrap();
        fs::write(&path, b"hello").unwrap();
        let stat = FileStat::of(&path).unwrap();
        assert_eq!(stat.size, 5);
        #[cfg(unix)]
        assert!(stat.identity.is_some());
    }
}
