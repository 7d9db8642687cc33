//! Error types for the th-watcher crate.
//!
//! This module provides the [`WatchError`] type for errors that can occur
//! while scanning a log directory or reading a file delta.

use std::io;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};

/// Errors that can occur while scanning directories or reading deltas.
///
/// None of these stop the poll loop. A failed scan or read yields no data
/// for that tick, and the next tick tries again.
///
/// # Error Recovery Strategy
///
/// - **Missing files** ([`WatchError::is_not_found`]): expected while a log
///   is rotated; the cursor is dropped on the next scan
/// - **Locked files** (permission denied, sharing violations): transient,
///   the cursor is kept and retried
/// - **Non-UTF-8 names** ([`WatchError::NonUtf8Path`]): the entry is skipped
///
/// # Examples
///
/// ```
/// use std::io;
/// use th_watcher::WatchError;
///
/// let err = WatchError::read("logs/yohoho_1.log", io::ErrorKind::NotFound.into());
/// assert!(err.is_not_found());
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The root directory could not be listed.
    #[error("failed to list directory '{path}': {source}")]
    ReadDir {
        /// The directory being listed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A tracked file's metadata could not be read.
    #[error("failed to stat '{path}': {source}")]
    Stat {
        /// The file being inspected.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The new bytes of a file could not be read.
    #[error("failed to read '{path}': {source}")]
    Read {
        /// The file being read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A directory entry name is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(PathBuf),
}

impl WatchError {
    /// Creates a new [`WatchError::ReadDir`] error.
    #[inline]
    pub fn read_dir(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::ReadDir {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`WatchError::Stat`] error.
    #[inline]
    pub fn stat(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Stat {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`WatchError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Returns the underlying I/O error kind, if any.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::ReadDir { source, .. } | Self::Stat { source, .. } | Self::Read { source, .. } => {
                Some(source.kind())
            }
            Self::NonUtf8Path(_) => None,
        }
    }

    /// Returns `true` if the path vanished.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::NotFound)
    }

    /// Returns `true` if the condition is expected to clear on its own.
    ///
    /// Missing and locked files are normal while the game rotates or holds
    /// its logs open. Anything else is still retried but worth a warning.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self.io_kind() {
            None => true,
            Some(kind) => matches!(
                kind,
                io::ErrorKind::NotFound
                    | io::ErrorKind::PermissionDenied
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
            ),
        }
    }

    /// Returns the path associated with this error, if it is UTF-8.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            Self::ReadDir { path, .. } | Self::Stat { path, .. } | Self::Read { path, .. } => {
                Some(path)
            }
            Self::NonUtf8Path(_) => None,
        }
    }
}
