//! Polling directory watcher.
//!
//! [`DirectoryWatcher`] lists one root directory on every poll, keeps a
//! [`FileCursor`] per matching file and reports which files have unread
//! bytes. It never reads file contents itself; the caller pulls each delta
//! through [`DirectoryWatcher::consume`] so that cursors only advance by what
//! was actually read.
//!
//! # Root Changes
//!
//! The root can be replaced at any time with [`request_root`], but the change
//! is held as pending until [`commit_pending_root`] runs at the end of a scan
//! cycle. A committed change drops every cursor of the old root, since file
//! names are relative and an old offset must never be applied to a
//! same-named file elsewhere.
//!
//! [`request_root`]: DirectoryWatcher::request_root
//! [`commit_pending_root`]: DirectoryWatcher::commit_pending_root

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::cursor::{FileCursor, FileStat, Observation};
use crate::error::WatchError;
use crate::events::{DeltaBatch, FileDelta, ScanStats};
use crate::filter::FileFilter;
use crate::reader::{Chunk, read_delta};

/// Lifecycle state of a watched root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootState {
    /// No root directory is set.
    Unconfigured,
    /// A root is set and no scan is running.
    Idle,
    /// A scan of the root is in progress.
    Scanning,
}

impl fmt::Display for RootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconfigured => "unconfigured",
            Self::Idle => "idle",
            Self::Scanning => "scanning",
        })
    }
}

/// Tracks the files of one directory by polling.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::fs;
/// use std::io::Write;
/// use camino::Utf8PathBuf;
/// use th_watcher::{DirectoryWatcher, GameLogFilter};
///
/// let dir = tempfile::tempdir()?;
/// let root = Utf8PathBuf::try_from(dir.path().to_path_buf())?;
/// fs::write(root.join("yohoho_1001.log"), "old history\n")?;
///
/// let mut watcher = DirectoryWatcher::with_root(Some(root.clone()), GameLogFilter::default());
///
/// // First sight: history is skipped.
/// assert!(watcher.scan().is_empty());
///
/// fs::OpenOptions::new()
///     .append(true)
///     .open(root.join("yohoho_1001.log"))?
///     .write_all(b"fresh\n")?;
///
/// let batch = watcher.scan();
/// assert_eq!(batch.len(), 1);
/// let delta = &batch.deltas[0];
/// let chunk = watcher.consume(delta, 1024)?;
/// assert_eq!(chunk.text, "fresh\n");
/// # Ok(())
/// # }
/// ```
pub struct DirectoryWatcher<F> {
    root: Option<Utf8PathBuf>,
    pending_root: Option<Option<Utf8PathBuf>>,
    cursors: BTreeMap<String, FileCursor>,
    filter: F,
    state: RootState,
}

impl<F> fmt::Debug for DirectoryWatcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryWatcher")
            .field("root", &self.root)
            .field("pending_root", &self.pending_root)
            .field("tracked", &self.cursors.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<F: FileFilter> DirectoryWatcher<F> {
    /// Creates an unconfigured watcher.
    #[must_use]
    pub fn new(filter: F) -> Self {
        Self::with_root(None, filter)
    }

    /// Creates a watcher with an initial root.
    #[must_use]
    pub fn with_root(root: Option<Utf8PathBuf>, filter: F) -> Self {
        let state = if root.is_some() {
            RootState::Idle
        } else {
            RootState::Unconfigured
        };
        Self {
            root,
            pending_root: None,
            cursors: BTreeMap::new(),
            filter,
            state,
        }
    }

    /// Returns the active root directory.
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<&Utf8Path> {
        self.root.as_deref()
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> RootState {
        self.state
    }

    /// Returns the file name filter.
    #[inline]
    #[must_use]
    pub const fn filter(&self) -> &F {
        &self.filter
    }

    /// Returns the cursor tracking `name`, if any.
    #[must_use]
    pub fn cursor(&self, name: &str) -> Option<&FileCursor> {
        self.cursors.get(name)
    }

    /// Returns the tracked files in name order.
    pub fn tracked(&self) -> impl Iterator<Item = (&str, &FileCursor)> {
        self.cursors.iter().map(|(name, cursor)| (name.as_str(), cursor))
    }

    /// Returns the number of tracked files.
    #[inline]
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.cursors.len()
    }

    /// Returns the root waiting to be committed, if a change is pending.
    ///
    /// The outer `Option` is whether a change is pending; the inner one is
    /// the requested root, where `None` clears it.
    #[must_use]
    pub fn pending_root(&self) -> Option<Option<&Utf8Path>> {
        self.pending_root.as_ref().map(Option::as_deref)
    }

    /// Queues a root change to be applied at the end of the scan cycle.
    ///
    /// A later request replaces an earlier one that was not committed yet.
    pub fn request_root(&mut self, root: Option<Utf8PathBuf>) {
        tracing::debug!(root = ?root, "root change requested");
        self.pending_root = Some(root);
    }

    /// Applies a pending root change.
    ///
    /// Returns `true` if a change was pending.
    pub fn commit_pending_root(&mut self) -> bool {
        match self.pending_root.take() {
            Some(root) => {
                self.set_root(root);
                true
            }
            None => false,
        }
    }

    /// Replaces the root immediately.
    ///
    /// Setting the same root again keeps the existing cursors.
    pub fn set_root(&mut self, root: Option<Utf8PathBuf>) {
        if root == self.root {
            return;
        }
        tracing::info!(
            old = ?self.root,
            new = ?root,
            dropped = self.cursors.len(),
            "log root changed"
        );
        self.cursors.clear();
        self.state = if root.is_some() {
            RootState::Idle
        } else {
            RootState::Unconfigured
        };
        self.root = root;
    }

    /// Scans the root and then applies any pending root change.
    pub fn scan(&mut self) -> DeltaBatch {
        let batch = self.poll();
        self.commit_pending_root();
        batch
    }

    /// Scans the root without applying pending root changes.
    ///
    /// New matching files are registered at their current size, every
    /// tracked file is observed, vanished files are dropped and files with
    /// unread bytes are returned in name order. An unset or missing root
    /// yields an empty batch.
    pub fn poll(&mut self) -> DeltaBatch {
        let mut batch = DeltaBatch::new();
        let Some(root) = self.root.clone() else {
            self.state = RootState::Unconfigured;
            return batch;
        };

        self.state = RootState::Scanning;
        match self.discover(&root, &mut batch.stats) {
            Ok(()) => self.observe_tracked(&mut batch),
            Err(err) if err.is_not_found() => {
                tracing::trace!(%root, "log root does not exist yet");
            }
            Err(err) => {
                tracing::debug!(error = %err, "skipping scan");
            }
        }
        batch.stats.tracked = self.cursors.len();
        self.state = RootState::Idle;
        batch
    }

    /// Reads the unread bytes described by `delta` and advances its cursor.
    ///
    /// At most `cap` bytes are read; the rest is reported again by the next
    /// poll. Calling this again for the same delta reads only what is left.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Read`] if the file cannot be read. The cursor is
    /// left untouched.
    pub fn consume(&mut self, delta: &FileDelta, cap: u64) -> Result<Chunk, WatchError> {
        let Some(cursor) = self.cursors.get_mut(&delta.name) else {
            return Ok(Chunk::default());
        };
        let available = delta.end_offset().saturating_sub(cursor.last_offset());
        let chunk = read_delta(cursor.path(), cursor.last_offset(), available, cap)?;
        cursor.advance(chunk.consumed);
        Ok(chunk)
    }

    /// Registers matching files not yet tracked.
    fn discover(&mut self, root: &Utf8Path, stats: &mut ScanStats) -> Result<(), WatchError> {
        let entries = fs::read_dir(root).map_err(|err| WatchError::read_dir(root, err))?;

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::trace!(%root, error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    let err = WatchError::NonUtf8Path(root.as_std_path().join(raw));
                    tracing::debug!(error = %err, "skipping entry");
                    continue;
                }
            };
            if self.cursors.contains_key(&name) || !self.filter.should_process(Utf8Path::new(&name))
            {
                continue;
            }

            let path = root.join(&name);
            let metadata = match fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(err) => {
                    tracing::trace!(%path, error = %err, "cannot stat new entry yet");
                    continue;
                }
            };
            let stat = FileStat::from_metadata(&metadata);
            tracing::debug!(%path, size = stat.size, "tracking new file");
            self.cursors.insert(name, FileCursor::at_end(path, stat));
            stats.discovered += 1;
        }
        Ok(())
    }

    /// Observes every tracked file, pruning vanished ones.
    fn observe_tracked(&mut self, batch: &mut DeltaBatch) {
        self.cursors.retain(|name, cursor| {
            let stat = match FileStat::of(cursor.path()) {
                Ok(stat) => Some(stat),
                Err(err) if err.kind() == io::ErrorKind::NotFound => None,
                Err(err) => {
                    let err = WatchError::stat(cursor.path(), err);
                    tracing::debug!(error = %err, "keeping cursor, no data this tick");
                    return true;
                }
            };

            let observation = cursor.observe(stat);
            match observation {
                Observation::Removed => {
                    tracing::debug!(path = %cursor.path(), "file vanished, dropping cursor");
                    batch.stats.removed += 1;
                    return false;
                }
                Observation::Unchanged => {}
                Observation::Grew { new_bytes } | Observation::Truncated { new_bytes } => {
                    let truncated = matches!(observation, Observation::Truncated { .. });
                    if truncated {
                        batch.stats.truncated += 1;
                    }
                    if new_bytes > 0 {
                        batch.stats.changed += 1;
                        batch.push(FileDelta {
                            name: name.clone(),
                            path: cursor.path().to_path_buf(),
                            offset: cursor.last_offset(),
                            new_bytes,
                            truncated,
                        });
                    }
                }
            }
            true
        });
    }
}
