//! File name filters for directory scans.
//!
//! A [`DirectoryWatcher`](crate::DirectoryWatcher) only tracks entries whose
//! file name passes its [`FileFilter`]. The two log families use different
//! naming conventions:
//!
//! - Game logs are `<prefix>_<digits>.log`, see [`GameLogFilter`]
//! - Chat logs have no extension or a `.txt` extension, see [`ChatLogFilter`]
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use th_watcher::{ChatLogFilter, FileFilter, GameLogFilter};
//!
//! let game = GameLogFilter::default();
//! assert!(game.should_process(Utf8Path::new("yohoho_1001.log")));
//! assert!(!game.should_process(Utf8Path::new("yohoho_latest.log")));
//!
//! let chat = ChatLogFilter;
//! assert!(chat.should_process(Utf8Path::new("Sage_chatlog")));
//! assert!(chat.should_process(Utf8Path::new("Sage_chatlog.TXT")));
//! assert!(!chat.should_process(Utf8Path::new("Sage_chatlog.bak")));
//! ```

use camino::Utf8Path;
use th_core::PathsConfig;

/// A predicate deciding which directory entries are tracked.
///
/// Filters receive the entry's file name relative to the watched root.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use th_watcher::FileFilter;
///
/// struct OnlyToday;
///
/// impl FileFilter for OnlyToday {
///     fn should_process(&self, path: &Utf8Path) -> bool {
///         path.as_str().contains("2026-10-15")
///     }
/// }
///
/// assert!(OnlyToday.should_process(Utf8Path::new("chat_2026-10-15.txt")));
/// ```
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if the entry should be tracked.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// A filter that accepts every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllFilter;

impl FileFilter for AcceptAllFilter {
    #[inline]
    fn should_process(&self, _path: &Utf8Path) -> bool {
        true
    }
}

/// Accepts game client logs named `<prefix>_<digits>.log`.
///
/// The extension is matched case-insensitively; the prefix is matched
/// exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLogFilter {
    prefix: String,
}

impl GameLogFilter {
    /// Creates a filter for the given file name prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Creates a filter using the configured prefix.
    #[must_use]
    pub fn from_config(config: &PathsConfig) -> Self {
        Self::new(config.game_log_prefix.as_str())
    }

    /// Returns the file name prefix.
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for GameLogFilter {
    fn default() -> Self {
        Self::from_config(&PathsConfig::default())
    }
}

impl FileFilter for GameLogFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let Some(stem) = name
            .len()
            .checked_sub(4)
            .filter(|&split| name.is_char_boundary(split))
            .filter(|&split| name[split..].eq_ignore_ascii_case(".log"))
            .map(|split| &name[..split])
        else {
            return false;
        };
        let Some(id) = stem
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            return false;
        };
        !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Accepts chat logs: files with no extension or a `.txt` extension.
///
/// A leading dot does not start an extension, so `.notes` counts as having
/// none and is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatLogFilter;

impl FileFilter for ChatLogFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        if path.file_name().is_none() {
            return false;
        }
        path.extension()
            .is_none_or(|ext| ext.eq_ignore_ascii_case("txt"))
    }
}

impl<F: FileFilter + ?Sized> FileFilter for Box<F> {
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}

impl<F: FileFilter + ?Sized> FileFilter for std::sync::Arc<F> {
    fn should_process(&self, path: &Utf8Path) -> bool {
        (**self).should_process(path)
    }
}
