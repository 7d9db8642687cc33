//! Default log directory discovery.
//!
//! The game client writes its logs into a per-user data directory whose
//! location depends on the platform and on how the client was installed.
//! [`find_default_log_dir`] probes the known locations in order and returns
//! the first one that actually holds a `.log` file.

use std::env;
use std::fs;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};

const VENDOR_DIR: &str = "Three Rings Design";
const GAME_DIR: &str = "Puzzle Pirates";
const CHATLOG_DIR: &str = "YPP_Chatlogs";

/// Returns the directories probed for game logs, most specific first.
///
/// Candidates whose base directory is unknown on this platform, or that are
/// not valid UTF-8, are left out.
#[must_use]
pub fn game_log_candidates() -> Vec<Utf8PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(appdata) = env::var_os("APPDATA") {
        candidates.push(PathBuf::from(appdata).join(VENDOR_DIR).join(GAME_DIR));
    }
    if let Some(local) = env::var_os("LOCALAPPDATA") {
        candidates.push(PathBuf::from(local).join(GAME_DIR));
    }
    if let Some(home) = dirs::home_dir() {
        candidates.push(
            home.join("Library")
                .join("Application Support")
                .join(VENDOR_DIR)
                .join(GAME_DIR),
        );
        candidates.push(home.join(".local").join("share").join(VENDOR_DIR).join(GAME_DIR));
    }
    if let Some(data) = dirs::data_dir() {
        candidates.push(data.join(VENDOR_DIR).join(GAME_DIR));
    }

    let mut seen = Vec::with_capacity(candidates.len());
    for path in candidates
        .into_iter()
        .filter_map(|path| Utf8PathBuf::from_path_buf(path).ok())
    {
        if !seen.contains(&path) {
            seen.push(path);
        }
    }
    seen
}

/// Returns the first existing game log directory, if any.
#[must_use]
pub fn find_default_log_dir() -> Option<Utf8PathBuf> {
    first_with_logs(game_log_candidates())
}

/// Returns the first candidate directory that contains a `.log` file.
pub fn first_with_logs<I>(candidates: I) -> Option<Utf8PathBuf>
where
    I: IntoIterator<Item = Utf8PathBuf>,
{
    candidates.into_iter().find(|dir| {
        let found = contains_log_file(dir);
        tracing::trace!(%dir, found, "probed log directory");
        found
    })
}

/// Returns `true` if `dir` is a readable directory holding a `.log` file.
#[must_use]
pub fn contains_log_file(dir: &Utf8Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        let path = entry.path();
        path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("log"))
    })
}

/// Returns the chat log directory under the user's documents folder if it
/// exists.
#[must_use]
pub fn default_chatlog_dir() -> Option<Utf8PathBuf> {
    let documents = dirs::document_dir().or_else(|| dirs::home_dir().map(|h| h.join("Documents")))?;
    let dir = Utf8PathBuf::from_path_buf(documents.join(CHATLOG_DIR)).ok()?;
    dir.is_dir().then_some(dir)
}
