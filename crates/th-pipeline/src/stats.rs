//! Per-tick counters.

use serde::{Deserialize, Serialize};
use th_watcher::ScanStats;

/// What one [`tick`](crate::LogIngestionPipeline::tick) did.
///
/// # Examples
///
/// ```
/// use th_pipeline::TickSummary;
///
/// let summary = TickSummary::default();
/// assert!(summary.is_idle());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// Files whose new bytes were read.
    pub files_read: usize,

    /// Raw bytes consumed across all files.
    pub bytes_read: u64,

    /// Non-blank lines seen.
    pub lines: usize,

    /// Events delivered to the callback.
    pub events: usize,

    /// Reads that failed and will be retried.
    pub read_errors: usize,

    /// Scan counters for the game log root.
    pub game: ScanStats,

    /// Scan counters for the chat log root.
    pub chat: ScanStats,

    /// `true` if a queued root change was applied after the scans.
    pub root_changed: bool,
}

impl TickSummary {
    /// Returns `true` if the tick read nothing and changed nothing.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.bytes_read == 0
            && self.read_errors == 0
            && !self.root_changed
            && self.game.discovered == 0
            && self.game.removed == 0
            && self.chat.discovered == 0
            && self.chat.removed == 0
    }

    /// Adds another summary's counters into this one.
    pub fn merge(&mut self, other: &Self) {
        self.files_read += other.files_read;
        self.bytes_read += other.bytes_read;
        self.lines += other.lines;
        self.events += other.events;
        self.read_errors += other.read_errors;
        self.root_changed |= other.root_changed;
        self.game = other.game;
        self.chat = other.chat;
    }
}
