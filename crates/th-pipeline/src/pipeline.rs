//! The tick-driven ingestion loop.
//!
//! [`LogIngestionPipeline`] owns one [`DirectoryWatcher`] per root, the
//! [`LineClassifier`], the [`ChatFilterEngine`] and the [`AlertRouter`]. A
//! host calls [`tick`](LogIngestionPipeline::tick) on a fixed interval; the
//! pipeline never spawns threads or sleeps.
//!
//! # Tick Sequence
//!
//! ```text
//! tick(emit)
//!   │
//!   ├─ game root: poll ─► consume each delta ─► classify lines ─► emit
//!   │
//!   ├─ chat root: poll ─► consume each delta ─► classify lines ─► emit
//!   │                                        └► filter lines ───► alert, emit
//!   │
//!   └─ commit queued root changes (game, then chat)
//! ```
//!
//! Root changes requested between or during ticks never affect the scan in
//! progress; they are applied once both roots have been scanned.

use camino::{Utf8Path, Utf8PathBuf};
use th_classifier::{ChatFilterEngine, LineClassifier};
use th_core::{Command, Config};
use th_watcher::{
    ChatLogFilter, DirectoryWatcher, FileFilter, GameLogFilter, RootState, ScanStats,
};

use crate::alert::{AlertPlayer, AlertRouter};
use crate::events::{LogEvent, RootKind};
use crate::stats::TickSummary;

/// Default per-file read cap for one tick.
pub const DEFAULT_MAX_READ_BYTES: u64 = 1024 * 1024;

/// Tails the game and chat log roots and turns new lines into events.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::io::Write;
///
/// use camino::Utf8PathBuf;
/// use th_pipeline::LogIngestionPipeline;
///
/// let dir = tempfile::tempdir()?;
/// let root = Utf8PathBuf::try_from(dir.path().to_path_buf())?;
/// let log = root.join("yohoho_1001.log");
/// std::fs::write(&log, "")?;
///
/// let mut pipeline = LogIngestionPipeline::new(Some(root), None);
/// pipeline.tick(|_| {}); // registers the file at its current size
///
/// let mut file = std::fs::OpenOptions::new().append(true).open(&log)?;
/// writeln!(file, "Entering game data.BoxingObject:5(A,B)")?;
///
/// let mut modes = Vec::new();
/// pipeline.tick(|event| modes.push(event.mode().to_owned()));
/// assert_eq!(modes, ["RumbleStart"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LogIngestionPipeline {
    game: DirectoryWatcher<GameLogFilter>,
    chat: DirectoryWatcher<ChatLogFilter>,
    classifier: LineClassifier,
    filters: ChatFilterEngine,
    alerts: AlertRouter,
    max_read_bytes: u64,
}

impl LogIngestionPipeline {
    /// Creates a pipeline with the built-in pattern table and no chat rules.
    ///
    /// The given roots take effect immediately.
    #[must_use]
    pub fn new(game_root: Option<Utf8PathBuf>, chat_root: Option<Utf8PathBuf>) -> Self {
        Self {
            game: DirectoryWatcher::with_root(game_root, GameLogFilter::default()),
            chat: DirectoryWatcher::with_root(chat_root, ChatLogFilter),
            classifier: LineClassifier::builtin(),
            filters: ChatFilterEngine::new(),
            alerts: AlertRouter::new(),
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
        }
    }

    /// Creates a pipeline from a settings snapshot.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let mut alerts = AlertRouter::new();
        alerts.set_muted(config.chat.mute);
        Self {
            game: DirectoryWatcher::with_root(
                config.paths.log_dir.clone(),
                GameLogFilter::from_config(&config.paths),
            ),
            chat: DirectoryWatcher::with_root(config.paths.chatlog_dir.clone(), ChatLogFilter),
            classifier: LineClassifier::builtin(),
            filters: ChatFilterEngine::from_config(&config.chat),
            alerts,
            max_read_bytes: config.poll.max_read_bytes.max(1),
        }
    }

    /// Replaces the line classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: LineClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replaces the chat filter engine.
    #[must_use]
    pub fn with_filters(mut self, filters: ChatFilterEngine) -> Self {
        self.filters = filters;
        self
    }

    /// Installs the player used for chat alerts.
    #[must_use]
    pub fn with_alert_player(mut self, player: impl AlertPlayer + 'static) -> Self {
        self.alerts.set_player(Some(Box::new(player)));
        self
    }

    /// Sets the per-file read cap for one tick. Zero is treated as one byte.
    #[must_use]
    pub const fn with_max_read_bytes(mut self, max_read_bytes: u64) -> Self {
        self.max_read_bytes = if max_read_bytes == 0 {
            1
        } else {
            max_read_bytes
        };
        self
    }

    // =========================================================================
    // Roots
    // =========================================================================

    /// Queues a new game log root, applied after the next tick's scans.
    pub fn update_log_path(&mut self, root: Option<Utf8PathBuf>) {
        self.game.request_root(root);
    }

    /// Queues a new chat log root, applied after the next tick's scans.
    pub fn update_chatlog_path(&mut self, root: Option<Utf8PathBuf>) {
        self.chat.request_root(root);
    }

    /// Returns the active root of `kind`.
    #[must_use]
    pub fn root(&self, kind: RootKind) -> Option<&Utf8Path> {
        match kind {
            RootKind::GameLog => self.game.root(),
            RootKind::ChatLog => self.chat.root(),
        }
    }

    /// Returns the scan state of `kind`.
    #[must_use]
    pub const fn root_state(&self, kind: RootKind) -> RootState {
        match kind {
            RootKind::GameLog => self.game.state(),
            RootKind::ChatLog => self.chat.state(),
        }
    }

    /// Returns the number of files tracked under `kind`.
    #[must_use]
    pub fn tracked_count(&self, kind: RootKind) -> usize {
        match kind {
            RootKind::GameLog => self.game.tracked_count(),
            RootKind::ChatLog => self.chat.tracked_count(),
        }
    }

    // =========================================================================
    // Rules and switches
    // =========================================================================

    /// Returns the chat filter engine.
    #[inline]
    #[must_use]
    pub const fn filters(&self) -> &ChatFilterEngine {
        &self.filters
    }

    /// Returns the chat filter engine for direct edits.
    #[inline]
    pub fn filters_mut(&mut self) -> &mut ChatFilterEngine {
        &mut self.filters
    }

    /// Returns the line classifier.
    #[inline]
    #[must_use]
    pub const fn classifier(&self) -> &LineClassifier {
        &self.classifier
    }

    /// Returns the alert router.
    #[inline]
    #[must_use]
    pub const fn alerts(&self) -> &AlertRouter {
        &self.alerts
    }

    /// Applies a host command to the live state.
    ///
    /// Returns `false` if the command referred to an unknown rule or is not
    /// handled by the pipeline.
    pub fn apply(&mut self, command: &Command) -> bool {
        tracing::debug!(?command, "applying command");
        match command {
            Command::SetGameLogRoot(root) => {
                self.update_log_path(root.clone());
                true
            }
            Command::SetChatLogRoot(root) => {
                self.update_chatlog_path(root.clone());
                true
            }
            Command::SetChatFiltersOff(off) => {
                self.filters.set_filters_off(*off);
                true
            }
            Command::SetChatMute(muted) => {
                self.alerts.set_muted(*muted);
                true
            }
            Command::UpsertRule { key, entry } => {
                self.filters.upsert(*key, entry.clone());
                true
            }
            Command::RemoveRule(key) => self.filters.remove(*key).is_some(),
            Command::SetRuleEnabled { key, enabled } => self.filters.set_enabled(*key, *enabled),
            Command::SetRuleMuted { key, muted } => self.filters.set_muted(*key, *muted),
            _ => false,
        }
    }

    // =========================================================================
    // Ticking
    // =========================================================================

    /// Runs one scan cycle, delivering events to `emit` as lines are read.
    ///
    /// Game lines are handled before chat lines; within a root, files are
    /// handled in name order and lines in file order. Audible chat hits are
    /// handed to the alert player before their event is delivered.
    pub fn tick(&mut self, mut emit: impl FnMut(LogEvent)) -> TickSummary {
        let mut summary = TickSummary::default();
        let mut events = 0;
        let Self {
            game,
            chat,
            classifier,
            filters,
            alerts,
            max_read_bytes,
        } = self;
        let cap = *max_read_bytes;
        let (classifier, filters) = (&*classifier, &*filters);

        let mut deliver = |event: LogEvent| {
            alerts.route(&event, filters);
            events += 1;
            emit(event);
        };

        let game_stats = drain(game, RootKind::GameLog, cap, &mut summary, |line| {
            classify_game_line(classifier, line, &mut deliver);
        });
        let chat_stats = drain(chat, RootKind::ChatLog, cap, &mut summary, |line| {
            classify_chat_line(classifier, filters, line, &mut deliver);
        });

        summary.game = game_stats;
        summary.chat = chat_stats;
        summary.events = events;

        let game_changed = game.commit_pending_root();
        let chat_changed = chat.commit_pending_root();
        summary.root_changed = game_changed || chat_changed;

        if !summary.is_idle() {
            tracing::debug!(
                files = summary.files_read,
                bytes = summary.bytes_read,
                lines = summary.lines,
                events = summary.events,
                "tick"
            );
        }
        summary
    }

    /// Runs one scan cycle and collects its events.
    pub fn tick_collect(&mut self) -> (Vec<LogEvent>, TickSummary) {
        let mut events = Vec::new();
        let summary = self.tick(|event| events.push(event));
        (events, summary)
    }

    /// Classifies one line as if it had been read from `kind`.
    ///
    /// Alerts are not played. Useful for replaying a whole file offline.
    pub fn classify_line(&self, kind: RootKind, line: &str, mut emit: impl FnMut(LogEvent)) {
        match kind {
            RootKind::GameLog => classify_game_line(&self.classifier, line, &mut emit),
            RootKind::ChatLog => {
                classify_chat_line(&self.classifier, &self.filters, line, &mut emit);
            }
        }
    }
}

/// Polls one root and feeds every new line to `on_line`.
fn drain<F: FileFilter>(
    watcher: &mut DirectoryWatcher<F>,
    kind: RootKind,
    cap: u64,
    summary: &mut TickSummary,
    mut on_line: impl FnMut(&str),
) -> ScanStats {
    let batch = watcher.poll();
    for delta in &batch {
        if delta.truncated {
            tracing::info!(%kind, file = %delta.name, "log truncated, rereading from start");
        }
        match watcher.consume(delta, cap) {
            Ok(chunk) if chunk.is_empty() => {}
            Ok(chunk) => {
                summary.files_read += 1;
                summary.bytes_read += chunk.consumed;
                tracing::trace!(%kind, file = %delta.name, bytes = chunk.consumed, "read delta");
                for line in chunk.lines() {
                    summary.lines += 1;
                    on_line(line);
                }
            }
            Err(err) => {
                summary.read_errors += 1;
                if err.is_recoverable() {
                    tracing::debug!(%kind, error = %err, "no data this tick");
                } else {
                    tracing::warn!(%kind, error = %err, "log read failed");
                }
            }
        }
    }
    batch.stats
}

fn classify_game_line(
    classifier: &LineClassifier,
    line: &str,
    deliver: &mut impl FnMut(LogEvent),
) {
    if let Some(category) = classifier.classify(line) {
        deliver(LogEvent::Category {
            category: category.clone(),
            line: line.to_owned(),
            source: RootKind::GameLog,
        });
    }
}

fn classify_chat_line(
    classifier: &LineClassifier,
    filters: &ChatFilterEngine,
    line: &str,
    deliver: &mut impl FnMut(LogEvent),
) {
    if let Some(category) = classifier.classify(line) {
        deliver(LogEvent::Category {
            category: category.clone(),
            line: line.to_owned(),
            source: RootKind::ChatLog,
        });
    }
    for hit in filters.evaluate(line) {
        deliver(LogEvent::FilterMatch {
            line: line.to_owned(),
            key: hit.key,
            term: hit.term,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::fs::OpenOptions;
    use std::io::Write;

    use th_core::{RuleKey, SearchEntry};

    use super::*;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    fn append(path: &Utf8Path, text: &str) {
        let mut file = OpenOptions::new().create(true).append(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn test_unconfigured_roots_tick_quietly() {
        let mut pipeline = LogIngestionPipeline::new(None, None);
        let (events, summary) = pipeline.tick_collect();
        assert!(events.is_empty());
        assert!(summary.is_idle());
        assert_eq!(pipeline.root_state(RootKind::GameLog), RootState::Unconfigured);
        assert_eq!(pipeline.root_state(RootKind::ChatLog), RootState::Unconfigured);
    }

    #[test]
    fn test_root_change_applies_after_tick() {
        let (_dir, root) = temp_root();
        let mut pipeline = LogIngestionPipeline::new(None, None);
        assert!(pipeline.apply(&Command::SetGameLogRoot(Some(root.clone()))));
        assert_eq!(pipeline.root(RootKind::GameLog), None);

        let (_, summary) = pipeline.tick_collect();
        assert!(summary.root_changed);
        assert_eq!(pipeline.root(RootKind::GameLog), Some(root.as_path()));
        assert_eq!(pipeline.root_state(RootKind::GameLog), RootState::Idle);
    }

    #[test]
    fn test_chat_line_emits_category_then_matches() {
        let mut pipeline = LogIngestionPipeline::new(None, None);
        pipeline.apply(&Command::UpsertRule {
            key: RuleKey::new(1),
            entry: SearchEntry::new("forage").with_channel("").with_strings("foraging"),
        });

        let mut modes = Vec::new();
        pipeline.classify_line(RootKind::ChatLog, "Stopping foraging in 119 seconds", |e| {
            modes.push(e.mode().to_owned());
        });
        assert_eq!(modes, ["ForageStart", "FilterMatch"]);
    }

    #[test]
    fn test_game_lines_never_filtered() {
        let mut pipeline = LogIngestionPipeline::new(None, None);
        pipeline.apply(&Command::UpsertRule {
            key: RuleKey::new(1),
            entry: SearchEntry::new("any").with_channel("").with_strings("boxing"),
        });
        let mut events = Vec::new();
        pipeline.classify_line(RootKind::GameLog, "Entering game data.BoxingObject:1", |e| {
            events.push(e);
        });
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].mode(), "RumbleStart");
    }

    #[test]
    fn test_apply_rule_commands() {
        let mut pipeline = LogIngestionPipeline::new(None, None);
        let key = RuleKey::new(7);
        assert!(!pipeline.apply(&Command::RemoveRule(key)));
        assert!(!pipeline.apply(&Command::SetRuleEnabled { key, enabled: false }));

        pipeline.apply(&Command::UpsertRule {
            key,
            entry: SearchEntry::new("maps").with_strings("ci map"),
        });
        assert!(pipeline.apply(&Command::SetRuleMuted { key, muted: true }));
        assert!(pipeline.filters().rule(key).is_some_and(|rule| rule.muted));

        assert!(pipeline.apply(&Command::SetChatFiltersOff(true)));
        assert!(pipeline.filters().filters_off());

        assert!(pipeline.apply(&Command::SetChatMute(true)));
        assert!(pipeline.alerts().muted());

        assert!(pipeline.apply(&Command::RemoveRule(key)));
        assert!(pipeline.filters().is_empty());
    }

    #[test]
    fn test_read_cap_spreads_delta_over_ticks() {
        let (_dir, root) = temp_root();
        let log = root.join("yohoho_7.log");
        append(&log, "");

        let mut pipeline =
            LogIngestionPipeline::new(Some(root), None).with_max_read_bytes(16);
        pipeline.tick_collect();

        append(&log, "first line\nsecond line\n");
        let (_, first) = pipeline.tick_collect();
        assert_eq!(first.bytes_read, 11);
        assert_eq!(first.lines, 1);

        let (_, second) = pipeline.tick_collect();
        assert_eq!(second.bytes_read, 12);
        assert_eq!(second.lines, 1);

        let (_, third) = pipeline.tick_collect();
        assert_eq!(third.bytes_read, 0);
    }

    #[test]
    fn test_from_config_uses_paths_and_rules() {
        let (_dir, root) = temp_root();
        let mut config = Config::default();
        config.paths.chatlog_dir = Some(root.clone());
        config.chat.mute = true;

        let pipeline = LogIngestionPipeline::from_config(&config);
        assert_eq!(pipeline.root(RootKind::ChatLog), Some(root.as_path()));
        assert_eq!(pipeline.root(RootKind::GameLog), config.paths.log_dir.as_deref());
        assert_eq!(pipeline.filters().len(), config.chat.rules.len());
        assert!(pipeline.alerts().muted());
    }
}
