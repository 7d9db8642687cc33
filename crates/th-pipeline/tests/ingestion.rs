//! End-to-end tests driving the pipeline over real files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use th_classifier::{LineClassifier, PatternRule};
use th_core::{Category, Command, Config, RuleKey, SearchEntry, TradeMode};
use th_pipeline::{
    AlertError, AlertPlayer, LogEvent, LogIngestionPipeline, RootKind, RootState,
};

const RUMBLE_LINE: &str = "2026/10/15 21:04:11:123 INFO Entering game data.BoxingObject:5(A,B)";

struct Roots {
    _dir: TempDir,
    game: Utf8PathBuf,
    chat: Utf8PathBuf,
}

fn roots() -> Roots {
    let dir = tempfile::tempdir().unwrap();
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    let game = base.join("Puzzle Pirates");
    let chat = base.join("YPP_Chatlogs");
    fs::create_dir_all(&game).unwrap();
    fs::create_dir_all(&chat).unwrap();
    Roots {
        _dir: dir,
        game,
        chat,
    }
}

fn append(path: &Utf8Path, text: &str) {
    let mut file = OpenOptions::new().create(true).append(true).open(path).unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

fn pipeline(roots: &Roots) -> LogIngestionPipeline {
    LogIngestionPipeline::new(Some(roots.game.clone()), Some(roots.chat.clone()))
}

fn modes(events: &[LogEvent]) -> Vec<&str> {
    events.iter().map(LogEvent::mode).collect()
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl AlertPlayer for Recorder {
    fn play(&mut self, sound: &str) -> Result<(), AlertError> {
        self.0.lock().unwrap().push(sound.to_owned());
        Ok(())
    }
}

#[test]
fn test_end_to_end_rumble_start() {
    let roots = roots();
    let log = roots.game.join("yohoho_1001.log");
    append(&log, "");

    let mut pipeline = pipeline(&roots);
    let (events, _) = pipeline.tick_collect();
    assert!(events.is_empty());

    append(&log, &format!("{RUMBLE_LINE}\n"));
    let (events, summary) = pipeline.tick_collect();

    assert_eq!(
        events,
        [LogEvent::Category {
            category: Category::RUMBLE_START,
            line: RUMBLE_LINE.to_owned(),
            source: RootKind::GameLog,
        }]
    );
    assert_eq!(summary.events, 1);
    assert_eq!(summary.files_read, 1);
}

#[test]
fn test_line_written_in_two_parts() {
    let roots = roots();
    let log = roots.game.join("yohoho_1001.log");
    append(&log, "");

    let mut pipeline = pipeline(&roots);
    pipeline.tick_collect();

    let (head, tail) = RUMBLE_LINE.split_at(RUMBLE_LINE.find("ta.BoxingObject").unwrap());
    append(&log, head);
    let (events, summary) = pipeline.tick_collect();
    assert!(events.is_empty());
    assert_eq!(summary.bytes_read, 0);
    assert_eq!(summary.lines, 0);

    append(&log, &format!("{tail}\n"));
    let (events, summary) = pipeline.tick_collect();
    assert_eq!(modes(&events), ["RumbleStart"]);
    assert_eq!(summary.lines, 1);
    assert_eq!(summary.bytes_read, RUMBLE_LINE.len() as u64 + 1);

    let (events, _) = pipeline.tick_collect();
    assert!(events.is_empty());
}

#[test]
fn test_no_history_replay() {
    let roots = roots();
    let log = roots.game.join("yohoho_1001.log");
    append(&log, &format!("{RUMBLE_LINE}\n{RUMBLE_LINE}\n"));
    append(&roots.chat.join("chat.txt"), "[1] Sage trade wts ci map\n");

    let mut pipeline = pipeline(&roots);
    let (events, summary) = pipeline.tick_collect();
    assert!(events.is_empty());
    assert_eq!(summary.bytes_read, 0);
    assert_eq!(summary.game.discovered, 1);
    assert_eq!(summary.chat.discovered, 1);

    let (events, _) = pipeline.tick_collect();
    assert!(events.is_empty());
}

#[test]
fn test_file_created_later_is_not_replayed() {
    let roots = roots();
    let mut pipeline = pipeline(&roots);
    pipeline.tick_collect();

    append(&roots.game.join("yohoho_2002.log"), &format!("{RUMBLE_LINE}\n"));
    let (events, summary) = pipeline.tick_collect();
    assert!(events.is_empty());
    assert_eq!(summary.game.discovered, 1);
}

#[test]
fn test_append_only_byte_accounting() {
    let roots = roots();
    let log = roots.game.join("yohoho_1001.log");
    append(&log, "header line\n");
    let initial = fs::metadata(&log).unwrap().len();

    let mut pipeline = pipeline(&roots).with_max_read_bytes(64);
    pipeline.tick_collect();

    let mut total = 0;
    for n in 0..20 {
        append(&log, &format!("line number {n} with some padding text\n"));
        total += pipeline.tick_collect().1.bytes_read;
    }
    for _ in 0..20 {
        total += pipeline.tick_collect().1.bytes_read;
    }

    let final_size = fs::metadata(&log).unwrap().len();
    assert_eq!(total, final_size - initial);
}

#[test]
fn test_truncation_then_growth_rereads_once() {
    let roots = roots();
    let log = roots.game.join("yohoho_1001.log");
    append(&log, &"old filler line\n".repeat(8));

    let mut pipeline = pipeline(&roots);
    pipeline.tick_collect();

    fs::write(&log, "").unwrap();
    let (events, summary) = pipeline.tick_collect();
    assert!(events.is_empty());
    assert_eq!(summary.game.truncated, 1);

    let content = format!("{}{RUMBLE_LINE}\n", "new filler line!\n".repeat(10));
    append(&log, &content);
    let (events, summary) = pipeline.tick_collect();
    assert_eq!(modes(&events), ["RumbleStart"]);
    assert_eq!(summary.bytes_read, content.len() as u64);

    let (events, summary) = pipeline.tick_collect();
    assert!(events.is_empty());
    assert_eq!(summary.bytes_read, 0);
}

#[test]
fn test_shrink_within_one_tick_reads_whole_file() {
    let roots = roots();
    let log = roots.game.join("yohoho_1001.log");
    append(&log, &"old filler line\n".repeat(8));

    let mut pipeline = pipeline(&roots);
    pipeline.tick_collect();

    fs::write(&log, format!("{RUMBLE_LINE}\n")).unwrap();
    let (events, _) = pipeline.tick_collect();
    assert_eq!(modes(&events), ["RumbleStart"]);
}

#[test]
fn test_vanished_file_is_dropped() {
    let roots = roots();
    let log = roots.game.join("yohoho_1001.log");
    append(&log, "x\n");

    let mut pipeline = pipeline(&roots);
    pipeline.tick_collect();
    assert_eq!(pipeline.tracked_count(RootKind::GameLog), 1);

    fs::remove_file(&log).unwrap();
    let (_, summary) = pipeline.tick_collect();
    assert_eq!(summary.game.removed, 1);
    assert_eq!(pipeline.tracked_count(RootKind::GameLog), 0);
}

#[test]
fn test_classifier_first_match_wins() {
    let roots = roots();
    let log = roots.game.join("yohoho_1001.log");
    append(&log, "");

    let rules = [
        PatternRule::new("Entering game", Category::new("Generic")).unwrap(),
        PatternRule::new("BoxingObject", Category::RUMBLE_START).unwrap(),
    ];
    let mut pipeline =
        pipeline(&roots).with_classifier(LineClassifier::new(rules.into_iter().collect()));
    pipeline.tick_collect();

    append(&log, &format!("{RUMBLE_LINE}\n"));
    let (events, _) = pipeline.tick_collect();
    assert_eq!(modes(&events), ["Generic"]);
}

#[test]
fn test_trade_inversion_from_chat_log() {
    let roots = roots();
    let log = roots.chat.join("sage_emerald_chatlog.txt");
    append(&log, "");

    let mut pipeline = pipeline(&roots);
    pipeline.apply(&Command::UpsertRule {
        key: RuleKey::new(1),
        entry: SearchEntry::new("buy maps").with_strings("ci map"),
    });
    pipeline.apply(&Command::UpsertRule {
        key: RuleKey::new(2),
        entry: SearchEntry::new("sell maps")
            .with_mode(TradeMode::Sell)
            .with_strings("ci map"),
    });
    pipeline.tick_collect();

    append(&log, "[10:00:00] Alice trade selling ci map\n");
    let (events, _) = pipeline.tick_collect();
    let hits: Vec<_> = events.iter().filter_map(LogEvent::filter_hit).collect();
    assert_eq!(hits, [(RuleKey::new(1), Some("ci map"))]);
}

#[test]
fn test_keyword_shadowing_from_chat_log() {
    let roots = roots();
    let log = roots.chat.join("chat");
    append(&log, "");

    let mut pipeline = pipeline(&roots);
    pipeline.apply(&Command::UpsertRule {
        key: RuleKey::new(1),
        entry: SearchEntry::new("freebies").with_strings("away"),
    });
    pipeline.apply(&Command::UpsertRule {
        key: RuleKey::new(2),
        entry: SearchEntry::new("charm buyers")
            .with_mode(TradeMode::Sell)
            .with_strings("charm"),
    });
    pipeline.tick_collect();

    append(&log, "[10:00:00] Alice trade giving away wtb charm\n");
    let (events, _) = pipeline.tick_collect();
    let hits: Vec<_> = events.iter().filter_map(LogEvent::filter_hit).collect();
    assert_eq!(
        hits,
        [(RuleKey::new(1), Some("away")), (RuleKey::new(2), Some("charm"))]
    );
}

#[test]
fn test_short_lines_never_match_channel_rules() {
    let roots = roots();
    let log = roots.chat.join("chat.txt");
    append(&log, "");

    let mut pipeline = pipeline(&roots);
    pipeline.apply(&Command::UpsertRule {
        key: RuleKey::new(1),
        entry: SearchEntry::new("maps").with_strings("ci map"),
    });
    pipeline.tick_collect();

    append(&log, "ci map\n\n   \nwts ci map\ncontinued ci map\r\n");
    let (events, summary) = pipeline.tick_collect();
    assert!(events.is_empty());
    assert_eq!(summary.lines, 3);
}

#[test]
fn test_filters_off_and_ignored_files() {
    let roots = roots();
    let chat = roots.chat.join("chat.txt");
    let ignored = roots.chat.join("notes.md");
    append(&chat, "");
    append(&ignored, "");

    let mut pipeline = pipeline(&roots);
    pipeline.apply(&Command::UpsertRule {
        key: RuleKey::new(1),
        entry: SearchEntry::new("maps").with_strings("ci map"),
    });
    pipeline.tick_collect();
    assert_eq!(pipeline.tracked_count(RootKind::ChatLog), 1);

    pipeline.apply(&Command::SetChatFiltersOff(true));
    append(&chat, "[1] Sage trade wts ci map\n");
    append(&ignored, "[1] Sage trade wts ci map\n");
    let (events, _) = pipeline.tick_collect();
    assert!(events.is_empty());

    pipeline.apply(&Command::SetChatFiltersOff(false));
    append(&chat, "[2] Sage trade wts ci map\n");
    let (events, _) = pipeline.tick_collect();
    assert_eq!(modes(&events), ["FilterMatch"]);
}

#[test]
fn test_game_before_chat_and_name_order() {
    let roots = roots();
    let chat = roots.chat.join("chat.txt");
    let game_b = roots.game.join("yohoho_2.log");
    let game_a = roots.game.join("yohoho_1.log");
    for path in [&chat, &game_b, &game_a] {
        append(path, "");
    }

    let mut pipeline = pipeline(&roots);
    pipeline.apply(&Command::UpsertRule {
        key: RuleKey::new(1),
        entry: SearchEntry::new("any").with_channel("").with_strings("ahoy"),
    });
    pipeline.tick_collect();

    append(&chat, "ahoy\n");
    append(&game_b, "Stopping foraging in 119 seconds\n");
    append(&game_a, "Entering game data.SwordObject:1\n");
    let (events, _) = pipeline.tick_collect();
    assert_eq!(modes(&events), ["SwordFightStart", "ForageStart", "FilterMatch"]);
}

#[test]
fn test_root_change_is_queued_until_after_scan() {
    let roots = roots();
    let old = roots.game.join("yohoho_1.log");
    append(&old, "");

    let mut pipeline = pipeline(&roots);
    pipeline.tick_collect();

    let other = roots.chat.parent().unwrap().join("Other");
    fs::create_dir_all(&other).unwrap();
    pipeline.update_log_path(Some(other.clone()));

    append(&old, &format!("{RUMBLE_LINE}\n"));
    let (events, summary) = pipeline.tick_collect();
    assert_eq!(modes(&events), ["RumbleStart"]);
    assert!(summary.root_changed);
    assert_eq!(pipeline.root(RootKind::GameLog), Some(other.as_path()));
    assert_eq!(pipeline.tracked_count(RootKind::GameLog), 0);

    pipeline.apply(&Command::SetGameLogRoot(None));
    pipeline.tick_collect();
    assert_eq!(pipeline.root_state(RootKind::GameLog), RootState::Unconfigured);
}

#[test]
fn test_missing_root_is_not_an_error() {
    let roots = roots();
    let missing = roots.game.join("not-created-yet");
    let mut pipeline = LogIngestionPipeline::new(Some(missing.clone()), None);

    let (events, summary) = pipeline.tick_collect();
    assert!(events.is_empty());
    assert_eq!(summary.read_errors, 0);

    fs::create_dir_all(&missing).unwrap();
    append(&missing.join("yohoho_5.log"), "");
    pipeline.tick_collect();
    append(&missing.join("yohoho_5.log"), &format!("{RUMBLE_LINE}\n"));
    let (events, _) = pipeline.tick_collect();
    assert_eq!(modes(&events), ["RumbleStart"]);
}

#[test]
fn test_alerts_follow_mute_switches() {
    let roots = roots();
    let log = roots.chat.join("chat.txt");
    append(&log, "");

    let recorder = Recorder::default();
    let mut pipeline = pipeline(&roots).with_alert_player(recorder.clone());
    pipeline.apply(&Command::UpsertRule {
        key: RuleKey::new(1),
        entry: SearchEntry::new("maps")
            .with_strings("ci map")
            .with_sound("horn.ogg"),
    });
    pipeline.tick_collect();

    append(&log, "[1] Sage trade wts ci map\n");
    pipeline.tick_collect();

    pipeline.apply(&Command::SetChatMute(true));
    append(&log, "[2] Sage trade wts ci map\n");
    let (events, _) = pipeline.tick_collect();
    assert_eq!(events.len(), 1);

    pipeline.apply(&Command::SetChatMute(false));
    pipeline.apply(&Command::SetRuleMuted {
        key: RuleKey::new(1),
        muted: true,
    });
    append(&log, "[3] Sage trade wts ci map\n");
    pipeline.tick_collect();

    assert_eq!(*recorder.0.lock().unwrap(), ["horn.ogg"]);
}

#[test]
fn test_from_default_config() {
    let roots = roots();
    let log = roots.chat.join("chat.txt");
    append(&log, "");

    let mut config = Config::default();
    config.paths.log_dir = Some(roots.game.clone());
    config.paths.chatlog_dir = Some(roots.chat.clone());

    let mut pipeline = LogIngestionPipeline::from_config(&config);
    pipeline.tick_collect();

    append(&log, "[21:03:44] Sage trade wts cursed isles map\n");
    let (events, _) = pipeline.tick_collect();
    let hits: Vec<_> = events.iter().filter_map(LogEvent::filter_hit).collect();
    assert_eq!(hits, [(RuleKey::new(1), Some("cursed isles"))]);
}
