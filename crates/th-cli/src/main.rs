//! CLI entry point for the Thalassa log core.
//!
//! This binary tails the Puzzle Pirates game and chat logs, prints the
//! recognised events and rings the terminal bell for chat filter hits.
//!
//! # Usage
//!
//! ```bash
//! thalassa [OPTIONS] <COMMAND>
//!
//! # Tail both log directories until Ctrl-C
//! thalassa watch --log-dir "$HOME/.local/share/Three Rings Design/Puzzle Pirates"
//!
//! # Run an existing chat log through the filters once
//! thalassa classify --kind chat ~/Documents/YPP_Chatlogs/sage_emerald.txt
//!
//! # Manage chat filter rules
//! thalassa rules add "Kraken ink" --strings "kraken ink | ink"
//! thalassa rules list
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{WrapErr, bail, eyre};
use th_classifier::ChatFilterEngine;
use th_core::{Command, Config, MatchKind, RuleKey, SearchEntry, TradeMode, paths};
use th_pipeline::{AlertError, AlertPlayer, LogEvent, LogIngestionPipeline, RootKind};
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Log tailing and chat alerts for Puzzle Pirates.
///
/// Watches the game client log and chat log directories, reports game state
/// transitions and chat lines matching your trade searches.
#[derive(Parser)]
#[command(name = "thalassa", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Settings file to use.
    ///
    /// Defaults to `<config dir>/thalassa/settings.json`.
    #[arg(short, long, global = true, env = "THALASSA_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Game client log directory (overrides the settings file).
    #[arg(long, global = true, env = "THALASSA_LOG_DIR")]
    log_dir: Option<Utf8PathBuf>,

    /// Chat log directory (overrides the settings file).
    #[arg(long, global = true, env = "THALASSA_CHATLOG_DIR")]
    chatlog_dir: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Tail both log directories and print events until interrupted.
    Watch {
        /// Poll interval in milliseconds (overrides the settings file).
        #[arg(long, env = "THALASSA_INTERVAL_MS")]
        interval_ms: Option<u64>,

        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,

        /// Do not ring the terminal bell on chat filter hits.
        #[arg(long)]
        no_bell: bool,
    },

    /// Run the whole content of one log file through the classifiers.
    Classify {
        /// Log file to read.
        file: Utf8PathBuf,

        /// Which classifiers to apply.
        #[arg(short, long, value_enum, default_value_t = KindArg::Game)]
        kind: KindArg,

        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,
    },

    /// List and edit chat filter rules.
    #[command(subcommand)]
    Rules(RulesCommand),

    /// Inspect or create the settings file.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Rule subcommands.
#[derive(Subcommand)]
enum RulesCommand {
    /// List every rule.
    List,

    /// Add a new rule.
    Add(AddRule),

    /// Delete a rule.
    Remove {
        /// Key of the rule.
        key: u32,
    },

    /// Enable a rule.
    Enable {
        /// Key of the rule.
        key: u32,
    },

    /// Disable a rule without deleting it.
    Disable {
        /// Key of the rule.
        key: u32,
    },

    /// Silence a rule's alert sound.
    Mute {
        /// Key of the rule.
        key: u32,
    },

    /// Restore a rule's alert sound.
    Unmute {
        /// Key of the rule.
        key: u32,
    },
}

/// Arguments for `rules add`.
#[derive(Args)]
struct AddRule {
    /// Display name of the rule.
    name: String,

    /// Terms to search for, separated by `|`.
    #[arg(long, conflicts_with = "regex", required_unless_present = "regex")]
    strings: Option<String>,

    /// Regular expression searched against the lowercased line.
    #[arg(long)]
    regex: Option<String>,

    /// Chat channel the rule is limited to; empty for every channel.
    #[arg(long, default_value = "trade")]
    channel: String,

    /// Trade side you are on.
    #[arg(long, value_enum, default_value_t = ModeArg::Buy)]
    mode: ModeArg,

    /// Sound played on a match.
    #[arg(long)]
    sound: Option<String>,

    /// Add the rule muted.
    #[arg(long)]
    muted: bool,
}

/// Settings subcommands.
#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as JSON.
    Show,

    /// Print the settings file location.
    Path,

    /// Write a settings file with defaults and discovered log directories.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Log kind for `classify`.
#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// Game client log: pattern table only.
    Game,
    /// Chat log: pattern table and chat filter rules.
    Chat,
}

impl From<KindArg> for RootKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Game => Self::GameLog,
            KindArg::Chat => Self::ChatLog,
        }
    }
}

/// Trade side for `rules add`.
#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// You want to buy; sell offers are searched.
    Buy,
    /// You want to sell; buy requests are searched.
    Sell,
    /// The whole line is searched.
    Any,
}

impl From<ModeArg> for TradeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Buy => Self::Buy,
            ModeArg::Sell => Self::Sell,
            ModeArg::Any => Self::Any,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
/// Logs go to stderr so stdout carries only events.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(level)
    });

    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(io::stderr),
        )
        .with(filter)
        .init();
}

/// Returns the settings file path from `--config` or the platform default.
fn settings_path(cli: &Cli) -> color_eyre::Result<Utf8PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Config::default_location().wrap_err("cannot locate the settings file"),
    }
}

/// Loads the settings snapshot without applying CLI overrides.
fn load_settings(path: &Utf8Path) -> color_eyre::Result<Config> {
    Config::load_or_default(path).wrap_err_with(|| format!("cannot load settings from {path}"))
}

/// Builds the effective [`Config`] for tailing.
///
/// Directory flags override the file; directories left unset in both are
/// discovered from the platform's usual locations.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = load_settings(&settings_path(cli)?)?;

    if let Some(dir) = &cli.log_dir {
        config.apply(&Command::SetGameLogRoot(Some(dir.clone())));
    }
    if let Some(dir) = &cli.chatlog_dir {
        config.apply(&Command::SetChatLogRoot(Some(dir.clone())));
    }
    if config.paths.log_dir.is_none() {
        config.paths.log_dir = paths::find_default_log_dir();
    }
    if config.paths.chatlog_dir.is_none() {
        config.paths.chatlog_dir = paths::default_chatlog_dir();
    }
    config.validate()?;
    Ok(config)
}

// =============================================================================
// ALERTS
// =============================================================================

/// Rings the terminal bell for every audible chat hit.
///
/// The configured sound file name is only logged; a terminal cannot play it.
struct TerminalBell<W> {
    out: W,
}

impl<W: Write + Send> AlertPlayer for TerminalBell<W> {
    fn play(&mut self, sound: &str) -> Result<(), AlertError> {
        tracing::debug!(sound, "ringing bell");
        self.out.write_all(b"\x07")?;
        self.out.flush()?;
        Ok(())
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Tails both roots until Ctrl-C or SIGTERM.
async fn run_watch(
    mut config: Config,
    interval_ms: Option<u64>,
    json: bool,
    bell: bool,
) -> color_eyre::Result<()> {
    if let Some(ms) = interval_ms {
        config.poll.interval_ms = ms;
        config.validate()?;
    }

    info!(
        log_dir = ?config.paths.log_dir,
        chatlog_dir = ?config.paths.chatlog_dir,
        rules = config.chat.rules.len(),
        interval_ms = config.poll.interval_ms,
        "Starting watch"
    );

    let mut pipeline = LogIngestionPipeline::from_config(&config);
    if bell {
        pipeline = pipeline.with_alert_player(TerminalBell { out: io::stderr() });
    }

    let mut interval = tokio::time::interval(config.poll.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let stdout = io::stdout();
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut handle = stdout.lock();
                let mut failure = None;
                pipeline.tick(|event| {
                    if failure.is_none() {
                        failure = write_event(&mut handle, &event, json).err();
                    }
                });
                if let Some(err) = failure {
                    return Err(err).wrap_err("cannot write events");
                }
            }
            result = &mut shutdown => {
                result?;
                break;
            }
        }
    }

    info!("Stopped watching");
    Ok(())
}

/// Resolves when the process is asked to stop.
async fn shutdown_signal() -> color_eyre::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received Ctrl-C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl-C, shutting down");
    }

    Ok(())
}

/// Classifies every line of one file and prints the events.
fn run_classify(
    config: &Config,
    file: &Utf8Path,
    kind: KindArg,
    json: bool,
) -> color_eyre::Result<()> {
    let bytes = std::fs::read(file).wrap_err_with(|| format!("cannot read {file}"))?;
    let text = String::from_utf8_lossy(&bytes);
    let pipeline = LogIngestionPipeline::new(None, None)
        .with_filters(ChatFilterEngine::from_config(&config.chat));

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let mut lines = 0_usize;
    let mut events = 0_usize;
    let mut failure = None;

    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        lines += 1;
        pipeline.classify_line(kind.into(), line, |event| {
            events += 1;
            if failure.is_none() {
                failure = write_event(&mut handle, &event, json).err();
            }
        });
        if let Some(err) = failure.take() {
            return Err(err).wrap_err("cannot write events");
        }
    }

    info!(%file, lines, events, "Classified file");
    Ok(())
}

/// Applies a rule command to the settings file.
fn run_rules(path: &Utf8Path, command: &RulesCommand) -> color_eyre::Result<()> {
    let mut config = load_settings(path)?;

    let change = match command {
        RulesCommand::List => return print_rules(&config),
        RulesCommand::Add(args) => {
            let entry = new_rule(args);
            ChatFilterEngine::validate(&entry)
                .wrap_err_with(|| format!("rule '{}' would never match", entry.name))?;
            Command::UpsertRule {
                key: config.chat.next_rule_key(),
                entry,
            }
        }
        RulesCommand::Remove { key } => Command::RemoveRule(RuleKey::new(*key)),
        RulesCommand::Enable { key } => Command::SetRuleEnabled {
            key: RuleKey::new(*key),
            enabled: true,
        },
        RulesCommand::Disable { key } => Command::SetRuleEnabled {
            key: RuleKey::new(*key),
            enabled: false,
        },
        RulesCommand::Mute { key } => Command::SetRuleMuted {
            key: RuleKey::new(*key),
            muted: true,
        },
        RulesCommand::Unmute { key } => Command::SetRuleMuted {
            key: RuleKey::new(*key),
            muted: false,
        },
    };

    if !config.apply(&change) {
        bail!("no rule with that key; see `thalassa rules list`");
    }
    config.save(path)?;

    if let Command::UpsertRule { key, entry } = &change {
        info!(%key, name = %entry.name, "Added rule");
    }
    Ok(())
}

fn new_rule(args: &AddRule) -> SearchEntry {
    let mut entry = SearchEntry::new(args.name.as_str())
        .with_channel(args.channel.as_str())
        .with_mode(args.mode.into())
        .with_muted(args.muted);
    if let Some(strings) = &args.strings {
        entry = entry.with_strings(strings.as_str());
    }
    if let Some(regex) = &args.regex {
        entry = entry.with_regex(regex.as_str());
    }
    if let Some(sound) = &args.sound {
        entry = entry.with_sound(sound.as_str());
    }
    entry
}

/// Handles the `config` subcommands.
fn run_config(cli: &Cli, command: &ConfigCommand) -> color_eyre::Result<()> {
    let path = settings_path(cli)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match command {
        ConfigCommand::Show => {
            let config = build_config(cli)?;
            writeln!(handle, "{}", serde_json::to_string_pretty(&config)?)?;
        }
        ConfigCommand::Path => {
            writeln!(handle, "{path}")?;
        }
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(eyre!("{path} already exists; pass --force to overwrite"));
            }
            let mut config = Config::default();
            config.paths.log_dir = cli.log_dir.clone().or_else(paths::find_default_log_dir);
            config.paths.chatlog_dir = cli
                .chatlog_dir
                .clone()
                .or_else(paths::default_chatlog_dir);
            config.save(&path)?;
            info!(%path, "Wrote settings");
        }
    }
    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Writes one event as text or a JSON line.
fn write_event(out: &mut impl Write, event: &LogEvent, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, event)?;
        writeln!(out)
    } else {
        writeln!(out, "{event}")
    }
}

/// Prints the rule table.
fn print_rules(config: &Config) -> color_eyre::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if config.chat.rules.is_empty() {
        writeln!(handle, "No rules. Add one with `thalassa rules add`.")?;
        return Ok(());
    }

    writeln!(
        handle,
        "{:>4}  {:<3}  {:<5}  {:<4}  {:<8}  {:<20}  SEARCH",
        "KEY", "ON", "MUTED", "MODE", "CHANNEL", "NAME"
    )?;
    for (key, entry) in &config.chat.rules {
        let search = match entry.match_kind {
            MatchKind::Strings => entry.strings.as_str(),
            MatchKind::Regex => entry.regex.as_str(),
        };
        writeln!(
            handle,
            "{:>4}  {:<3}  {:<5}  {:<4}  {:<8}  {:<20}  {search}",
            key.get(),
            if entry.enabled { "yes" } else { "no" },
            if entry.muted { "yes" } else { "no" },
            entry.mode.label(),
            if entry.channel.is_empty() { "*" } else { entry.channel.as_str() },
            entry.name,
        )?;
    }

    let state = if config.chat.filters_off { "off" } else { "on" };
    let mute = if config.chat.mute { ", muted" } else { "" };
    writeln!(handle)?;
    writeln!(handle, "Chat filters are {state}{mute}.")?;
    Ok(())
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Route to appropriate command
    match &cli.command {
        Commands::Watch {
            interval_ms,
            json,
            no_bell,
        } => {
            let config = build_config(&cli)?;
            run_watch(config, *interval_ms, *json, !*no_bell).await
        }
        Commands::Classify { file, kind, json } => {
            let config = load_settings(&settings_path(&cli)?)?;
            run_classify(&config, file, *kind, *json)
        }
        Commands::Rules(command) => run_rules(&settings_path(&cli)?, command),
        Commands::Config(command) => run_config(&cli, command),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_rule_builds_entry() {
        let cli = Cli::try_parse_from([
            "thalassa",
            "rules",
            "add",
            "Ink",
            "--strings",
            "kraken ink | ink",
            "--mode",
            "sell",
            "--sound",
            "horn.ogg",
        ])
        .unwrap();
        let Commands::Rules(RulesCommand::Add(args)) = &cli.command else {
            panic!("expected rules add");
        };
        let entry = new_rule(args);
        assert_eq!(entry.name, "Ink");
        assert_eq!(entry.mode, TradeMode::Sell);
        assert_eq!(entry.channel, "trade");
        assert_eq!(entry.sound, "horn.ogg");
        assert_eq!(entry.terms().collect::<Vec<_>>(), ["kraken ink", "ink"]);
    }

    #[test]
    fn test_add_rule_needs_strings_or_regex() {
        assert!(Cli::try_parse_from(["thalassa", "rules", "add", "Empty"]).is_err());
        assert!(
            Cli::try_parse_from(["thalassa", "rules", "add", "X", "--strings", "a", "--regex", "b"])
                .is_err()
        );
    }

    #[test]
    fn test_write_event_json_line() {
        let event = LogEvent::FilterMatch {
            line: "[1] Sage trade wts ci map".to_owned(),
            key: RuleKey::new(2),
            term: None,
        };
        let mut out = Vec::new();
        write_event(&mut out, &event, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(value["kind"], "filter_match");
        assert_eq!(value["key"], 2);
    }

    #[test]
    fn test_rules_round_trip_through_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested").join("settings.json"))
            .unwrap();

        let add = RulesCommand::Add(AddRule {
            name: "Ink".to_owned(),
            strings: Some("ink".to_owned()),
            regex: None,
            channel: "trade".to_owned(),
            mode: ModeArg::Buy,
            sound: None,
            muted: false,
        });
        run_rules(&path, &add).unwrap();
        let config = Config::load(&path).unwrap();
        let key = RuleKey::new(4);
        assert_eq!(config.chat.rules.get(&key).map(|e| e.name.as_str()), Some("Ink"));

        run_rules(&path, &RulesCommand::Disable { key: 4 }).unwrap();
        assert!(!Config::load(&path).unwrap().chat.rules[&key].enabled);

        assert!(run_rules(&path, &RulesCommand::Remove { key: 99 }).is_err());
    }
}
