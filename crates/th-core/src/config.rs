//! Configuration structures for the Thalassa log core.
//!
//! This module provides the settings snapshot consumed by the pipeline:
//!
//! - [`PathsConfig`] - Log directory roots and the game log naming prefix
//! - [`PollConfig`] - Poll cadence and per-tick read limits
//! - [`ChatConfig`] - Chat filter rules and global switches
//! - [`Config`] - Root configuration combining all settings
//!
//! All configuration types implement [`Default`] and deserialize with
//! `#[serde(default)]`, so a partial settings file loads cleanly. The snapshot
//! is persisted as pretty-printed JSON; hosts mutate it only through
//! [`Config::apply`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Command, RuleKey, SearchEntry, default_search_entries};

/// Application directory name under the platform config directory.
const APP_DIR: &str = "thalassa";

/// Settings file name.
const SETTINGS_FILE: &str = "settings.json";

/// Directory roots watched by the pipeline.
///
/// Either root may be unset; an unset root leaves that side of the pipeline
/// idle without raising an error.
///
/// # Examples
///
/// ```
/// use th_core::PathsConfig;
///
/// let config = PathsConfig::default();
/// assert!(config.log_dir.is_none());
/// assert_eq!(config.game_log_prefix, "yohoho");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the game client logs.
    pub log_dir: Option<Utf8PathBuf>,

    /// Directory holding the chat logs.
    pub chatlog_dir: Option<Utf8PathBuf>,

    /// Prefix of game log file names (`<prefix>_<digits>.log`).
    pub game_log_prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_dir: None,
            chatlog_dir: None,
            game_log_prefix: "yohoho".to_owned(),
        }
    }
}

/// Poll loop settings.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use th_core::PollConfig;
///
/// let config = PollConfig::default();
/// assert_eq!(config.interval(), Duration::from_millis(50));
/// assert_eq!(config.max_read_bytes, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Interval between ticks in milliseconds.
    pub interval_ms: u64,

    /// Maximum bytes read from a single file in one tick.
    ///
    /// Larger deltas are drained over several ticks.
    pub max_read_bytes: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 50,
            max_read_bytes: 1024 * 1024,
        }
    }
}

impl PollConfig {
    /// Returns the tick interval as a [`Duration`].
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Chat filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Disables every chat filter rule.
    pub filters_off: bool,

    /// Silences every chat alert sound. Matches are still emitted.
    pub mute: bool,

    /// Filter rules keyed by their stable key.
    pub rules: BTreeMap<RuleKey, SearchEntry>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            filters_off: false,
            mute: false,
            rules: default_search_entries(),
        }
    }
}

impl ChatConfig {
    /// Returns the key a newly created rule should use.
    ///
    /// One past the largest key in use, so keys of deleted rules are never
    /// handed to a different rule within the same snapshot.
    #[must_use]
    pub fn next_rule_key(&self) -> RuleKey {
        self.rules
            .keys()
            .next_back()
            .map_or(RuleKey::new(1), |key| key.next())
    }
}

/// Root configuration for the Thalassa log core.
///
/// # Examples
///
/// ```
/// use th_core::{Command, Config};
///
/// let mut config = Config::default();
/// config.apply(&Command::SetChatMute(true));
/// assert!(config.chat.mute);
///
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// let parsed: Config = serde_json::from_str(&json).unwrap();
/// assert_eq!(parsed, config);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory roots.
    pub paths: PathsConfig,

    /// Poll loop settings.
    pub poll: PollConfig,

    /// Chat filter settings.
    pub chat: ChatConfig,
}

impl Config {
    /// Returns the default settings file location.
    ///
    /// This is `<config dir>/thalassa/settings.json`, where the config dir is
    /// the platform's per-user configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDirectory`] if the platform has no
    /// configuration directory, or [`ConfigError::InvalidPath`] if it is not
    /// valid UTF-8.
    pub fn default_location() -> Result<Utf8PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDirectory)?;
        let dir = Utf8PathBuf::from_path_buf(dir).map_err(|path| ConfigError::InvalidPath {
            path: Utf8PathBuf::from(path.to_string_lossy().into_owned()),
            reason: "path is not valid UTF-8".to_owned(),
        })?;
        Ok(dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Loads and validates a settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        tracing::debug!(%path, rules = config.chat.rules.len(), "loaded settings");
        Ok(config)
    }

    /// Loads a settings file, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be loaded.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(%path, "no settings file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Writes the settings as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Utf8Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        fs::write(path, json)?;
        tracing::debug!(%path, "saved settings");
        Ok(())
    }

    /// Checks option values that would make the pipeline misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] naming the first bad option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_ms == 0 {
            return Err(ConfigError::invalid_option(
                "poll.interval_ms",
                "must be greater than zero",
            ));
        }
        if self.poll.max_read_bytes == 0 {
            return Err(ConfigError::invalid_option(
                "poll.max_read_bytes",
                "must be greater than zero",
            ));
        }
        let prefix = &self.paths.game_log_prefix;
        if prefix.is_empty() {
            return Err(ConfigError::invalid_option(
                "paths.game_log_prefix",
                "must not be empty",
            ));
        }
        if prefix.contains(['/', '\\']) {
            return Err(ConfigError::invalid_option(
                "paths.game_log_prefix",
                "must not contain path separators",
            ));
        }
        Ok(())
    }

    /// Applies a host command to the snapshot.
    ///
    /// Returns `false` if the command referred to a rule that does not exist
    /// and therefore changed nothing.
    pub fn apply(&mut self, command: &Command) -> bool {
        match command {
            Command::SetGameLogRoot(root) => self.paths.log_dir.clone_from(root),
            Command::SetChatLogRoot(root) => self.paths.chatlog_dir.clone_from(root),
            Command::SetChatFiltersOff(off) => self.chat.filters_off = *off,
            Command::SetChatMute(mute) => self.chat.mute = *mute,
            Command::UpsertRule { key, entry } => {
                self.chat.rules.insert(*key, entry.clone());
            }
            Command::RemoveRule(key) => return self.chat.rules.remove(key).is_some(),
            Command::SetRuleEnabled { key, enabled } => {
                let Some(rule) = self.chat.rules.get_mut(key) else {
                    return false;
                };
                rule.enabled = *enabled;
            }
            Command::SetRuleMuted { key, muted } => {
                let Some(rule) = self.chat.rules.get_mut(key) else {
                    return false;
                };
                rule.muted = *muted;
            }
        }
        true
    }
}
