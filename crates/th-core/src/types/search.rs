//! Chat filter rules.
//!
//! A [`SearchEntry`] is a user-authored rule describing which chat lines
//! should raise an alert. Rules are stored in a map keyed by a stable
//! [`RuleKey`] so that edits and deletions survive across sessions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable integer key identifying a [`SearchEntry`].
///
/// Keys are assigned when a rule is created and never reused for a different
/// rule while the original exists.
///
/// # Examples
///
/// ```
/// use th_core::RuleKey;
///
/// let key = RuleKey::new(7);
/// assert_eq!(key.get(), 7);
/// assert_eq!(key.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleKey(u32);

impl RuleKey {
    /// Creates a new rule key.
    #[inline]
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw key value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns the key following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a trade a rule is looking for.
///
/// Trade semantics are inverted: a [`Buy`](Self::Buy) rule wants to find
/// sellers, so it searches the sell segments of a trade message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeMode {
    /// Looking to buy: match terms in sell offers.
    #[default]
    Buy,
    /// Looking to sell: match terms in buy requests.
    Sell,
    /// Match terms anywhere in the line.
    Any,
}

impl TradeMode {
    /// Returns a human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
            Self::Any => "Any",
        }
    }
}

/// How a rule's search text is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Pipe-delimited literal terms from [`SearchEntry::strings`].
    #[default]
    Strings,
    /// A regular expression from [`SearchEntry::regex`].
    Regex,
}

/// A user-authored chat filter rule.
///
/// Exactly one of [`strings`](Self::strings) and [`regex`](Self::regex) is
/// active, selected by [`match_kind`](Self::match_kind). The inactive field is
/// kept so that switching kinds in a UI does not lose what the user typed.
///
/// # Examples
///
/// ```
/// use th_core::{SearchEntry, TradeMode};
///
/// let entry = SearchEntry::new("Selling charms")
///     .with_mode(TradeMode::Sell)
///     .with_strings("vamp charm | v charm |  ");
///
/// let terms: Vec<_> = entry.terms().collect();
/// assert_eq!(terms, ["vamp charm", "v charm"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchEntry {
    /// Display name of the rule.
    pub name: String,

    /// Whether the rule is evaluated at all.
    pub enabled: bool,

    /// Whether matches of this rule play no sound.
    pub muted: bool,

    /// Channel the rule is scoped to. Empty means any channel.
    pub channel: String,

    /// Which side of a trade the rule is looking for.
    pub mode: TradeMode,

    /// Whether [`strings`](Self::strings) or [`regex`](Self::regex) is active.
    pub match_kind: MatchKind,

    /// Pipe-delimited literal search terms.
    pub strings: String,

    /// Regular expression searched against the lowercased line.
    pub regex: String,

    /// Identifier of the alert sound to play on a match.
    pub sound: String,
}

/// Sound used by rules that do not name one.
const DEFAULT_SOUND: &str = "trade_chat_sound.ogg";

impl Default for SearchEntry {
    fn default() -> Self {
        Self {
            name: "New Search".to_owned(),
            enabled: true,
            muted: false,
            channel: "trade".to_owned(),
            mode: TradeMode::Buy,
            match_kind: MatchKind::Strings,
            strings: String::new(),
            regex: String::new(),
            sound: DEFAULT_SOUND.to_owned(),
        }
    }
}

impl SearchEntry {
    /// Creates a new enabled trade-channel rule with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Scopes the rule to a channel. An empty string means any channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Sets the trade mode.
    #[must_use]
    pub fn with_mode(mut self, mode: TradeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets pipe-delimited search terms and selects [`MatchKind::Strings`].
    #[must_use]
    pub fn with_strings(mut self, strings: impl Into<String>) -> Self {
        self.strings = strings.into();
        self.match_kind = MatchKind::Strings;
        self
    }

    /// Sets a regular expression and selects [`MatchKind::Regex`].
    #[must_use]
    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = regex.into();
        self.match_kind = MatchKind::Regex;
        self
    }

    /// Sets the alert sound identifier.
    #[must_use]
    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = sound.into();
        self
    }

    /// Sets whether the rule starts enabled.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets whether the rule is muted.
    #[must_use]
    pub fn with_muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Returns the trimmed, non-empty literal terms.
    ///
    /// Yields terms regardless of [`match_kind`](Self::match_kind); callers
    /// decide whether the string form is active.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.strings
            .split('|')
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Returns `true` if the rule only applies to one channel.
    #[inline]
    #[must_use]
    pub fn is_channel_scoped(&self) -> bool {
        !self.channel.trim().is_empty()
    }
}

/// Returns the rules a fresh installation starts with.
///
/// Three trade searches for items commonly hunted in the trade channel.
#[must_use]
pub fn default_search_entries() -> BTreeMap<RuleKey, SearchEntry> {
    let mut rules = BTreeMap::new();
    rules.insert(
        RuleKey::new(1),
        SearchEntry::new("Buying CI Map")
            .with_strings("ci map | cursed island | cursed isles | ci of | ci near"),
    );
    rules.insert(
        RuleKey::new(2),
        SearchEntry::new("Buying Vampire Reliq").with_strings(
            "reliq | vamp charm | v charm | vampire charm | vampiric charm | vampirate charm",
        ),
    );
    rules.insert(
        RuleKey::new(3),
        SearchEntry::new("Buying WWWFinder").with_strings(
            "wayfinder | way-finder | wolf charm | w charm | ww charm | werewolf charm | werewolves charm",
        ),
    );
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_entry() {
        let entry = SearchEntry::default();
        assert_eq!(entry.name, "New Search");
        assert!(entry.enabled);
        assert!(!entry.muted);
        assert_eq!(entry.channel, "trade");
        assert_eq!(entry.mode, TradeMode::Buy);
        assert_eq!(entry.match_kind, MatchKind::Strings);
        assert_eq!(entry.sound, "trade_chat_sound.ogg");
    }

    #[test]
    fn test_terms_drop_empties() {
        let entry = SearchEntry::new("x").with_strings(" | a |b||  c d |");
        let terms: Vec<_> = entry.terms().collect();
        assert_eq!(terms, ["a", "b", "c d"]);
    }

    #[test]
    fn test_with_regex_switches_kind() {
        let entry = SearchEntry::new("x").with_strings("a").with_regex("^a");
        assert_eq!(entry.match_kind, MatchKind::Regex);
        assert_eq!(entry.strings, "a");
    }

    #[test]
    fn test_channel_scope() {
        assert!(SearchEntry::default().is_channel_scoped());
        assert!(!SearchEntry::default().with_channel("  ").is_channel_scoped());
    }

    #[test]
    fn test_default_entries_keys() {
        let rules = default_search_entries();
        let keys: Vec<u32> = rules.keys().map(|k| k.get()).collect();
        assert_eq!(keys, [1, 2, 3]);
        assert!(rules.values().all(|r| r.channel == "trade"));
    }

    #[test]
    fn test_rule_map_json_roundtrip_uses_string_keys() {
        let rules = default_search_entries();
        let json = serde_json::to_string(&rules).unwrap();
        assert!(json.starts_with(r#"{"1":"#));
        let parsed: BTreeMap<RuleKey, SearchEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rules);
    }

    #[test]
    fn test_partial_entry_deserializes_with_defaults() {
        let entry: SearchEntry =
            serde_json::from_str(r#"{"name": "Globals", "channel": "", "mode": "any"}"#).unwrap();
        assert_eq!(entry.name, "Globals");
        assert_eq!(entry.mode, TradeMode::Any);
        assert!(entry.enabled);
        assert!(!entry.is_channel_scoped());
    }

    #[test]
    fn test_rule_key_next() {
        assert_eq!(RuleKey::new(3).next(), RuleKey::new(4));
        assert_eq!(RuleKey::new(u32::MAX).next(), RuleKey::new(u32::MAX));
    }
}
