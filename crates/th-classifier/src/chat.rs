//! Keyword and regex filters for chat lines.
//!
//! The [`ChatFilterEngine`] evaluates every enabled [`SearchEntry`] against a
//! chat line independently and reports each hit as a [`FilterMatch`].
//!
//! # Evaluation
//!
//! ```text
//! line ──► lowercase ──► for each enabled rule (key order)
//!                          │
//!                          ├─ channel set? third token must equal it
//!                          │
//!                          ├─ Regex   ──► search lowercased line ──► (key, None)
//!                          │
//!                          └─ Strings ──► trade channel, Buy/Sell mode:
//!                                           search opposite-side segments
//!                                         otherwise:
//!                                           search whole lowercased line
//!                                         each hit ──► (key, Some(term))
//! ```
//!
//! The buy/sell split is computed at most once per line and shared by all
//! trade rules.

use std::collections::BTreeMap;

use regex::Regex;
use th_core::{ChatConfig, FxHashSet, MatchKind, RuleKey, SearchEntry, TradeMode, fx_hash_set};

use crate::error::ClassifierError;
use crate::trade::{Segments, Side, TradeKeywords};

/// Channel whose messages are split into buy and sell segments.
pub const TRADE_CHANNEL: &str = "trade";

/// One rule hit on a chat line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterMatch {
    /// Key of the rule that matched.
    pub key: RuleKey,
    /// The literal term that matched, or `None` for regex rules.
    pub term: Option<String>,
}

impl FilterMatch {
    /// Creates a match.
    #[inline]
    #[must_use]
    pub const fn new(key: RuleKey, term: Option<String>) -> Self {
        Self { key, term }
    }
}

/// The compiled form of a rule's search text.
#[derive(Debug, Clone)]
enum Matcher {
    /// Lowercased literal terms.
    Terms(Vec<String>),
    /// A compiled regular expression.
    Pattern(Regex),
    /// An empty or malformed regex; never matches.
    Inert,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    entry: SearchEntry,
    channel: String,
    matcher: Matcher,
}

impl CompiledRule {
    /// Trade side whose segments this rule searches, if it searches segments.
    fn searched_side(&self) -> Option<Side> {
        if self.channel != TRADE_CHANNEL {
            return None;
        }
        match self.entry.mode {
            TradeMode::Buy => Some(Side::Sell),
            TradeMode::Sell => Some(Side::Buy),
            TradeMode::Any => None,
        }
    }
}

/// Evaluates chat filter rules against chat lines.
///
/// # Examples
///
/// ```
/// use th_classifier::ChatFilterEngine;
/// use th_core::{RuleKey, SearchEntry, TradeMode};
///
/// let mut engine = ChatFilterEngine::new();
/// engine.upsert(RuleKey::new(1), SearchEntry::new("Maps").with_strings("ci map"));
/// engine.upsert(
///     RuleKey::new(2),
///     SearchEntry::new("Sell maps").with_mode(TradeMode::Sell).with_strings("ci map"),
/// );
///
/// let hits = engine.evaluate("[10:00:00] Alice trade selling ci map");
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].key, RuleKey::new(1));
/// assert_eq!(hits[0].term.as_deref(), Some("ci map"));
/// ```
#[derive(Debug, Clone)]
pub struct ChatFilterEngine {
    rules: BTreeMap<RuleKey, CompiledRule>,
    filters_off: bool,
    keywords: TradeKeywords,
    reported: FxHashSet<String>,
}

impl Default for ChatFilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatFilterEngine {
    /// Creates an engine with no rules and the standard trade keywords.
    #[must_use]
    pub fn new() -> Self {
        Self::with_keywords(TradeKeywords::default())
    }

    /// Creates an engine with no rules and custom trade keywords.
    #[must_use]
    pub fn with_keywords(keywords: TradeKeywords) -> Self {
        Self {
            rules: BTreeMap::new(),
            filters_off: false,
            keywords,
            reported: fx_hash_set(),
        }
    }

    /// Creates an engine from the chat section of the settings.
    #[must_use]
    pub fn from_config(config: &ChatConfig) -> Self {
        let mut engine = Self::new();
        engine.set_filters_off(config.filters_off);
        for (key, entry) in &config.rules {
            engine.upsert(*key, entry.clone());
        }
        engine
    }

    /// Checks a rule before it is installed.
    ///
    /// [`upsert`](Self::upsert) accepts any rule; this lets a host refuse
    /// input that would never match.
    ///
    /// # Errors
    ///
    /// Returns an error if the active search text is empty or the regex does
    /// not compile.
    pub fn validate(entry: &SearchEntry) -> Result<(), ClassifierError> {
        match entry.match_kind {
            MatchKind::Strings => {
                if entry.terms().next().is_none() {
                    return Err(ClassifierError::NoTerms);
                }
            }
            MatchKind::Regex => {
                if entry.regex.is_empty() {
                    return Err(ClassifierError::EmptyRegex);
                }
                Regex::new(&entry.regex)
                    .map_err(|err| ClassifierError::invalid_regex(entry.regex.as_str(), err))?;
            }
        }
        Ok(())
    }

    /// Sets the switch that disables every rule.
    pub fn set_filters_off(&mut self, off: bool) {
        self.filters_off = off;
    }

    /// Returns `true` if every rule is disabled.
    #[inline]
    #[must_use]
    pub const fn filters_off(&self) -> bool {
        self.filters_off
    }

    /// Installs a rule, replacing any rule with the same key.
    ///
    /// The channel and literal terms are lowercased and the regex compiled
    /// here, once. A malformed regex is logged and the rule never matches.
    pub fn upsert(&mut self, key: RuleKey, entry: SearchEntry) {
        let matcher = self.compile(key, &entry);
        let channel = entry.channel.trim().to_lowercase();
        tracing::debug!(%key, name = %entry.name, %channel, "installed chat rule");
        self.rules.insert(
            key,
            CompiledRule {
                entry,
                channel,
                matcher,
            },
        );
    }

    /// Removes a rule, returning it if it existed.
    pub fn remove(&mut self, key: RuleKey) -> Option<SearchEntry> {
        self.rules.remove(&key).map(|rule| rule.entry)
    }

    /// Enables or disables a rule. Returns `false` if the key is unknown.
    pub fn set_enabled(&mut self, key: RuleKey, enabled: bool) -> bool {
        let Some(rule) = self.rules.get_mut(&key) else {
            return false;
        };
        rule.entry.enabled = enabled;
        true
    }

    /// Mutes or unmutes a rule. Returns `false` if the key is unknown.
    pub fn set_muted(&mut self, key: RuleKey, muted: bool) -> bool {
        let Some(rule) = self.rules.get_mut(&key) else {
            return false;
        };
        rule.entry.muted = muted;
        true
    }

    /// Returns the rule stored under `key`.
    #[must_use]
    pub fn rule(&self, key: RuleKey) -> Option<&SearchEntry> {
        self.rules.get(&key).map(|rule| &rule.entry)
    }

    /// Returns all rules in key order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleKey, &SearchEntry)> {
        self.rules.iter().map(|(key, rule)| (*key, &rule.entry))
    }

    /// Returns the number of installed rules.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rules are installed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates every enabled rule against `line`.
    ///
    /// Rules are visited in key order. A rule can match more than once when
    /// several of its terms, or one term in several segments, are found.
    #[must_use]
    pub fn evaluate(&self, line: &str) -> Vec<FilterMatch> {
        let mut hits = Vec::new();
        if self.filters_off {
            return hits;
        }

        let lowered = line.to_lowercase();
        let channel_token = lowered.split_whitespace().nth(2);
        let mut segments: Option<Segments<'_>> = None;

        for (key, rule) in &self.rules {
            if !rule.entry.enabled {
                continue;
            }
            if !rule.channel.is_empty() && channel_token != Some(rule.channel.as_str()) {
                continue;
            }

            match &rule.matcher {
                Matcher::Inert => {}
                Matcher::Pattern(regex) => {
                    if regex.is_match(&lowered) {
                        hits.push(FilterMatch::new(*key, None));
                    }
                }
                Matcher::Terms(terms) => match rule.searched_side() {
                    Some(side) => {
                        let parts = segments
                            .get_or_insert_with(|| self.keywords.split(&lowered))
                            .side(side);
                        for term in terms {
                            for part in parts {
                                if part.contains(term.as_str()) {
                                    hits.push(FilterMatch::new(*key, Some(term.clone())));
                                }
                            }
                        }
                    }
                    None => {
                        for term in terms {
                            if lowered.contains(term.as_str()) {
                                hits.push(FilterMatch::new(*key, Some(term.clone())));
                            }
                        }
                    }
                },
            }
        }

        if !hits.is_empty() {
            tracing::trace!(hits = hits.len(), line, "chat filters matched");
        }
        hits
    }

    fn compile(&mut self, key: RuleKey, entry: &SearchEntry) -> Matcher {
        match entry.match_kind {
            MatchKind::Strings => Matcher::Terms(entry.terms().map(str::to_lowercase).collect()),
            MatchKind::Regex if entry.regex.is_empty() => Matcher::Inert,
            MatchKind::Regex => match Regex::new(&entry.regex) {
                Ok(regex) => Matcher::Pattern(regex),
                Err(err) => {
                    if self.reported.insert(entry.regex.clone()) {
                        tracing::warn!(
                            %key,
                            name = %entry.name,
                            pattern = %entry.regex,
                            error = %err,
                            "chat rule has an invalid regex and will never match"
                        );
                    }
                    Matcher::Inert
                }
            },
        }
    }
}
