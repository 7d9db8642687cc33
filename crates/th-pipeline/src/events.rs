//! Events emitted by the pipeline.
//!
//! Every recognised line produces one or more [`LogEvent`]s, delivered to the
//! tick's callback synchronously, in line order within a file and file order
//! within a tick.
//!
//! # Event Kinds
//!
//! ```text
//! game line ──► LineClassifier ──► Category { label, line, GameLog }
//!
//! chat line ──► LineClassifier ──► Category { label, line, ChatLog }
//!           └─► ChatFilterEngine ─► FilterMatch { line, key, term } (per hit)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use th_core::{Category, RuleKey};

/// Mode string reported for chat filter hits.
pub const FILTER_MATCH_MODE: &str = "FilterMatch";

/// Which of the two watched roots a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootKind {
    /// The game client log directory.
    GameLog,
    /// The chat log directory.
    ChatLog,
}

impl fmt::Display for RootKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GameLog => "game log",
            Self::ChatLog => "chat log",
        })
    }
}

/// A recognised line.
///
/// # Examples
///
/// ```
/// use th_core::Category;
/// use th_pipeline::{LogEvent, RootKind};
///
/// let event = LogEvent::Category {
///     category: Category::RUMBLE_START,
///     line: "Entering game data.BoxingObject:5(A,B)".to_owned(),
///     source: RootKind::GameLog,
/// };
/// assert_eq!(event.mode(), "RumbleStart");
/// assert_eq!(event.line(), "Entering game data.BoxingObject:5(A,B)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEvent {
    /// A line matched an entry of the pattern table.
    Category {
        /// The entry's label.
        category: Category,
        /// The raw line.
        line: String,
        /// Root the line was read from.
        source: RootKind,
    },

    /// A chat line matched a filter rule.
    FilterMatch {
        /// The raw line.
        line: String,
        /// Key of the rule that matched.
        key: RuleKey,
        /// The literal term that matched, or `None` for regex rules.
        term: Option<String>,
    },
}

impl LogEvent {
    /// Returns the category label, or `"FilterMatch"` for filter hits.
    #[must_use]
    pub fn mode(&self) -> &str {
        match self {
            Self::Category { category, .. } => category.as_str(),
            Self::FilterMatch { .. } => FILTER_MATCH_MODE,
        }
    }

    /// Returns the line that produced the event.
    #[inline]
    #[must_use]
    pub fn line(&self) -> &str {
        match self {
            Self::Category { line, .. } | Self::FilterMatch { line, .. } => line,
        }
    }

    /// Returns the root the line came from.
    #[must_use]
    pub const fn source(&self) -> RootKind {
        match self {
            Self::Category { source, .. } => *source,
            Self::FilterMatch { .. } => RootKind::ChatLog,
        }
    }

    /// Returns the rule key and term of a filter hit.
    #[must_use]
    pub fn filter_hit(&self) -> Option<(RuleKey, Option<&str>)> {
        match self {
            Self::FilterMatch { key, term, .. } => Some((*key, term.as_deref())),
            Self::Category { .. } => None,
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category {
                category, line, ..
            } => write!(f, "[{category}] {line}"),
            Self::FilterMatch {
                line,
                key,
                term: Some(term),
            } => write!(f, "[{FILTER_MATCH_MODE} #{key} '{term}'] {line}"),
            Self::FilterMatch {
                line,
                key,
                term: None,
            } => write!(f, "[{FILTER_MATCH_MODE} #{key}] {line}"),
        }
    }
}
