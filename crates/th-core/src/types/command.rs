//! Configuration commands sent from a host to the core.
//!
//! A UI never holds the pipeline's state. It emits a [`Command`], the host
//! applies it to its [`Config`](crate::Config) snapshot and forwards the same
//! value to the pipeline, and both dispatch on it with a `match`.
//!
//! # Command Flow
//!
//! ```text
//! Widget change → Command → Config::apply (persisted snapshot)
//!                         └► LogIngestionPipeline::apply (live state)
//! ```

use camino::Utf8PathBuf;

use super::search::{RuleKey, SearchEntry};

/// A change to the core's configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    // =========================================================================
    // Directory roots
    // =========================================================================
    /// Set or clear the game log directory.
    SetGameLogRoot(Option<Utf8PathBuf>),

    /// Set or clear the chat log directory.
    SetChatLogRoot(Option<Utf8PathBuf>),

    // =========================================================================
    // Global switches
    // =========================================================================
    /// Turn every chat filter off (`true`) or back on.
    SetChatFiltersOff(bool),

    /// Silence every chat alert sound.
    SetChatMute(bool),

    // =========================================================================
    // Rule editing
    // =========================================================================
    /// Insert a rule or replace the rule stored under `key`.
    UpsertRule {
        /// Key of the rule.
        key: RuleKey,
        /// New rule contents.
        entry: SearchEntry,
    },

    /// Delete a rule.
    RemoveRule(RuleKey),

    /// Enable or disable a rule without changing its contents.
    SetRuleEnabled {
        /// Key of the rule.
        key: RuleKey,
        /// New enabled state.
        enabled: bool,
    },

    /// Mute or unmute a rule's alert sound.
    SetRuleMuted {
        /// Key of the rule.
        key: RuleKey,
        /// New muted state.
        muted: bool,
    },
}
