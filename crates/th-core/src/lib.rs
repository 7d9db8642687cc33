//! Core types, configuration, and errors for the Thalassa log core.
//!
//! This crate provides the foundational types shared across the workspace:
//!
//! - [`Config`] and its sections, persisted as a JSON snapshot
//! - [`ConfigError`] for configuration loading and validation failures
//! - Domain types: [`SearchEntry`] chat filter rules, [`RuleKey`],
//!   [`Category`] labels and the [`Command`] enum used by hosts to mutate
//!   configuration and the pipeline
//! - The `FxHashSet` alias
//! - Default log directory discovery in [`paths`]
//!
//! # Crate Dependencies
//!
//! ```text
//! th-cli ──► th-pipeline ──► th-classifier ──► th-core
//!                        └─► th-watcher ──────────►
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod paths;
pub mod types;

pub use config::{ChatConfig, Config, PathsConfig, PollConfig};
pub use error::ConfigError;
pub use hash::{FxHashSet, fx_hash_set};
pub use types::{
    Category, Command, MatchKind, RuleKey, SearchEntry, TradeMode, default_search_entries,
};
