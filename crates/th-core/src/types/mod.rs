//! Domain types for the Thalassa log core.
//!
//! # Module Organization
//!
//! - [`category`] - Labels for recognised game-state transitions
//! - [`search`] - Chat filter rules and their keys
//! - [`command`] - Tagged configuration commands sent by hosts
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use th_core::{Category, Command, RuleKey, SearchEntry};
//! ```

mod category;
mod command;
mod search;

pub use category::Category;
pub use command::Command;
pub use search::{MatchKind, RuleKey, SearchEntry, TradeMode, default_search_entries};
