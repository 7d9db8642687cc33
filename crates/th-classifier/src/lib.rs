//! Game event pattern tables and chat filter rules.
//!
//! This crate turns single log lines into meaning. It has no I/O and no
//! clock; every function is a pure evaluation of a line against rules.
//!
//! - [`LineClassifier`] maps a line to at most one [`Category`](th_core::Category)
//!   using an ordered [`PatternTable`] of substrings, first match wins
//! - [`ChatFilterEngine`] evaluates user-authored
//!   [`SearchEntry`](th_core::SearchEntry) rules against chat lines, with
//!   channel scoping and buy/sell segmentation of trade messages
//! - [`TradeKeywords`] cuts a trade message into buy and sell segments
//!
//! # Crate Dependencies
//!
//! ```text
//! th-cli ──► th-pipeline ──► th-classifier ──► th-core
//!                        └─► th-watcher ──────────►
//! ```
//!
//! # Usage
//!
//! ```
//! use th_classifier::{ChatFilterEngine, LineClassifier};
//! use th_core::{ChatConfig, Category};
//!
//! let classifier = LineClassifier::builtin();
//! let engine = ChatFilterEngine::from_config(&ChatConfig::default());
//!
//! let game_line = "Entering game data.BoxingObject:5(A,B)";
//! assert_eq!(classifier.classify(game_line), Some(&Category::RUMBLE_START));
//!
//! let chat_line = "[21:03:44] Sage trade wts cursed isles map";
//! let hits = engine.evaluate(chat_line);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].term.as_deref(), Some("cursed isles"));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod chat;
pub mod classifier;
pub mod error;
pub mod trade;

pub use chat::{ChatFilterEngine, FilterMatch, TRADE_CHANNEL};
pub use classifier::{LineClassifier, PatternRule, PatternTable};
pub use error::ClassifierError;
pub use trade::{BUY_KEYWORDS, SELL_KEYWORDS, Segments, Side, TradeKeywords};
