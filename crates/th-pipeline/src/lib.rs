//! Tick-driven log ingestion for the Thalassa companion.
//!
//! This crate wires the watcher and the classifiers together. Each call to
//! [`LogIngestionPipeline::tick`] reads the bytes appended to the game and
//! chat logs since the previous tick and turns recognised lines into
//! [`LogEvent`]s.
//!
//! # Overview
//!
//! - [`LogIngestionPipeline`]: owns both roots and runs one scan cycle per tick
//! - [`LogEvent`]: a categorised line or a chat filter hit
//! - [`AlertPlayer`] / [`AlertRouter`]: injected sound output for filter hits
//! - [`TickSummary`]: counters for one tick
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    LogIngestionPipeline                       │
//! │                                                               │
//! │  DirectoryWatcher<GameLogFilter> ──► LineClassifier ───┐      │
//! │                                                        │      │
//! │  DirectoryWatcher<ChatLogFilter> ──► LineClassifier ───┤      │
//! │                                 └──► ChatFilterEngine ─┤      │
//! │                                            │           │      │
//! │                                      AlertRouter       ▼      │
//! │                                            │       emit(event)│
//! └────────────────────────────────────────────│──────────────────┘
//!                                              ▼
//!                                         AlertPlayer (host)
//! ```
//!
//! # Crate Dependencies
//!
//! ```text
//! th-cli ──► th-pipeline ──► th-classifier ──► th-core
//!                        └─► th-watcher ──────────►
//! ```
//!
//! # Host Loop
//!
//! The pipeline is synchronous and takes `&mut self`, so a host drives it
//! from one task on a fixed interval:
//!
//! ```no_run
//! use th_core::Config;
//! use th_pipeline::LogIngestionPipeline;
//!
//! let config = Config::default();
//! let mut pipeline = LogIngestionPipeline::from_config(&config);
//! loop {
//!     pipeline.tick(|event| println!("{event}"));
//!     std::thread::sleep(config.poll.interval());
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod alert;
mod error;
mod events;
mod pipeline;
mod stats;

pub use alert::{AlertPlayer, AlertRouter};
pub use error::AlertError;
pub use events::{FILTER_MATCH_MODE, LogEvent, RootKind};
pub use pipeline::{DEFAULT_MAX_READ_BYTES, LogIngestionPipeline};
pub use stats::TickSummary;

pub use th_watcher::RootState;
