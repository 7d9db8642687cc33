//! Polling directory watcher with per-file byte cursors.
//!
//! This crate tails log files that another process keeps appending to. It
//! does not use filesystem notifications: the game writes its logs through
//! buffered handles that many platforms report late or not at all, so the
//! watcher polls on a fixed tick instead.
//!
//! # Overview
//!
//! - [`FileCursor`] remembers the read offset of one file and detects growth,
//!   truncation, rotation and removal
//! - [`DirectoryWatcher`] lists a root directory, keeps a cursor per file
//!   accepted by its [`FileFilter`] and reports [`FileDelta`]s
//! - [`read_delta`] reads exactly the new bytes and decodes them permissively
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    DirectoryWatcher::poll                    │
//! │  ┌─────────────┐    ┌──────────────────┐    ┌────────────┐   │
//! │  │ read_dir    │ -> │ FileFilter       │ -> │ FileCursor │   │
//! │  │ (root)      │    │ (name convention)│    │ (per file) │   │
//! │  └─────────────┘    └──────────────────┘    └─────┬──────┘   │
//! └───────────────────────────────────────────────────│──────────┘
//!                                                     │ FileDelta
//!                                                     ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  DirectoryWatcher::consume                   │
//! │   seek(offset) -> read(new_bytes, cap) -> advance(consumed)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
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
//! ```no_run
//! use camino::Utf8PathBuf;
//! use th_watcher::{DirectoryWatcher, GameLogFilter};
//!
//! let root = Utf8PathBuf::from("/path/to/Puzzle Pirates");
//! let mut watcher = DirectoryWatcher::with_root(Some(root), GameLogFilter::default());
//!
//! loop {
//!     let batch = watcher.scan();
//!     for delta in &batch {
//!         match watcher.consume(delta, 1024 * 1024) {
//!             Ok(chunk) => {
//!                 for line in chunk.lines() {
//!                     println!("{}: {line}", delta.name);
//!                 }
//!             }
//!             Err(err) => eprintln!("{err}"),
//!         }
//!     }
//!     std::thread::sleep(std::time::Duration::from_millis(50));
//! }
//! ```
//!
//! # Error Handling
//!
//! Nothing here is fatal. A missing or locked file yields no data for that
//! tick and is retried on the next one:
//!
//! ```
//! use th_watcher::WatchError;
//!
//! fn report(err: &WatchError) {
//!     if err.is_recoverable() {
//!         // Expected while the game rotates its logs.
//!     } else {
//!         eprintln!("log read failed: {err}");
//!     }
//! }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod cursor;
pub mod directory;
pub mod error;
pub mod events;
pub mod filter;
pub mod reader;

pub use cursor::{FileCursor, FileIdentity, FileStat, Observation};
pub use directory::{DirectoryWatcher, RootState};
pub use error::WatchError;
pub use events::{DeltaBatch, FileDelta, ScanStats};
pub use filter::{AcceptAllFilter, ChatLogFilter, FileFilter, GameLogFilter};
pub use reader::{Chunk, read_delta};
