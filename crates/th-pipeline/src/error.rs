//! Error types for the th-pipeline crate.
//!
//! Ticking never fails; read errors are logged and retried on the next tick.
//! The only error surfaced here comes from the host's [`AlertPlayer`].
//!
//! [`AlertPlayer`]: crate::AlertPlayer

/// Errors returned by an alert player.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// The sound file does not exist.
    #[error("sound not found: {0}")]
    SoundNotFound(String),

    /// I/O error while opening the output device or sound file.
    #[error("alert I/O error: {0}")]
    Io(#[from] std::io::Error),
}
