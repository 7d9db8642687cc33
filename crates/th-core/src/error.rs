//! Error types for the th-core crate.
//!
//! This module provides the [`ConfigError`] type for failures while loading,
//! validating, or saving the settings snapshot.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use th_core::ConfigError;
///
/// let error = ConfigError::InvalidOption {
///     option: "poll.interval_ms".to_owned(),
///     reason: "must be greater than zero".to_owned(),
/// };
/// assert!(error.to_string().contains("poll.interval_ms"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The provided path is invalid or malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The invalid path.
        path: Utf8PathBuf,
        /// Explanation of why the path is invalid.
        reason: String,
    },

    /// No platform configuration directory could be determined.
    #[error("no configuration directory available on this platform")]
    NoConfigDirectory,

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading or writing configuration.
    #[error("failed to access configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}
