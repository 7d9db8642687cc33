//! Error types for the th-classifier crate.
//!
//! Classification itself never fails: a line either matches or it does not.
//! [`ClassifierError`] is returned when a rule is checked before being
//! installed, so hosts can reject bad input while the user is still typing.

/// Errors found while validating rules.
///
/// # Examples
///
/// ```
/// use th_classifier::{ChatFilterEngine, ClassifierError};
/// use th_core::SearchEntry;
///
/// let entry = SearchEntry::new("broken").with_regex("(unclosed");
/// let err = ChatFilterEngine::validate(&entry).unwrap_err();
/// assert!(matches!(err, ClassifierError::InvalidRegex { .. }));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// A rule's regular expression does not compile.
    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        /// The pattern as written.
        pattern: String,
        /// The compile error.
        #[source]
        source: regex::Error,
    },

    /// A regex rule has an empty pattern.
    #[error("regex rule has an empty pattern")]
    EmptyRegex,

    /// A string rule has no non-empty terms.
    #[error("string rule has no search terms")]
    NoTerms,

    /// A pattern table entry has an empty substring.
    #[error("pattern for category '{category}' is empty")]
    EmptyPattern {
        /// Category the pattern was meant to produce.
        category: String,
    },
}

impl ClassifierError {
    /// Creates a new [`ClassifierError::InvalidRegex`] error.
    #[inline]
    pub fn invalid_regex(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_regex_display() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = ClassifierError::invalid_regex("(", source);
        assert!(err.to_string().starts_with("invalid regex '('"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_empty_pattern_display() {
        let err = ClassifierError::EmptyPattern {
            category: "RumbleStart".to_owned(),
        };
        assert_eq!(err.to_string(), "pattern for category 'RumbleStart' is empty");
    }
}
