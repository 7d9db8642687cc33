//! Category labels for recognised game-state transitions.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A symbolic tag identifying a recognised game-state transition.
///
/// Labels are plain strings so hosts can extend the pattern table with their
/// own categories. The labels used by the built-in game log table are
/// available as associated constants.
///
/// # Examples
///
/// ```
/// use th_core::Category;
///
/// assert_eq!(Category::RUMBLE_START.as_str(), "RumbleStart");
///
/// let custom = Category::new("Voyage");
/// assert_eq!(custom.to_string(), "Voyage");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(Cow<'static, str>);

impl Category {
    /// A rumble (boxing) puzzle was entered.
    pub const RUMBLE_START: Self = Self::from_static("RumbleStart");
    /// The rumble panel was replaced, ending the puzzle.
    pub const RUMBLE_END: Self = Self::from_static("RumbleEnd");
    /// A sword fight puzzle was entered.
    pub const SWORD_FIGHT_START: Self = Self::from_static("SwordFightStart");
    /// The sword fight panel was replaced, ending the puzzle.
    pub const SWORD_FIGHT_END: Self = Self::from_static("SwordFightEnd");
    /// The cursed isles gauntlet scene was shown.
    pub const CURSED_ISLES_START: Self = Self::from_static("CursedIslesStart");
    /// The dark seas skirmish mod was disabled.
    pub const CURSED_ISLES_END: Self = Self::from_static("CursedIslesEnd");
    /// The two-minute forage countdown started.
    pub const FORAGE_START: Self = Self::from_static("ForageStart");

    /// Creates a category from a static string without allocating.
    #[inline]
    #[must_use]
    pub const fn from_static(label: &'static str) -> Self {
        Self(Cow::Borrowed(label))
    }

    /// Creates a category from an owned or borrowed label.
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(Cow::Owned(label.into()))
    }

    /// Returns the label text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_and_owned_compare_equal() {
        assert_eq!(Category::new("RumbleStart"), Category::RUMBLE_START);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&Category::FORAGE_START).unwrap();
        assert_eq!(json, r#""ForageStart""#);

        let parsed: Category = serde_json::from_str(r#""Voyage""#).unwrap();
        assert_eq!(parsed.as_str(), "Voyage");
    }
}
