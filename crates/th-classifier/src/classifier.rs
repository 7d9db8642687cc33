//! Ordered substring tables for game events.
//!
//! A [`LineClassifier`] holds a [`PatternTable`], an ordered list of
//! `(substring, category)` rules. The first rule whose substring occurs
//! anywhere in a line decides the line's category; later rules are never
//! consulted for that line.

use th_core::Category;

use crate::error::ClassifierError;

/// Substrings of the game client log that mark state transitions.
fn builtin_patterns() -> [(&'static str, Category); 7] {
    [
        ("Entering game data.BoxingObject", Category::RUMBLE_START),
        (
            "replaced=class com.threerings.piracy.puzzle.boxing.client.BoxingPanel",
            Category::RUMBLE_END,
        ),
        ("Entering game data.SwordObject", Category::SWORD_FIGHT_START),
        (
            "replaced=class com.threerings.piracy.puzzle.sword.client.SwordPanel",
            Category::SWORD_FIGHT_END,
        ),
        (
            "Setting place view com.threerings.yohoho.sea.seamonster.cursed.client.GauntletScenePanel",
            Category::CURSED_ISLES_START,
        ),
        (
            "Disabling skirmish environment mod [mod=dark_seas]",
            Category::CURSED_ISLES_END,
        ),
        ("Stopping foraging in 119 seconds", Category::FORAGE_START),
    ]
}

/// One `(substring, category)` entry of a [`PatternTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternRule {
    needle: String,
    category: Category,
}

impl PatternRule {
    /// Creates a rule matching lines that contain `needle`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::EmptyPattern`] if `needle` is empty, since
    /// an empty substring would match every line.
    pub fn new(needle: impl Into<String>, category: Category) -> Result<Self, ClassifierError> {
        let needle = needle.into();
        if needle.is_empty() {
            return Err(ClassifierError::EmptyPattern {
                category: category.to_string(),
            });
        }
        Ok(Self { needle, category })
    }

    /// Returns the substring searched for.
    #[inline]
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Returns the category produced on a match.
    #[inline]
    #[must_use]
    pub const fn category(&self) -> &Category {
        &self.category
    }

    /// Returns `true` if `line` contains the substring.
    #[inline]
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        line.contains(self.needle.as_str())
    }
}

/// An ordered list of [`PatternRule`]s.
///
/// # Examples
///
/// ```
/// use th_classifier::PatternTable;
/// use th_core::Category;
///
/// let mut table = PatternTable::new();
/// table.push("Arrived at", Category::new("Arrival"))?;
/// table.push("Departed", Category::new("Departure"))?;
/// assert_eq!(table.len(), 2);
/// # Ok::<(), th_classifier::ClassifierError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternTable {
    rules: Vec<PatternRule>,
}

impl PatternTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Returns the table of game client events.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            rules: builtin_patterns()
                .into_iter()
                .map(|(needle, category)| PatternRule {
                    needle: needle.to_owned(),
                    category,
                })
                .collect(),
        }
    }

    /// Appends a rule after all existing ones.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::EmptyPattern`] if `needle` is empty.
    pub fn push(
        &mut self,
        needle: impl Into<String>,
        category: Category,
    ) -> Result<(), ClassifierError> {
        self.rules.push(PatternRule::new(needle, category)?);
        Ok(())
    }

    /// Returns the rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &PatternRule> {
        self.rules.iter()
    }

    /// Returns the number of rules.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table has no rules.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<PatternRule> for PatternTable {
    fn from_iter<T: IntoIterator<Item = PatternRule>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}

/// First-match-wins line classifier.
///
/// # Examples
///
/// ```
/// use th_classifier::LineClassifier;
/// use th_core::Category;
///
/// let classifier = LineClassifier::builtin();
/// let line = "2026/10/15 21:04:11 Entering game data.BoxingObject:5(A,B)";
/// assert_eq!(classifier.classify(line), Some(&Category::RUMBLE_START));
/// assert_eq!(classifier.classify("nothing to see"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LineClassifier {
    table: PatternTable,
}

impl LineClassifier {
    /// Creates a classifier over the given table.
    #[must_use]
    pub const fn new(table: PatternTable) -> Self {
        Self { table }
    }

    /// Creates a classifier over [`PatternTable::builtin`].
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(PatternTable::builtin())
    }

    /// Returns the category of the first rule matching `line`.
    #[must_use]
    pub fn classify(&self, line: &str) -> Option<&Category> {
        let category = self
            .table
            .iter()
            .find(|rule| rule.matches(line))
            .map(PatternRule::category);
        if let Some(category) = category {
            tracing::trace!(%category, line, "classified line");
        }
        category
    }

    /// Returns the pattern table.
    #[inline]
    #[must_use]
    pub const fn table(&self) -> &PatternTable {
        &self.table
    }
}
