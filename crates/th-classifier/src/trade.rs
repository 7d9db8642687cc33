//! Buy/sell segmentation of trade chat messages.
//!
//! A trade message often advertises both sides at once ("wts charm, wtb
//! map"). [`TradeKeywords::split`] cuts the message at every trade keyword so
//! each side can be searched separately: a segment starts at a keyword and
//! runs up to the next keyword or the end of the line.
//!
//! ```text
//! "giving away wtb charm"
//!  └─ sell ──┘ └ buy ──┘
//! ```
//!
//! Keywords are tried longest first at each position, so a long keyword is
//! never shadowed by a shorter one that is its prefix.

use std::cmp::Reverse;

use smallvec::SmallVec;

/// Keywords that open a request to buy.
pub const BUY_KEYWORDS: &[&str] = &["buy", "[b]", "wtb", "lf", "looking"];

/// Keywords that open an offer to sell.
pub const SELL_KEYWORDS: &[&str] = &["sell", "[s]", "wts", "free", "giving"];

/// Which side of a trade a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// A request to buy.
    Buy,
    /// An offer to sell.
    Sell,
}

/// The buy and sell segments of one message, in message order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segments<'a> {
    /// Segments opened by a buy keyword.
    pub buy: SmallVec<[&'a str; 2]>,
    /// Segments opened by a sell keyword.
    pub sell: SmallVec<[&'a str; 2]>,
}

impl<'a> Segments<'a> {
    /// Returns the segments of one side.
    #[inline]
    #[must_use]
    pub fn side(&self, side: Side) -> &[&'a str] {
        match side {
            Side::Buy => &self.buy,
            Side::Sell => &self.sell,
        }
    }

    /// Returns `true` if the message has no trade keywords.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.sell.is_empty()
    }
}

/// A set of buy and sell keywords, sorted longest first.
///
/// Keywords are stored lowercased and matched against text the caller has
/// already lowercased.
///
/// # Examples
///
/// ```
/// use th_classifier::TradeKeywords;
///
/// let keywords = TradeKeywords::default();
/// let segments = keywords.split("giving away wtb charm");
/// assert_eq!(segments.sell.as_slice(), ["giving away"]);
/// assert_eq!(segments.buy.as_slice(), ["wtb charm"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeKeywords {
    sorted: Vec<(String, Side)>,
}

impl TradeKeywords {
    /// Creates a keyword set. Empty keywords are ignored.
    ///
    /// A keyword listed on both sides counts as a buy keyword.
    #[must_use]
    pub fn new<B, S>(buy: B, sell: S) -> Self
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut sorted: Vec<(String, Side)> = Vec::new();
        let tagged = buy
            .into_iter()
            .map(|k| (k.as_ref().to_lowercase(), Side::Buy))
            .chain(sell.into_iter().map(|k| (k.as_ref().to_lowercase(), Side::Sell)));
        for (keyword, side) in tagged {
            if !keyword.is_empty() && !sorted.iter().any(|(k, _)| *k == keyword) {
                sorted.push((keyword, side));
            }
        }
        // Stable, so equal lengths keep their listed order.
        sorted.sort_by_key(|(keyword, _)| Reverse(keyword.len()));
        Self { sorted }
    }

    /// Returns the keywords in matching order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Side)> {
        self.sorted.iter().map(|(k, side)| (k.as_str(), *side))
    }

    /// Finds every keyword occurrence, left to right, without overlaps.
    fn occurrences(&self, text: &str) -> SmallVec<[(usize, Side); 4]> {
        let mut found = SmallVec::new();
        let mut pos = 0;
        while let Some(rest) = text.get(pos..).filter(|rest| !rest.is_empty()) {
            match self.sorted.iter().find(|(k, _)| rest.starts_with(k.as_str())) {
                Some((keyword, side)) => {
                    found.push((pos, *side));
                    pos += keyword.len();
                }
                None => pos += rest.chars().next().map_or(1, char::len_utf8),
            }
        }
        found
    }

    /// Splits lowercased `text` into buy and sell segments.
    ///
    /// Each segment is trimmed of surrounding whitespace. Text before the
    /// first keyword belongs to neither side.
    #[must_use]
    pub fn split<'a>(&self, text: &'a str) -> Segments<'a> {
        let found = self.occurrences(text);
        let mut segments = Segments::default();
        for (i, &(start, side)) in found.iter().enumerate() {
            let end = found.get(i + 1).map_or(text.len(), |&(next, _)| next);
            let segment = text[start..end].trim();
            match side {
                Side::Buy => segments.buy.push(segment),
                Side::Sell => segments.sell.push(segment),
            }
        }
        segments
    }
}

impl Default for TradeKeywords {
    fn default() -> Self {
        Self::new(BUY_KEYWORDS, SELL_KEYWORDS)
    }
}
