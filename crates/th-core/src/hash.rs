//! Fast hash set alias.
//!
//! The chat filter engine records every regex pattern that failed to compile
//! so its warning is logged once rather than on every line. The set is keyed
//! by short pattern strings that never come from the log stream, so the Fx
//! hash from `rustc-hash` is used instead of the std SipHash.
//!
//! # Examples
//!
//! ```
//! use th_core::{FxHashSet, fx_hash_set};
//!
//! let mut reported: FxHashSet<String> = fx_hash_set();
//! assert!(reported.insert("(unclosed".to_owned()));
//! assert!(!reported.insert("(unclosed".to_owned()));
//! ```

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// Creates a new empty [`FxHashSet`].
#[inline]
#[must_use]
pub fn fx_hash_set<V>() -> FxHashSet<V> {
    FxHashSet::default()
}
