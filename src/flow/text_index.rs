//! Precomputed character masks
//!
//! A [`TextIndex`] maps each character of a declared alphabet to the
//! [`PositionSet`] of offsets where it occurs in one text. Character atoms
//! then become a word-parallel intersection plus shift instead of a
//! per-offset comparison.
//!
//! The index never changes results: a literal outside the alphabet falls
//! back to scanning the text, and class masks are only assembled when the
//! alphabet covers every character of the text.
//!
//! # Example
//!
//! ```rust
//! use flowmatch::flow::{build_text_index, compile};
//!
//! let index = build_text_index("banana", "abn".chars());
//! let pattern = compile("an").unwrap();
//! assert_eq!(pattern.match_all_indexed(&index).unwrap(), vec![3, 5]);
//! ```

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::position_set::PositionSet;

/// Summary of an index, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextIndexStats {
    /// Text length in characters
    pub text_length: usize,
    /// Number of characters with a precomputed mask
    pub precomputed_chars: usize,
    /// Total number of offsets marked across all masks
    pub indexed_positions: usize,
    /// Whether every character of the text has a mask
    pub covers_text: bool,
}

/// Per-character occurrence masks over one text
#[derive(Debug, Clone)]
pub struct TextIndex {
    chars: Vec<char>,
    masks: HashMap<char, PositionSet, ahash::RandomState>,
    covers_text: bool,
}

impl TextIndex {
    /// Index `text` for every character of `alphabet`
    pub fn build(text: &str, alphabet: impl IntoIterator<Item = char>) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let size = chars.len() + 1;

        let mut masks: HashMap<char, PositionSet, ahash::RandomState> =
            HashMap::with_hasher(ahash::RandomState::new());
        for c in alphabet {
            masks.entry(c).or_insert_with(|| PositionSet::new(size));
        }

        if text.is_ascii() {
            // Byte offsets are character offsets
            let bytes = text.as_bytes();
            for (&c, mask) in masks.iter_mut() {
                if c.is_ascii() {
                    for pos in memchr::memchr_iter(c as u8, bytes) {
                        mask.insert(pos);
                    }
                }
            }
        } else {
            for (pos, c) in chars.iter().enumerate() {
                if let Some(mask) = masks.get_mut(c) {
                    mask.insert(pos);
                }
            }
        }

        let covers_text = chars.iter().all(|c| masks.contains_key(c));
        log_debug!(
            "text index: {} chars, {} masks, covers text: {}",
            chars.len(),
            masks.len(),
            covers_text
        );

        Self {
            chars,
            masks,
            covers_text,
        }
    }

    /// Index `text` for exactly the characters it contains
    pub fn for_text(text: &str) -> Self {
        Self::build(text, text.chars())
    }

    /// The indexed text
    #[inline]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Text length in characters
    #[inline]
    pub fn text_len(&self) -> usize {
        self.chars.len()
    }

    /// Offsets where `c` occurs, if `c` is in the alphabet
    #[inline]
    pub fn positions_of(&self, c: char) -> Option<&PositionSet> {
        self.masks.get(&c)
    }

    /// Whether every character of the text has a mask
    pub fn covers_text(&self) -> bool {
        self.covers_text
    }

    /// Offsets whose character satisfies `predicate`.
    ///
    /// Returns `None` unless the alphabet covers the text, because a
    /// character without a mask could satisfy the predicate unseen.
    pub fn class_mask(&self, predicate: impl Fn(char) -> bool) -> Option<PositionSet> {
        if !self.covers_text {
            return None;
        }
        let mut mask = PositionSet::new(self.chars.len() + 1);
        for (&c, positions) in &self.masks {
            if predicate(c) {
                mask.union_with(positions);
            }
        }
        Some(mask)
    }

    /// Summary counts
    pub fn stats(&self) -> TextIndexStats {
        TextIndexStats {
            text_length: self.chars.len(),
            precomputed_chars: self.masks.len(),
            indexed_positions: self.masks.values().map(PositionSet::len).sum(),
            covers_text: self.covers_text,
        }
    }
}

/// Index `text` for every character of `alphabet`
pub fn build_text_index(text: &str, alphabet: impl IntoIterator<Item = char>) -> TextIndex {
    TextIndex::build(text, alphabet)
}
