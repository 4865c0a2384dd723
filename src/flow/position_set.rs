//! Position sets over text offsets
//!
//! A [`PositionSet`] is a fixed-size bit vector indexed by text offset
//! `0..=len`. A set bit at offset `k` means "a match of the sub-pattern
//! processed so far can end exactly at offset `k`".
//!
//! Bits are packed into `u64` words so that union, intersection and the
//! one-step shift used by single-character atoms are word-parallel.
//!
//! # Example
//!
//! ```rust
//! use flowmatch::flow::PositionSet;
//!
//! let mut set = PositionSet::new(6);
//! set.insert(1);
//! set.insert(3);
//! assert_eq!(set.to_vec(), vec![1, 3]);
//! assert_eq!(set.shifted().to_vec(), vec![2, 4]);
//! ```

use std::fmt;

const WORD_BITS: usize = 64;

#[inline(always)]
fn word_count(size: usize) -> usize {
    size.div_ceil(WORD_BITS)
}

/// Common operations the fixed-point driver needs from a set type.
///
/// Implemented by [`PositionSet`], [`TrackedPositionSet`](super::tracked::TrackedPositionSet)
/// and [`FuzzyState`](super::fuzzy_state::FuzzyState), which lets the
/// repetition algorithm be written once.
pub trait FlowSet: Clone + PartialEq {
    /// Merge `other` into `self`, returning whether any member was added.
    fn merge(&mut self, other: &Self) -> bool;

    /// Whether the set has no members.
    fn is_empty(&self) -> bool;
}

/// Fixed-size boolean vector over text offsets
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PositionSet {
    /// Number of addressable offsets (text length + 1)
    size: usize,
    /// Packed bits; bits at or above `size` are always zero
    words: Vec<u64>,
}

impl PositionSet {
    /// Create an empty set able to hold offsets `0..size`
    pub fn new(size: usize) -> Self {
        Self {
            size,
            words: vec![0; word_count(size)],
        }
    }

    /// Create an empty set sized for a text of `text_len` characters
    #[inline]
    pub fn for_text(text_len: usize) -> Self {
        Self::new(text_len + 1)
    }

    /// Create a set with every offset `0..size` present
    pub fn full(size: usize) -> Self {
        let mut set = Self {
            size,
            words: vec![u64::MAX; word_count(size)],
        };
        set.clear_tail();
        set
    }

    /// Create a set from an iterator of offsets; out-of-range offsets are ignored
    pub fn from_positions(size: usize, positions: impl IntoIterator<Item = usize>) -> Self {
        let mut set = Self::new(size);
        for pos in positions {
            set.insert(pos);
        }
        set
    }

    /// Number of addressable offsets
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Set the bit at `pos`. Offsets outside `0..size` are ignored.
    ///
    /// Returns `true` if the bit was newly set.
    #[inline]
    pub fn insert(&mut self, pos: usize) -> bool {
        if pos >= self.size {
            return false;
        }
        let word = &mut self.words[pos / WORD_BITS];
        let mask = 1u64 << (pos % WORD_BITS);
        let added = *word & mask == 0;
        *word |= mask;
        added
    }

    /// Clear the bit at `pos`
    #[inline]
    pub fn remove(&mut self, pos: usize) {
        if pos < self.size {
            self.words[pos / WORD_BITS] &= !(1u64 << (pos % WORD_BITS));
        }
    }

    /// Whether `pos` is a member
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        pos < self.size && self.words[pos / WORD_BITS] & (1u64 << (pos % WORD_BITS)) != 0
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether no bit is set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Clear every bit
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// In-place union. Returns `true` if any bit was added.
    ///
    /// # Panics
    /// Panics if the sets have different sizes.
    pub fn union_with(&mut self, other: &PositionSet) -> bool {
        assert_eq!(self.size, other.size, "position sets must have equal size");
        let mut changed = false;
        for (a, &b) in self.words.iter_mut().zip(&other.words) {
            let merged = *a | b;
            changed |= merged != *a;
            *a = merged;
        }
        changed
    }

    /// Union returning a new set
    pub fn union(&self, other: &PositionSet) -> PositionSet {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    /// In-place intersection
    pub fn intersect_with(&mut self, other: &PositionSet) {
        assert_eq!(self.size, other.size, "position sets must have equal size");
        for (a, &b) in self.words.iter_mut().zip(&other.words) {
            *a &= b;
        }
    }

    /// In-place difference (`self - other`)
    pub fn difference_with(&mut self, other: &PositionSet) {
        assert_eq!(self.size, other.size, "position sets must have equal size");
        for (a, &b) in self.words.iter_mut().zip(&other.words) {
            *a &= !b;
        }
    }

    /// Whether every member of `self` is also in `other`
    pub fn is_subset(&self, other: &PositionSet) -> bool {
        self.size == other.size
            && self
                .words
                .iter()
                .zip(&other.words)
                .all(|(&a, &b)| a & !b == 0)
    }

    /// Every member moved one offset forward; a member at the last offset
    /// falls off the end.
    pub fn shifted(&self) -> PositionSet {
        let mut result = PositionSet::new(self.size);
        let mut carry = 0u64;
        for (dst, &src) in result.words.iter_mut().zip(&self.words) {
            *dst = (src << 1) | carry;
            carry = src >> (WORD_BITS - 1);
        }
        result.clear_tail();
        result
    }

    /// Iterate members in ascending order
    pub fn iter(&self) -> Positions<'_> {
        Positions {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    /// Members in ascending order
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }

    fn clear_tail(&mut self) {
        let rem = self.size % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}

impl FlowSet for PositionSet {
    #[inline]
    fn merge(&mut self, other: &Self) -> bool {
        self.union_with(other)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        PositionSet::is_empty(self)
    }
}

/// Ascending iterator over the members of a [`PositionSet`]
pub struct Positions<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl Iterator for Positions<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.index * WORD_BITS + bit);
            }
            self.index += 1;
            self.current = *self.words.get(self.index)?;
        }
    }
}

impl<'a> IntoIterator for &'a PositionSet {
    type Item = usize;
    type IntoIter = Positions<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Renders the raw bit string, e.g. `0101`
impl fmt::Display for PositionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pos in 0..self.size {
            f.write_str(if self.contains(pos) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for PositionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionSet[{}] (positions: {:?})", self, self.to_vec())
    }
}
