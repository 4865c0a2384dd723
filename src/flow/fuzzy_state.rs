//! Three-dimensional state space for bounded edit-distance matching
//!
//! A [`FuzzyState`] is conceptually a boolean array addressed by
//! `(text_offset, pattern_offset, distance)`. A member
//! `(t, pattern_len, d)` means "a match ending at text offset `t` needed
//! `d` edits".
//!
//! Storage is a sparse map from `(pattern_offset, distance)` to a
//! [`PositionSet`] over text offsets. Pipeline stages only ever populate a
//! handful of pattern offsets at a time, so empty planes are never stored.

use std::collections::BTreeMap;
use std::fmt;

use super::position_set::{FlowSet, PositionSet};

/// Sparse `text × pattern × distance` bit array
#[derive(Clone, PartialEq, Eq)]
pub struct FuzzyState {
    text_len: usize,
    pattern_len: usize,
    max_distance: usize,
    /// `(pattern_offset, distance)` -> text offsets. Never holds an empty set.
    planes: BTreeMap<(usize, usize), PositionSet>,
}

impl FuzzyState {
    /// Create an empty state
    pub fn new(text_len: usize, pattern_len: usize, max_distance: usize) -> Self {
        Self {
            text_len,
            pattern_len,
            max_distance,
            planes: BTreeMap::new(),
        }
    }

    /// Create the initial state of a match: every text offset at pattern
    /// offset 0 with distance 0
    pub fn seeded(text_len: usize, pattern_len: usize, max_distance: usize) -> Self {
        let mut state = Self::new(text_len, pattern_len, max_distance);
        state.insert_plane(0, 0, &PositionSet::full(text_len + 1));
        state
    }

    /// An empty state with the same dimensions as `self`
    pub fn empty_like(&self) -> Self {
        Self::new(self.text_len, self.pattern_len, self.max_distance)
    }

    /// Text length this state is sized for
    #[inline]
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    /// Total pattern length shared by every stage of one match
    #[inline]
    pub fn pattern_len(&self) -> usize {
        self.pattern_len
    }

    /// Largest distance this state can hold
    #[inline]
    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    #[inline]
    fn in_bounds(&self, pattern_pos: usize, distance: usize) -> bool {
        pattern_pos <= self.pattern_len && distance <= self.max_distance
    }

    /// Set one state bit; out-of-range coordinates are ignored
    pub fn set(&mut self, text_pos: usize, pattern_pos: usize, distance: usize) -> bool {
        if text_pos > self.text_len || !self.in_bounds(pattern_pos, distance) {
            return false;
        }
        let size = self.text_len + 1;
        self.planes
            .entry((pattern_pos, distance))
            .or_insert_with(|| PositionSet::new(size))
            .insert(text_pos)
    }

    /// Read one state bit
    pub fn get(&self, text_pos: usize, pattern_pos: usize, distance: usize) -> bool {
        self.planes
            .get(&(pattern_pos, distance))
            .is_some_and(|plane| plane.contains(text_pos))
    }

    /// Text offsets reached at `(pattern_pos, distance)`
    pub fn plane(&self, pattern_pos: usize, distance: usize) -> Option<&PositionSet> {
        self.planes.get(&(pattern_pos, distance))
    }

    /// Union `offsets` into the plane at `(pattern_pos, distance)`.
    ///
    /// Returns `true` if any bit was added.
    pub fn insert_plane(
        &mut self,
        pattern_pos: usize,
        distance: usize,
        offsets: &PositionSet,
    ) -> bool {
        if offsets.is_empty() || !self.in_bounds(pattern_pos, distance) {
            return false;
        }
        debug_assert_eq!(offsets.size(), self.text_len + 1);
        match self.planes.get_mut(&(pattern_pos, distance)) {
            Some(plane) => plane.union_with(offsets),
            None => {
                self.planes.insert((pattern_pos, distance), offsets.clone());
                true
            }
        }
    }

    /// Iterate the non-empty planes of one pattern offset as `(distance, offsets)`
    pub fn layer(&self, pattern_pos: usize) -> impl Iterator<Item = (usize, &PositionSet)> {
        self.planes
            .range((pattern_pos, 0)..=(pattern_pos, self.max_distance))
            .map(|(&(_, distance), plane)| (distance, plane))
    }

    /// Union of the text offsets of one pattern offset across all distances
    pub fn layer_offsets(&self, pattern_pos: usize) -> PositionSet {
        let mut all = PositionSet::new(self.text_len + 1);
        for (_, plane) in self.layer(pattern_pos) {
            all.union_with(plane);
        }
        all
    }

    /// A new state holding the layer at `from` moved to pattern offset `to`
    pub fn relocate(&self, from: usize, to: usize) -> FuzzyState {
        let mut moved = self.empty_like();
        for (distance, plane) in self.layer(from) {
            moved.insert_plane(to, distance, plane);
        }
        moved
    }

    /// Keep only text offsets in `allowed` at pattern offset `pattern_pos`
    pub fn restrict_layer(&mut self, pattern_pos: usize, allowed: &PositionSet) {
        self.planes.retain(|&(pos, _), plane| {
            if pos == pattern_pos {
                plane.intersect_with(allowed);
                !plane.is_empty()
            } else {
                true
            }
        });
    }

    /// Close the layer at `pattern_pos` under deletion: any state may skip
    /// one more text character at the cost of one edit.
    pub fn apply_deletions(&mut self, pattern_pos: usize) {
        for distance in 0..self.max_distance {
            let Some(plane) = self.planes.get(&(pattern_pos, distance)) else {
                continue;
            };
            let skipped = plane.shifted();
            self.insert_plane(pattern_pos, distance + 1, &skipped);
        }
    }

    /// All member coordinates `(text, pattern, distance)` in ascending order
    pub fn states(&self) -> Vec<(usize, usize, usize)> {
        let mut states: Vec<_> = self
            .planes
            .iter()
            .flat_map(|(&(pattern_pos, distance), plane)| {
                plane.iter().map(move |text_pos| (text_pos, pattern_pos, distance))
            })
            .collect();
        states.sort_unstable();
        states
    }

    /// Number of member states
    pub fn state_count(&self) -> usize {
        self.planes.values().map(PositionSet::len).sum()
    }

    /// Text offsets reached at the end of the pattern, per distance
    pub fn match_ends(&self) -> BTreeMap<usize, Vec<usize>> {
        self.layer(self.pattern_len)
            .map(|(distance, plane)| (distance, plane.to_vec()))
            .collect()
    }

    /// Whether no state is set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    /// Whether both states have the same dimensions
    pub fn is_compatible(&self, other: &FuzzyState) -> bool {
        self.text_len == other.text_len
            && self.pattern_len == other.pattern_len
            && self.max_distance == other.max_distance
    }

    /// In-place union; returns `true` if any state was added
    pub fn union_with(&mut self, other: &FuzzyState) -> bool {
        assert!(self.is_compatible(other), "fuzzy states must share dimensions");
        let mut changed = false;
        for (&(pattern_pos, distance), plane) in &other.planes {
            changed |= self.insert_plane(pattern_pos, distance, plane);
        }
        changed
    }
}

impl FlowSet for FuzzyState {
    #[inline]
    fn merge(&mut self, other: &Self) -> bool {
        self.union_with(other)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        FuzzyState::is_empty(self)
    }
}

impl fmt::Display for FuzzyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FuzzyState[{}x{}x{}] (active: {})",
            self.text_len,
            self.pattern_len,
            self.max_distance,
            self.state_count()
        )?;
        for (&(pattern_pos, distance), plane) in &self.planes {
            write!(f, " p{}/d{}={:?}", pattern_pos, distance, plane.to_vec())?;
        }
        Ok(())
    }
}

impl fmt::Debug for FuzzyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
