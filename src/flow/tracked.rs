//! Position sets annotated with start offsets
//!
//! A [`TrackedPositionSet`] pairs every reachable end offset with the set of
//! start offsets that produced it. Lookahead needs this: `(?=B)A` keeps an
//! end of `A` only if `B` also matched from the *same* start, which a plain
//! [`PositionSet`] cannot express.

use std::collections::BTreeMap;
use std::fmt;

use super::position_set::{FlowSet, PositionSet};

/// A position set plus an `end -> starts` relation
///
/// Invariant: every member of the underlying end set has a non-empty start
/// set in the relation, and the relation has no entry for a non-member.
#[derive(Clone, PartialEq, Eq)]
pub struct TrackedPositionSet {
    ends: PositionSet,
    starts: BTreeMap<usize, PositionSet>,
}

impl TrackedPositionSet {
    /// Create an empty tracked set over offsets `0..size`
    pub fn new(size: usize) -> Self {
        Self {
            ends: PositionSet::new(size),
            starts: BTreeMap::new(),
        }
    }

    /// Lift a plain set: every member becomes its own origin
    pub fn from_position_set(set: &PositionSet) -> Self {
        let mut tracked = Self::new(set.size());
        for pos in set {
            tracked.insert(pos, pos);
        }
        tracked
    }

    /// Number of addressable offsets
    #[inline]
    pub fn size(&self) -> usize {
        self.ends.size()
    }

    /// Record that a match starting at `start` can end at `end`.
    ///
    /// Out-of-range offsets are ignored. Returns `true` if the pair is new.
    pub fn insert(&mut self, start: usize, end: usize) -> bool {
        let size = self.size();
        if start >= size || end >= size {
            return false;
        }
        self.ends.insert(end);
        self.starts
            .entry(end)
            .or_insert_with(|| PositionSet::new(size))
            .insert(start)
    }

    /// Record every start in `starts` as an origin of `end`
    pub fn insert_starts(&mut self, starts: &PositionSet, end: usize) -> bool {
        if end >= self.size() || starts.is_empty() {
            return false;
        }
        self.ends.insert(end);
        match self.starts.get_mut(&end) {
            Some(existing) => existing.union_with(starts),
            None => {
                self.starts.insert(end, starts.clone());
                true
            }
        }
    }

    /// Start offsets recorded for `end`
    pub fn starts_of(&self, end: usize) -> Option<&PositionSet> {
        self.starts.get(&end)
    }

    /// The plain set of end offsets
    #[inline]
    pub fn ends(&self) -> &PositionSet {
        &self.ends
    }

    /// Iterate `(end, starts)` entries in ascending end order
    pub fn entries(&self) -> impl Iterator<Item = (usize, &PositionSet)> {
        self.starts.iter().map(|(&end, starts)| (end, starts))
    }

    /// Every `(start, end)` pair, ordered by end then start
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.entries()
            .flat_map(|(end, starts)| starts.iter().map(move |start| (start, end)))
            .collect()
    }

    /// Union of all start sets
    pub fn start_set(&self) -> PositionSet {
        let mut all = PositionSet::new(self.size());
        for starts in self.starts.values() {
            all.union_with(starts);
        }
        all
    }

    /// Number of `(start, end)` pairs
    pub fn pair_count(&self) -> usize {
        self.starts.values().map(PositionSet::len).sum()
    }

    /// Whether no pair is recorded
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// In-place union of pairs; returns `true` if any pair was added
    pub fn union_with(&mut self, other: &TrackedPositionSet) -> bool {
        let mut changed = false;
        for (end, starts) in other.entries() {
            changed |= self.insert_starts(starts, end);
        }
        changed
    }

    /// Keep only pairs whose start is in `allowed`
    pub fn retain_starts(&mut self, allowed: &PositionSet) {
        self.filter_starts(|starts| starts.intersect_with(allowed));
    }

    /// Drop pairs whose start is in `denied`
    pub fn remove_starts(&mut self, denied: &PositionSet) {
        self.filter_starts(|starts| starts.difference_with(denied));
    }

    /// Keep only pairs whose end is in `allowed`
    pub fn retain_ends(&mut self, allowed: &PositionSet) {
        self.ends.intersect_with(allowed);
        let ends = &self.ends;
        self.starts.retain(|&end, _| ends.contains(end));
    }

    fn filter_starts(&mut self, mut f: impl FnMut(&mut PositionSet)) {
        let ends = &mut self.ends;
        self.starts.retain(|&end, starts| {
            f(starts);
            if starts.is_empty() {
                ends.remove(end);
                false
            } else {
                true
            }
        });
    }

    /// Pairs of `self` whose start also starts some pair of `other`
    pub fn lookahead_intersect(&self, other: &TrackedPositionSet) -> TrackedPositionSet {
        let mut result = self.clone();
        result.retain_starts(&other.start_set());
        result
    }

    /// Pairs of `self` whose start starts no pair of `other`
    pub fn lookahead_subtract(&self, other: &TrackedPositionSet) -> TrackedPositionSet {
        let mut result = self.clone();
        result.remove_starts(&other.start_set());
        result
    }

    /// Forget the start offsets
    pub fn to_position_set(&self) -> PositionSet {
        self.ends.clone()
    }
}

impl FlowSet for TrackedPositionSet {
    #[inline]
    fn merge(&mut self, other: &Self) -> bool {
        self.union_with(other)
    }

    #[inline]
    fn is_empty(&self) -> bool {
        TrackedPositionSet::is_empty(self)
    }
}

impl fmt::Display for TrackedPositionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pairs: {:?})", self.ends, self.pairs())
    }
}

impl fmt::Debug for TrackedPositionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrackedPositionSet[{}]", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_position_set_is_identity() {
        let plain = PositionSet::from_positions(5, [0, 2, 4]);
        let tracked = TrackedPositionSet::from_position_set(&plain);
        assert_eq!(tracked.pairs(), vec![(0, 0), (2, 2), (4, 4)]);
        assert_eq!(tracked.to_position_set(), plain);
    }

    #[test]
    fn test_insert_ignores_out_of_range() {
        let mut tracked = TrackedPositionSet::new(3);
        assert!(tracked.insert(0, 2));
        assert!(!tracked.insert(0, 2));
        assert!(!tracked.insert(0, 3));
        assert!(!tracked.insert(5, 1));
        assert_eq!(tracked.pair_count(), 1);
    }

    #[test]
    fn test_lookahead_intersect_keys_on_start() {
        let mut main = TrackedPositionSet::new(10);
        main.insert(0, 5);
        main.insert(3, 5);
        main.insert(4, 6);

        let mut condition = TrackedPositionSet::new(10);
        condition.insert(3, 4);

        let kept = main.lookahead_intersect(&condition);
        assert_eq!(kept.pairs(), vec![(3, 5)]);
        assert_eq!(kept.ends().to_vec(), vec![5]);

        let rest = main.lookahead_subtract(&condition);
        assert_eq!(rest.pairs(), vec![(0, 5), (4, 6)]);
        assert_eq!(rest.ends().to_vec(), vec![5, 6]);
    }

    #[test]
    fn test_filter_removes_emptied_ends() {
        let mut tracked = TrackedPositionSet::new(6);
        tracked.insert(1, 2);
        tracked.insert(2, 4);
        tracked.retain_starts(&PositionSet::from_positions(6, [2]));
        assert_eq!(tracked.ends().to_vec(), vec![4]);
        assert!(tracked.starts_of(2).is_none());
    }

    #[test]
    fn test_retain_ends() {
        let mut tracked = TrackedPositionSet::new(6);
        tracked.insert(0, 2);
        tracked.insert(1, 3);
        tracked.insert(2, 3);
        tracked.retain_ends(&PositionSet::from_positions(6, [3, 5]));
        assert_eq!(tracked.pairs(), vec![(1, 3), (2, 3)]);
        assert_eq!(tracked.ends().to_vec(), vec![3]);
    }

    #[test]
    fn test_union_reports_change() {
        let mut a = TrackedPositionSet::new(4);
        a.insert(0, 1);
        let mut b = TrackedPositionSet::new(4);
        b.insert(0, 1);
        assert!(!a.union_with(&b));
        b.insert(1, 1);
        assert!(a.union_with(&b));
        assert_eq!(a.starts_of(1).map(PositionSet::to_vec), Some(vec![0, 1]));
    }
}
