//! Bounded edit-distance matching
//!
//! The fuzzy evaluator drives the same pattern tree over a [`FuzzyState`].
//! Every node owns a fixed slice of one shared pattern-offset axis, laid
//! out once per pattern by [`FuzzyLayout`]. A node applied at entry offset
//! `p` reads the layer at `p` and writes only the layer at `p` plus its
//! laid-out length.
//!
//! A character atom allows, from each state `(t, p, d)`:
//! - match: `(t + 1, p + 1, d)` if the atom accepts `text[t]`
//! - substitution: `(t + 1, p + 1, d + 1)`
//! - insertion, a pattern unit with no text: `(t, p + 1, d + 1)`
//! - deletion, a text character with no pattern: `(t + 1, p, d + 1)`,
//!   applied as a closure on the entry layer
//!
//! Edits are only emitted while `d + 1 <= max_distance`. After the root
//! finishes, one more deletion closure on the final layer absorbs trailing
//! text.
//!
//! # Example
//!
//! ```rust
//! use flowmatch::flow::compile;
//!
//! let pattern = compile("cat").unwrap();
//! let matches = pattern.fuzzy_match_all("cats", 1).unwrap();
//! assert_eq!(matches.get(0), &[3]);
//! assert_eq!(matches.get(1), &[2, 4]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ast::{FuzzyLayout, PatternNode};
use super::debug::{StepObserver, StepSet};
use super::fuzzy_state::FuzzyState;
use super::matcher::Haystack;
use super::position_set::PositionSet;
use super::text_index::TextIndex;
use super::transform::{repeat_fixed_point, round_view, Evaluator};

/// End offsets of fuzzy matches, keyed by edit distance
///
/// Each end offset appears once, under the smallest distance that reaches
/// it. Distances with no end offsets are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuzzyMatches {
    by_distance: BTreeMap<usize, Vec<usize>>,
}

impl FuzzyMatches {
    /// Build from end offsets per distance, which may repeat an offset at
    /// several distances
    pub fn from_raw(raw: BTreeMap<usize, Vec<usize>>) -> Self {
        let mut seen = std::collections::BTreeSet::new();
        let mut by_distance = BTreeMap::new();
        for (distance, ends) in raw {
            let mut fresh: Vec<usize> = ends.into_iter().filter(|&end| seen.insert(end)).collect();
            if fresh.is_empty() {
                continue;
            }
            fresh.sort_unstable();
            by_distance.insert(distance, fresh);
        }
        Self { by_distance }
    }

    /// Sorted end offsets whose best distance is `distance`
    pub fn get(&self, distance: usize) -> &[usize] {
        self.by_distance
            .get(&distance)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Exact matches
    pub fn exact(&self) -> &[usize] {
        self.get(0)
    }

    /// Distances that have at least one end offset, ascending
    pub fn distances(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_distance.keys().copied()
    }

    /// `(distance, ends)` pairs in ascending distance order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.by_distance
            .iter()
            .map(|(&distance, ends)| (distance, ends.as_slice()))
    }

    /// Smallest distance at which a match ends at `end`
    pub fn best_distance(&self, end: usize) -> Option<usize> {
        self.iter()
            .find(|(_, ends)| ends.binary_search(&end).is_ok())
            .map(|(distance, _)| distance)
    }

    /// Sorted end offsets reachable within `distance` edits
    pub fn within(&self, distance: usize) -> Vec<usize> {
        let mut ends: Vec<usize> = self
            .by_distance
            .range(..=distance)
            .flat_map(|(_, ends)| ends.iter().copied())
            .collect();
        ends.sort_unstable();
        ends
    }

    /// Number of distinct end offsets
    pub fn len(&self) -> usize {
        self.by_distance.values().map(Vec::len).sum()
    }

    /// Whether nothing matched
    pub fn is_empty(&self) -> bool {
        self.by_distance.is_empty()
    }

    /// The underlying map
    pub fn as_map(&self) -> &BTreeMap<usize, Vec<usize>> {
        &self.by_distance
    }
}

/// Drives a pattern tree over one text with a distance bound
///
/// Every call takes the tree together with its [`FuzzyLayout`], which a
/// [`CompiledPattern`](super::pattern::CompiledPattern) computes once.
pub struct FuzzyMatcher<'t> {
    haystack: Haystack<'t>,
    max_distance: usize,
}

impl<'t> FuzzyMatcher<'t> {
    /// Match against `chars` with at most `max_distance` edits
    pub fn new(chars: &'t [char], max_distance: usize) -> Self {
        Self {
            haystack: Haystack::new(chars),
            max_distance,
        }
    }

    /// Match against the text of `index`, using its masks
    pub fn with_index(index: &'t TextIndex, max_distance: usize) -> Self {
        Self {
            haystack: Haystack::indexed(index),
            max_distance,
        }
    }

    /// Largest number of edits considered
    pub fn max_distance(&self) -> usize {
        self.max_distance
    }

    /// End offsets of every match of `root` within the distance bound
    pub fn match_ends(&self, root: &PatternNode, layout: &FuzzyLayout) -> FuzzyMatches {
        FuzzyMatches::from_raw(self.final_state(root, layout, None).match_ends())
    }

    /// Like [`match_ends`](Self::match_ends), reporting every step to `observer`
    pub fn match_ends_traced(
        &self,
        root: &PatternNode,
        layout: &FuzzyLayout,
        observer: &mut dyn StepObserver,
    ) -> FuzzyMatches {
        FuzzyMatches::from_raw(self.final_state(root, layout, Some(observer)).match_ends())
    }

    /// The complete state after `root` and the trailing deletion closure
    pub fn final_state(
        &self,
        root: &PatternNode,
        layout: &FuzzyLayout,
        observer: Option<&mut dyn StepObserver>,
    ) -> FuzzyState {
        let pattern_len = layout.len();
        let seed = FuzzyState::seeded(self.haystack.len(), pattern_len, self.max_distance);
        let mut evaluator = FuzzyEvaluator {
            haystack: self.haystack,
            observer,
            exact: Evaluator::new(self.haystack),
        };
        let mut state = evaluator.apply(root, layout, &seed, 0);
        state.apply_deletions(pattern_len);
        state
    }
}

struct FuzzyEvaluator<'a, 't> {
    haystack: Haystack<'t>,
    observer: Option<&'a mut dyn StepObserver>,
    /// Lookahead conditions and cached index masks
    exact: Evaluator<'static, 't>,
}

impl FuzzyEvaluator<'_, '_> {
    /// Apply `node`, laid out by `layout`, to the layer of `state` at `entry`
    fn apply(
        &mut self,
        node: &PatternNode,
        layout: &FuzzyLayout,
        state: &FuzzyState,
        entry: usize,
    ) -> FuzzyState {
        let output = match node {
            PatternNode::Literal(_) | PatternNode::AnyChar | PatternNode::CharacterClass(_) => {
                self.step_atom(node, state, entry)
            }
            PatternNode::Concat(nodes) => {
                let mut current: Option<FuzzyState> = None;
                let mut offset = entry;
                for (part, part_layout) in nodes.iter().zip(layout.children()) {
                    let input = current.as_ref().unwrap_or(state);
                    current = Some(self.apply(part, part_layout, input, offset));
                    offset += part_layout.len();
                }
                current.unwrap_or_else(|| state.clone())
            }
            PatternNode::Alternation(branches) => {
                let exit = entry + layout.len();
                let mut output = state.empty_like();
                for (branch, branch_layout) in branches.iter().zip(layout.children()) {
                    let reached = self.apply(branch, branch_layout, state, entry);
                    output.union_with(&reached.relocate(entry + branch_layout.len(), exit));
                }
                output
            }
            PatternNode::Repeat {
                node: element,
                min,
                max,
            } => {
                let element_layout = layout.child(0);
                let span = element_layout.len();
                let start = state.relocate(entry, entry);
                let ceiling = self.haystack.len() + state.max_distance() + 2;
                let looped = repeat_fixed_point(&start, *min, *max, ceiling, |set, iteration| {
                    // Rewind every iteration to the element's entry
                    let next = self
                        .apply(element, element_layout, set, entry)
                        .relocate(entry + span, entry);
                    if let Some(observer) = self.observer.as_deref_mut() {
                        let reached = round_view(set, &next, iteration, *min);
                        observer.on_iteration(node, iteration, StepSet::Fuzzy(&reached));
                    }
                    next
                });
                looped.relocate(entry, entry + span)
            }
            PatternNode::PositiveLookahead { condition, body } => {
                self.apply_lookahead(condition, body, layout.child(1), state, entry, true)
            }
            PatternNode::NegativeLookahead { condition, body } => {
                self.apply_lookahead(condition, body, layout.child(1), state, entry, false)
            }
        };

        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_step(node, StepSet::Fuzzy(state), StepSet::Fuzzy(&output));
        }
        output
    }

    fn step_atom(&mut self, node: &PatternNode, state: &FuzzyState, entry: usize) -> FuzzyState {
        let mut work = state.relocate(entry, entry);
        work.apply_deletions(entry);

        let haystack = self.haystack;
        let mask = self.exact.atom_mask(node);
        let exit = entry + 1;
        let mut output = state.empty_like();
        for (distance, plane) in work.layer(entry) {
            let hits = match mask {
                Some(mask) => {
                    let mut hits = plane.clone();
                    hits.intersect_with(mask);
                    hits
                }
                None => PositionSet::from_positions(
                    plane.size(),
                    plane.iter().filter(|&pos| haystack.matches_at(node, pos)),
                ),
            };
            output.insert_plane(exit, distance, &hits.shifted());

            if distance < state.max_distance() {
                // Substitution
                output.insert_plane(exit, distance + 1, &plane.shifted());
                // Insertion
                output.insert_plane(exit, distance + 1, plane);
            }
        }
        output
    }

    /// The condition is checked exactly, with no edits, at each entry
    /// offset; the body is matched fuzzily from the offsets that pass.
    fn apply_lookahead(
        &mut self,
        condition: &PatternNode,
        body: &PatternNode,
        body_layout: &FuzzyLayout,
        state: &FuzzyState,
        entry: usize,
        positive: bool,
    ) -> FuzzyState {
        let entries = state.layer_offsets(entry);
        let allowed = self.exact.lookahead_offsets(condition, &entries, positive);
        let mut entering = state.relocate(entry, entry);
        entering.restrict_layer(entry, &allowed);
        self.apply(body, body_layout, &entering, entry)
    }
}

#[cfg(test)]
mod tests {
    use super::super::debug::StepTrace;
    use super::super::parser::parse;
    use super::*;

    fn fuzzy(pattern: &str, text: &str, max_distance: usize) -> FuzzyMatches {
        let chars: Vec<char> = text.chars().collect();
        let root = parse(pattern).unwrap();
        FuzzyMatcher::new(&chars, max_distance).match_ends(&root, &FuzzyLayout::of(&root))
    }

    fn map(entries: &[(usize, &[usize])]) -> BTreeMap<usize, Vec<usize>> {
        entries.iter().map(|(d, ends)| (*d, ends.to_vec())).collect()
    }

    #[test]
    fn test_cat_in_cats() {
        let matches = fuzzy("cat", "cats", 1);
        assert_eq!(matches.as_map(), &map(&[(0, &[3]), (1, &[2, 4])]));
    }

    #[test]
    fn test_zero_distance_is_exact() {
        let text = "abcabxac";
        let chars: Vec<char> = text.chars().collect();
        for pattern in ["ab", "a.c", "(ab|x)+", "[a-b]{2}", "(?!ab)a."] {
            let root = parse(pattern).unwrap();
            let haystack = Haystack::new(&chars);
            let exact = Evaluator::new(haystack).apply(&root, &haystack.all_offsets());
            let layout = FuzzyLayout::of(&root);
            let matches = FuzzyMatcher::new(&chars, 0).match_ends(&root, &layout);
            assert_eq!(matches.exact(), exact.to_vec().as_slice(), "{}", pattern);
            assert!(matches.distances().all(|distance| distance == 0));
        }
    }

    #[test]
    fn test_substitution() {
        let matches = fuzzy("abc", "xbc", 1);
        assert!(matches.exact().is_empty());
        assert_eq!(matches.best_distance(3), Some(1));
    }

    #[test]
    fn test_deletion_between_characters() {
        // "ac" in "abc": delete 'b'
        let matches = fuzzy("ac", "abc", 1);
        assert_eq!(matches.best_distance(3), Some(1));
    }

    #[test]
    fn test_insertion() {
        // "abc" against "ac": one pattern character has no text
        let matches = fuzzy("abc", "ac", 1);
        assert_eq!(matches.best_distance(2), Some(1));
    }

    #[test]
    fn test_distance_bound() {
        let matches = fuzzy("abcd", "wxyz", 2);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_alternation_lifts_shorter_branch() {
        let matches = fuzzy("a|bcd", "a", 0);
        assert_eq!(matches.exact(), &[1]);
        let matches = fuzzy("a|bcd", "bd", 1);
        assert_eq!(matches.best_distance(2), Some(1));
    }

    #[test]
    fn test_repeat_under_edits() {
        let matches = fuzzy("ab*c", "abbxc", 1);
        assert_eq!(matches.best_distance(5), Some(1));
        assert_eq!(fuzzy("ab*c", "abbbc", 1).best_distance(5), Some(0));
    }

    #[test]
    fn test_lookahead_condition_is_exact() {
        // The condition never tolerates edits
        let matches = fuzzy("(?=q)ab", "ab", 1);
        assert!(matches.is_empty());
        let matches = fuzzy("(?=a)ax", "ab", 1);
        assert_eq!(matches.best_distance(2), Some(1));
    }

    #[test]
    fn test_fuzzy_matches_helpers() {
        let raw = map(&[(0, &[3]), (1, &[2, 3, 4]), (2, &[2])]);
        let matches = FuzzyMatches::from_raw(raw);
        assert_eq!(matches.get(1), &[2, 4]);
        assert!(matches.get(2).is_empty());
        assert_eq!(matches.distances().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(matches.within(0), vec![3]);
        assert_eq!(matches.within(1), vec![2, 3, 4]);
        assert_eq!(matches.best_distance(9), None);
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_fuzzy_matches_json() {
        let matches = fuzzy("cat", "cats", 1);
        let json = serde_json::to_string(&matches).unwrap();
        assert_eq!(json, r#"{"0":[3],"1":[2,4]}"#);
        let back: FuzzyMatches = serde_json::from_str(&json).unwrap();
        assert_eq!(back, matches);
    }

    #[test]
    fn test_traced_reports_fuzzy_steps() {
        let chars: Vec<char> = "ab".chars().collect();
        let mut trace = StepTrace::new();
        let root = parse("a+").unwrap();
        let layout = FuzzyLayout::of(&root);
        let matches = FuzzyMatcher::new(&chars, 1).match_ends_traced(&root, &layout, &mut trace);
        assert_eq!(matches.exact(), &[1]);
        assert!(!trace.iterations_of("a+").is_empty());
    }

    #[test]
    fn test_long_literal_pattern() {
        let pattern = "abc".repeat(2_000);
        let root = parse(&pattern).unwrap();
        let layout = FuzzyLayout::of(&root);
        assert_eq!(layout.len(), 6_000);

        let mut text: Vec<char> = pattern.chars().collect();
        text[100] = 'x';
        let matches = FuzzyMatcher::new(&text, 1).match_ends(&root, &layout);
        assert!(matches.exact().is_empty());
        assert_eq!(matches.best_distance(6_000), Some(1));
    }

    #[test]
    fn test_indexed_equals_plain() {
        let text = "cat cart cut";
        let index = TextIndex::for_text(text);
        let chars: Vec<char> = text.chars().collect();
        for pattern in ["c[aeiou]t", "c.r?t", "(ca|cu)t"] {
            let root = parse(pattern).unwrap();
            let layout = FuzzyLayout::of(&root);
            assert_eq!(
                FuzzyMatcher::with_index(&index, 1).match_ends(&root, &layout),
                FuzzyMatcher::new(&chars, 1).match_ends(&root, &layout),
                "{}",
                pattern
            );
        }
    }
}
