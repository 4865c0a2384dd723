//! The transformation contract
//!
//! Every [`PatternNode`] is a function from a set of text offsets to a set
//! of text offsets: output offset `j` is present iff some input offset
//! `i <= j` exists such that the node matches `text[i..j)`. Composition
//! follows the tree:
//!
//! - character atoms move each matching offset one step forward
//! - `Concat` feeds the output of each part into the next
//! - `Alternation` is the union of its branches over the same input
//! - `Repeat` iterates its element to a fixed point
//! - lookaheads intersect or subtract by start offset
//!
//! The same contract is implemented twice: over plain [`PositionSet`]s
//! and over [`TrackedPositionSet`]s, which additionally carry the start
//! offset of every match. Lookahead and span reporting need the latter.
//!
//! # Termination
//!
//! [`repeat_fixed_point`] is the only loop. For a text of `N` characters
//! the exact phase stabilises after at most `N + 1` applications (a
//! longer chain of element matches must contain an empty match, which can
//! be removed or duplicated freely) and the accumulation phase can grow
//! at most `N + 1` times. The loop is additionally capped at a hard
//! ceiling supplied by the caller.

use hashbrown::HashMap;

use super::ast::PatternNode;
use super::debug::{StepObserver, StepSet};
use super::matcher::Haystack;
use super::position_set::{FlowSet, PositionSet};
use super::tracked::TrackedPositionSet;

/// Repeat `step` between `min` and `max` times (unbounded if `None`),
/// returning the union of the sets reached after each permitted count.
///
/// `step` receives the current set and the 1-based iteration number. While
/// `iteration <= min` that set is the result of exactly `iteration - 1`
/// applications; afterwards it is everything reached so far, and the round
/// adds the step's output to it. Each of the two phases stops after
/// `ceiling` applications at the latest.
pub fn repeat_fixed_point<S, F>(
    input: &S,
    min: usize,
    max: Option<usize>,
    ceiling: usize,
    mut step: F,
) -> S
where
    S: FlowSet,
    F: FnMut(&S, usize) -> S,
{
    // Exact phase: exactly `min` applications
    let mut current = input.clone();
    let mut iteration = 0;
    while iteration < min {
        if iteration >= ceiling {
            log_debug!("repeat: exact phase stopped at ceiling {}", ceiling);
            break;
        }
        iteration += 1;
        let next = step(&current, iteration);
        if next.is_empty() {
            return next;
        }
        if next == current {
            log_debug!("repeat: exact phase converged after {} iterations", iteration);
            break;
        }
        current = next;
    }

    // Accumulation phase: up to `max - min` more, keeping every count
    let extra = max.map(|max| max.saturating_sub(min));
    let mut result = current;
    let mut rounds = 0;
    loop {
        if extra.is_some_and(|extra| rounds >= extra) {
            break;
        }
        if rounds >= ceiling {
            log_debug!("repeat: accumulation stopped at ceiling {}", ceiling);
            break;
        }
        rounds += 1;
        let next = step(&result, min + rounds);
        if !result.merge(&next) {
            log_debug!("repeat: fixed point after {} extra iterations", rounds);
            break;
        }
    }
    result
}

/// The set a repetition round is reported with: the exact-count set in
/// the exact phase, the accumulated set once counts are being collected
pub(crate) fn round_view<S: FlowSet>(set: &S, next: &S, iteration: usize, min: usize) -> S {
    if iteration <= min {
        return next.clone();
    }
    let mut reached = set.clone();
    reached.merge(next);
    reached
}

/// Applies pattern trees to position sets over one text
pub struct Evaluator<'a, 't> {
    haystack: Haystack<'t>,
    observer: Option<&'a mut dyn StepObserver>,
    /// Index masks of class atoms, assembled on first use
    class_masks: HashMap<PatternNode, Option<PositionSet>, ahash::RandomState>,
}

impl<'a, 't> Evaluator<'a, 't> {
    /// Evaluate over `haystack` without diagnostics
    pub fn new(haystack: Haystack<'t>) -> Self {
        Self {
            haystack,
            observer: None,
            class_masks: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Evaluate over `haystack`, reporting every step to `observer`
    pub fn with_observer(haystack: Haystack<'t>, observer: &'a mut dyn StepObserver) -> Self {
        Self {
            haystack,
            observer: Some(observer),
            class_masks: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// The text being evaluated
    pub fn haystack(&self) -> Haystack<'t> {
        self.haystack
    }

    /// Hard iteration ceiling for repetitions over this text
    #[inline]
    fn ceiling(&self) -> usize {
        self.haystack.len() + 2
    }

    /// Offsets whose character matches the atom `node`, if the attached
    /// index can answer without scanning the text.
    ///
    /// Class masks are merged from the index once per evaluator and reused
    /// by every later application of an equal atom.
    pub fn atom_mask(&mut self, node: &PatternNode) -> Option<&PositionSet> {
        let index = self.haystack.index()?;
        match node {
            PatternNode::Literal(c) => {
                let mask = index.positions_of(*c);
                if mask.is_none() {
                    log_debug!("{:?} is not indexed, scanning text", c);
                }
                mask
            }
            PatternNode::AnyChar | PatternNode::CharacterClass(_) => {
                if !self.class_masks.contains_key(node) {
                    let mask = index.class_mask(|c| node.matches_char(c));
                    if mask.is_none() {
                        log_debug!("index does not cover the text, scanning for {}", node);
                    }
                    self.class_masks.insert(node.clone(), mask);
                }
                self.class_masks.get(node).and_then(Option::as_ref)
            }
            _ => None,
        }
    }

    /// Number of class masks assembled so far
    pub fn cached_masks(&self) -> usize {
        self.class_masks.len()
    }

    // ========================================================================
    // Plain position sets
    // ========================================================================

    /// Apply `node` to `input`
    pub fn apply(&mut self, node: &PatternNode, input: &PositionSet) -> PositionSet {
        let output = match node {
            PatternNode::Literal(_) | PatternNode::AnyChar | PatternNode::CharacterClass(_) => {
                self.step_atom(node, input)
            }
            PatternNode::Concat(nodes) => {
                let mut current: Option<PositionSet> = None;
                for part in nodes {
                    let from = current.as_ref().unwrap_or(input);
                    current = Some(self.apply(part, from));
                }
                current.unwrap_or_else(|| input.clone())
            }
            PatternNode::Alternation(branches) => {
                let mut output = PositionSet::new(input.size());
                for branch in branches {
                    let reached = self.apply(branch, input);
                    output.union_with(&reached);
                }
                output
            }
            PatternNode::Repeat {
                node: element,
                min,
                max,
            } => {
                let ceiling = self.ceiling();
                repeat_fixed_point(input, *min, *max, ceiling, |set, iteration| {
                    let next = self.apply(element, set);
                    if let Some(observer) = self.observer.as_deref_mut() {
                        let reached = round_view(set, &next, iteration, *min);
                        observer.on_iteration(node, iteration, StepSet::Exact(&reached));
                    }
                    next
                })
            }
            PatternNode::PositiveLookahead { condition, body } => {
                let seed = TrackedPositionSet::from_position_set(input);
                let assertion = self.apply_tracked(condition, &seed);
                let main = self.apply_tracked(body, &seed);
                main.lookahead_intersect(&assertion).to_position_set()
            }
            PatternNode::NegativeLookahead { condition, body } => {
                let seed = TrackedPositionSet::from_position_set(input);
                let assertion = self.apply_tracked(condition, &seed);
                let main = self.apply_tracked(body, &seed);
                main.lookahead_subtract(&assertion).to_position_set()
            }
        };

        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_step(node, StepSet::Exact(input), StepSet::Exact(&output));
        }
        output
    }

    fn step_atom(&mut self, node: &PatternNode, input: &PositionSet) -> PositionSet {
        if let Some(mask) = self.atom_mask(node) {
            let mut hits = input.clone();
            hits.intersect_with(mask);
            return hits.shifted();
        }
        let mut output = PositionSet::new(input.size());
        for pos in input {
            if self.haystack.matches_at(node, pos) {
                output.insert(pos + 1);
            }
        }
        output
    }

    // ========================================================================
    // Tracked position sets
    // ========================================================================

    /// Apply `node` to `input`, carrying start offsets through
    pub fn apply_tracked(
        &mut self,
        node: &PatternNode,
        input: &TrackedPositionSet,
    ) -> TrackedPositionSet {
        let output = match node {
            PatternNode::Literal(_) | PatternNode::AnyChar | PatternNode::CharacterClass(_) => {
                self.step_atom_tracked(node, input)
            }
            PatternNode::Concat(nodes) => {
                let mut current: Option<TrackedPositionSet> = None;
                for part in nodes {
                    let from = current.as_ref().unwrap_or(input);
                    current = Some(self.apply_tracked(part, from));
                }
                current.unwrap_or_else(|| input.clone())
            }
            PatternNode::Alternation(branches) => {
                let mut output = TrackedPositionSet::new(input.size());
                for branch in branches {
                    let reached = self.apply_tracked(branch, input);
                    output.union_with(&reached);
                }
                output
            }
            PatternNode::Repeat {
                node: element,
                min,
                max,
            } => {
                let ceiling = self.ceiling();
                repeat_fixed_point(input, *min, *max, ceiling, |set, iteration| {
                    let next = self.apply_tracked(element, set);
                    if let Some(observer) = self.observer.as_deref_mut() {
                        let reached = round_view(set, &next, iteration, *min);
                        observer.on_iteration(node, iteration, StepSet::Tracked(&reached));
                    }
                    next
                })
            }
            PatternNode::PositiveLookahead { condition, body } => {
                let allowed = self.lookahead_offsets(condition, input.ends(), true);
                let mut entering = input.clone();
                entering.retain_ends(&allowed);
                self.apply_tracked(body, &entering)
            }
            PatternNode::NegativeLookahead { condition, body } => {
                let allowed = self.lookahead_offsets(condition, input.ends(), false);
                let mut entering = input.clone();
                entering.retain_ends(&allowed);
                self.apply_tracked(body, &entering)
            }
        };

        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_step(node, StepSet::Tracked(input), StepSet::Tracked(&output));
        }
        output
    }

    fn step_atom_tracked(
        &mut self,
        node: &PatternNode,
        input: &TrackedPositionSet,
    ) -> TrackedPositionSet {
        let haystack = self.haystack;
        let mask = self.atom_mask(node);
        let mut output = TrackedPositionSet::new(input.size());
        for (end, starts) in input.entries() {
            let hit = match mask {
                Some(mask) => mask.contains(end),
                None => haystack.matches_at(node, end),
            };
            if hit {
                output.insert_starts(starts, end + 1);
            }
        }
        output
    }

    /// The offsets of `entries` from which `condition` matches (`positive`)
    /// or does not match (`!positive`)
    pub fn lookahead_offsets(
        &mut self,
        condition: &PatternNode,
        entries: &PositionSet,
        positive: bool,
    ) -> PositionSet {
        let seed = TrackedPositionSet::from_position_set(entries);
        let matched = self.apply_tracked(condition, &seed).start_set();
        if positive {
            matched
        } else {
            let mut rest = entries.clone();
            rest.difference_with(&matched);
            rest
        }
    }
}
