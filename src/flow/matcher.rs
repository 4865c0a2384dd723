//! Exact matcher
//!
//! [`Matcher`] seeds a [`PositionSet`] with every text offset, so every
//! offset is a legal match start, applies the pattern tree once and
//! reports the offsets where some match ends. No loop over start
//! positions is needed.
//!
//! [`Haystack`] is the text as the evaluator sees it: the characters plus
//! an optional [`TextIndex`] that answers character tests with
//! precomputed masks.

use super::ast::PatternNode;
use super::debug::StepObserver;
use super::error::MatchError;
use super::position_set::PositionSet;
use super::text_index::TextIndex;
use super::tracked::TrackedPositionSet;
use super::transform::Evaluator;

// ============================================================================
// Configuration
// ============================================================================

/// Default maximum text length in characters
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10_000;

/// Default largest accepted edit distance for fuzzy matching
pub const DEFAULT_MAX_DISTANCE: usize = 8;

/// Limits checked at the start of every match call
///
/// Memory use of a match is proportional to the text length (times the
/// distance bound for fuzzy matching), so both are capped up front.
///
/// # Example
///
/// ```rust
/// use flowmatch::flow::MatchConfig;
///
/// let config = MatchConfig::new()
///     .with_max_text_length(1_000)
///     .with_max_distance(2);
/// assert_eq!(config.max_text_length, 1_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Maximum text length in characters
    pub max_text_length: usize,

    /// Largest `max_distance` accepted by fuzzy matching
    pub max_distance: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

impl MatchConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum text length
    pub fn with_max_text_length(mut self, length: usize) -> Self {
        self.max_text_length = length;
        self
    }

    /// Set the largest accepted edit distance
    pub fn with_max_distance(mut self, distance: usize) -> Self {
        self.max_distance = distance;
        self
    }

    /// Reject texts longer than the configured maximum
    #[inline]
    pub fn check_text_length(&self, length: usize) -> Result<(), MatchError> {
        if length > self.max_text_length {
            return Err(MatchError::InputTooLong {
                length,
                max_length: self.max_text_length,
            });
        }
        Ok(())
    }

    /// Reject edit distances above the configured maximum
    #[inline]
    pub fn check_distance(&self, distance: usize) -> Result<(), MatchError> {
        if distance > self.max_distance {
            return Err(MatchError::InvalidArgument {
                name: "max_distance",
                reason: format!(
                    "{} exceeds the configured limit of {}",
                    distance, self.max_distance
                ),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Haystack
// ============================================================================

/// The text being searched, with an optional precomputed index
#[derive(Debug, Clone, Copy)]
pub struct Haystack<'t> {
    chars: &'t [char],
    index: Option<&'t TextIndex>,
}

impl<'t> Haystack<'t> {
    /// Search `chars` with direct character tests
    pub fn new(chars: &'t [char]) -> Self {
        Self { chars, index: None }
    }

    /// Search the text an index was built from, using its masks
    pub fn indexed(index: &'t TextIndex) -> Self {
        Self {
            chars: index.chars(),
            index: Some(index),
        }
    }

    /// Text length in characters
    #[inline]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the text is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The characters of the text
    #[inline]
    pub fn chars(&self) -> &'t [char] {
        self.chars
    }

    /// The index, if one is attached
    #[inline]
    pub fn index(&self) -> Option<&'t TextIndex> {
        self.index
    }

    /// Whether the character atom `node` matches the character at `pos`
    #[inline]
    pub fn matches_at(&self, node: &PatternNode, pos: usize) -> bool {
        self.chars.get(pos).is_some_and(|&c| node.matches_char(c))
    }

    /// Every offset `0..=len`
    pub fn all_offsets(&self) -> PositionSet {
        PositionSet::full(self.len() + 1)
    }
}

// ============================================================================
// Matcher
// ============================================================================

/// Drives a pattern tree over one text
///
/// # Example
///
/// ```rust
/// use flowmatch::flow::{parse, Matcher};
///
/// let root = parse("a").unwrap();
/// let text: Vec<char> = "banana".chars().collect();
/// assert_eq!(Matcher::new(&text).match_ends(&root), vec![2, 4, 6]);
/// ```
pub struct Matcher<'t> {
    haystack: Haystack<'t>,
}

impl<'t> Matcher<'t> {
    /// Match against `chars`
    pub fn new(chars: &'t [char]) -> Self {
        Self {
            haystack: Haystack::new(chars),
        }
    }

    /// Match against the text of `index`, using its masks
    pub fn with_index(index: &'t TextIndex) -> Self {
        Self {
            haystack: Haystack::indexed(index),
        }
    }

    /// The text being matched
    pub fn haystack(&self) -> Haystack<'t> {
        self.haystack
    }

    /// Sorted end offsets of every match of `root`
    pub fn match_ends(&self, root: &PatternNode) -> Vec<usize> {
        let seed = self.haystack.all_offsets();
        let mut evaluator = Evaluator::new(self.haystack);
        let ends = evaluator.apply(root, &seed).to_vec();
        if self.haystack.index().is_some() {
            log_debug!("indexed match used {} class masks", evaluator.cached_masks());
        }
        ends
    }

    /// Like [`match_ends`](Self::match_ends), reporting every step to `observer`
    pub fn match_ends_traced(
        &self,
        root: &PatternNode,
        observer: &mut dyn StepObserver,
    ) -> Vec<usize> {
        let seed = self.haystack.all_offsets();
        Evaluator::with_observer(self.haystack, observer)
            .apply(root, &seed)
            .to_vec()
    }

    /// Every `(start, end)` pair such that `root` matches `text[start..end)`,
    /// ordered by end then start
    pub fn match_pairs(&self, root: &PatternNode) -> Vec<(usize, usize)> {
        let seed = TrackedPositionSet::from_position_set(&self.haystack.all_offsets());
        Evaluator::new(self.haystack)
            .apply_tracked(root, &seed)
            .pairs()
    }
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.max_text_length, DEFAULT_MAX_TEXT_LENGTH);
        assert_eq!(config.max_distance, DEFAULT_MAX_DISTANCE);
        assert_eq!(MatchConfig::new(), config);
    }

    #[test]
    fn test_config_checks() {
        let config = MatchConfig::new().with_max_text_length(3).with_max_distance(1);
        assert!(config.check_text_length(3).is_ok());
        assert_eq!(
            config.check_text_length(4),
            Err(MatchError::InputTooLong {
                length: 4,
                max_length: 3
            })
        );
        assert!(config.check_distance(1).is_ok());
        assert!(matches!(
            config.check_distance(2),
            Err(MatchError::InvalidArgument { name: "max_distance", .. })
        ));
    }

    #[test]
    fn test_match_ends() {
        let text = chars("banana");
        let matcher = Matcher::new(&text);
        assert_eq!(matcher.match_ends(&parse("an").unwrap()), vec![3, 5]);
        assert_eq!(matcher.match_ends(&parse("x").unwrap()), Vec::<usize>::new());
    }

    #[test]
    fn test_empty_text() {
        let text = chars("");
        let matcher = Matcher::new(&text);
        assert_eq!(matcher.match_ends(&parse("a*").unwrap()), vec![0]);
        assert!(matcher.match_ends(&parse("a").unwrap()).is_empty());
    }

    #[test]
    fn test_match_pairs() {
        let text = chars("aab");
        let pairs = Matcher::new(&text).match_pairs(&parse("a+b").unwrap());
        assert_eq!(pairs, vec![(0, 3), (1, 3)]);
    }

    #[test]
    fn test_haystack_matches_at() {
        let text = chars("a\n");
        let haystack = Haystack::new(&text);
        assert!(haystack.matches_at(&PatternNode::AnyChar, 0));
        assert!(!haystack.matches_at(&PatternNode::AnyChar, 1));
        assert!(!haystack.matches_at(&PatternNode::AnyChar, 2));
        assert!(haystack.index().is_none());
    }
}
