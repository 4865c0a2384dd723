//! Compiled patterns
//!
//! [`compile`] parses a pattern once; the resulting [`CompiledPattern`] is
//! immutable and can be matched against any number of texts, from any
//! number of threads. Every match call checks its preconditions (text
//! length, distance bound) before doing any work.
//!
//! # Example
//!
//! ```rust
//! use flowmatch::flow::compile;
//!
//! let pattern = compile("(a|b)*c").unwrap();
//! assert_eq!(pattern.match_all("abacxbbc").unwrap(), vec![4, 8]);
//! assert!(pattern.is_match("c").unwrap());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ast::{FuzzyLayout, PatternNode};
use super::debug::StepObserver;
use super::error::{MatchError, SyntaxError};
use super::fuzzy::{FuzzyMatcher, FuzzyMatches};
use super::matcher::{MatchConfig, Matcher};
use super::parser::parse;
use super::text_index::TextIndex;

/// Parse `pattern` into a reusable [`CompiledPattern`] with default limits
pub fn compile(pattern: &str) -> Result<CompiledPattern, SyntaxError> {
    CompiledPattern::new(pattern)
}

/// A half-open match range `[start, end)` in character offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Offset of the first matched character
    pub start: usize,
    /// Offset one past the last matched character
    pub end: usize,
}

impl Span {
    /// Create a span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no characters
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A parsed pattern plus the limits its match calls enforce
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    root: PatternNode,
    source: String,
    config: MatchConfig,
    /// Fuzzy-axis lengths of every node, shared by all fuzzy matches
    layout: FuzzyLayout,
}

impl CompiledPattern {
    /// Parse `pattern`
    pub fn new(pattern: &str) -> Result<Self, SyntaxError> {
        match parse(pattern) {
            Ok(root) => {
                let compiled = Self::build(root, pattern.to_string());
                log_debug!(
                    "compiled {:?}: {} nodes, fuzzy length {}",
                    pattern,
                    compiled.root.node_count(),
                    compiled.layout.len()
                );
                Ok(compiled)
            }
            Err(error) => {
                log_debug!("failed to compile {:?}: {}", pattern, error);
                Err(error)
            }
        }
    }

    /// Wrap an already built tree, e.g. one deserialized from JSON
    pub fn from_node(root: PatternNode) -> Self {
        let source = root.to_string();
        Self::build(root, source)
    }

    fn build(root: PatternNode, source: String) -> Self {
        let layout = FuzzyLayout::of(&root);
        Self {
            root,
            source,
            config: MatchConfig::default(),
            layout,
        }
    }

    /// Replace the match limits
    pub fn with_config(mut self, config: MatchConfig) -> Self {
        self.config = config;
        self
    }

    /// The pattern tree
    pub fn root(&self) -> &PatternNode {
        &self.root
    }

    /// The pattern text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Length of the pattern axis used by fuzzy matching
    pub fn pattern_len(&self) -> usize {
        self.layout.len()
    }

    /// Fuzzy-axis layout of the tree, computed at compile time
    pub fn layout(&self) -> &FuzzyLayout {
        &self.layout
    }

    /// The match limits
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    fn prepare(&self, text: &str) -> Result<Vec<char>, MatchError> {
        let length = text.chars().count();
        self.config.check_text_length(length)?;
        log_debug!(
            "matching {:?} against {} chars ({} nodes)",
            self.source,
            length,
            self.root.node_count()
        );
        Ok(text.chars().collect())
    }

    /// Sorted end offsets of every match in `text`
    pub fn match_all(&self, text: &str) -> Result<Vec<usize>, MatchError> {
        let chars = self.prepare(text)?;
        Ok(Matcher::new(&chars).match_ends(&self.root))
    }

    /// Like [`match_all`](Self::match_all), reporting every step to `observer`
    pub fn match_all_traced(
        &self,
        text: &str,
        observer: &mut dyn StepObserver,
    ) -> Result<Vec<usize>, MatchError> {
        let chars = self.prepare(text)?;
        Ok(Matcher::new(&chars).match_ends_traced(&self.root, observer))
    }

    /// Same result as [`match_all`](Self::match_all) on the indexed text
    pub fn match_all_indexed(&self, index: &TextIndex) -> Result<Vec<usize>, MatchError> {
        self.config.check_text_length(index.text_len())?;
        Ok(Matcher::with_index(index).match_ends(&self.root))
    }

    /// End offsets of matches within `max_distance` edits, grouped by the
    /// smallest distance that reaches each end
    pub fn fuzzy_match_all(
        &self,
        text: &str,
        max_distance: usize,
    ) -> Result<FuzzyMatches, MatchError> {
        self.config.check_distance(max_distance)?;
        let chars = self.prepare(text)?;
        Ok(FuzzyMatcher::new(&chars, max_distance).match_ends(&self.root, &self.layout))
    }

    /// Like [`fuzzy_match_all`](Self::fuzzy_match_all), reporting every step
    pub fn fuzzy_match_all_traced(
        &self,
        text: &str,
        max_distance: usize,
        observer: &mut dyn StepObserver,
    ) -> Result<FuzzyMatches, MatchError> {
        self.config.check_distance(max_distance)?;
        let chars = self.prepare(text)?;
        Ok(FuzzyMatcher::new(&chars, max_distance).match_ends_traced(
            &self.root,
            &self.layout,
            observer,
        ))
    }

    /// Every match as a `[start, end)` span, ordered by end then start
    pub fn find_spans(&self, text: &str) -> Result<Vec<Span>, MatchError> {
        let chars = self.prepare(text)?;
        Ok(Matcher::new(&chars)
            .match_pairs(&self.root)
            .into_iter()
            .map(|(start, end)| Span::new(start, end))
            .collect())
    }

    /// Whether the pattern matches anywhere in `text`
    pub fn is_match(&self, text: &str) -> Result<bool, MatchError> {
        Ok(!self.match_all(text)?.is_empty())
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::super::debug::StepTrace;
    use super::super::error::SyntaxErrorKind;
    use super::*;

    #[test]
    fn test_compile_and_match() {
        let pattern = compile("a").unwrap();
        assert_eq!(pattern.match_all("banana").unwrap(), vec![2, 4, 6]);
        assert_eq!(pattern.as_str(), "a");
        assert_eq!(pattern.to_string(), "a");
    }

    #[test]
    fn test_compile_error() {
        let error = compile("(ab").unwrap_err();
        assert_eq!(error.kind, SyntaxErrorKind::UnclosedGroup);
        assert_eq!(error.offset, 0);
    }

    #[test]
    fn test_text_length_checked_first() {
        let pattern = compile("a")
            .unwrap()
            .with_config(MatchConfig::new().with_max_text_length(3));
        assert!(pattern.match_all("aaa").is_ok());
        assert_eq!(
            pattern.match_all("aaaa"),
            Err(MatchError::InputTooLong {
                length: 4,
                max_length: 3
            })
        );
        // Length counts characters, not bytes
        assert!(pattern.match_all("ééé").is_ok());
        assert!(pattern.fuzzy_match_all("aaaa", 1).is_err());
        assert!(pattern.find_spans("aaaa").is_err());
    }

    #[test]
    fn test_distance_checked() {
        let pattern = compile("a")
            .unwrap()
            .with_config(MatchConfig::new().with_max_distance(2));
        assert!(pattern.fuzzy_match_all("b", 2).is_ok());
        assert!(matches!(
            pattern.fuzzy_match_all("b", 3),
            Err(MatchError::InvalidArgument { name: "max_distance", .. })
        ));
    }

    #[test]
    fn test_find_spans() {
        let pattern = compile("a").unwrap();
        let spans = pattern.find_spans("banana").unwrap();
        assert_eq!(spans, vec![Span::new(1, 2), Span::new(3, 4), Span::new(5, 6)]);
        assert!(spans.iter().all(|span| span.len() == 1));
    }

    #[test]
    fn test_from_node() {
        let node = PatternNode::repeat(PatternNode::Literal('a'), 1, None);
        let pattern = CompiledPattern::from_node(node);
        assert_eq!(pattern.as_str(), "a+");
        assert_eq!(pattern.match_all("aa").unwrap(), vec![1, 2]);
        assert_eq!(pattern.pattern_len(), 1);
        assert_eq!(pattern.layout(), &FuzzyLayout::of(pattern.root()));
    }

    #[test]
    fn test_long_literal_pattern() {
        let source = "a".repeat(20_000);
        let pattern = compile(&source).unwrap();
        assert_eq!(pattern.pattern_len(), 20_000);
        assert!(pattern.match_all("aaa").unwrap().is_empty());

        let text = format!("b{}", source);
        let pattern = pattern.with_config(MatchConfig::new().with_max_text_length(30_000));
        assert_eq!(pattern.match_all(&text).unwrap(), vec![20_001]);
        assert!(pattern.find_spans("aaa").unwrap().is_empty());
    }

    #[test]
    fn test_indexed_matches_plain() {
        let pattern = compile("[ab]n").unwrap();
        let index = TextIndex::for_text("banana");
        assert_eq!(
            pattern.match_all_indexed(&index).unwrap(),
            pattern.match_all("banana").unwrap()
        );
    }

    #[test]
    fn test_traced_match() {
        let pattern = compile("ab").unwrap();
        let mut trace = StepTrace::new();
        let ends = pattern.match_all_traced("xab", &mut trace).unwrap();
        assert_eq!(ends, vec![3]);
        assert!(!trace.is_empty());
    }

    #[test]
    fn test_is_match() {
        let pattern = compile("x+").unwrap();
        assert!(pattern.is_match("axb").unwrap());
        assert!(!pattern.is_match("ab").unwrap());
    }

    #[test]
    fn test_span_serde() {
        let json = serde_json::to_string(&Span::new(1, 4)).unwrap();
        assert_eq!(json, r#"{"start":1,"end":4}"#);
    }
}
