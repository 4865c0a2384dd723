//! Integration tests for lookahead
//!
//! `(?=B)A` keeps the matches of `A` whose start also starts a match of
//! `B`; `(?!B)A` keeps the others.

use flowmatch::flow::{compile, parse, CompiledPattern, PatternNode, Span};

fn ends(pattern: &str, text: &str) -> Vec<usize> {
    compile(pattern).unwrap().match_all(text).unwrap()
}

fn lookahead(condition: &str, body: &str, positive: bool) -> CompiledPattern {
    let condition = Box::new(parse(condition).unwrap());
    let body = Box::new(parse(body).unwrap());
    let node = if positive {
        PatternNode::PositiveLookahead { condition, body }
    } else {
        PatternNode::NegativeLookahead { condition, body }
    };
    CompiledPattern::from_node(node)
}

// ============================================================================
// Positive Lookahead
// ============================================================================

#[test]
fn test_positive_lookahead_gates_start() {
    assert_eq!(ends("(?=ab)ab*c", "abbbcd"), vec![5]);
    assert!(ends("(?=ab)ab*c", "xbbbcd").is_empty());
}

#[test]
fn test_condition_may_be_longer_than_body() {
    assert_eq!(ends("(?=abc)a", "abxabc"), vec![4]);
}

#[test]
fn test_lookahead_under_repetition() {
    assert_eq!(ends("((?=a).)+", "aab"), vec![1, 2]);
}

#[test]
fn test_nested_lookahead() {
    assert_eq!(ends("(?=a(?=b).)..", "abxacx"), vec![2]);
}

// ============================================================================
// Negative Lookahead
// ============================================================================

#[test]
fn test_negative_lookahead_excludes_start() {
    assert_eq!(ends("(?!dog)...", "cat"), vec![3]);
    assert!(ends("(?!dog)...", "dog").is_empty());
    assert_eq!(ends("(?!a).", "ab"), vec![2]);
}

#[test]
fn test_negative_lookahead_word_filter() {
    // Three word characters not starting with "th"
    assert_eq!(ends(r"(?!th)\w\w\w", "the cat"), vec![7]);
    // "the" starts with th; "he " is not three word characters
    assert_eq!(ends(r"(?!th)\w\w\w\s", "the cat "), vec![8]);
}

// ============================================================================
// Partition
// ============================================================================

#[test]
fn test_positive_and_negative_partition_matches() {
    let text = "abcabdabcx";
    let cases = [
        ("ab", "a.."),
        ("abc", "(a|b)+"),
        ("c", "."),
        ("x", "[a-c]*"),
        ("a", "a?b?"),
    ];
    for (condition, body) in cases {
        let plain = compile(body).unwrap();
        let kept = lookahead(condition, body, true);
        let dropped = lookahead(condition, body, false);

        let mut spans: Vec<Span> = kept.find_spans(text).unwrap();
        let rest = dropped.find_spans(text).unwrap();
        assert!(rest.iter().all(|span| !spans.contains(span)), "{}", body);
        spans.extend(rest);
        spans.sort_by_key(|span| (span.end, span.start));
        assert_eq!(spans, plain.find_spans(text).unwrap(), "({}) {}", condition, body);

        let mut all_ends = kept.match_all(text).unwrap();
        all_ends.extend(dropped.match_all(text).unwrap());
        all_ends.sort_unstable();
        all_ends.dedup();
        assert_eq!(all_ends, plain.match_all(text).unwrap(), "({}) {}", condition, body);
    }
}

#[test]
fn test_lookahead_spans_keep_body_start() {
    let spans = compile("(?=ab)a").unwrap().find_spans("abab").unwrap();
    assert_eq!(spans, vec![Span::new(0, 1), Span::new(2, 3)]);
}
