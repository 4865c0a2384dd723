//! Integration tests for pattern parsing
//!
//! These tests cover tree shapes, canonical rendering, tree serialization
//! and the tree printer.

use flowmatch::flow::{
    parse, CharacterPattern, ClassItem, ClassSet, PatternNode, TreePrinter, MAX_NESTING_DEPTH,
};

fn lit(c: char) -> PatternNode {
    PatternNode::Literal(c)
}

// ============================================================================
// Tree Shapes
// ============================================================================

#[test]
fn test_concat_and_alternation() {
    let tree = parse("ab|c").unwrap();
    assert_eq!(
        tree,
        PatternNode::Alternation(vec![PatternNode::concat([lit('a'), lit('b')]), lit('c')])
    );
}

#[test]
fn test_quantifier_binds_tightest() {
    let tree = parse("ab*").unwrap();
    assert_eq!(
        tree,
        PatternNode::concat([lit('a'), PatternNode::repeat(lit('b'), 0, None)])
    );
}

#[test]
fn test_group_quantifier() {
    let tree = parse("(ab){2,3}").unwrap();
    assert_eq!(
        tree,
        PatternNode::repeat(PatternNode::concat([lit('a'), lit('b')]), 2, Some(3))
    );
}

#[test]
fn test_lookahead_wraps_next_atom() {
    let tree = parse("(?=ab)ab*c").unwrap();
    let gated = PatternNode::PositiveLookahead {
        condition: Box::new(PatternNode::concat([lit('a'), lit('b')])),
        body: Box::new(lit('a')),
    };
    let expected = PatternNode::concat([gated, PatternNode::repeat(lit('b'), 0, None), lit('c')]);
    assert_eq!(tree, expected);
}

#[test]
fn test_negative_lookahead_on_group() {
    let tree = parse("(?!x)(yz)").unwrap();
    assert_eq!(
        tree,
        PatternNode::NegativeLookahead {
            condition: Box::new(lit('x')),
            body: Box::new(PatternNode::concat([lit('y'), lit('z')])),
        }
    );
}

#[test]
fn test_shorthand_and_class() {
    assert_eq!(
        parse(r"\s").unwrap(),
        PatternNode::CharacterClass(ClassSet::shorthand(CharacterPattern::Space))
    );
    assert_eq!(
        parse("[x-z0]").unwrap(),
        PatternNode::CharacterClass(ClassSet::new(
            vec![ClassItem::Range('x', 'z'), ClassItem::Char('0')],
            false
        ))
    );
}

#[test]
fn test_tree_metrics() {
    let tree = parse("(a|bc)*d").unwrap();
    assert_eq!(tree.node_count(), 8);
    assert_eq!(tree.fuzzy_len(), 3);
    assert!(!tree.has_lookahead());
    assert!(parse("(?=a)b").unwrap().has_lookahead());
}

#[test]
fn test_long_pattern_is_shallow() {
    let tree = parse(&"xy".repeat(15_000)).unwrap();
    assert_eq!(tree.depth(), 2);
    assert_eq!(tree.children().len(), 30_000);

    // Groups and quantifiers are the only source of depth
    let nested = parse("((ab)+c)*d").unwrap();
    assert_eq!(nested.depth(), 6);
}

#[test]
fn test_deep_nesting_within_limit() {
    let depth = MAX_NESTING_DEPTH;
    let pattern = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(parse(&pattern).unwrap(), lit('a'));
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_display_is_canonical() {
    assert_eq!(parse("(?:ab)").unwrap().to_string(), "ab");
    assert_eq!(parse("((a))").unwrap().to_string(), "a");
    assert_eq!(parse("a{2,2}").unwrap().to_string(), "a{2}");
    assert_eq!(parse(r"\.").unwrap().to_string(), r"\.");
}

#[test]
fn test_display_reparses_to_same_tree() {
    let patterns = [
        "a(b|c)*d",
        "(ab)+|x?",
        "[^a-c\\d]{2,}",
        "(?=ab)a.|(?!x)(yz)",
        r"\w+\s\W",
        "a|(b|c)d",
        "((a|b)c)*",
        r"\*\+\?\{\}",
        "a{0,3}b{4}",
    ];
    for pattern in patterns {
        let tree = parse(pattern).unwrap();
        let rendered = tree.to_string();
        assert_eq!(parse(&rendered).unwrap(), tree, "{} -> {}", pattern, rendered);
    }
}

// ============================================================================
// Serialization and Printing
// ============================================================================

#[test]
fn test_tree_json_round_trip() {
    let tree = parse("(?!a)[b-d]+|e").unwrap();
    let json = serde_json::to_string(&tree).unwrap();
    let back: PatternNode = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tree);
}

#[test]
fn test_tree_printer() {
    let tree = parse("a|b*").unwrap();
    let printed = TreePrinter::new().print(&tree);
    assert!(printed.contains("Alternation(2)"));
    assert!(printed.contains("Literal('a')"));
    assert!(printed.contains("Repeat{0,}"));

    let dot = TreePrinter::new().to_dot(&tree);
    assert!(dot.starts_with("digraph"));
}
