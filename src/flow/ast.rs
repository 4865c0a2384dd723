//! Pattern AST
//!
//! A parsed pattern is an immutable tree of [`PatternNode`]s. Each variant
//! is a transformation from a set of text positions to a set of text
//! positions (see [`transform`](super::transform)); composing the variants
//! mirrors the pattern's grammar.
//!
//! The tree is built once per compiled pattern and holds no match-time
//! state, so it can be shared across any number of concurrent matches.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::char_class::ClassSet;

/// A node of the pattern tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternNode {
    /// A single literal character
    Literal(char),

    /// `.`: any character except newline
    AnyChar,

    /// `[...]` or a shorthand escape such as `\d`
    CharacterClass(ClassSet),

    /// `AB...`: the output of each node feeds the next
    Concat(Vec<PatternNode>),

    /// `A|B|...`: union over branches applied to the same input
    Alternation(Vec<PatternNode>),

    /// `*`, `+`, `?`, `{n}`, `{n,}`, `{n,m}`
    Repeat {
        /// The repeated node
        node: Box<PatternNode>,
        /// Minimum number of repetitions
        min: usize,
        /// Maximum number of repetitions (None = unbounded)
        max: Option<usize>,
    },

    /// `(?=condition)body`
    PositiveLookahead {
        /// Zero-width condition evaluated from the body's start
        condition: Box<PatternNode>,
        /// The consuming part
        body: Box<PatternNode>,
    },

    /// `(?!condition)body`
    NegativeLookahead {
        /// Zero-width condition that must not match from the body's start
        condition: Box<PatternNode>,
        /// The consuming part
        body: Box<PatternNode>,
    },
}

impl PatternNode {
    /// Build a concatenation
    pub fn concat(nodes: impl IntoIterator<Item = PatternNode>) -> Self {
        PatternNode::Concat(nodes.into_iter().collect())
    }

    /// Build a repetition
    pub fn repeat(node: PatternNode, min: usize, max: Option<usize>) -> Self {
        PatternNode::Repeat {
            node: Box::new(node),
            min,
            max,
        }
    }

    /// Test a single character against a character atom.
    ///
    /// Returns `false` for composite nodes.
    #[inline]
    pub fn matches_char(&self, c: char) -> bool {
        match self {
            PatternNode::Literal(expected) => c == *expected,
            PatternNode::AnyChar => c != '\n',
            PatternNode::CharacterClass(class) => class.matches(c),
            _ => false,
        }
    }

    /// Length of this node on the fuzzy pattern axis.
    ///
    /// See [`FuzzyLayout`] for the rules; build the layout directly when
    /// the lengths of inner nodes are needed too.
    pub fn fuzzy_len(&self) -> usize {
        FuzzyLayout::of(self).len()
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Maximum nesting depth (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|c| c.depth())
            .max()
            .unwrap_or(0)
    }

    /// Direct children, in evaluation order
    pub fn children(&self) -> Vec<&PatternNode> {
        match self {
            PatternNode::Literal(_) | PatternNode::AnyChar | PatternNode::CharacterClass(_) => {
                Vec::new()
            }
            PatternNode::Concat(nodes) | PatternNode::Alternation(nodes) => nodes.iter().collect(),
            PatternNode::Repeat { node, .. } => vec![node],
            PatternNode::PositiveLookahead { condition, body }
            | PatternNode::NegativeLookahead { condition, body } => vec![condition, body],
        }
    }

    /// Whether the tree contains a lookahead anywhere
    pub fn has_lookahead(&self) -> bool {
        matches!(
            self,
            PatternNode::PositiveLookahead { .. } | PatternNode::NegativeLookahead { .. }
        ) || self.children().iter().any(|c| c.has_lookahead())
    }

    /// Short label used by tracing and tree printing
    pub fn label(&self) -> String {
        match self {
            PatternNode::Literal(c) => format!("Literal({:?})", c),
            PatternNode::AnyChar => "AnyChar".to_string(),
            PatternNode::CharacterClass(class) => format!("CharacterClass({})", class),
            PatternNode::Concat(_) => "Concat".to_string(),
            PatternNode::Alternation(branches) => format!("Alternation({})", branches.len()),
            PatternNode::Repeat { min, max, .. } => match max {
                Some(max) => format!("Repeat{{{},{}}}", min, max),
                None => format!("Repeat{{{},}}", min),
            },
            PatternNode::PositiveLookahead { .. } => "PositiveLookahead".to_string(),
            PatternNode::NegativeLookahead { .. } => "NegativeLookahead".to_string(),
        }
    }

    /// Display as an operand that binds tighter than concatenation
    fn fmt_atom(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternNode::Literal(_)
            | PatternNode::AnyChar
            | PatternNode::CharacterClass(_)
            | PatternNode::PositiveLookahead { .. }
            | PatternNode::NegativeLookahead { .. } => write!(f, "{}", self),
            _ => write!(f, "({})", self),
        }
    }
}

/// Fuzzy-axis lengths of every node of one tree, in the tree's shape.
///
/// Computed once per compiled pattern so every stage of a fuzzy match
/// shares one pattern-offset axis without re-deriving lengths:
/// - character atoms: 1
/// - concatenation: sum of its parts
/// - alternation: longest branch (shorter branches are lifted to it)
/// - repetition: its element's length; every iteration reuses the slice
/// - lookahead: its body's length; the condition is zero-width
///
/// Children follow [`PatternNode::children`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyLayout {
    len: usize,
    children: Vec<FuzzyLayout>,
}

static LEAF_LAYOUT: FuzzyLayout = FuzzyLayout {
    len: 0,
    children: Vec::new(),
};

impl FuzzyLayout {
    /// Lay out `node` and everything below it
    pub fn of(node: &PatternNode) -> Self {
        let children: Vec<FuzzyLayout> = node.children().into_iter().map(Self::of).collect();
        let len = match node {
            PatternNode::Literal(_) | PatternNode::AnyChar | PatternNode::CharacterClass(_) => 1,
            PatternNode::Concat(_) => children.iter().map(FuzzyLayout::len).sum(),
            PatternNode::Alternation(_) => {
                children.iter().map(FuzzyLayout::len).max().unwrap_or(0)
            }
            PatternNode::Repeat { .. } => children.first().map_or(0, FuzzyLayout::len),
            PatternNode::PositiveLookahead { .. } | PatternNode::NegativeLookahead { .. } => {
                children.get(1).map_or(0, FuzzyLayout::len)
            }
        };
        Self { len, children }
    }

    /// Length of the node on the pattern axis
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the node takes no room on the axis
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Layouts of the direct children
    #[inline]
    pub fn children(&self) -> &[FuzzyLayout] {
        &self.children
    }

    /// Layout of the `i`-th child; a leaf layout if there is none
    #[inline]
    pub fn child(&self, i: usize) -> &FuzzyLayout {
        self.children.get(i).unwrap_or(&LEAF_LAYOUT)
    }
}

/// Write a literal character, escaping control characters
pub(crate) fn write_control_escape(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match c {
        '\n' => f.write_str("\\n"),
        '\t' => f.write_str("\\t"),
        '\r' => f.write_str("\\r"),
        '\u{0C}' => f.write_str("\\f"),
        '\u{0B}' => f.write_str("\\v"),
        '\0' => f.write_str("\\0"),
        _ => write!(f, "{}", c),
    }
}

/// Renders canonical pattern syntax that parses back to an equal tree
impl fmt::Display for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternNode::Literal(c) => match c {
                '\\' | '|' | '(' | ')' | '[' | ']' | '{' | '}' | '*' | '+' | '?' | '.' => {
                    write!(f, "\\{}", c)
                }
                _ => write_control_escape(f, *c),
            },
            PatternNode::AnyChar => f.write_str("."),
            PatternNode::CharacterClass(class) => write!(f, "{}", class),
            PatternNode::Concat(nodes) => {
                for node in nodes {
                    match node {
                        PatternNode::Alternation(_) | PatternNode::Concat(_) => {
                            write!(f, "({})", node)?
                        }
                        _ => write!(f, "{}", node)?,
                    }
                }
                Ok(())
            }
            PatternNode::Alternation(branches) => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    match branch {
                        PatternNode::Alternation(_) => write!(f, "({})", branch)?,
                        _ => write!(f, "{}", branch)?,
                    }
                }
                Ok(())
            }
            PatternNode::Repeat { node, min, max } => {
                node.fmt_atom(f)?;
                match (*min, *max) {
                    (0, None) => f.write_str("*"),
                    (1, None) => f.write_str("+"),
                    (0, Some(1)) => f.write_str("?"),
                    (n, None) => write!(f, "{{{},}}", n),
                    (n, Some(m)) if n == m => write!(f, "{{{}}}", n),
                    (n, Some(m)) => write!(f, "{{{},{}}}", n, m),
                }
            }
            PatternNode::PositiveLookahead { condition, body } => {
                write!(f, "(?={})", condition)?;
                body.fmt_atom(f)
            }
            PatternNode::NegativeLookahead { condition, body } => {
                write!(f, "(?!{})", condition)?;
                body.fmt_atom(f)
            }
        }
    }
}
