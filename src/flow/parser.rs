//! Recursive-descent pattern parser
//!
//! Grammar, left to right with one character of lookahead:
//!
//! ```text
//! Expression := Term ('|' Term)*
//! Term       := Factor+
//! Factor     := Atom Quantifier?
//! Quantifier := '*' | '+' | '?' | '{' n (',' m?)? '}'
//! Atom       := Literal | '.' | '[' ClassBody ']' | '\' Escape
//!             | '(' Expression ')' | '(?:' Expression ')'
//!             | '(?=' Expression ')' Atom | '(?!' Expression ')' Atom
//! ```
//!
//! A lookahead binds to exactly one following atom. `{` always opens a
//! quantifier; a lone `}` is an ordinary literal.
//!
//! Concatenation and alternation are stored flat, so the tree only grows
//! deeper at a group, a lookahead or a quantifier. [`MAX_NESTING_DEPTH`]
//! therefore bounds the depth of every tree the parser returns, however
//! long the pattern.
//!
//! # Example
//!
//! ```rust
//! use flowmatch::flow::{parse, PatternNode};
//!
//! let tree = parse("ab").unwrap();
//! assert_eq!(
//!     tree,
//!     PatternNode::concat([PatternNode::Literal('a'), PatternNode::Literal('b')])
//! );
//! ```

use super::ast::PatternNode;
use super::char_class::{CharacterPattern, ClassItem, ClassSet};
use super::error::{SyntaxError, SyntaxErrorKind};

/// Maximum nesting depth of groups and lookaheads
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parse a pattern into a tree
pub fn parse(pattern: &str) -> Result<PatternNode, SyntaxError> {
    Parser::new(pattern).parse()
}

/// Pattern parser over the characters of one pattern
pub struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

/// One escape sequence, resolved
enum Escape {
    Char(char),
    Class(CharacterPattern),
}

impl Parser {
    /// Create a parser for `pattern`
    pub fn new(pattern: &str) -> Self {
        Self {
            chars: pattern.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    /// Parse the whole pattern
    pub fn parse(mut self) -> Result<PatternNode, SyntaxError> {
        if self.chars.is_empty() {
            return Err(self.error(SyntaxErrorKind::EmptyPattern));
        }
        let node = self.parse_expression()?;
        match self.peek() {
            None => Ok(node),
            Some(')') => Err(self.error(SyntaxErrorKind::UnbalancedParenthesis)),
            Some(c) => Err(self.error(SyntaxErrorKind::UnexpectedChar(c))),
        }
    }

    // ========================================================================
    // Cursor
    // ========================================================================

    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    #[inline]
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError::new(kind, self.pos)
    }

    fn error_at(&self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        SyntaxError::new(kind, offset)
    }

    fn expect(&mut self, expected: char) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(self.error(SyntaxErrorKind::UnexpectedChar(c))),
            None => Err(self.error(SyntaxErrorKind::UnexpectedEnd)),
        }
    }

    // ========================================================================
    // Expression / Term / Factor
    // ========================================================================

    fn parse_expression(&mut self) -> Result<PatternNode, SyntaxError> {
        let mut branches = vec![self.parse_term()?];
        while self.peek() == Some('|') {
            self.pos += 1;
            branches.push(self.parse_term()?);
        }
        if branches.len() == 1 {
            Ok(branches.remove(0))
        } else {
            Ok(PatternNode::Alternation(branches))
        }
    }

    fn parse_term(&mut self) -> Result<PatternNode, SyntaxError> {
        let mut factors = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            factors.push(self.parse_factor()?);
        }
        match factors.len() {
            0 => Err(self.error(SyntaxErrorKind::EmptyAlternative)),
            1 => Ok(factors.remove(0)),
            _ => Ok(PatternNode::Concat(factors)),
        }
    }

    fn parse_factor(&mut self) -> Result<PatternNode, SyntaxError> {
        let atom = self.parse_atom()?;
        let (min, max) = match self.peek() {
            Some('*') => {
                self.pos += 1;
                (0, None)
            }
            Some('+') => {
                self.pos += 1;
                (1, None)
            }
            Some('?') => {
                self.pos += 1;
                (0, Some(1))
            }
            Some('{') => self.parse_bounds()?,
            _ => return Ok(atom),
        };
        Ok(PatternNode::repeat(atom, min, max))
    }

    /// `{n}`, `{n,}` or `{n,m}`
    fn parse_bounds(&mut self) -> Result<(usize, Option<usize>), SyntaxError> {
        let open = self.pos;
        self.expect('{')?;
        let min = self.parse_number()?;
        let max = if self.peek() == Some(',') {
            self.pos += 1;
            if self.peek() == Some('}') {
                None
            } else {
                Some(self.parse_number()?)
            }
        } else {
            Some(min)
        };
        self.expect('}')?;
        if let Some(max) = max {
            if min > max {
                return Err(self.error_at(SyntaxErrorKind::InvalidQuantifier { min, max }, open));
            }
        }
        Ok((min, max))
    }

    fn parse_number(&mut self) -> Result<usize, SyntaxError> {
        let start = self.pos;
        let mut value: usize = 0;
        while let Some(digit) = self.peek().and_then(|c| c.to_digit(10)) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit as usize))
                .ok_or_else(|| self.error_at(SyntaxErrorKind::NumberTooLarge, start))?;
            self.pos += 1;
        }
        if self.pos == start {
            return Err(match self.peek() {
                None => self.error(SyntaxErrorKind::UnexpectedEnd),
                Some(_) => self.error(SyntaxErrorKind::ExpectedNumber),
            });
        }
        Ok(value)
    }

    // ========================================================================
    // Atoms
    // ========================================================================

    fn parse_atom(&mut self) -> Result<PatternNode, SyntaxError> {
        let Some(c) = self.peek() else {
            return Err(self.error(SyntaxErrorKind::UnexpectedEnd));
        };
        match c {
            '(' => self.parse_group(),
            '[' => self.parse_class(),
            '\\' => match self.parse_escape()? {
                Escape::Char(c) => Ok(PatternNode::Literal(c)),
                Escape::Class(pattern) => {
                    Ok(PatternNode::CharacterClass(ClassSet::shorthand(pattern)))
                }
            },
            '.' => {
                self.pos += 1;
                Ok(PatternNode::AnyChar)
            }
            '*' | '+' | '?' | '{' => Err(self.error(SyntaxErrorKind::NothingToRepeat(c))),
            '|' | ')' | ']' => Err(self.error(SyntaxErrorKind::UnexpectedChar(c))),
            _ => {
                self.pos += 1;
                Ok(PatternNode::Literal(c))
            }
        }
    }

    fn parse_group(&mut self) -> Result<PatternNode, SyntaxError> {
        let open = self.pos;
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(SyntaxErrorKind::NestingTooDeep {
                max_depth: MAX_NESTING_DEPTH,
            }));
        }
        self.expect('(')?;

        let mut lookahead = None;
        if self.peek() == Some('?') {
            self.pos += 1;
            match self.bump() {
                Some(':') => {}
                Some('=') => lookahead = Some(true),
                Some('!') => lookahead = Some(false),
                Some(other) => {
                    return Err(
                        self.error_at(SyntaxErrorKind::UnsupportedGroup(other), self.pos - 1)
                    )
                }
                None => return Err(self.error(SyntaxErrorKind::UnexpectedEnd)),
            }
        }

        self.depth += 1;
        let inner = self.parse_expression()?;
        if self.peek() != Some(')') {
            return Err(self.error_at(SyntaxErrorKind::UnclosedGroup, open));
        }
        self.pos += 1;

        let node = match lookahead {
            None => inner,
            Some(positive) => {
                let body = Box::new(self.parse_atom()?);
                let condition = Box::new(inner);
                if positive {
                    PatternNode::PositiveLookahead { condition, body }
                } else {
                    PatternNode::NegativeLookahead { condition, body }
                }
            }
        };
        self.depth -= 1;
        Ok(node)
    }

    /// `\` followed by one character
    fn parse_escape(&mut self) -> Result<Escape, SyntaxError> {
        let backslash = self.pos;
        self.expect('\\')?;
        let Some(c) = self.bump() else {
            return Err(self.error_at(SyntaxErrorKind::DanglingEscape, backslash));
        };
        if let Some(pattern) = CharacterPattern::from_escape(c) {
            return Ok(Escape::Class(pattern));
        }
        Ok(Escape::Char(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'f' => '\u{0C}',
            'v' => '\u{0B}',
            '0' => '\0',
            other => other,
        }))
    }

    /// `[...]`, `[^...]`
    fn parse_class(&mut self) -> Result<PatternNode, SyntaxError> {
        let open = self.pos;
        self.expect('[')?;
        let negated = self.peek() == Some('^');
        if negated {
            self.pos += 1;
        }

        let mut items = Vec::new();
        loop {
            let item_start = self.pos;
            let first = match self.peek() {
                None => return Err(self.error_at(SyntaxErrorKind::UnterminatedClass, open)),
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => self.parse_class_escape(open)?,
                Some(c) => {
                    self.pos += 1;
                    Escape::Char(c)
                }
            };

            let start = match first {
                Escape::Class(pattern) => {
                    items.push(ClassItem::Shorthand(pattern));
                    continue;
                }
                Escape::Char(c) => c,
            };

            // `-` right before `]` is a literal
            if self.peek() == Some('-') && !matches!(self.peek_at(1), Some(']') | None) {
                self.pos += 1;
                let end = match self.peek() {
                    Some('\\') => match self.parse_class_escape(open)? {
                        Escape::Char(c) => c,
                        Escape::Class(pattern) => {
                            return Err(self.error_at(
                                SyntaxErrorKind::UnexpectedChar(pattern.escape_letter()),
                                self.pos - 1,
                            ))
                        }
                    },
                    Some(c) => {
                        self.pos += 1;
                        c
                    }
                    None => return Err(self.error_at(SyntaxErrorKind::UnterminatedClass, open)),
                };
                if start > end {
                    return Err(
                        self.error_at(SyntaxErrorKind::InvalidRange { start, end }, item_start)
                    );
                }
                items.push(ClassItem::Range(start, end));
            } else {
                items.push(ClassItem::Char(start));
            }
        }

        if items.is_empty() {
            return Err(self.error_at(SyntaxErrorKind::EmptyClass, open));
        }
        Ok(PatternNode::CharacterClass(ClassSet::new(items, negated)))
    }

    /// An escape inside brackets; a trailing `\` leaves the class unterminated
    fn parse_class_escape(&mut self, open: usize) -> Result<Escape, SyntaxError> {
        if self.peek_at(1).is_none() {
            return Err(self.error_at(SyntaxErrorKind::UnterminatedClass, open));
        }
        self.parse_escape()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(c: char) -> PatternNode {
        PatternNode::Literal(c)
    }

    fn kind_of(pattern: &str) -> (SyntaxErrorKind, usize) {
        let err = parse(pattern).unwrap_err();
        (err.kind, err.offset)
    }

    #[test]
    fn test_concat_is_flat() {
        let tree = parse("abc").unwrap();
        assert_eq!(tree, PatternNode::concat([lit('a'), lit('b'), lit('c')]));
        // A group stays one factor
        let grouped = parse("a(bc)").unwrap();
        assert_eq!(
            grouped,
            PatternNode::concat([lit('a'), PatternNode::concat([lit('b'), lit('c')])])
        );
    }

    #[test]
    fn test_long_literal_keeps_depth_bounded() {
        let pattern = "ab".repeat(10_000);
        let tree = parse(&pattern).unwrap();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.node_count(), 20_001);
    }

    #[test]
    fn test_alternation_is_flat() {
        let tree = parse("a|b|c").unwrap();
        assert_eq!(tree, PatternNode::Alternation(vec![lit('a'), lit('b'), lit('c')]));
    }

    #[test]
    fn test_quantifiers() {
        assert_eq!(parse("a*").unwrap(), PatternNode::repeat(lit('a'), 0, None));
        assert_eq!(parse("a+").unwrap(), PatternNode::repeat(lit('a'), 1, None));
        assert_eq!(parse("a?").unwrap(), PatternNode::repeat(lit('a'), 0, Some(1)));
        assert_eq!(parse("a{3}").unwrap(), PatternNode::repeat(lit('a'), 3, Some(3)));
        assert_eq!(parse("a{2,}").unwrap(), PatternNode::repeat(lit('a'), 2, None));
        assert_eq!(parse("a{2,5}").unwrap(), PatternNode::repeat(lit('a'), 2, Some(5)));
    }

    #[test]
    fn test_groups() {
        let alt = PatternNode::Alternation(vec![lit('a'), lit('b')]);
        assert_eq!(parse("(a|b)").unwrap(), alt);
        assert_eq!(parse("(?:a|b)").unwrap(), alt);
        assert_eq!(
            parse("(a|b)*c").unwrap(),
            PatternNode::concat([PatternNode::repeat(alt, 0, None), lit('c')])
        );
    }

    #[test]
    fn test_lookahead_binds_one_atom() {
        let tree = parse("(?=ab)ab*").unwrap();
        let look = PatternNode::PositiveLookahead {
            condition: Box::new(PatternNode::concat([lit('a'), lit('b')])),
            body: Box::new(lit('a')),
        };
        assert_eq!(
            tree,
            PatternNode::concat([look, PatternNode::repeat(lit('b'), 0, None)])
        );

        let neg = parse("(?!x)(yz)").unwrap();
        assert_eq!(
            neg,
            PatternNode::NegativeLookahead {
                condition: Box::new(lit('x')),
                body: Box::new(PatternNode::concat([lit('y'), lit('z')])),
            }
        );
    }

    #[test]
    fn test_escapes() {
        assert_eq!(parse(r"\.").unwrap(), lit('.'));
        assert_eq!(parse(r"\n").unwrap(), lit('\n'));
        assert_eq!(parse(r"\0").unwrap(), lit('\0'));
        assert_eq!(parse(r"\f").unwrap(), lit('\u{0C}'));
        assert_eq!(parse(r"\q").unwrap(), lit('q'));
        assert_eq!(
            parse(r"\W").unwrap(),
            PatternNode::CharacterClass(ClassSet::shorthand(CharacterPattern::NonWord))
        );
    }

    #[test]
    fn test_character_class() {
        let tree = parse(r"[^a-c_\d-]").unwrap();
        assert_eq!(
            tree,
            PatternNode::CharacterClass(ClassSet::new(
                vec![
                    ClassItem::Range('a', 'c'),
                    ClassItem::Char('_'),
                    ClassItem::Shorthand(CharacterPattern::Digit),
                    ClassItem::Char('-'),
                ],
                true,
            ))
        );
        let escaped = parse(r"[\]\-]").unwrap();
        assert_eq!(
            escaped,
            PatternNode::CharacterClass(ClassSet::new(
                vec![ClassItem::Char(']'), ClassItem::Char('-')],
                false,
            ))
        );
    }

    #[test]
    fn test_closing_brace_is_literal() {
        assert_eq!(parse("}").unwrap(), lit('}'));
    }

    #[test]
    fn test_errors() {
        assert_eq!(kind_of(""), (SyntaxErrorKind::EmptyPattern, 0));
        assert_eq!(kind_of("a|"), (SyntaxErrorKind::EmptyAlternative, 2));
        assert_eq!(kind_of("|a"), (SyntaxErrorKind::EmptyAlternative, 0));
        assert_eq!(kind_of("(ab"), (SyntaxErrorKind::UnclosedGroup, 0));
        assert_eq!(kind_of("ab)"), (SyntaxErrorKind::UnbalancedParenthesis, 2));
        assert_eq!(kind_of("(?<a)"), (SyntaxErrorKind::UnsupportedGroup('<'), 2));
        assert_eq!(kind_of("[abc"), (SyntaxErrorKind::UnterminatedClass, 0));
        assert_eq!(kind_of("[]"), (SyntaxErrorKind::EmptyClass, 0));
        assert_eq!(
            kind_of("x[z-a]"),
            (SyntaxErrorKind::InvalidRange { start: 'z', end: 'a' }, 2)
        );
        assert_eq!(kind_of("a{x}"), (SyntaxErrorKind::ExpectedNumber, 2));
        assert_eq!(
            kind_of("a{5,2}"),
            (SyntaxErrorKind::InvalidQuantifier { min: 5, max: 2 }, 1)
        );
        assert_eq!(
            kind_of("a{99999999999999999999999}"),
            (SyntaxErrorKind::NumberTooLarge, 2)
        );
        assert_eq!(kind_of("ab\\"), (SyntaxErrorKind::DanglingEscape, 2));
        assert_eq!(kind_of("*a"), (SyntaxErrorKind::NothingToRepeat('*'), 0));
        assert_eq!(kind_of("a**"), (SyntaxErrorKind::NothingToRepeat('*'), 2));
        assert_eq!(kind_of("a]"), (SyntaxErrorKind::UnexpectedChar(']'), 1));
        assert_eq!(kind_of("(?=a)"), (SyntaxErrorKind::UnexpectedEnd, 5));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}a{}", "(".repeat(MAX_NESTING_DEPTH + 1), ")".repeat(MAX_NESTING_DEPTH + 1));
        assert_eq!(
            kind_of(&deep).0,
            SyntaxErrorKind::NestingTooDeep {
                max_depth: MAX_NESTING_DEPTH
            }
        );
        let ok = format!("{}a{}", "(".repeat(MAX_NESTING_DEPTH), ")".repeat(MAX_NESTING_DEPTH));
        assert_eq!(parse(&ok).unwrap(), lit('a'));
    }

    #[test]
    fn test_display_round_trip() {
        for pattern in [
            "abc",
            "a|b|c",
            "(a|b)*c",
            "a(bc)",
            r"[^a-z\d]+x{2,4}",
            r"\.\*\\",
            "(?=ab)a(?!c)b",
            "(a|(b|c))?",
            "x{3,}.",
        ] {
            let tree = parse(pattern).unwrap();
            let rendered = tree.to_string();
            assert_eq!(parse(&rendered).unwrap(), tree, "{} -> {}", pattern, rendered);
        }
    }
}
