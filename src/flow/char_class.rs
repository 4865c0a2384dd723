//! Character class membership
//!
//! Pre-computed lookup tables for the shorthand classes (`\d`, `\s`, `\w`
//! and their negations). Each table is a 128-entry bitmap for O(1) lookup of
//! ASCII characters; the shorthand classes are ASCII-only, so any non-ASCII
//! character is outside every positive class.
//!
//! # ClassSet
//!
//! [`ClassSet`] is the membership predicate of a bracket expression such
//! as `[^a-z_\d]`: individual characters, ranges and shorthand classes,
//! optionally negated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shorthand character class
///
/// # Example
///
/// ```rust
/// use flowmatch::flow::char_class::CharacterPattern;
///
/// let pattern = CharacterPattern::from_escape('d').unwrap();
/// assert!(pattern.matches('5'));
/// assert!(!pattern.matches('a'));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterPattern {
    /// Digit: `\d`, `[0-9]`
    Digit,
    /// Non-digit: `\D`
    NonDigit,
    /// Whitespace: `\s`, `[ \t\n\r\f\v]`
    Space,
    /// Non-whitespace: `\S`
    NonSpace,
    /// Word character: `\w`, `[a-zA-Z0-9_]`
    Word,
    /// Non-word character: `\W`
    NonWord,
}

impl CharacterPattern {
    /// Map the letter after a backslash to its shorthand class
    #[inline]
    pub fn from_escape(letter: char) -> Option<Self> {
        match letter {
            'd' => Some(Self::Digit),
            'D' => Some(Self::NonDigit),
            's' => Some(Self::Space),
            'S' => Some(Self::NonSpace),
            'w' => Some(Self::Word),
            'W' => Some(Self::NonWord),
            _ => None,
        }
    }

    /// The letter that follows the backslash in pattern syntax
    pub fn escape_letter(&self) -> char {
        match self {
            Self::Digit => 'd',
            Self::NonDigit => 'D',
            Self::Space => 's',
            Self::NonSpace => 'S',
            Self::Word => 'w',
            Self::NonWord => 'W',
        }
    }

    /// Check if a character belongs to this class
    #[inline(always)]
    pub fn matches(&self, c: char) -> bool {
        CHAR_CLASSES.matches_pattern(*self, c)
    }
}

impl fmt::Display for CharacterPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\{}", self.escape_letter())
    }
}

/// Pre-computed ASCII class tables, indexed by code point (0-127)
#[derive(Clone, Copy, Debug)]
pub struct CharClassTables {
    /// Digit characters [0-9]
    pub digit: [bool; 128],

    /// Word characters [a-zA-Z0-9_]
    pub word: [bool; 128],

    /// Whitespace characters [ \t\n\r\f\v]
    pub space: [bool; 128],
}

impl CharClassTables {
    /// Create all character class tables at compile time
    pub const fn new() -> Self {
        let mut tables = Self {
            digit: [false; 128],
            word: [false; 128],
            space: [false; 128],
        };

        let mut i = b'0';
        while i <= b'9' {
            tables.digit[i as usize] = true;
            tables.word[i as usize] = true;
            i += 1;
        }

        i = b'a';
        while i <= b'z' {
            tables.word[i as usize] = true;
            tables.word[(i - b'a' + b'A') as usize] = true;
            i += 1;
        }
        tables.word[b'_' as usize] = true;

        tables.space[b' ' as usize] = true;
        tables.space[b'\t' as usize] = true;
        tables.space[b'\n' as usize] = true;
        tables.space[b'\r' as usize] = true;
        tables.space[0x0C_usize] = true; // form feed
        tables.space[0x0B_usize] = true; // vertical tab

        tables
    }

    #[inline(always)]
    fn lookup(table: &[bool; 128], c: char) -> bool {
        c.is_ascii() && table[c as usize]
    }

    /// Check if a character is a digit [0-9]
    #[inline(always)]
    pub fn is_digit(&self, c: char) -> bool {
        Self::lookup(&self.digit, c)
    }

    /// Check if a character is a word character [a-zA-Z0-9_]
    #[inline(always)]
    pub fn is_word(&self, c: char) -> bool {
        Self::lookup(&self.word, c)
    }

    /// Check if a character is ASCII whitespace
    #[inline(always)]
    pub fn is_space(&self, c: char) -> bool {
        Self::lookup(&self.space, c)
    }

    /// Check if a character matches a shorthand class
    #[inline(always)]
    pub fn matches_pattern(&self, pattern: CharacterPattern, c: char) -> bool {
        match pattern {
            CharacterPattern::Digit => self.is_digit(c),
            CharacterPattern::NonDigit => !self.is_digit(c),
            CharacterPattern::Space => self.is_space(c),
            CharacterPattern::NonSpace => !self.is_space(c),
            CharacterPattern::Word => self.is_word(c),
            CharacterPattern::NonWord => !self.is_word(c),
        }
    }
}

impl Default for CharClassTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Global character class tables (compile-time initialized)
pub static CHAR_CLASSES: CharClassTables = CharClassTables::new();

/// One member of a bracket expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassItem {
    /// A single character
    Char(char),
    /// An inclusive range `start-end`
    Range(char, char),
    /// A shorthand class inside the brackets, e.g. `[\d_]`
    Shorthand(CharacterPattern),
}

impl ClassItem {
    /// Check if a character is covered by this item
    #[inline]
    pub fn matches(&self, c: char) -> bool {
        match *self {
            ClassItem::Char(expected) => c == expected,
            ClassItem::Range(start, end) => (start..=end).contains(&c),
            ClassItem::Shorthand(pattern) => pattern.matches(c),
        }
    }
}

/// Membership predicate of a character class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassSet {
    /// Members, in source order
    pub items: Vec<ClassItem>,
    /// `[^...]`
    pub negated: bool,
}

impl ClassSet {
    /// Create a class from its items
    pub fn new(items: Vec<ClassItem>, negated: bool) -> Self {
        Self { items, negated }
    }

    /// A class equivalent to a bare shorthand escape such as `\d`
    pub fn shorthand(pattern: CharacterPattern) -> Self {
        Self::new(vec![ClassItem::Shorthand(pattern)], false)
    }

    /// Check if a character is in the class
    #[inline]
    pub fn matches(&self, c: char) -> bool {
        self.items.iter().any(|item| item.matches(c)) != self.negated
    }

    /// If this class is exactly one bare shorthand, return it
    pub fn as_shorthand(&self) -> Option<CharacterPattern> {
        match self.items.as_slice() {
            [ClassItem::Shorthand(pattern)] if !self.negated => Some(*pattern),
            _ => None,
        }
    }
}

/// Write `c` so that it reads back as the same literal inside brackets
fn write_class_char(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match c {
        '\\' | ']' | '[' | '^' | '-' => write!(f, "\\{}", c),
        _ => super::ast::write_control_escape(f, c),
    }
}

/// Renders pattern syntax: `\d` for a bare shorthand, `[...]` otherwise
impl fmt::Display for ClassSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pattern) = self.as_shorthand() {
            return write!(f, "{}", pattern);
        }
        f.write_str("[")?;
        if self.negated {
            f.write_str("^")?;
        }
        for item in &self.items {
            match *item {
                ClassItem::Char(c) => write_class_char(f, c)?,
                ClassItem::Range(start, end) => {
                    write_class_char(f, start)?;
                    f.write_str("-")?;
                    write_class_char(f, end)?;
                }
                ClassItem::Shorthand(pattern) => write!(f, "{}", pattern)?,
            }
        }
        f.write_str("]")
    }
}
