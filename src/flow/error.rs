//! Error types
//!
//! [`SyntaxError`] is raised by the parser, never during matching.
//! [`MatchError`] reports a violated precondition of a match call and is
//! raised before any set is built. [`Error`] wraps both so that compile and
//! match calls can share one `?` chain.
//!
//! # Example
//!
//! ```rust
//! use flowmatch::flow::{compile, SyntaxErrorKind};
//!
//! let err = compile("a{5,2}").unwrap_err();
//! assert_eq!(err.kind, SyntaxErrorKind::InvalidQuantifier { min: 5, max: 2 });
//! assert_eq!(err.offset, 1);
//! ```

use std::fmt;

/// What went wrong while parsing a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A character that cannot appear here
    UnexpectedChar(char),
    /// The pattern ended in the middle of a construct
    UnexpectedEnd,
    /// The pattern is the empty string
    EmptyPattern,
    /// `a|`, `|a`, `(|a)` and the like
    EmptyAlternative,
    /// `(` without a matching `)`
    UnclosedGroup,
    /// `)` without a matching `(`
    UnbalancedParenthesis,
    /// `(?` followed by something other than `=`, `!` or `:`
    UnsupportedGroup(char),
    /// `[` without a matching `]`
    UnterminatedClass,
    /// `[]` or `[^]`
    EmptyClass,
    /// A class range whose start is after its end, e.g. `[z-a]`
    InvalidRange {
        /// Range start
        start: char,
        /// Range end
        end: char,
    },
    /// `{` not followed by a decimal number
    ExpectedNumber,
    /// `{n,m}` with `n > m`
    InvalidQuantifier {
        /// Lower bound
        min: usize,
        /// Upper bound
        max: usize,
    },
    /// A repetition bound that does not fit in `usize`
    NumberTooLarge,
    /// A backslash at the end of the pattern
    DanglingEscape,
    /// A quantifier with no atom before it
    NothingToRepeat(char),
    /// Groups nested deeper than the parser allows
    NestingTooDeep {
        /// Maximum permitted group depth
        max_depth: usize,
    },
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {:?}", c),
            SyntaxErrorKind::UnexpectedEnd => write!(f, "unexpected end of pattern"),
            SyntaxErrorKind::EmptyPattern => write!(f, "empty pattern"),
            SyntaxErrorKind::EmptyAlternative => write!(f, "empty alternative"),
            SyntaxErrorKind::UnclosedGroup => write!(f, "unclosed group"),
            SyntaxErrorKind::UnbalancedParenthesis => write!(f, "unbalanced parenthesis"),
            SyntaxErrorKind::UnsupportedGroup(c) => {
                write!(f, "unsupported group syntax (?{}", c)
            }
            SyntaxErrorKind::UnterminatedClass => write!(f, "unterminated character class"),
            SyntaxErrorKind::EmptyClass => write!(f, "empty character class"),
            SyntaxErrorKind::InvalidRange { start, end } => {
                write!(f, "invalid class range {:?}-{:?}", start, end)
            }
            SyntaxErrorKind::ExpectedNumber => write!(f, "expected a number"),
            SyntaxErrorKind::InvalidQuantifier { min, max } => {
                write!(f, "invalid quantifier {{{},{}}}: min exceeds max", min, max)
            }
            SyntaxErrorKind::NumberTooLarge => write!(f, "repetition bound too large"),
            SyntaxErrorKind::DanglingEscape => write!(f, "dangling escape at end of pattern"),
            SyntaxErrorKind::NothingToRepeat(c) => {
                write!(f, "quantifier {:?} has nothing to repeat", c)
            }
            SyntaxErrorKind::NestingTooDeep { max_depth } => {
                write!(f, "groups nested deeper than {}", max_depth)
            }
        }
    }
}

/// A malformed pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// What went wrong
    pub kind: SyntaxErrorKind,
    /// Character offset into the pattern
    pub offset: usize,
}

impl SyntaxError {
    /// Create a new syntax error
    pub fn new(kind: SyntaxErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    /// Render the pattern with a caret under the offending offset
    ///
    /// ```text
    /// invalid quantifier {5,2}: min exceeds max at offset 1
    /// a{5,2}
    ///  ^
    /// ```
    pub fn format_with_pattern(&self, pattern: &str) -> String {
        let mut output = format!("{}\n", self);
        output.push_str(pattern);
        output.push('\n');
        for _ in 0..self.offset {
            output.push(' ');
        }
        output.push('^');
        output
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.offset)
    }
}

impl std::error::Error for SyntaxError {}

/// A match call whose preconditions do not hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The text exceeds the configured maximum length
    InputTooLong {
        /// Length of the text in characters
        length: usize,
        /// Configured maximum
        max_length: usize,
    },

    /// An argument outside its permitted range
    InvalidArgument {
        /// Name of the argument
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::InputTooLong { length, max_length } => write!(
                f,
                "Input too long: {} characters exceeds limit of {}",
                length, max_length
            ),
            MatchError::InvalidArgument { name, reason } => {
                write!(f, "Invalid argument `{}`: {}", name, reason)
            }
        }
    }
}

impl std::error::Error for MatchError {}

/// Any error produced by this crate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Pattern failed to parse
    Syntax(SyntaxError),
    /// Match preconditions failed
    Match(MatchError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Syntax(err) => write!(f, "Syntax error: {}", err),
            Error::Match(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Syntax(err) => Some(err),
            Error::Match(err) => Some(err),
        }
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

impl From<MatchError> for Error {
    fn from(err: MatchError) -> Self {
        Error::Match(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = SyntaxError::new(SyntaxErrorKind::UnterminatedClass, 4);
        assert_eq!(err.to_string(), "unterminated character class at offset 4");
    }

    #[test]
    fn test_format_with_pattern() {
        let err = SyntaxError::new(SyntaxErrorKind::UnexpectedChar(']'), 2);
        let formatted = err.format_with_pattern("ab]c");
        let lines: Vec<&str> = formatted.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "ab]c");
        assert_eq!(lines[2], "  ^");
    }

    #[test]
    fn test_match_error_display() {
        let err = MatchError::InputTooLong {
            length: 12,
            max_length: 10,
        };
        assert!(err.to_string().contains("12 characters"));
    }

    #[test]
    fn test_umbrella_conversion() {
        fn run() -> Result<(), Error> {
            let parsed: Result<(), SyntaxError> =
                Err(SyntaxError::new(SyntaxErrorKind::EmptyPattern, 0));
            parsed?;
            Ok(())
        }
        let err = run().unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
