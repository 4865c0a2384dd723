//! Flowmatch - Backtracking-free pattern matching over position sets
//!
//! Flowmatch compiles a small regular-expression dialect into a tree of
//! nodes and matches it by pushing a *set* of text offsets through the
//! tree, one node at a time. Every start position advances in parallel, so
//! the running time depends on the pattern and the text length, never on
//! how alternatives happen to interact.
//!
//! It provides:
//! - Exact matching: the end offset of every match
//! - Match spans, from start offsets tracked alongside the ends
//! - Positive and negative lookahead
//! - Fuzzy matching within a Levenshtein distance bound
//! - Precomputed per-character masks for repeated character tests
//! - Step observers and tree printing for debugging
//! - Batch matching of one pattern over many texts
//!
//! ## Quick Start
//!
//! ```rust
//! use flowmatch::flow::compile;
//!
//! let pattern = compile("a*b").unwrap();
//! assert_eq!(pattern.match_all("aaabxbb").unwrap(), vec![4, 6, 7]);
//! ```
//!
//! ## Fuzzy Matching
//!
//! ```rust
//! use flowmatch::flow::compile;
//!
//! let pattern = compile("cat").unwrap();
//! let matches = pattern.fuzzy_match_all("cats", 1).unwrap();
//! assert_eq!(matches.get(0), &[3]);
//! assert_eq!(matches.get(1), &[2, 4]);
//! ```
//!
//! ## Feature Flags
//!
//! - `logging` - Enable debug logging using the `log` crate
//! - `parallel` - Match batches of texts on the rayon thread pool

// Lint configuration for production quality
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(clippy::all)]
#![allow(clippy::new_without_default)]
#![allow(clippy::module_inception)]

/// Logging macros - no-op when logging feature is disabled
#[cfg(not(feature = "logging"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

/// Logging macros - use log crate when logging feature is enabled
#[cfg(feature = "logging")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

// Prelude module for convenient imports
pub mod prelude;

// Matching core
pub mod flow;

/// Re-export commonly used types for convenience
pub use flow::{
    // Debug tools
    debug::{LogObserver, StepObserver, StepTrace, TreePrinter},
    // Errors
    error::{Error, MatchError, SyntaxError, SyntaxErrorKind},
    // Fuzzy matching
    fuzzy::{FuzzyMatcher, FuzzyMatches},
    // Batch matching
    parallel::{match_batch, match_batch_owned, ParallelConfig},
    // Text index
    text_index::{build_text_index, TextIndex},
    compile,
    parse,
    CompiledPattern,
    MatchConfig,
    Matcher,
    PatternNode,
    PositionSet,
    Span,
};
