//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from flowmatch.
//! Importing this module with a wildcard import brings them into scope:
//!
//! ```
//! use flowmatch::prelude::*;
//!
//! let pattern = compile("ab+").unwrap();
//! assert_eq!(pattern.match_all("abbx").unwrap(), vec![2, 3]);
//! ```
//!
//! # Re-exported Items
//!
//! ## Core Types
//! - [`compile()`] - Compile a pattern
//! - [`CompiledPattern`] - Reusable compiled pattern
//! - [`PatternNode`] - Pattern tree node
//! - [`MatchConfig`] - Match limits
//! - [`Span`] - Match range
//! - [`FuzzyMatches`] - Fuzzy match ends grouped by distance
//! - [`TextIndex`] - Precomputed character masks
//!
//! ## Error Handling
//! - [`Error`] - Any flowmatch error
//! - [`SyntaxError`] - Malformed pattern
//! - [`MatchError`] - Rejected match call
//!
//! ## Debugging
//! - [`StepObserver`] - Receives every evaluation step
//! - [`StepTrace`] - Records evaluation steps
//! - [`TreePrinter`] - Indented tree dump

// ============================================================================
// Core Types
// ============================================================================

pub use crate::flow::{
    build_text_index, compile, CompiledPattern, FuzzyMatches, MatchConfig, PatternNode, Span,
    TextIndex,
};

// ============================================================================
// Error Handling
// ============================================================================

pub use crate::flow::error::{Error, MatchError, SyntaxError, SyntaxErrorKind};

// ============================================================================
// Debugging
// ============================================================================

pub use crate::flow::debug::{StepObserver, StepTrace, TreePrinter};
