//! Position-set pattern matching
//!
//! Patterns are parsed into an immutable [`PatternNode`] tree. Matching
//! pushes a set of reachable text offsets through the tree: every node maps
//! an input set to an output set, so all start positions advance together
//! and no alternative is ever retried.
//!
//! # Module Organization
//!
//! ## Sets
//! - [`PositionSet`] - Bitset of text offsets
//! - [`TrackedPositionSet`] - Offsets with their match starts, for lookahead
//! - [`FuzzyState`] - Offsets per pattern offset and edit distance
//!
//! ## Patterns
//! - [`parser`] - Pattern syntax to [`PatternNode`]
//! - [`CompiledPattern`] - Reusable compiled pattern, the main entry point
//!
//! ## Matching
//! - [`Matcher`] - Exact matching
//! - [`FuzzyMatcher`] - Matching within an edit distance
//! - [`TextIndex`] - Precomputed character masks
//! - [`parallel`] - One pattern over many texts
//!
//! ## Diagnostics
//! - [`debug`] - Step observers and tree printing
//! - [`error`] - Syntax and match errors

// ============================================================================
// Module Declarations
// ============================================================================

pub mod ast;
pub mod char_class;
pub mod debug;
pub mod error;
pub mod fuzzy;
pub mod fuzzy_state;
pub mod matcher;
pub mod parser;
pub mod pattern;
pub mod position_set;
pub mod text_index;
pub mod tracked;
pub mod transform;

// Batch matching (always available, uses rayon when the feature is enabled)
pub mod parallel;

// ============================================================================
// Core Types
// ============================================================================

pub use ast::{FuzzyLayout, PatternNode};
pub use char_class::{CharacterPattern, ClassItem, ClassSet};
pub use parser::{parse, Parser, MAX_NESTING_DEPTH};
pub use pattern::{compile, CompiledPattern, Span};

// ============================================================================
// Sets
// ============================================================================

pub use fuzzy_state::FuzzyState;
pub use position_set::{FlowSet, PositionSet};
pub use tracked::TrackedPositionSet;

// ============================================================================
// Matching
// ============================================================================

pub use fuzzy::{FuzzyMatcher, FuzzyMatches};
pub use matcher::{
    Haystack, MatchConfig, Matcher, DEFAULT_MAX_DISTANCE, DEFAULT_MAX_TEXT_LENGTH,
};
pub use parallel::{match_batch, match_batch_owned, ParallelConfig};
pub use text_index::{build_text_index, TextIndex, TextIndexStats};
pub use transform::{repeat_fixed_point, Evaluator};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::{Error, MatchError, SyntaxError, SyntaxErrorKind};

// ============================================================================
// Debug Tools
// ============================================================================

pub use debug::{
    LogObserver, SetSnapshot, StepObserver, StepSet, StepTrace, TraceAction, TraceEntry,
    TreePrinter,
};
