//! Diagnostics
//!
//! Matching can report every transformation step to a [`StepObserver`].
//! Observers never influence the result; with no observer attached the
//! evaluator skips the callbacks entirely.
//!
//! # Features
//! - Step tracing ([`StepTrace`], JSON export through `serde_json`)
//! - Forwarding steps to the `log` crate ([`LogObserver`])
//! - Pattern tree pretty printing ([`TreePrinter`])
//!
//! # Example
//!
//! ```rust
//! use flowmatch::flow::{compile, StepTrace};
//!
//! let pattern = compile("a*b").unwrap();
//! let mut trace = StepTrace::new();
//! let ends = pattern.match_all_traced("aab", &mut trace).unwrap();
//! assert_eq!(ends, vec![3]);
//! assert!(!trace.entries.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;

use super::ast::PatternNode;
use super::fuzzy_state::FuzzyState;
use super::position_set::PositionSet;
use super::tracked::TrackedPositionSet;

/// Borrowed view of whichever set a step operated on
#[derive(Clone, Copy)]
pub enum StepSet<'s> {
    /// Plain position set
    Exact(&'s PositionSet),
    /// Position set with start offsets
    Tracked(&'s TrackedPositionSet),
    /// Edit-distance state space
    Fuzzy(&'s FuzzyState),
}

impl StepSet<'_> {
    /// Number of members
    pub fn len(&self) -> usize {
        match self {
            StepSet::Exact(set) => set.len(),
            StepSet::Tracked(set) => set.pair_count(),
            StepSet::Fuzzy(state) => state.state_count(),
        }
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned copy of the members, suitable for recording
    pub fn snapshot(&self) -> SetSnapshot {
        match self {
            StepSet::Exact(set) => SetSnapshot::Exact {
                positions: set.to_vec(),
            },
            StepSet::Tracked(set) => SetSnapshot::Tracked { pairs: set.pairs() },
            StepSet::Fuzzy(state) => SetSnapshot::Fuzzy {
                states: state.states(),
            },
        }
    }
}

impl fmt::Display for StepSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepSet::Exact(set) => write!(f, "{:?}", set.to_vec()),
            StepSet::Tracked(set) => write!(f, "{:?}", set.pairs()),
            StepSet::Fuzzy(state) => write!(f, "{:?}", state.states()),
        }
    }
}

/// Owned members of a set at one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SetSnapshot {
    /// Text offsets
    Exact {
        /// Members in ascending order
        positions: Vec<usize>,
    },
    /// `(start, end)` pairs
    Tracked {
        /// Pairs ordered by end, then start
        pairs: Vec<(usize, usize)>,
    },
    /// `(text, pattern, distance)` states
    Fuzzy {
        /// States in ascending order
        states: Vec<(usize, usize, usize)>,
    },
}

/// Callback interface for step-by-step diagnostics
pub trait StepObserver {
    /// A node finished transforming `input` into `output`
    fn on_step(&mut self, node: &PatternNode, input: StepSet<'_>, output: StepSet<'_>);

    /// A repetition node finished one more iteration.
    ///
    /// While the minimum count is being reached `set` holds the offsets
    /// after exactly `iteration` repetitions; after that it holds every
    /// offset reached so far, so it only grows until the fixed point.
    fn on_iteration(&mut self, _node: &PatternNode, _iteration: usize, _set: StepSet<'_>) {}
}

/// What a trace entry records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TraceAction {
    /// A complete node application
    Step {
        /// Set fed to the node
        input: SetSnapshot,
        /// Set the node produced
        output: SetSnapshot,
    },
    /// One repetition iteration
    Iteration {
        /// 1-based iteration count
        iteration: usize,
        /// Set after this iteration
        set: SetSnapshot,
    },
}

/// A single trace entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Node label, e.g. `Literal('a')`
    pub node: String,
    /// Node in pattern syntax
    pub pattern: String,
    /// What happened
    pub action: TraceAction,
}

/// Recording observer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTrace {
    /// Trace entries, in the order they were reported
    pub entries: Vec<TraceEntry>,
}

impl StepTrace {
    /// Create a new empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iteration entries of the repetition node rendered as `pattern`
    pub fn iterations_of(&self, pattern: &str) -> Vec<(usize, &SetSnapshot)> {
        self.entries
            .iter()
            .filter(|entry| entry.pattern == pattern)
            .filter_map(|entry| match &entry.action {
                TraceAction::Iteration { iteration, set } => Some((*iteration, set)),
                TraceAction::Step { .. } => None,
            })
            .collect()
    }

    /// Serialize the trace as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format as a readable string
    pub fn format(&self) -> String {
        let mut output = String::new();
        for entry in &self.entries {
            match &entry.action {
                TraceAction::Step { input, output: out } => {
                    writeln!(
                        output,
                        "{} `{}`: {} -> {}",
                        entry.node,
                        entry.pattern,
                        snapshot_summary(input),
                        snapshot_summary(out)
                    )
                    .unwrap();
                }
                TraceAction::Iteration { iteration, set } => {
                    writeln!(
                        output,
                        "  {} `{}` #{}: {}",
                        entry.node,
                        entry.pattern,
                        iteration,
                        snapshot_summary(set)
                    )
                    .unwrap();
                }
            }
        }
        output
    }
}

fn snapshot_summary(snapshot: &SetSnapshot) -> String {
    match snapshot {
        SetSnapshot::Exact { positions } => format!("{:?}", positions),
        SetSnapshot::Tracked { pairs } => format!("{:?}", pairs),
        SetSnapshot::Fuzzy { states } => format!("{} states", states.len()),
    }
}

impl StepObserver for StepTrace {
    fn on_step(&mut self, node: &PatternNode, input: StepSet<'_>, output: StepSet<'_>) {
        self.entries.push(TraceEntry {
            node: node.label(),
            pattern: node.to_string(),
            action: TraceAction::Step {
                input: input.snapshot(),
                output: output.snapshot(),
            },
        });
    }

    fn on_iteration(&mut self, node: &PatternNode, iteration: usize, set: StepSet<'_>) {
        self.entries.push(TraceEntry {
            node: node.label(),
            pattern: node.to_string(),
            action: TraceAction::Iteration {
                iteration,
                set: set.snapshot(),
            },
        });
    }
}

/// Observer that forwards every step to the `log` crate at debug level.
///
/// Without the `logging` feature this observer does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl StepObserver for LogObserver {
    #[allow(unused_variables)]
    fn on_step(&mut self, node: &PatternNode, input: StepSet<'_>, output: StepSet<'_>) {
        log_debug!("{} `{}`: {} -> {}", node.label(), node, input, output);
    }

    #[allow(unused_variables)]
    fn on_iteration(&mut self, node: &PatternNode, iteration: usize, set: StepSet<'_>) {
        log_debug!("{} `{}` iteration {}: {}", node.label(), node, iteration, set);
    }
}

/// Pattern tree pretty printer
pub struct TreePrinter {
    /// Indentation string
    indent: String,
    /// Maximum depth to print
    max_depth: Option<usize>,
}

impl TreePrinter {
    /// Create a new tree printer
    pub fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            max_depth: None,
        }
    }

    /// Set the indentation string
    pub fn indent(mut self, indent: &str) -> Self {
        self.indent = indent.to_string();
        self
    }

    /// Set the maximum depth to print
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Print a pattern tree, one node per line
    pub fn print(&self, node: &PatternNode) -> String {
        let mut output = String::new();
        self.print_node(node, 0, &mut output);
        output
    }

    fn print_node(&self, node: &PatternNode, depth: usize, output: &mut String) {
        let indent = self.indent.repeat(depth);
        if let Some(max) = self.max_depth {
            if depth > max {
                writeln!(output, "{}...", indent).unwrap();
                return;
            }
        }

        match node {
            PatternNode::PositiveLookahead { condition, body }
            | PatternNode::NegativeLookahead { condition, body } => {
                writeln!(output, "{}{}", indent, node.label()).unwrap();
                writeln!(output, "{}{}condition:", indent, self.indent).unwrap();
                self.print_node(condition, depth + 2, output);
                writeln!(output, "{}{}body:", indent, self.indent).unwrap();
                self.print_node(body, depth + 2, output);
            }
            _ => {
                writeln!(output, "{}{}", indent, node.label()).unwrap();
                for child in node.children() {
                    self.print_node(child, depth + 1, output);
                }
            }
        }
    }

    /// Generate a GraphViz DOT diagram
    pub fn to_dot(&self, node: &PatternNode) -> String {
        let mut output = String::new();
        output.push_str("digraph Pattern {\n");
        output.push_str("  rankdir=TB;\n");
        output.push_str("  node [shape=box];\n");
        let mut next_id = 0;
        Self::dot_node(node, &mut next_id, &mut output);
        output.push_str("}\n");
        output
    }

    fn dot_node(node: &PatternNode, next_id: &mut usize, output: &mut String) -> usize {
        let id = *next_id;
        *next_id += 1;
        writeln!(output, "  n{} [label={:?}]", id, node.label()).unwrap();
        for child in node.children() {
            let child_id = Self::dot_node(child, next_id, output);
            writeln!(output, "  n{} -> n{}", id, child_id).unwrap();
        }
        id
    }
}

impl Default for TreePrinter {
    fn default() -> Self {
        Self::new()
    }
}
