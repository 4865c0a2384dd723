//! Batch matching
//!
//! One [`CompiledPattern`] matched against many independent texts. The
//! pattern tree is shared read-only; every text gets its own sets.
//!
//! # Feature Flag
//!
//! Texts are matched on the rayon thread pool when the `parallel` feature
//! is enabled, and one after another otherwise. Results are identical and
//! always in input order.
//!
//! ```toml
//! [dependencies]
//! flowmatch = { version = "0.1", features = ["parallel"] }
//! ```
//!
//! # Example
//!
//! ```rust
//! use flowmatch::flow::{compile, parallel::match_batch};
//!
//! let pattern = compile("ab").unwrap();
//! let results = match_batch(&pattern, &["ab", "xx", "abab"]);
//! assert_eq!(results[0], Ok(vec![2]));
//! assert_eq!(results[1], Ok(vec![]));
//! assert_eq!(results[2], Ok(vec![2, 4]));
//! ```

use super::error::MatchError;
use super::pattern::CompiledPattern;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Match `pattern` against every text in `inputs`
///
/// # Returns
/// One result per input, in the same order
#[cfg(feature = "parallel")]
pub fn match_batch(
    pattern: &CompiledPattern,
    inputs: &[&str],
) -> Vec<Result<Vec<usize>, MatchError>> {
    inputs
        .par_iter()
        .map(|input| pattern.match_all(input))
        .collect()
}

/// Match `pattern` against every text in `inputs` sequentially
#[cfg(not(feature = "parallel"))]
pub fn match_batch(
    pattern: &CompiledPattern,
    inputs: &[&str],
) -> Vec<Result<Vec<usize>, MatchError>> {
    inputs
        .iter()
        .map(|input| pattern.match_all(input))
        .collect()
}

/// Match `pattern` against owned texts
#[cfg(feature = "parallel")]
pub fn match_batch_owned(
    pattern: &CompiledPattern,
    inputs: Vec<String>,
) -> Vec<Result<Vec<usize>, MatchError>> {
    inputs
        .into_par_iter()
        .map(|input| pattern.match_all(&input))
        .collect()
}

/// Match `pattern` against owned texts sequentially
#[cfg(not(feature = "parallel"))]
pub fn match_batch_owned(
    pattern: &CompiledPattern,
    inputs: Vec<String>,
) -> Vec<Result<Vec<usize>, MatchError>> {
    inputs
        .into_iter()
        .map(|input| pattern.match_all(&input))
        .collect()
}

/// Configuration for batch matching
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use (None = rayon default)
    pub num_threads: Option<usize>,
    /// Minimum number of texts per work item
    pub min_chunk_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            min_chunk_size: 1,
        }
    }
}

impl ParallelConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of threads to use
    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set the minimum number of texts per work item
    pub fn with_min_chunk_size(mut self, size: usize) -> Self {
        self.min_chunk_size = size.max(1);
        self
    }
}

/// Match `pattern` against `inputs` under `config`
#[cfg(feature = "parallel")]
pub fn match_batch_with_config(
    pattern: &CompiledPattern,
    inputs: &[&str],
    config: &ParallelConfig,
) -> Vec<Result<Vec<usize>, MatchError>> {
    let run = || {
        inputs
            .par_iter()
            .with_min_len(config.min_chunk_size)
            .map(|input| pattern.match_all(input))
            .collect()
    };
    match config.num_threads {
        Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(run),
            Err(_error) => {
                log_debug!("could not build a {} thread pool: {}", threads, _error);
                run()
            }
        },
        None => run(),
    }
}

/// Match `pattern` against `inputs` sequentially; `config` is ignored
#[cfg(not(feature = "parallel"))]
pub fn match_batch_with_config(
    pattern: &CompiledPattern,
    inputs: &[&str],
    _config: &ParallelConfig,
) -> Vec<Result<Vec<usize>, MatchError>> {
    match_batch(pattern, inputs)
}
