//! Bounded worker pool used to run checks concurrently
//!
//! The module only deals with system resources and execution strategy:
//! it works out how many workers the machine and configuration allow and
//! runs a closure over a list of items, sequentially or on a crossbeam pool.
//! Whatever the strategy, results come back in input order.
//!
//! ```rust
//! use repolint::parallel::ExecutionStrategy;
//!
//! let strategy = ExecutionStrategy::auto(100, 2, 4);
//! let doubled = strategy.execute(vec![1, 2, 3], |x| x * 2).unwrap();
//! assert_eq!(doubled, vec![2, 4, 6]);
//! ```

use serde::{Deserialize, Serialize};

pub mod processor;

pub use processor::{ExecutionStrategy, ParallelProcessor};

/// `[parallel]` configuration section
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParallelConfig {
    /// Maximum number of worker threads (0 = auto-detect)
    pub max_threads: usize,
    /// Percentage of CPU cores to use (1-100)
    pub thread_percentage: u8,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            thread_percentage: 75,
        }
    }
}
