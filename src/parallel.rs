//! Parallel processing configuration
//!
//! Folder aggregation can extract files on Rayon's thread pool. Results are
//! always collected in file order, so the aggregated table does not depend on
//! which file finishes first.

use crate::errors::{Result, ToolboxError};
use rayon::ThreadPoolBuilder;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Set up the global Rayon thread pool with the specified configuration
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::ThreadPoolError`] if the global pool was already
    /// initialised or cannot be built.
    pub fn setup_global_pool(&self) -> Result<()> {
        if let Some(num_threads) = self.num_threads {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    ToolboxError::ThreadPoolError(format!(
                        "Failed to initialize thread pool with {num_threads} threads: {e}"
                    ))
                })?;

            tracing::info!(threads = num_threads, "configured parallel processing");
        } else {
            tracing::info!(threads = self.current_threads(), "using default thread pool");
        }

        Ok(())
    }

    /// Get the current number of threads being used
    #[must_use]
    pub fn current_threads(&self) -> usize {
        rayon::current_num_threads()
    }

    /// Create a configuration that uses all available CPU cores
    #[must_use]
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    /// Create a configuration that uses a specific number of threads
    #[must_use]
    pub const fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }
}
