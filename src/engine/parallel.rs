//! Parallel fan-out support
//!
//! Every tree walk applies the same policy at each node: below the
//! stage's threshold the items are processed on the calling thread, at or
//! above it they are spread over the rayon pool with work stealing.
//! Results keep the input order either way, so sequential and parallel
//! runs build identical trees.
//!
//! Walks recurse from inside the mapped closure, so a fan-out at a child
//! node runs nested in its parent's. Nested `par_iter` calls join the
//! same pool through work stealing and never spawn threads of their own,
//! so the number of workers stays bounded by the pool size.
//!
//! # Feature Flag
//!
//! Parallelism requires the `parallel` feature (enabled by default).
//! Without it every helper falls back to sequential iteration.

use super::config::ParallelConfig;
use super::error::AnalysisResult;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Map items to results, failing on the first error
///
/// Runs in parallel when `items.len() >= threshold`.
#[cfg(feature = "parallel")]
pub fn try_map<T, R, E, F>(items: &[T], threshold: usize, f: F) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&T) -> Result<R, E> + Sync + Send,
{
    if items.len() >= threshold.max(2) {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

/// Map items to results sequentially (fallback when rayon is not available)
#[cfg(not(feature = "parallel"))]
pub fn try_map<T, R, E, F>(items: &[T], _threshold: usize, f: F) -> Result<Vec<R>, E>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(&T) -> Result<R, E> + Sync + Send,
{
    items.iter().map(f).collect()
}

/// Worker pool the pipeline runs in
///
/// With `num_threads` unset the global rayon pool is used.
pub struct WorkerPool {
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    /// Build the pool described by the configuration
    #[cfg(feature = "parallel")]
    pub fn new(config: &ParallelConfig) -> AnalysisResult<Self> {
        use super::error::AnalysisError;

        let pool = match config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("morphtree-worker-{}", i))
                    .build()
                    .map_err(|e| AnalysisError::ThreadPool(e.to_string()))?,
            ),
            None => None,
        };
        Ok(Self { pool })
    }

    /// Build the pool described by the configuration
    #[cfg(not(feature = "parallel"))]
    pub fn new(_config: &ParallelConfig) -> AnalysisResult<Self> {
        Ok(Self {})
    }

    /// Run a closure inside the pool
    #[cfg(feature = "parallel")]
    pub fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    /// Run a closure on the calling thread
    #[cfg(not(feature = "parallel"))]
    pub fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        f()
    }

    /// Number of threads work is spread over
    pub fn current_num_threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            match &self.pool {
                Some(pool) => pool.current_num_threads(),
                None => rayon::current_num_threads(),
            }
        }
        #[cfg(not(feature = "parallel"))]
        {
            1
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.current_num_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::AnalysisError;

    #[test]
    fn test_try_map_keeps_order() {
        let items: Vec<usize> = (0..100).collect();
        let sequential = try_map(&items, usize::MAX, |x| Ok::<_, AnalysisError>(x * 2)).unwrap();
        let parallel = try_map(&items, 2, |x| Ok::<_, AnalysisError>(x * 2)).unwrap();
        assert_eq!(sequential, parallel);
        assert_eq!(parallel[99], 198);
    }

    #[test]
    fn test_try_map_propagates_error() {
        let items: Vec<usize> = (0..50).collect();
        let result = try_map(&items, 2, |&x| {
            if x == 17 {
                Err(AnalysisError::Canceled)
            } else {
                Ok(x)
            }
        });
        assert_eq!(result, Err(AnalysisError::Canceled));
    }

    #[test]
    fn test_nested_fan_out_keeps_order() {
        let pool = WorkerPool::new(&ParallelConfig::new().with_num_threads(2)).unwrap();
        let rows: Vec<usize> = (0..8).collect();
        let table = pool
            .install(|| {
                try_map(&rows, 2, |&row| {
                    let cols: Vec<usize> = (0..8).collect();
                    try_map(&cols, 2, |&col| Ok::<_, AnalysisError>(row * 8 + col))
                })
            })
            .unwrap();

        let flat: Vec<usize> = table.into_iter().flatten().collect();
        assert_eq!(flat, (0..64).collect::<Vec<_>>());
        #[cfg(feature = "parallel")]
        assert_eq!(pool.current_num_threads(), 2);
    }

    #[test]
    fn test_pool_install() {
        let pool = WorkerPool::new(&ParallelConfig::new().with_num_threads(2)).unwrap();
        let sum: usize = pool.install(|| (1..=10).sum());
        assert_eq!(sum, 55);
        assert!(pool.current_num_threads() >= 1);
    }
}
