//! Worker threads for running several roster solves at once.

use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};

/// Thread budget for a sweep. Zero means "whatever Rayon's global pool has".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn default_workers() -> Self {
        Self::default()
    }

    pub fn with_workers(workers: usize) -> Self {
        Self { workers }
    }

    /// Requested worker count; 0 when deferring to the global pool.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Threads a sweep will actually run on.
    pub fn thread_count(&self) -> usize {
        if self.workers == 0 {
            rayon::current_num_threads()
        } else {
            self.workers
        }
    }

    /// Runs `op` with this thread budget. A dedicated pool (threads named `roster-sweep-N`)
    /// is built per call when a count was requested; it is torn down when `op` returns.
    pub fn install<OP, R>(&self, op: OP) -> Result<R, ThreadPoolBuildError>
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return Ok(op());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|index| format!("roster-sweep-{index}"))
            .build()?;
        Ok(pool.install(op))
    }
}
