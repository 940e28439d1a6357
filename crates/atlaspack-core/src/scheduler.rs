//! Work scheduler: a fixed-size worker pool for the parallel pipeline phases
//! (trimming, hull extraction, per-slice bookkeeping).
//!
//! `for_each_parallel` is a blocking join point and the submitting thread helps
//! drain the work, so a worker submitting nested work cannot deadlock the pool.
//! Tasks are independent; the orchestrator re-establishes sprite order with
//! stable sorts on the single-threaded boundaries around each parallel phase.

use std::sync::OnceLock;

use rayon::prelude::*;
use rayon::ThreadPool;

pub struct Scheduler {
    pool: ThreadPool,
}

impl Scheduler {
    pub fn new() -> Self {
        let workers = std::thread::available_parallelism()
            .map_or(1, |n| n.get())
            .max(2)
            - 1;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("atlaspack-worker-{i}"))
            .build()
            .expect("failed to spawn worker threads");
        Self { pool }
    }

    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Enqueues a single fire-and-forget task.
    pub fn spawn(&self, task: impl FnOnce() + Send + 'static) {
        self.pool.spawn(task);
    }

    /// Runs `body` over every item, blocking until all complete.
    /// A panic in any body is propagated to the caller.
    pub fn for_each_parallel<T, F>(&self, items: &mut [T], body: F)
    where
        T: Send,
        F: Fn(&mut T) + Send + Sync,
    {
        self.pool
            .install(|| items.par_iter_mut().for_each(|item| body(item)));
    }

    /// Like [`for_each_parallel`](Self::for_each_parallel), but each body may
    /// fail; the remaining workers finish their current item and one of the
    /// captured errors is returned.
    pub fn try_for_each_parallel<T, E, F>(&self, items: &mut [T], body: F) -> Result<(), E>
    where
        T: Send,
        E: Send,
        F: Fn(&mut T) -> Result<(), E> + Send + Sync,
    {
        self.pool
            .install(|| items.par_iter_mut().try_for_each(|item| body(item)))
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared scheduler instance, created on first use.
pub fn scheduler() -> &'static Scheduler {
    static SCHEDULER: OnceLock<Scheduler> = OnceLock::new();
    SCHEDULER.get_or_init(Scheduler::new)
}
