//! Bounded worker pool for per-element batches.
//!
//! Each batch builds a dedicated rayon pool, runs one task per item and
//! returns only after every task finished. Failures do not cancel the
//! batch; they are collected and reported together afterwards.

use super::error::{BatchFailure, IpfError, IpfResult, ItemFailure};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::warn;

/// Thread count for parallel import and extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    threads: usize,
}

impl WorkerPool {
    /// Pool with `threads` workers, clamped to `1..=hardware_threads()`.
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.clamp(1, Self::hardware_threads()),
        }
    }

    /// Single-threaded pool.
    pub const fn sequential() -> Self {
        Self { threads: 1 }
    }

    /// Available hardware parallelism, at least 1.
    pub fn hardware_threads() -> usize {
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }

    /// Number of workers.
    pub const fn threads(&self) -> usize {
        self.threads
    }

    /// Run `task` once per item and wait for all of them.
    ///
    /// Results come back in input order. `label` names an item in the
    /// failure report.
    pub fn run<T, R, F, L>(&self, items: &[T], label: L, task: F) -> IpfResult<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> IpfResult<R> + Sync + Send,
        L: Fn(&T) -> String,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|index| format!("tos-worker-{index}"))
            .build()
            .map_err(|e| IpfError::Pool(e.to_string()))?;

        let results: Vec<IpfResult<R>> = pool.install(|| items.par_iter().map(&task).collect());

        let mut outputs = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (item, result) in items.iter().zip(results) {
            match result {
                Ok(output) => outputs.push(output),
                Err(error) => {
                    let item = label(item);
                    warn!(%item, %error, "task failed");
                    failures.push(ItemFailure { item, error });
                }
            }
        }

        if failures.is_empty() {
            Ok(outputs)
        } else {
            Err(IpfError::Batch(BatchFailure {
                total: items.len(),
                failures,
            }))
        }
    }
}

impl Default for WorkerPool {
    /// Half the hardware threads, at least one.
    fn default() -> Self {
        Self::new(Self::hardware_threads() / 2)
    }
}

/// Completed-work counters shared by the tasks of a batch.
#[derive(Debug, Default)]
pub struct Progress {
    files: AtomicUsize,
    bytes: AtomicU64,
}

impl Progress {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished file of `bytes` bytes.
    pub fn record(&self, bytes: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Files finished so far.
    pub fn files(&self) -> usize {
        self.files.load(Ordering::Relaxed)
    }

    /// Bytes finished so far.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}
