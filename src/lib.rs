//! # stridepool
//!
//! `stridepool` is a Rust library that provides a fixed-size worker pool with
//! an interleaved parallel-for dispatcher.
//!
//! ## Features
//! - Persistent workers, each with a single job slot.
//! - Round-robin partitioning of a range over the workers and, optionally,
//!   the calling thread.
//! - A single completion signal per round, fired by the last worker to finish.
//! - Waiting rounds over borrowed data, or detached rounds over owned data.
//! - Resizing the pool between rounds.
//! - A reader/writer access wrapper for state shared by a round.
//! - A small command-line argument parser.
//! - Metrics collection for monitoring pool activity.
//!
//! ## Usage
//!
//! ### Basic Usage
//! ```rust
//! use stridepool::WorkerPool;
//!
//! // Create a pool with 4 workers
//! let mut pool = WorkerPool::new(4).unwrap();
//!
//! // Fill a buffer by interleaved index
//! let mut buffer = vec![0usize; 200];
//! pool.parallel_for_each_mut(&mut buffer, |x| *x = 7);
//! assert!(buffer.iter().all(|&x| x == 7));
//! ```
//!
//! ### Strides and Contributor Indices
//! ```rust
//! use stridepool::{ForOptions, Synched, WorkerPool};
//!
//! let mut pool = WorkerPool::new(2).unwrap();
//! let seen = Synched::new(Vec::new());
//!
//! // Every third position in [0, 30), the calling thread stays out
//! let options = ForOptions::new().advance(3).main_contribute(false);
//! pool.parallel_for_with(0usize, 30, options, |i, worker| {
//!     seen.write().push((i, worker));
//! });
//!
//! assert_eq!(seen.read().len(), 10);
//! ```
//!
//! ### Detached Rounds
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use stridepool::{ForOptions, WorkerPool};
//!
//! let mut pool = WorkerPool::new(4).unwrap();
//! let count = Arc::new(AtomicUsize::new(0));
//!
//! let shared = Arc::clone(&count);
//! pool.parallel_for_detached(0usize, 1000, ForOptions::new(), move |_, _| {
//!     shared.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! // Do something else, then collect the round
//! pool.wait();
//! assert_eq!(count.load(Ordering::Relaxed), 1000);
//! ```
//!
//! ### Resizing
//! ```rust
//! use stridepool::WorkerPool;
//!
//! let mut pool = WorkerPool::new(8).unwrap();
//! pool.set_worker_count(2).unwrap();
//! assert_eq!(pool.worker_count(), 2);
//! ```
//!
//! ### Collecting Metrics
//! ```rust
//! use stridepool::{metrics::{PoolMetrics, AtomicMetricsCollector}, WorkerPoolBuilder};
//! use std::sync::atomic::Ordering;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(PoolMetrics::new());
//! let collector = Arc::new(AtomicMetricsCollector::new(metrics.clone()));
//!
//! let mut pool = WorkerPoolBuilder::new()
//!     .num_threads(4)
//!     .with_metrics_collector(collector)
//!     .build()
//!     .unwrap();
//!
//! pool.parallel_for(0usize, 64, |_| {});
//!
//! assert_eq!(metrics.rounds_issued.load(Ordering::SeqCst), 1);
//! assert_eq!(metrics.completed_jobs.load(Ordering::SeqCst), 4);
//! ```
//!
//! ## Failure behaviour
//!
//! A panic inside a per-element function that runs on a worker is logged and
//! aborts the process, the same way an unhandled failure on a background
//! thread would. A panic on the calling thread unwinds normally, after the
//! round's workers have finished.

pub mod args;
mod errors;
mod macros;
pub mod metrics;
pub mod pool;
pub mod signal;
pub mod synched;

pub use args::Arguments;
pub use errors::PoolError;
pub use pool::{Cursor, ForOptions, SliceCursor, Worker, WorkerPool, WorkerPoolBuilder};
pub use signal::Signal;
pub use synched::Synched;

#[doc(hidden)]
pub mod __private {
    pub use tracing;
}

/// Runs `f` over `[begin, end)` on the calling thread only.
///
/// This is the baseline the benchmarks compare the pool against.
///
/// # Example
/// ```rust
/// use stridepool::run_sequential;
///
/// let mut sum = 0;
/// run_sequential(0usize, 10, |i| sum += i);
/// assert_eq!(sum, 45);
/// ```
pub fn run_sequential<C, F>(begin: C, end: C, mut f: F)
where
    C: Cursor,
    F: FnMut(C::Item),
{
    let mut cursor = begin;
    for _ in 0..cursor.distance_to(&end) {
        f(cursor.get());
        cursor.advance(1);
    }
}
