//! # Macros for `stridepool`
//!
//! Shorthands for building pools, dispatching ranges and logging metrics.

/// Runs a parallel-for over a `Range`.
///
/// # Examples
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use stridepool::{parallel_for, WorkerPool};
///
/// let mut pool = WorkerPool::new(4).unwrap();
/// let count = AtomicUsize::new(0);
///
/// // Every position
/// parallel_for!(pool, 0usize..100, |_| {
///     count.fetch_add(1, Ordering::Relaxed);
/// });
///
/// // Every tenth position
/// parallel_for!(pool, 0usize..100, |_| {
///     count.fetch_add(1, Ordering::Relaxed);
/// }, advance: 10);
///
/// assert_eq!(count.load(Ordering::Relaxed), 110);
/// ```
#[macro_export]
macro_rules! parallel_for {
    ($pool:expr, $range:expr, $f:expr) => {{
        let range = $range;
        $pool.parallel_for(range.start, range.end, $f)
    }};
    ($pool:expr, $range:expr, $f:expr, advance: $advance:expr) => {{
        let range = $range;
        let f = $f;
        $pool.parallel_for_with(
            range.start,
            range.end,
            $crate::ForOptions::new().advance($advance),
            move |item, _| f(item),
        )
    }};
}

/// Logs the current metrics of the pool through `tracing` at info level.
///
/// # Example
/// ```rust
/// use stridepool::{metrics::{PoolMetrics, AtomicMetricsCollector}, WorkerPoolBuilder, log_metrics};
/// use std::sync::Arc;
///
/// let metrics = Arc::new(PoolMetrics::new());
/// let collector = Arc::new(AtomicMetricsCollector::new(metrics.clone()));
/// let pool = WorkerPoolBuilder::new().with_metrics_collector(collector).build().unwrap();
///
/// log_metrics!(metrics);
/// drop(pool);
/// ```
#[macro_export]
macro_rules! log_metrics {
    ($metrics:expr) => {
        $crate::__private::tracing::info!(
            rounds_issued = $metrics
                .rounds_issued
                .load(std::sync::atomic::Ordering::SeqCst),
            rounds_completed = $metrics
                .rounds_completed
                .load(std::sync::atomic::Ordering::SeqCst),
            running_jobs = $metrics
                .running_jobs
                .load(std::sync::atomic::Ordering::SeqCst),
            completed_jobs = $metrics
                .completed_jobs
                .load(std::sync::atomic::Ordering::SeqCst),
            active_workers = $metrics
                .active_workers
                .load(std::sync::atomic::Ordering::SeqCst),
            "worker pool metrics"
        );
    };
}

/// Creates a worker pool.
///
/// # Examples
/// ```rust
/// use stridepool::create_worker_pool;
///
/// let pool = create_worker_pool!(num_threads: 8, thread_name: "render").unwrap();
/// assert_eq!(pool.worker_count(), 8);
/// ```
#[macro_export]
macro_rules! create_worker_pool {
    (num_threads: $num:expr) => {
        $crate::WorkerPoolBuilder::new().num_threads($num).build()
    };
    (num_threads: $num:expr, thread_name: $name:expr) => {
        $crate::WorkerPoolBuilder::new()
            .num_threads($num)
            .thread_name($name)
            .build()
    };
    (num_threads: $num:expr, metrics: $collector:expr) => {
        $crate::WorkerPoolBuilder::new()
            .num_threads($num)
            .with_metrics_collector($collector)
            .build()
    };
}
