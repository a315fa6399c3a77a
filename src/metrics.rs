//! Metrics collection for the worker pool.
//!
//! This module defines the `MetricsCollector` trait for observing dispatch
//! rounds and worker lifecycle, as well as a default implementation backed by
//! atomic counters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A trait for collecting metrics from the worker pool.
///
/// Hooks are called from the dispatching thread (`on_round_*`,
/// `on_worker_*`) and from worker threads (`on_job_*`), so implementations
/// must be thread-safe.
pub trait MetricsCollector: Send + Sync {
    /// Called when a round is issued to `jobs` workers.
    fn on_round_issued(&self, jobs: usize);
    /// Called when a worker starts running its share of a round.
    fn on_job_started(&self);
    /// Called when a worker finishes its share of a round.
    fn on_job_completed(&self);
    /// Called once the dispatcher has observed the end of a round.
    fn on_round_completed(&self);
    /// Called when a worker thread is added to the pool.
    fn on_worker_started(&self);
    /// Called when a worker thread has been joined.
    fn on_worker_stopped(&self);
}

/// Stores metrics for the worker pool using atomic counters.
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Number of rounds handed to the workers.
    pub rounds_issued: AtomicUsize,
    /// Number of rounds the dispatcher has waited out.
    pub rounds_completed: AtomicUsize,
    /// Number of jobs currently executing.
    pub running_jobs: AtomicUsize,
    /// Total number of jobs that have completed.
    pub completed_jobs: AtomicUsize,
    /// Number of worker threads currently alive.
    pub active_workers: AtomicUsize,
}

impl PoolMetrics {
    /// Creates a new `PoolMetrics` instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A default implementation of `MetricsCollector` using atomic counters.
///
/// It is backed by an `Arc<PoolMetrics>` so the counters can be read while
/// the pool is running.
pub struct AtomicMetricsCollector {
    /// Shared metrics storage.
    pub metrics: Arc<PoolMetrics>,
}

impl AtomicMetricsCollector {
    /// Creates a new `AtomicMetricsCollector` writing into `metrics`.
    pub fn new(metrics: Arc<PoolMetrics>) -> Self {
        Self { metrics }
    }
}

impl MetricsCollector for AtomicMetricsCollector {
    fn on_round_issued(&self, _jobs: usize) {
        self.metrics.rounds_issued.fetch_add(1, Ordering::SeqCst);
    }

    fn on_job_started(&self) {
        self.metrics.running_jobs.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrements the running jobs and increments the completed jobs.
    fn on_job_completed(&self) {
        self.metrics.running_jobs.fetch_sub(1, Ordering::SeqCst);
        self.metrics.completed_jobs.fetch_add(1, Ordering::SeqCst);
    }

    fn on_round_completed(&self) {
        self.metrics.rounds_completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_worker_started(&self) {
        self.metrics.active_workers.fetch_add(1, Ordering::SeqCst);
    }

    fn on_worker_stopped(&self) {
        self.metrics.active_workers.fetch_sub(1, Ordering::SeqCst);
    }
}
