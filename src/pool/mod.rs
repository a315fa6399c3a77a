pub mod cursor;
pub(crate) mod task;
mod worker;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::thread;

use tracing::{debug, trace};

use crate::errors::PoolError;
use crate::metrics::MetricsCollector;
use crate::signal::Signal;

pub use cursor::{Cursor, SliceCursor};
use task::{erase_lifetime, Stride};
pub use worker::Worker;

/// Completion tracking shared between the pool and the jobs of a round.
struct RoundState {
    /// Jobs issued in the current round that have not finished yet.
    active: AtomicUsize,
    /// Fired by the job that brings `active` down to zero.
    done: Signal,
}

impl RoundState {
    fn finish_job(&self) {
        // Only the previous value tells who finished last; re-reading the
        // counter would let two jobs both see zero.
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            trace!("last job of the round finished");
            self.done.notify();
        }
    }
}

/// Tuning knobs for one parallel-for round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForOptions {
    advance: usize,
    main_contribute: bool,
}

impl ForOptions {
    /// Stride of 1, calling thread contributes.
    pub fn new() -> Self {
        Self {
            advance: 1,
            main_contribute: true,
        }
    }

    /// Step between consecutive positions. Must not be zero.
    pub fn advance(mut self, advance: usize) -> Self {
        self.advance = advance;
        self
    }

    /// Whether the calling thread processes one interleaved slice itself.
    pub fn main_contribute(mut self, main_contribute: bool) -> Self {
        self.main_contribute = main_contribute;
        self
    }
}

impl Default for ForOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixed-size pool of workers driven one round at a time.
///
/// Every parallel-for splits its range round-robin: with `P'` contributors,
/// contributor `i` visits offsets `i, i + P', i + 2P', …` (scaled by the
/// stride). Workers are contributors `0..P`, the calling thread is
/// contributor `P` when it takes part.
///
/// A panic inside a per-element function running on a worker aborts the
/// process. Wrap the function body in `std::panic::catch_unwind` to handle
/// failures yourself.
pub struct WorkerPool {
    workers: Vec<Worker>,
    round: Arc<RoundState>,
    round_pending: bool,
    /// Set while jobs sent with `issue_work` are collecting in an open batch.
    /// The batch holds one extra count on `round.active` until `wait`.
    batch_open: bool,
    thread_name: Option<String>,
    stack_size: Option<usize>,
    metrics_collector: Option<Arc<dyn MetricsCollector>>,
}

impl WorkerPool {
    /// Creates a pool with `num_threads` workers.
    pub fn new(num_threads: usize) -> Result<Self, PoolError> {
        WorkerPoolBuilder::new().num_threads(num_threads).build()
    }

    /// Number of workers, not counting the calling thread.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Grows or shrinks the pool.
    ///
    /// A pending detached round is waited for first. Removed workers are
    /// stopped and joined before this returns. On a spawn failure the workers
    /// created so far are kept.
    pub fn set_worker_count(&mut self, num_threads: usize) -> Result<(), PoolError> {
        self.wait();

        let current = self.workers.len();
        if num_threads < current {
            debug!(from = current, to = num_threads, "shrinking worker pool");
            for mut worker in self.workers.drain(num_threads..).rev() {
                worker.join();
                self.metrics_collector
                    .as_ref()
                    .map(|m| m.on_worker_stopped());
            }
        } else if num_threads > current {
            debug!(from = current, to = num_threads, "growing worker pool");
            self.workers.reserve(num_threads - current);
            for id in current..num_threads {
                let worker = Worker::spawn(id, self.thread_builder(id), None)?;
                self.workers.push(worker);
                self.metrics_collector
                    .as_ref()
                    .map(|m| m.on_worker_started());
            }
        }
        Ok(())
    }

    /// Whether a detached round was issued and not waited for yet.
    pub fn has_pending_round(&self) -> bool {
        self.round_pending
    }

    /// Blocks until the last issued round has completed.
    ///
    /// Returns at once when no round is outstanding.
    pub fn wait(&mut self) {
        if !self.round_pending {
            return;
        }
        if self.batch_open {
            // Release the batch's own count; the counter can now reach zero.
            self.batch_open = false;
            self.round.finish_job();
        }
        self.round.done.wait();
        self.round_pending = false;
        trace!("round completed");
        self.metrics_collector
            .as_ref()
            .map(|m| m.on_round_completed());
    }

    /// Sends `f` to the worker at `index` without waiting for it.
    ///
    /// Jobs sent this way join one batch that [`wait`](Self::wait) collects.
    /// A pending parallel-for round is waited for before the batch opens.
    /// Send at most one job to each worker per batch: a job the worker has
    /// not picked up yet is replaced by the next one, and `wait` then never
    /// returns.
    ///
    /// ```rust
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use std::sync::Arc;
    /// use stridepool::WorkerPool;
    ///
    /// let mut pool = WorkerPool::new(2).unwrap();
    /// let done = Arc::new(AtomicUsize::new(0));
    /// for index in 0..2 {
    ///     let done = Arc::clone(&done);
    ///     pool.issue_work(index, move || {
    ///         done.fetch_add(1, Ordering::SeqCst);
    ///     });
    /// }
    /// pool.wait();
    /// assert_eq!(done.load(Ordering::SeqCst), 2);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`worker_count`](Self::worker_count).
    pub fn issue_work<F>(&mut self, index: usize, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        assert!(
            index < self.workers.len(),
            "worker index {} out of range for a pool of {}",
            index,
            self.workers.len()
        );

        if !self.batch_open {
            self.wait();
            self.metrics_collector
                .as_ref()
                .map(|m| m.on_round_issued(0));
            self.round.active.store(1, Ordering::Release);
            self.batch_open = true;
            self.round_pending = true;
            trace!("opened work batch");
        }
        self.round.active.fetch_add(1, Ordering::AcqRel);

        let round = Arc::clone(&self.round);
        let metrics = self.metrics_collector.clone();
        self.workers[index].issue_job(Box::new(move || {
            metrics.as_ref().map(|m| m.on_job_started());
            f();
            metrics.as_ref().map(|m| m.on_job_completed());
            round.finish_job();
        }));
        trace!(worker = index, "issued work");
    }

    /// Calls `f` on every position of `[begin, end)` and waits for all of
    /// them.
    ///
    /// ```rust
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use stridepool::WorkerPool;
    ///
    /// let mut pool = WorkerPool::new(4).unwrap();
    /// let sum = AtomicUsize::new(0);
    /// pool.parallel_for(0usize, 100, |i| {
    ///     sum.fetch_add(i, Ordering::Relaxed);
    /// });
    /// assert_eq!(sum.into_inner(), 4950);
    /// ```
    pub fn parallel_for<C, F>(&mut self, begin: C, end: C, f: F)
    where
        C: Cursor,
        F: Fn(C::Item) + Sync,
    {
        self.parallel_for_with(begin, end, ForOptions::new(), move |item, _| f(item));
    }

    /// Like [`parallel_for`](Self::parallel_for), with a configurable stride
    /// and main-thread contribution. `f` also receives the contributor index.
    pub fn parallel_for_with<C, F>(&mut self, begin: C, end: C, options: ForOptions, f: F)
    where
        C: Cursor,
        F: Fn(C::Item, usize) + Sync,
    {
        let len = begin.distance_to(&end);
        if len == 0 {
            return;
        }
        self.wait();

        if self.workers.is_empty() {
            run_inline(&begin, len, options, &f);
            return;
        }

        let shared = &f;
        let guard = RoundGuard { pool: self };
        // SAFETY: `guard` waits for the round before `f` and `begin` go out
        // of scope, including when the calling thread's own slice unwinds.
        // Panics on workers abort the process, so every job finishes.
        let contributors = unsafe {
            guard
                .pool
                .issue_round(begin.clone(), len, options, move |item, i| shared(item, i))
        };

        if options.main_contribute {
            let stride = Stride {
                index: guard.pool.workers.len(),
                contributors,
                advance: options.advance,
            };
            stride.run(&begin, len, &f);
        }

        drop(guard);
    }

    /// Issues a round and returns without waiting for the workers.
    ///
    /// The cursor and the function are moved into the jobs. When
    /// `main_contribute` is set, the calling thread still processes its own
    /// slice before returning. The next round, resize, [`wait`](Self::wait)
    /// or drop waits for this one.
    pub fn parallel_for_detached<C, F>(&mut self, begin: C, end: C, options: ForOptions, f: F)
    where
        C: Cursor + 'static,
        F: Fn(C::Item, usize) + Send + Sync + 'static,
    {
        let len = begin.distance_to(&end);
        if len == 0 {
            return;
        }
        self.wait();

        if self.workers.is_empty() {
            run_inline(&begin, len, options, &f);
            return;
        }

        let f = Arc::new(f);
        let shared = Arc::clone(&f);
        // SAFETY: the jobs only capture owned, 'static values.
        let contributors = unsafe {
            self.issue_round(begin.clone(), len, options, move |item, i| (*shared)(item, i))
        };

        if options.main_contribute {
            let stride = Stride {
                index: self.workers.len(),
                contributors,
                advance: options.advance,
            };
            stride.run(&begin, len, &*f);
        }
    }

    /// Calls `f` on every element of `items`.
    pub fn parallel_for_each<T, F>(&mut self, items: &[T], f: F)
    where
        T: Sync,
        F: Fn(&T) + Sync,
    {
        let (begin, end) = SliceCursor::range(items);
        self.parallel_for(begin, end, f);
    }

    /// Calls `f` with exclusive access to every element of `items`.
    ///
    /// ```rust
    /// use stridepool::WorkerPool;
    ///
    /// let mut pool = WorkerPool::new(3).unwrap();
    /// let mut squares: Vec<u64> = (0..10).collect();
    /// pool.parallel_for_each_mut(&mut squares, |x| *x *= *x);
    /// assert_eq!(squares[9], 81);
    /// ```
    pub fn parallel_for_each_mut<T, F>(&mut self, items: &mut [T], f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync,
    {
        let base = SendPtr(items.as_mut_ptr());
        self.parallel_for(0usize, items.len(), move |i| {
            // SAFETY: `i < items.len()`, the interleaving hands every index to
            // exactly one contributor, and `items` stays mutably borrowed
            // until the round has completed.
            let item = unsafe { &mut *base.get().add(i) };
            f(item);
        });
    }

    /// Sets the counter for the whole batch, then hands one strided job to
    /// each worker. Returns the number of contributors in the round.
    ///
    /// # Safety
    ///
    /// Everything `begin` and `f` borrow must stay alive until the round has
    /// been waited for.
    unsafe fn issue_round<'a, C, G>(
        &mut self,
        begin: C,
        len: usize,
        options: ForOptions,
        f: G,
    ) -> usize
    where
        C: Cursor + 'a,
        G: Fn(C::Item, usize) + Clone + Send + 'a,
    {
        let workers = self.workers.len();
        let contributors = workers + options.main_contribute as usize;

        // The hook runs before the round is armed so nothing is left to wait
        // for if it panics.
        self.metrics_collector
            .as_ref()
            .map(|m| m.on_round_issued(workers));

        // The full batch is accounted for before the first job starts, so a
        // fast worker cannot bring the counter to zero mid-issue.
        self.round.active.store(workers, Ordering::Release);
        self.round_pending = true;
        trace!(len, workers, contributors, "issuing round");

        for (index, worker) in self.workers.iter().enumerate() {
            let stride = Stride {
                index,
                contributors,
                advance: options.advance,
            };
            let begin = begin.clone();
            let f = f.clone();
            let round = Arc::clone(&self.round);
            let metrics = self.metrics_collector.clone();

            let job: Box<dyn FnOnce() + Send + 'a> = Box::new(move || {
                metrics.as_ref().map(|m| m.on_job_started());
                stride.run(&begin, len, &f);
                // Borrowed captures must be gone before the round can end.
                drop(begin);
                drop(f);
                metrics.as_ref().map(|m| m.on_job_completed());
                round.finish_job();
            });
            // SAFETY: forwarded to the caller.
            worker.issue_job(unsafe { erase_lifetime(job) });
        }

        contributors
    }

    fn thread_builder(&self, id: usize) -> thread::Builder {
        let name = match &self.thread_name {
            Some(prefix) => format!("{}-{}", prefix, id),
            None => format!("stridepool-worker-{}", id),
        };
        let builder = thread::Builder::new().name(name);
        match self.stack_size {
            Some(size) => builder.stack_size(size),
            None => builder,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.wait();
        for mut worker in self.workers.drain(..).rev() {
            worker.join();
            self.metrics_collector
                .as_ref()
                .map(|m| m.on_worker_stopped());
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("round_pending", &self.round_pending)
            .field("batch_open", &self.batch_open)
            .finish()
    }
}

/// Waits for the round on drop.
struct RoundGuard<'p> {
    pool: &'p mut WorkerPool,
}

impl Drop for RoundGuard<'_> {
    fn drop(&mut self) {
        self.pool.wait();
    }
}

/// Processes the whole range on the calling thread.
fn run_inline<C, F>(begin: &C, len: usize, options: ForOptions, f: &F)
where
    C: Cursor,
    F: Fn(C::Item, usize),
{
    let stride = Stride {
        index: 0,
        contributors: 1,
        advance: options.advance,
    };
    stride.run(begin, len, f);
}

struct SendPtr<T>(*mut T);

impl<T> SendPtr<T> {
    fn get(&self) -> *mut T {
        self.0
    }
}

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

// SAFETY: the pointer is only dereferenced at disjoint indices, each by a
// single thread, so it behaves like a `&mut [T]` split across threads.
unsafe impl<T: Send> Send for SendPtr<T> {}
// SAFETY: see above.
unsafe impl<T: Send> Sync for SendPtr<T> {}

/// Builder for [`WorkerPool`].
pub struct WorkerPoolBuilder {
    num_threads: usize,
    thread_name: Option<String>,
    stack_size: Option<usize>,
    metrics_collector: Option<Arc<dyn MetricsCollector>>,
}

impl WorkerPoolBuilder {
    /// Four workers, default thread names and stack size.
    pub fn new() -> Self {
        Self {
            num_threads: 4,
            thread_name: None,
            stack_size: None,
            metrics_collector: None,
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = n;
        self
    }

    /// Worker threads are named `<prefix>-<index>`.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = Some(prefix.into());
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn with_metrics_collector(mut self, collector: Arc<dyn MetricsCollector>) -> Self {
        self.metrics_collector = Some(collector);
        self
    }

    pub fn build(self) -> Result<WorkerPool, PoolError> {
        let mut pool = WorkerPool {
            workers: Vec::with_capacity(self.num_threads),
            round: Arc::new(RoundState {
                active: AtomicUsize::new(0),
                done: Signal::new(),
            }),
            round_pending: false,
            batch_open: false,
            thread_name: self.thread_name,
            stack_size: self.stack_size,
            metrics_collector: self.metrics_collector,
        };
        pool.set_worker_count(self.num_threads)?;
        Ok(pool)
    }
}

impl Default for WorkerPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
