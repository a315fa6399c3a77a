//! Worker logic for the pool.
//!
//! A [`Worker`] is one background thread plus one pending-job slot. The
//! thread sleeps on a [`Signal`] until a job is issued, runs it, and goes
//! back to sleep. Issuing the empty job (`None`) makes the thread leave its
//! loop; this is what dropping a worker does before joining it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::{debug, error, trace};

use super::task::Job;
use crate::errors::PoolError;
use crate::signal::Signal;

struct Shared {
    slot: Mutex<Option<Job>>,
    work_available: Signal,
}

/// A thread waiting for a job.
///
/// Mainly used internally by [`WorkerPool`](super::WorkerPool), but usable on
/// its own. Callers must not issue a new job while the previous one is still
/// running: the slot holds a single job and a job issued before the worker
/// woke up replaces the previous one.
pub struct Worker {
    id: usize,
    shared: Arc<Shared>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Starts an idle worker.
    pub fn new(id: usize) -> Result<Self, PoolError> {
        Self::spawn(id, thread::Builder::new(), None)
    }

    /// Starts a worker that runs `f` at once.
    pub fn with_job<F>(id: usize, f: F) -> Result<Self, PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        Self::spawn(id, thread::Builder::new(), Some(Box::new(f)))
    }

    pub(crate) fn spawn(
        id: usize,
        builder: thread::Builder,
        initial: Option<Job>,
    ) -> Result<Self, PoolError> {
        let has_initial = initial.is_some();
        let shared = Arc::new(Shared {
            slot: Mutex::new(initial),
            work_available: if has_initial {
                Signal::skip_first_wait()
            } else {
                Signal::new()
            },
        });

        let thread_shared = Arc::clone(&shared);
        let handle = builder.spawn(move || worker_loop(id, thread_shared))?;
        debug!(worker = id, "worker started");

        Ok(Self {
            id,
            shared,
            thread: Some(handle),
        })
    }

    /// Index of this worker within its pool.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Stores `f` in the slot and wakes the worker.
    pub fn issue_work<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.issue(Some(Box::new(f)));
    }

    pub(crate) fn issue_job(&self, job: Job) {
        self.issue(Some(job));
    }

    fn issue(&self, job: Option<Job>) {
        *self
            .shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = job;
        self.shared.work_available.notify();
    }

    /// Stops the worker after its current job and waits for the thread.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            self.issue(None);
            let _ = handle.join();
            debug!(worker = self.id, "worker stopped");
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.join();
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("running", &self.thread.is_some())
            .finish()
    }
}

/// Worker thread main loop
fn worker_loop(id: usize, shared: Arc<Shared>) {
    loop {
        shared.work_available.wait();
        let job = shared
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match job {
            Some(job) => run_job(id, job),
            None => break,
        }
    }
    trace!(worker = id, "worker loop exited");
}

/// Runs a job; a panic escaping it takes the whole process down.
fn run_job(id: usize, job: Job) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        let message = payload
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("non-string panic payload");
        error!(worker = id, "job panicked: {}; aborting", message);
        std::process::abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    #[test]
    fn runs_issued_work() {
        let worker = Worker::new(0).unwrap();
        let (tx, rx) = channel();
        worker.issue_work(move || tx.send(42).unwrap());
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn runs_jobs_one_after_another() {
        let worker = Worker::new(3).unwrap();
        assert_eq!(worker.id(), 3);
        let (tx, rx) = channel();
        for i in 0..100 {
            let tx = tx.clone();
            worker.issue_work(move || tx.send(i).unwrap());
            assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), i);
        }
    }

    #[test]
    fn initial_job_runs_immediately() {
        let (tx, rx) = channel();
        let _worker = Worker::with_job(0, move || tx.send("ready").unwrap()).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "ready");
    }

    #[test]
    fn drop_finishes_the_running_job_then_joins() {
        let (started_tx, started_rx) = channel();
        let (done_tx, done_rx) = channel();
        let worker = Worker::new(0).unwrap();
        worker.issue_work(move || {
            started_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(50));
            done_tx.send(()).unwrap();
        });
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        drop(worker);
        assert!(done_rx.try_recv().is_ok());
    }

    #[test]
    fn join_is_idempotent() {
        let mut worker = Worker::new(0).unwrap();
        worker.join();
        worker.join();
        assert!(format!("{:?}", worker).contains("running: false"));
    }
}
