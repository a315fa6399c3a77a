//! Single-notification gate shared by workers and the pool.
//!
//! A [`Signal`] behaves like a condition variable that remembers a
//! notification sent while nobody was waiting. The next call to
//! [`Signal::wait`] consumes it and returns immediately, so a worker that
//! finishes before the dispatcher reaches its wait can never be missed.

use std::sync::{Condvar, Mutex, PoisonError};

/// An edge-triggered wait/notify primitive.
///
/// Only one wait/notify round may be in flight per instance: notifications
/// do not queue up, a second `notify` before the matching `wait` is a no-op.
pub struct Signal {
    signalled: Mutex<bool>,
    condvar: Condvar,
}

impl Signal {
    /// Creates a signal in the non-signalled state.
    pub fn new() -> Self {
        Self {
            signalled: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Creates a signal whose first [`wait`](Signal::wait) returns at once.
    pub fn skip_first_wait() -> Self {
        Self {
            signalled: Mutex::new(true),
            condvar: Condvar::new(),
        }
    }

    /// Alias of [`notify_one`](Signal::notify_one).
    pub fn notify(&self) {
        self.notify_one();
    }

    /// Wakes one waiting thread, or primes the next `wait` if none is blocked.
    pub fn notify_one(&self) {
        let mut signalled = self.signalled.lock().unwrap_or_else(PoisonError::into_inner);
        *signalled = true;
        self.condvar.notify_one();
    }

    /// Wakes every waiting thread. Only one of them consumes the
    /// notification, the rest go back to sleep.
    pub fn notify_all(&self) {
        let mut signalled = self.signalled.lock().unwrap_or_else(PoisonError::into_inner);
        *signalled = true;
        self.condvar.notify_all();
    }

    /// Blocks until notified, then clears the notification.
    pub fn wait(&self) {
        let guard = self.signalled.lock().unwrap_or_else(PoisonError::into_inner);
        let mut signalled = self
            .condvar
            .wait_while(guard, |signalled| !*signalled)
            .unwrap_or_else(PoisonError::into_inner);
        *signalled = false;
    }

    /// Returns whether a notification is waiting to be consumed.
    pub fn is_signalled(&self) -> bool {
        *self.signalled.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("signalled", &self.is_signalled())
            .finish()
    }
}
