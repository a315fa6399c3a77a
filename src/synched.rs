//! Reader/writer access wrapper.
//!
//! [`Synched`] makes a value shareable between the per-element functions of a
//! parallel-for: any number of [`ReadGuard`]s may coexist, a [`WriteGuard`]
//! excludes every other guard. It is backed by crossbeam's `ShardedLock`,
//! which keeps concurrent readers from contending on a single cache line.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::PoisonError;

use crossbeam::sync::{ShardedLock, ShardedLockReadGuard, ShardedLockWriteGuard};

/// A value guarded for many readers or a single writer.
///
/// ```rust
/// use stridepool::{Synched, WorkerPool};
///
/// let mut pool = WorkerPool::new(4).unwrap();
/// let total = Synched::new(0u64);
/// pool.parallel_for(1u64, 101, |i| *total.write() += i);
/// assert_eq!(*total.read(), 5050);
/// ```
pub struct Synched<T> {
    lock: ShardedLock<T>,
    readers: AtomicUsize,
}

impl<T> Synched<T> {
    pub fn new(value: T) -> Self {
        Self {
            lock: ShardedLock::new(value),
            readers: AtomicUsize::new(0),
        }
    }

    /// Blocks until no writer holds the value, then grants shared access.
    pub fn read(&self) -> ReadGuard<'_, T> {
        let guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.readers.fetch_add(1, Ordering::SeqCst);
        ReadGuard {
            guard,
            readers: &self.readers,
        }
    }

    /// Blocks until no reader or writer holds the value, then grants
    /// exclusive access.
    pub fn write(&self) -> WriteGuard<'_, T> {
        let guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        WriteGuard { guard }
    }

    /// Number of read guards currently alive.
    pub fn reader_count(&self) -> usize {
        self.readers.load(Ordering::SeqCst)
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.lock.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn into_inner(self) -> T {
        self.lock.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Clone for Synched<T> {
    fn clone(&self) -> Self {
        Self::new(self.read().clone())
    }
}

impl<T: Default> Default for Synched<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Synched<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Synched<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.lock.try_read() {
            Ok(guard) => f.debug_struct("Synched").field("value", &*guard).finish(),
            Err(_) => f
                .debug_struct("Synched")
                .field("value", &"<locked>")
                .finish(),
        }
    }
}

/// Shared access to a [`Synched`] value, released on drop.
pub struct ReadGuard<'a, T> {
    guard: ShardedLockReadGuard<'a, T>,
    readers: &'a AtomicUsize,
}

impl<T> Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> Drop for ReadGuard<'_, T> {
    fn drop(&mut self) {
        self.readers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Exclusive access to a [`Synched`] value, released on drop.
pub struct WriteGuard<'a, T> {
    guard: ShardedLockWriteGuard<'a, T>,
}

impl<T> Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn readers_coexist() {
        let value = Synched::new(vec![1, 2, 3]);
        let a = value.read();
        let b = value.read();
        assert_eq!(value.reader_count(), 2);
        assert_eq!(a.len() + b.len(), 6);
        drop(a);
        assert_eq!(value.reader_count(), 1);
        drop(b);
        assert_eq!(value.reader_count(), 0);
    }

    #[test]
    fn writer_waits_for_readers() {
        let value = Arc::new(Synched::new(0));
        let reader = value.read();

        let writer = {
            let value = Arc::clone(&value);
            thread::spawn(move || {
                *value.write() = 1;
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(*reader, 0);
        drop(reader);

        writer.join().unwrap();
        assert_eq!(*value.read(), 1);
    }

    #[test]
    fn concurrent_writers_do_not_lose_updates() {
        let value = Arc::new(Synched::new(0usize));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let value = Arc::clone(&value);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        *value.write() += 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*value.read(), 8000);
    }

    #[test]
    fn clone_copies_the_value() {
        let original = Synched::from(String::from("ttl"));
        let copy = original.clone();
        original.write().push('!');
        assert_eq!(copy.into_inner(), "ttl");
        assert_eq!(*original.read(), "ttl!");
        assert!(format!("{:?}", original).contains("ttl!"));
    }
}
