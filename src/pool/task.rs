//! Job abstraction and the strided slice every contributor runs.

use super::cursor::Cursor;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Extends the lifetime of a borrowed job so it can sit in a worker's slot.
///
/// # Safety
///
/// The caller must not let `'a` end before the job has finished running.
/// The pool upholds this by waiting for the round before returning.
pub(crate) unsafe fn erase_lifetime<'a>(job: Box<dyn FnOnce() + Send + 'a>) -> Job {
    // SAFETY: Only the lifetime bound of the trait object changes, the layout
    // is identical. The caller guarantees the borrow outlives the job.
    unsafe { std::mem::transmute::<Box<dyn FnOnce() + Send + 'a>, Job>(job) }
}

/// Interleaved share of a range assigned to one contributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stride {
    /// Contributor index, passed to the per-element function.
    pub index: usize,
    /// Number of concurrent contributors in the round.
    pub contributors: usize,
    /// Step between logical positions.
    pub advance: usize,
}

impl Stride {
    /// Calls `f` for positions `index·advance, (index + contributors)·advance, …`
    /// below `len`, starting from `begin`. Returns how many calls were made.
    pub fn run<C, F>(&self, begin: &C, len: usize, f: &F) -> usize
    where
        C: Cursor,
        F: Fn(C::Item, usize) + ?Sized,
    {
        debug_assert!(self.advance > 0, "a zero stride never terminates");

        // An offset that does not fit in `usize` is past any range.
        let offset = match self.index.checked_mul(self.advance) {
            Some(offset) if offset < len => offset,
            _ => return 0,
        };
        // Likewise a step that overflows never lands on a second position.
        let step = self.contributors.checked_mul(self.advance).unwrap_or(usize::MAX);
        let mut cursor = begin.clone();
        cursor.advance(offset);
        let mut remaining = len - offset;
        let mut visited = 0;

        loop {
            f(cursor.get(), self.index);
            visited += 1;
            if remaining <= step {
                break;
            }
            // Never step past the end, so integer cursors near their
            // maximum cannot overflow.
            cursor.advance(step);
            remaining -= step;
        }

        visited
    }
}
