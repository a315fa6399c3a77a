//! Iteration positions consumed by the dispatcher.
//!
//! A [`Cursor`] is a cheap, copyable position in some sequence. The pool only
//! needs three things from it: move forward, measure the distance to the end
//! position, and produce the element at the current position. Unsigned
//! integers are cursors over themselves, [`SliceCursor`] walks a borrowed
//! slice.

/// A position in a sequence that can be handed to worker threads.
pub trait Cursor: Clone + Send {
    /// The value produced at a position.
    type Item;

    /// Moves the cursor `n` positions forward.
    ///
    /// The dispatcher never moves a cursor past the end position it was
    /// given. Implementations may panic when asked to.
    fn advance(&mut self, n: usize);

    /// Number of positions between `self` and `end`, zero when `end` is not
    /// ahead of `self`. Saturates at `usize::MAX`.
    fn distance_to(&self, end: &Self) -> usize;

    /// The element at the current position.
    fn get(&self) -> Self::Item;
}

macro_rules! integer_cursor {
    ($($ty:ty),*) => {
        $(
            impl Cursor for $ty {
                type Item = $ty;

                /// # Panics
                ///
                /// Panics if the cursor would pass the type's maximum.
                #[inline]
                fn advance(&mut self, n: usize) {
                    *self = <$ty>::try_from(n)
                        .ok()
                        .and_then(|n| self.checked_add(n))
                        .unwrap_or_else(|| {
                            panic!("cursor advanced past {}::MAX", stringify!($ty))
                        });
                }

                #[inline]
                fn distance_to(&self, end: &Self) -> usize {
                    usize::try_from(end.saturating_sub(*self)).unwrap_or(usize::MAX)
                }

                #[inline]
                fn get(&self) -> $ty {
                    *self
                }
            }
        )*
    };
}

integer_cursor!(usize, u64, u32, u16, u8);

/// A cursor over the elements of a borrowed slice.
#[derive(Debug)]
pub struct SliceCursor<'a, T> {
    slice: &'a [T],
    index: usize,
}

impl<'a, T> SliceCursor<'a, T> {
    /// Cursor at the first element.
    pub fn begin(slice: &'a [T]) -> Self {
        Self { slice, index: 0 }
    }

    /// Cursor one past the last element.
    pub fn end(slice: &'a [T]) -> Self {
        Self {
            slice,
            index: slice.len(),
        }
    }

    /// Both ends of the slice.
    pub fn range(slice: &'a [T]) -> (Self, Self) {
        (Self::begin(slice), Self::end(slice))
    }

    /// Index of the current position within the slice.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for SliceCursor<'_, T> {
    fn clone(&self) -> Self {
        Self {
            slice: self.slice,
            index: self.index,
        }
    }
}

impl<'a, T: Sync> Cursor for SliceCursor<'a, T> {
    type Item = &'a T;

    #[inline]
    fn advance(&mut self, n: usize) {
        self.index += n;
    }

    #[inline]
    fn distance_to(&self, end: &Self) -> usize {
        end.index.saturating_sub(self.index)
    }

    /// # Panics
    ///
    /// Panics when the cursor is at or past the end of the slice.
    #[inline]
    fn get(&self) -> &'a T {
        &self.slice[self.index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_cursor_moves_and_measures() {
        let mut c = 3usize;
        c.advance(4);
        assert_eq!(c.get(), 7);
        assert_eq!(c.distance_to(&10), 3);
        assert_eq!(10usize.distance_to(&c), 0);
        assert_eq!(5u8.distance_to(&9), 4);
    }

    #[test]
    fn integer_cursor_reaches_its_maximum() {
        let mut c = 250u8;
        c.advance(5);
        assert_eq!(c, u8::MAX);
        assert_eq!(0u64.distance_to(&u64::MAX) as u64, u64::MAX.min(usize::MAX as u64));
    }

    #[test]
    #[should_panic(expected = "cursor advanced past u8::MAX")]
    fn integer_cursor_refuses_to_wrap() {
        let mut c = 250u8;
        c.advance(300);
    }

    #[test]
    fn slice_cursor_walks_the_slice() {
        let data = ['a', 'b', 'c', 'd'];
        let (mut begin, end) = SliceCursor::range(&data);
        assert_eq!(begin.distance_to(&end), 4);
        assert_eq!(*begin.get(), 'a');
        begin.advance(2);
        assert_eq!(*begin.get(), 'c');
        assert_eq!(begin.index(), 2);
        assert_eq!(begin.distance_to(&end), 2);
        assert_eq!(end.distance_to(&begin), 0);
    }

    #[test]
    fn empty_slice_has_zero_distance() {
        let data: [u32; 0] = [];
        let (begin, end) = SliceCursor::range(&data);
        assert_eq!(begin.distance_to(&end), 0);
    }
}
