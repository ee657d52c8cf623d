use core::fmt;
use core::marker::PhantomData;

use super::{HugeList, Tree};
use crate::cursor::PinnedWalk;
use crate::raw::{Handle, Walk};
use crate::{Balance, Error};

/// A cursor over a [`HugeList`] that walks the segment tree it was created on.
///
/// Steps within a segment are plain slice reads. Any change to the list, and for a
/// self-adjusting list any read, makes the next step fail with [`Error::InvalidState`].
pub struct FastCursor<T, S> {
    walk: PinnedWalk<usize, 1>,
    /// Current segment and the offset of the next element in it.
    segment: Option<(Handle, usize)>,
    _marker: PhantomData<fn() -> (T, S)>,
}

impl<T, S> FastCursor<T, S> {
    pub(super) fn new(tree: &Tree<T, S>, walk: Walk<usize, 1>, segment: Option<(Handle, usize)>) -> Self {
        Self {
            walk: PinnedWalk::new(walk, tree.version()),
            segment,
            _marker: PhantomData,
        }
    }

    /// Returns the next element, or `None` past the end.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if `list` changed since the cursor was created.
    pub fn next<'a>(&mut self, list: &'a HugeList<T, S>) -> Result<Option<&'a T>, Error> {
        self.walk.check(&list.raw)?;
        loop {
            if let Some((handle, offset)) = self.segment {
                if let Some(item) = list.raw.value(handle).get(offset) {
                    self.segment = Some((handle, offset + 1));
                    return Ok(Some(item));
                }
            }
            match self.walk.next(&list.raw)? {
                Some(located) => self.segment = Some((located.handle, 0)),
                None => {
                    self.segment = None;
                    return Ok(None);
                }
            }
        }
    }
}

impl<T, S> Clone for FastCursor<T, S> {
    fn clone(&self) -> Self {
        Self {
            walk: self.walk.clone(),
            segment: self.segment,
            _marker: PhantomData,
        }
    }
}

impl<T, S> fmt::Debug for FastCursor<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastCursor").finish_non_exhaustive()
    }
}

/// A cursor over a [`HugeList`] that remembers the index of the next element.
///
/// Elements inserted or removed before that index between steps shift what it reads next.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RobustCursor {
    index: usize,
}

impl RobustCursor {
    pub(super) const fn new(index: usize) -> Self {
        Self { index }
    }

    /// Index of the element the next step returns.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the element at the remembered index and advances past it, or `None` once the
    /// index reaches the end of `list`.
    pub fn next<'a, T, S: Balance>(&mut self, list: &'a mut HugeList<T, S>) -> Option<&'a T> {
        let item = list.get(self.index)?;
        self.index += 1;
        Some(item)
    }
}

/// A cursor chosen by [`HugeList::cursor`] to suit the balancing strategy.
#[derive(Debug)]
pub enum Cursor<T, S> {
    Fast(FastCursor<T, S>),
    Robust(RobustCursor),
}

impl<T, S: Balance> Cursor<T, S> {
    /// Advances whichever cursor this is.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] from a fast cursor whose list changed.
    pub fn next<'a>(&mut self, list: &'a mut HugeList<T, S>) -> Result<Option<&'a T>, Error> {
        match self {
            Cursor::Fast(cursor) => cursor.next(list),
            Cursor::Robust(cursor) => Ok(cursor.next(list)),
        }
    }
}
