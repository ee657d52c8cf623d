use core::fmt;
use core::marker::PhantomData;

use super::{KeyedMap, Tree, by_key};
use crate::cursor::PinnedWalk;
use crate::raw::{Nearest, Walk};
use crate::{Balance, Error};

/// A cursor over a [`KeyedMap`] that walks the tree shape it was created on.
///
/// Each step is O(1) amortized, but any structural change to the map (and, for a
/// self-adjusting map, any lookup) makes the next step fail with [`Error::InvalidState`].
/// The cursor does not borrow the map; it must only be used with the map that created it.
pub struct FastCursor<K, V, S> {
    walk: PinnedWalk<usize, 0>,
    _marker: PhantomData<fn() -> (K, V, S)>,
}

impl<K, V, S> FastCursor<K, V, S> {
    pub(super) fn new(tree: &Tree<K, V, S>, walk: Walk<usize, 0>) -> Self {
        Self {
            walk: PinnedWalk::new(walk, tree.version()),
            _marker: PhantomData,
        }
    }

    /// Returns the next entry, or `None` past the last one.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if `map` changed since the cursor was created.
    pub fn next<'a>(&mut self, map: &'a KeyedMap<K, V, S>) -> Result<Option<(&'a K, &'a V)>, Error> {
        let located = self.walk.next(&map.raw)?;
        Ok(located.map(|located| map.raw.entry(located.handle)))
    }
}

impl<K, V, S> Clone for FastCursor<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            walk: self.walk.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K, V, S> fmt::Debug for FastCursor<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastCursor").finish_non_exhaustive()
    }
}

/// A cursor over a [`KeyedMap`] that remembers the last key it returned.
///
/// Every step looks up the next greater key, so entries inserted or removed between steps
/// are simply seen or skipped. Each step costs O(log n).
#[derive(Clone, Debug)]
pub struct RobustCursor<K> {
    position: Position<K>,
}

#[derive(Clone, Debug)]
enum Position<K> {
    /// Nothing returned yet; start at the first key not less than this one, if any.
    Start(Option<K>),
    After(K),
}

impl<K> RobustCursor<K> {
    pub(super) fn new(start: Option<K>) -> Self {
        Self {
            position: Position::Start(start),
        }
    }
}

impl<K: Ord + Clone> RobustCursor<K> {
    /// Returns the entry after the last one returned, or `None` if there is none yet.
    /// A later call may still find entries inserted in the meantime.
    pub fn next<'a, V, S: Balance>(&mut self, map: &'a mut KeyedMap<K, V, S>) -> Option<(&'a K, &'a V)> {
        let located = match &self.position {
            Position::Start(None) => map.raw.first(),
            Position::Start(Some(start)) => map.raw.nearest(by_key(start), Nearest::GreaterOrEqual),
            Position::After(last) => map.raw.nearest(by_key(last), Nearest::Greater),
        }?;
        let (key, value) = map.raw.entry(located.handle);
        self.position = Position::After(key.clone());
        Some((key, value))
    }
}

/// A cursor chosen by [`KeyedMap::cursor`] to suit the balancing strategy.
#[derive(Debug)]
pub enum Cursor<K, V, S> {
    Fast(FastCursor<K, V, S>),
    Robust(RobustCursor<K>),
}

impl<K: Ord + Clone, V, S: Balance> Cursor<K, V, S> {
    /// Returns the next entry.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] from a fast cursor whose map changed.
    pub fn next<'a>(&mut self, map: &'a mut KeyedMap<K, V, S>) -> Result<Option<(&'a K, &'a V)>, Error> {
        match self {
            Cursor::Fast(cursor) => cursor.next(map),
            Cursor::Robust(cursor) => Ok(cursor.next(map)),
        }
    }
}
