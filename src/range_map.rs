use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::cursor::PinnedWalk;
use crate::extent::{self, Extent};
use crate::raw::{AllocationMode, Located, Nearest, RawTree, Walk};
use crate::{Avl, Balance, Error};

type Tree<V, S, E> = RawTree<(), V, E, S, 1>;

/// Comparison locating the entry starting at `position`, or the slot around it.
fn at<E: Extent>(position: E) -> impl FnMut(&(), &[E; 1]) -> Ordering {
    move |_, start| position.cmp(&start[0])
}

/// Comparison for inserting at `position`: an entry starting there moves up.
fn before<E: Extent>(position: E) -> impl FnMut(&(), &[E; 1]) -> Ordering {
    move |_, start| if position <= start[0] { Ordering::Less } else { Ordering::Greater }
}

/// A sequence of contiguous ranges, each with a length and a value.
///
/// Ranges tile `0..extent` without gaps: a range's start is the sum of the lengths before
/// it. Inserting or removing a range shifts every later range, in O(log n), because each
/// node stores its start relative to its parent.
///
/// # Examples
///
/// ```
/// use offset_tree::RangeMap;
///
/// let mut lines: RangeMap<&str> = RangeMap::new();
/// lines.insert(0, 6, "hello\n");
/// lines.insert(6, 6, "world\n");
/// lines.insert(6, 3, "hi\n");
///
/// assert_eq!(lines.extent(), 15);
/// assert_eq!(lines.get_range(7), Some((6, 3, &"hi\n")));
/// assert_eq!(lines.get(9), Some(&"world\n"));
/// assert_eq!(lines.nearest_greater(9), Err(15));
/// ```
#[derive(Clone)]
pub struct RangeMap<V, S = Avl, E = usize> {
    raw: Tree<V, S, E>,
}

/// An in-order iterator over a [`RangeMap`], yielding start, length and value.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, V, S, E> {
    tree: &'a Tree<V, S, E>,
    walk: Walk<E, 1>,
    remaining: usize,
}

impl<V, S, E: Extent> RangeMap<V, S, E> {
    /// Creates an empty map that grows on demand.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: RawTree::new(AllocationMode::default()),
        }
    }

    /// Creates an empty map with `capacity` node slots reserved.
    ///
    /// With [`AllocationMode::FixedCapacity`] the map never holds more than `capacity` ranges.
    #[must_use]
    pub fn with_capacity(capacity: usize, mode: AllocationMode) -> Self {
        Self {
            raw: RawTree::with_capacity(capacity, mode),
        }
    }

    /// Returns the number of node slots, occupied or free.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Returns the allocation mode the map was created with.
    #[must_use]
    pub const fn allocation_mode(&self) -> AllocationMode {
        self.raw.mode()
    }

    /// Returns the number of ranges.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map holds no ranges.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the total length of all ranges.
    #[must_use]
    pub fn extent(&self) -> E {
        self.raw.extent()[0]
    }

    /// Removes every range, leaving an extent of zero.
    ///
    /// # Complexity
    ///
    /// O(n), without recursion.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the modification counter. It changes on every structural change, and on every
    /// lookup of a self-adjusting map.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.raw.version()
    }

    /// Returns an iterator over `(start, length, value)` in position order.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::{Avl, RangeMap};
    ///
    /// let map: RangeMap<char, Avl, u32> = [(2, 'a'), (3, 'b')].into_iter().collect();
    /// let ranges: Vec<_> = map.iter().collect();
    /// assert_eq!(ranges, [(0, 2, &'a'), (2, 3, &'b')]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1) amortized per range.
    pub fn iter(&self) -> Iter<'_, V, S, E> {
        Iter {
            tree: &self.raw,
            walk: Walk::first(&self.raw),
            remaining: self.raw.len(),
        }
    }

    /// Returns a cursor over the current tree shape, failing with [`Error::InvalidState`] once
    /// the map changes.
    #[must_use]
    pub fn fast_cursor(&self) -> FastCursor<V, S, E> {
        FastCursor::new(&self.raw, Walk::first(&self.raw))
    }

    /// Returns a fast cursor positioned at the first range starting at or after `start`.
    #[must_use]
    pub fn fast_cursor_from(&self, start: E) -> FastCursor<V, S, E> {
        FastCursor::new(&self.raw, Walk::seek(&self.raw, at(start)))
    }

    /// Returns a cursor that re-queries the map on every step and tolerates modifications.
    #[must_use]
    pub fn robust_cursor(&self) -> RobustCursor<E> {
        RobustCursor {
            position: Position::Start(E::ZERO),
        }
    }

    /// Returns a robust cursor positioned at the first range starting at or after `start`.
    #[must_use]
    pub fn robust_cursor_from(&self, start: E) -> RobustCursor<E> {
        RobustCursor {
            position: Position::Start(start),
        }
    }

    /// Height of the tree, counting the root as 1. Used by balance checks.
    #[doc(hidden)]
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    fn entry(&self, located: Located<E, 1>) -> (E, E, &V) {
        (located.start[0], located.weight[0], self.raw.value(located.handle))
    }
}

impl<V, S: Balance, E: Extent> RangeMap<V, S, E> {
    /// Inserts a range of `length` at `start`, shifting the range that started there (and
    /// every later one) up by `length`.
    ///
    /// # Errors
    ///
    /// - [`Error::ArgumentInvalid`] if `length` is zero or `start` is past the extent.
    /// - [`Error::KeyConflict`] if `start` falls strictly inside a range.
    /// - [`Error::Overflow`] if the extent or range count would not fit in `E`.
    /// - [`Error::CapacityExhausted`] if a fixed-capacity map is full.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn try_insert(&mut self, start: E, length: E, value: V) -> Result<(), Error> {
        let length = extent::positive(length)?;
        let total = self.extent();
        if start > total {
            return Err(Error::ArgumentInvalid("start is past the extent"));
        }
        if start < total && self.raw.find(at(start)).is_none() {
            return Err(Error::KeyConflict);
        }
        self.raw.insert(before(start), [length], (), value).map(|_| ())
    }

    /// Inserts a range at `start`, shifting the range that started there and every later
    /// one.
    ///
    /// # Panics
    ///
    /// Panics if [`try_insert`](Self::try_insert) fails.
    pub fn insert(&mut self, start: E, length: E, value: V) {
        if let Err(err) = self.try_insert(start, length, value) {
            panic!("`RangeMap::insert()` - {err}");
        }
    }

    /// Appends a range at the extent.
    ///
    /// # Errors
    ///
    /// As [`try_insert`](Self::try_insert).
    pub fn try_push(&mut self, length: E, value: V) -> Result<(), Error> {
        let length = extent::positive(length)?;
        let end = self.extent();
        self.raw.insert(before(end), [length], (), value).map(|_| ())
    }

    /// Appends a range of `length` at the extent.
    ///
    /// # Panics
    ///
    /// Panics if [`try_push`](Self::try_push) fails.
    pub fn push(&mut self, length: E, value: V) {
        if let Err(err) = self.try_push(length, value) {
            panic!("`RangeMap::push()` - {err}");
        }
    }

    /// Removes the range starting at `start`, shifting every later range down by its
    /// length. Returns its value.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no range starts at `start`.
    pub fn try_remove(&mut self, start: E) -> Result<V, Error> {
        self.raw.remove(at(start)).map(|removed| removed.value)
    }

    /// Removes the range starting at `start`, returning its value.
    ///
    /// # Panics
    ///
    /// Panics if no range starts at `start`.
    pub fn remove(&mut self, start: E) -> V {
        match self.try_remove(start) {
            Ok(value) => value,
            Err(err) => panic!("`RangeMap::remove()` - {err}"),
        }
    }

    /// Returns the value of the range starting at `start`.
    pub fn get(&mut self, start: E) -> Option<&V> {
        let located = self.raw.find(at(start))?;
        Some(self.raw.value(located.handle))
    }

    /// Returns a mutable reference to the value of the range starting at `start`.
    ///
    /// # Complexity
    ///
    /// O(log n); amortized for a splay map.
    pub fn get_mut(&mut self, start: E) -> Option<&mut V> {
        let located = self.raw.find(at(start))?;
        Some(self.raw.value_mut(located.handle))
    }

    /// Replaces the value of the range starting at `start`, returning the old one.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no range starts at `start`.
    pub fn try_set(&mut self, start: E, value: V) -> Result<V, Error> {
        let slot = self.get_mut(start).ok_or(Error::NotFound)?;
        Ok(core::mem::replace(slot, value))
    }

    /// Replaces the value of the range starting at `start`, returning the old one.
    ///
    /// # Panics
    ///
    /// Panics if no range starts at `start`.
    pub fn set(&mut self, start: E, value: V) -> V {
        match self.try_set(start, value) {
            Ok(old) => old,
            Err(err) => panic!("`RangeMap::set()` - {err}"),
        }
    }

    /// Returns the length of the range starting at `start`.
    pub fn length_at(&mut self, start: E) -> Option<E> {
        self.raw.find(at(start)).map(|located| located.weight[0])
    }

    /// Changes the length of the range starting at `start` by `delta`, shifting every later
    /// range. A range whose length drops to zero is removed. Returns the new length.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no range starts at `start`.
    /// - [`Error::ArgumentInvalid`] if the length would drop below zero.
    /// - [`Error::Overflow`] if the length or extent would not fit in `E`.
    pub fn try_adjust_length(&mut self, start: E, delta: isize) -> Result<E, Error> {
        let located = self.raw.find(at(start)).ok_or(Error::NotFound)?;
        let length = extent::adjust(located.weight[0], delta)?;
        if length == E::ZERO {
            self.raw.remove(at(start))?;
        } else {
            self.raw.set_weight(at(start), [length])?;
        }
        Ok(length)
    }

    /// Grows or shrinks the range starting at `start` by `delta`; a range shrunk to zero is
    /// removed.
    ///
    /// # Panics
    ///
    /// Panics if [`try_adjust_length`](Self::try_adjust_length) fails.
    pub fn adjust_length(&mut self, start: E, delta: isize) -> E {
        match self.try_adjust_length(start, delta) {
            Ok(length) => length,
            Err(err) => panic!("`RangeMap::adjust_length()` - {err}"),
        }
    }

    /// Returns the range covering `position` as `(start, length, value)`.
    pub fn get_range(&mut self, position: E) -> Option<(E, E, &V)> {
        if position >= self.extent() {
            return None;
        }
        self.nearest_less_or_equal(position)
    }

    /// Returns the last range starting strictly before `position`.
    pub fn nearest_less(&mut self, position: E) -> Option<(E, E, &V)> {
        let located = self.raw.nearest(at(position), Nearest::Less)?;
        Some(self.entry(located))
    }

    /// Returns the last range starting at or before `position`, i.e. the range covering it
    /// when `position` is inside the extent.
    pub fn nearest_less_or_equal(&mut self, position: E) -> Option<(E, E, &V)> {
        let located = self.raw.nearest(at(position), Nearest::LessOrEqual)?;
        Some(self.entry(located))
    }

    /// Returns the first range starting strictly after `position`.
    ///
    /// # Errors
    ///
    /// When no range starts after `position`, returns the extent, the position the next
    /// range would start at.
    pub fn nearest_greater(&mut self, position: E) -> Result<(E, E, &V), E> {
        match self.raw.nearest(at(position), Nearest::Greater) {
            Some(located) => Ok(self.entry(located)),
            None => Err(self.extent()),
        }
    }

    /// Returns the range starting at `position`, else the first one after it.
    ///
    /// # Errors
    ///
    /// When no range starts at or after `position`, returns the extent.
    pub fn nearest_greater_or_equal(&mut self, position: E) -> Result<(E, E, &V), E> {
        match self.raw.nearest(at(position), Nearest::GreaterOrEqual) {
            Some(located) => Ok(self.entry(located)),
            None => Err(self.extent()),
        }
    }

    /// Returns the cursor suited to the balancing strategy: robust for a self-adjusting map,
    /// fast otherwise.
    #[must_use]
    pub fn cursor(&self) -> Cursor<V, S, E> {
        if S::SELF_ADJUSTING {
            Cursor::Robust(self.robust_cursor())
        } else {
            Cursor::Fast(self.fast_cursor())
        }
    }

    /// Checks the tree invariants, panicking on any violation.
    #[doc(hidden)]
    pub fn validate(&self) {
        self.raw.validate(|_, _| true);
    }
}

impl<V, S, E: Extent> Default for RangeMap<V, S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug, S, E: Extent> fmt::Debug for RangeMap<V, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<V, S: Balance, E: Extent> FromIterator<(E, V)> for RangeMap<V, S, E> {
    /// Builds a map from `(length, value)` pairs laid end to end.
    ///
    /// # Panics
    ///
    /// Panics on a zero length or if the extent overflows `E`.
    fn from_iter<T: IntoIterator<Item = (E, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<V, S: Balance, E: Extent> Extend<(E, V)> for RangeMap<V, S, E> {
    fn extend<T: IntoIterator<Item = (E, V)>>(&mut self, iter: T) {
        for (length, value) in iter {
            self.push(length, value);
        }
    }
}

impl<'a, V, S, E: Extent> IntoIterator for &'a RangeMap<V, S, E> {
    type Item = (E, E, &'a V);
    type IntoIter = Iter<'a, V, S, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V, S, E: Extent> Iterator for Iter<'a, V, S, E> {
    type Item = (E, E, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let located = self.walk.next(tree)?;
        self.remaining -= 1;
        Some((located.start[0], located.weight[0], tree.value(located.handle)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, S, E: Extent> ExactSizeIterator for Iter<'_, V, S, E> {}

impl<V, S, E: Extent> FusedIterator for Iter<'_, V, S, E> {}

impl<V, S, E> fmt::Debug for Iter<'_, V, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish()
    }
}

/// A traversal-stack cursor over a [`RangeMap`].
///
/// Fails with [`Error::InvalidState`] once the map changes; for a splay map that includes
/// lookups.
pub struct FastCursor<V, S, E> {
    walk: PinnedWalk<E, 1>,
    _marker: PhantomData<fn() -> (V, S)>,
}

impl<V, S, E: Extent> FastCursor<V, S, E> {
    fn new(tree: &Tree<V, S, E>, walk: Walk<E, 1>) -> Self {
        Self {
            walk: PinnedWalk::new(walk, tree.version()),
            _marker: PhantomData,
        }
    }

    /// Returns the next range as `(start, length, value)`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if `map` changed since the cursor was created.
    pub fn next<'a>(&mut self, map: &'a RangeMap<V, S, E>) -> Result<Option<(E, E, &'a V)>, Error> {
        Ok(self.walk.next(&map.raw)?.map(|located| map.entry(located)))
    }
}

impl<V, S, E> fmt::Debug for FastCursor<V, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastCursor").finish_non_exhaustive()
    }
}

/// A re-querying cursor over a [`RangeMap`] that remembers the last start returned.
///
/// Ranges inserted or removed before the cursor shift later ranges, so a step after such
/// an edit continues from the remembered position, not from the remembered range.
#[derive(Clone, Copy, Debug)]
pub struct RobustCursor<E> {
    position: Position<E>,
}

#[derive(Clone, Copy, Debug)]
enum Position<E> {
    Start(E),
    After(E),
}

impl<E: Extent> RobustCursor<E> {
    /// Returns the next range at or after the cursor's position, or `None` past the last one.
    pub fn next<'a, V, S: Balance>(&mut self, map: &'a mut RangeMap<V, S, E>) -> Option<(E, E, &'a V)> {
        let located = match self.position {
            Position::Start(start) => map.raw.nearest(at(start), Nearest::GreaterOrEqual),
            Position::After(last) => map.raw.nearest(at(last), Nearest::Greater),
        }?;
        self.position = Position::After(located.start[0]);
        Some(map.entry(located))
    }
}

/// A cursor chosen by [`RangeMap::cursor`] to suit the balancing strategy.
#[derive(Debug)]
pub enum Cursor<V, S, E> {
    Fast(FastCursor<V, S, E>),
    Robust(RobustCursor<E>),
}

impl<V, S: Balance, E: Extent> Cursor<V, S, E> {
    /// Advances whichever cursor this is.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] from a fast cursor whose map changed.
    pub fn next<'a>(&mut self, map: &'a mut RangeMap<V, S, E>) -> Result<Option<(E, E, &'a V)>, Error> {
        match self {
            Cursor::Fast(cursor) => cursor.next(map),
            Cursor::Robust(cursor) => Ok(cursor.next(map)),
        }
    }
}
