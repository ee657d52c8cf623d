use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::cursor::PinnedWalk;
use crate::extent::{self, Extent};
use crate::raw::{AllocationMode, Located, Nearest, RawTree, Walk};
use crate::{Avl, Balance, Error};

type Tree<V, S, E> = RawTree<(), V, E, S, 2>;

/// One of the two coordinate sequences of a [`Range2Map`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    X,
    Y,
}

impl Side {
    const fn index(self) -> usize {
        match self {
            Side::X => 0,
            Side::Y => 1,
        }
    }
}

fn at<E: Extent>(position: E, side: Side) -> impl FnMut(&(), &[E; 2]) -> Ordering {
    move |_, start| position.cmp(&start[side.index()])
}

fn before<E: Extent>(position: E, side: Side) -> impl FnMut(&(), &[E; 2]) -> Ordering {
    move |_, start| if position <= start[side.index()] { Ordering::Less } else { Ordering::Greater }
}

/// A range of a [`Range2Map`] seen from both sides.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Range2<'a, V, E> {
    pub x_start: E,
    pub x_length: E,
    pub y_start: E,
    pub y_length: E,
    pub value: &'a V,
}

impl<'a, V, E: Extent> Range2<'a, V, E> {
    fn new(located: Located<E, 2>, value: &'a V) -> Self {
        Self {
            x_start: located.start[0],
            x_length: located.weight[0],
            y_start: located.start[1],
            y_length: located.weight[1],
            value,
        }
    }

    /// Start on `side`.
    #[must_use]
    pub const fn start(&self, side: Side) -> E {
        match side {
            Side::X => self.x_start,
            Side::Y => self.y_start,
        }
    }

    /// Length on `side`.
    #[must_use]
    pub const fn length(&self, side: Side) -> E {
        match side {
            Side::X => self.x_length,
            Side::Y => self.y_length,
        }
    }
}

/// Two parallel range sequences sharing one set of entries.
///
/// Every entry has an X length and a Y length, so it occupies a range on each side; the
/// two tilings advance together. This maps, for instance, byte offsets to character
/// offsets of the same text runs. Entries can be addressed by their start on either side.
///
/// # Examples
///
/// ```
/// use offset_tree::{Range2Map, Side};
///
/// // Runs of text: X counts bytes, Y counts characters.
/// let mut runs: Range2Map<&str> = Range2Map::new();
/// runs.insert(0, Side::X, 5, 5, "hello");
/// runs.insert(5, Side::X, 6, 2, "日本");
///
/// let run = runs.get_range(6, Side::X).unwrap();
/// assert_eq!((run.y_start, run.y_length, *run.value), (5, 2, "日本"));
/// assert_eq!(runs.extent(Side::Y), 7);
/// ```
#[derive(Clone)]
pub struct Range2Map<V, S = Avl, E = usize> {
    raw: Tree<V, S, E>,
}

/// An in-order iterator over a [`Range2Map`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, V, S, E> {
    tree: &'a Tree<V, S, E>,
    walk: Walk<E, 2>,
    remaining: usize,
}

impl<V, S, E: Extent> Range2Map<V, S, E> {
    /// Creates an empty map that grows on demand.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: RawTree::new(AllocationMode::default()),
        }
    }

    /// Creates an empty map with `capacity` node slots reserved.
    ///
    /// With [`AllocationMode::FixedCapacity`] the map never holds more than `capacity` entries.
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

    /// Returns the number of entries.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map holds no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the total length on `side`.
    #[must_use]
    pub fn extent(&self, side: Side) -> E {
        self.raw.extent()[side.index()]
    }

    /// Removes every entry, leaving both extents at zero.
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

    /// Returns an iterator over the entries in order, each seen from both sides.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::Range2Map;
    ///
    /// let mut map: Range2Map<char> = Range2Map::new();
    /// map.push(4, 1, 'a');
    /// map.push(2, 2, 'b');
    /// let y_starts: Vec<usize> = map.iter().map(|range| range.y_start).collect();
    /// assert_eq!(y_starts, [0, 1]);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1) amortized per entry.
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

    /// Returns a fast cursor positioned at the first entry starting at or after `start` on
    /// `side`.
    #[must_use]
    pub fn fast_cursor_from(&self, start: E, side: Side) -> FastCursor<V, S, E> {
        FastCursor::new(&self.raw, Walk::seek(&self.raw, at(start, side)))
    }

    /// Returns a cursor that re-queries the map on every step and tolerates modifications.
    #[must_use]
    pub fn robust_cursor(&self) -> RobustCursor<E> {
        self.robust_cursor_from(E::ZERO, Side::X)
    }

    /// Returns a robust cursor positioned at the first entry starting at or after `start` on
    /// `side`.
    #[must_use]
    pub fn robust_cursor_from(&self, start: E, side: Side) -> RobustCursor<E> {
        RobustCursor { start, side, started: false }
    }

    /// Height of the tree, counting the root as 1. Used by balance checks.
    #[doc(hidden)]
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    fn range(&self, located: Located<E, 2>) -> Range2<'_, V, E> {
        Range2::new(located, self.raw.value(located.handle))
    }
}

impl<V, S: Balance, E: Extent> Range2Map<V, S, E> {
    /// Inserts an entry at `start` on `side`, shifting the entry that started there and
    /// every later one on both sides.
    ///
    /// # Errors
    ///
    /// - [`Error::ArgumentInvalid`] if either length is zero or `start` is past the extent
    ///   on `side`.
    /// - [`Error::KeyConflict`] if `start` falls strictly inside an entry on `side`.
    /// - [`Error::Overflow`] if either extent or the entry count would not fit in `E`.
    /// - [`Error::CapacityExhausted`] if a fixed-capacity map is full.
    pub fn try_insert(&mut self, start: E, side: Side, x_length: E, y_length: E, value: V) -> Result<(), Error> {
        let lengths = [extent::positive(x_length)?, extent::positive(y_length)?];
        let total = self.extent(side);
        if start > total {
            return Err(Error::ArgumentInvalid("start is past the extent"));
        }
        if start < total && self.raw.find(at(start, side)).is_none() {
            return Err(Error::KeyConflict);
        }
        self.raw.insert(before(start, side), lengths, (), value).map(|_| ())
    }

    /// Inserts an entry at `start` on `side`, shifting later entries on both sides.
    ///
    /// # Panics
    ///
    /// Panics if [`try_insert`](Self::try_insert) fails.
    pub fn insert(&mut self, start: E, side: Side, x_length: E, y_length: E, value: V) {
        if let Err(err) = self.try_insert(start, side, x_length, y_length, value) {
            panic!("`Range2Map::insert()` - {err}");
        }
    }

    /// Appends an entry after the last one.
    ///
    /// # Errors
    ///
    /// As [`try_insert`](Self::try_insert).
    pub fn try_push(&mut self, x_length: E, y_length: E, value: V) -> Result<(), Error> {
        let end = self.extent(Side::X);
        self.try_insert(end, Side::X, x_length, y_length, value)
    }

    /// Appends an entry after the last one.
    ///
    /// # Panics
    ///
    /// Panics if [`try_push`](Self::try_push) fails.
    pub fn push(&mut self, x_length: E, y_length: E, value: V) {
        if let Err(err) = self.try_push(x_length, y_length, value) {
            panic!("`Range2Map::push()` - {err}");
        }
    }

    /// Removes the entry starting at `start` on `side`, returning its value.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no entry starts there.
    pub fn try_remove(&mut self, start: E, side: Side) -> Result<V, Error> {
        self.raw.remove(at(start, side)).map(|removed| removed.value)
    }

    /// Removes the entry starting at `start` on `side`, returning its value.
    ///
    /// # Panics
    ///
    /// Panics if no entry starts at `start` on `side`.
    pub fn remove(&mut self, start: E, side: Side) -> V {
        match self.try_remove(start, side) {
            Ok(value) => value,
            Err(err) => panic!("`Range2Map::remove()` - {err}"),
        }
    }

    /// Returns the value of the entry starting at `start` on `side`.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::{Range2Map, Side};
    ///
    /// let mut map: Range2Map<&str> = Range2Map::new();
    /// map.push(3, 1, "abc");
    /// map.push(2, 2, "de");
    /// assert_eq!(map.get(3, Side::X), Some(&"de"));
    /// assert_eq!(map.get(1, Side::Y), Some(&"de"));
    /// assert_eq!(map.get(1, Side::X), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n); amortized for a splay map.
    pub fn get(&mut self, start: E, side: Side) -> Option<&V> {
        let located = self.raw.find(at(start, side))?;
        Some(self.raw.value(located.handle))
    }

    /// Returns a mutable reference to the value of the entry starting at `start` on `side`.
    pub fn get_mut(&mut self, start: E, side: Side) -> Option<&mut V> {
        let located = self.raw.find(at(start, side))?;
        Some(self.raw.value_mut(located.handle))
    }

    /// Replaces the value of the entry starting at `start` on `side`, returning the old
    /// one.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no entry starts at `start` on `side`.
    pub fn try_set(&mut self, start: E, side: Side, value: V) -> Result<V, Error> {
        let slot = self.get_mut(start, side).ok_or(Error::NotFound)?;
        Ok(core::mem::replace(slot, value))
    }

    /// Replaces the value of the entry starting at `start` on `side`, returning the old
    /// one.
    ///
    /// # Panics
    ///
    /// Panics if no entry starts at `start` on `side`.
    pub fn set(&mut self, start: E, side: Side, value: V) -> V {
        match self.try_set(start, side, value) {
            Ok(old) => old,
            Err(err) => panic!("`Range2Map::set()` - {err}"),
        }
    }

    /// Returns the entry starting at `start` on `side`.
    pub fn range_at(&mut self, start: E, side: Side) -> Option<Range2<'_, V, E>> {
        let located = self.raw.find(at(start, side))?;
        Some(self.range(located))
    }

    /// Changes both lengths of the entry starting at `start` on `side`. An entry whose
    /// lengths both drop to zero is removed.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no entry starts there.
    /// - [`Error::ArgumentInvalid`] if a length would drop below zero, or exactly one of them
    ///   would reach zero.
    /// - [`Error::Overflow`] if a length or extent would not fit in `E`.
    pub fn try_adjust_length(&mut self, start: E, side: Side, x_delta: isize, y_delta: isize) -> Result<(), Error> {
        let located = self.raw.find(at(start, side)).ok_or(Error::NotFound)?;
        let lengths = [extent::adjust(located.weight[0], x_delta)?, extent::adjust(located.weight[1], y_delta)?];
        match (lengths[0] == E::ZERO, lengths[1] == E::ZERO) {
            (true, true) => self.raw.remove(at(start, side)).map(|_| ()),
            (false, false) => self.raw.set_weight(at(start, side), lengths).map(|_| ()),
            _ => Err(Error::ArgumentInvalid("only one side of the entry would become empty")),
        }
    }

    /// Changes both lengths of the entry starting at `start` on `side`.
    ///
    /// # Panics
    ///
    /// Panics if [`try_adjust_length`](Self::try_adjust_length) fails.
    pub fn adjust_length(&mut self, start: E, side: Side, x_delta: isize, y_delta: isize) {
        if let Err(err) = self.try_adjust_length(start, side, x_delta, y_delta) {
            panic!("`Range2Map::adjust_length()` - {err}");
        }
    }

    /// Returns the entry covering `position` on `side`.
    pub fn get_range(&mut self, position: E, side: Side) -> Option<Range2<'_, V, E>> {
        if position >= self.extent(side) {
            return None;
        }
        self.nearest_less_or_equal(position, side)
    }

    /// Returns the last entry starting strictly before `position` on `side`.
    pub fn nearest_less(&mut self, position: E, side: Side) -> Option<Range2<'_, V, E>> {
        let located = self.raw.nearest(at(position, side), Nearest::Less)?;
        Some(self.range(located))
    }

    /// Returns the last entry starting at or before `position` on `side`.
    pub fn nearest_less_or_equal(&mut self, position: E, side: Side) -> Option<Range2<'_, V, E>> {
        let located = self.raw.nearest(at(position, side), Nearest::LessOrEqual)?;
        Some(self.range(located))
    }

    /// Returns the first entry starting strictly after `position` on `side`.
    ///
    /// # Errors
    ///
    /// When there is none, returns the extent on `side`.
    pub fn nearest_greater(&mut self, position: E, side: Side) -> Result<Range2<'_, V, E>, E> {
        match self.raw.nearest(at(position, side), Nearest::Greater) {
            Some(located) => Ok(self.range(located)),
            None => Err(self.extent(side)),
        }
    }

    /// Returns the first entry starting at or after `position` on `side`.
    ///
    /// # Errors
    ///
    /// When no entry starts at or after `position` on `side`, returns the extent on `side`.
    pub fn nearest_greater_or_equal(&mut self, position: E, side: Side) -> Result<Range2<'_, V, E>, E> {
        match self.raw.nearest(at(position, side), Nearest::GreaterOrEqual) {
            Some(located) => Ok(self.range(located)),
            None => Err(self.extent(side)),
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

    /// Checks the tree invariants on both sides, panicking on any violation.
    #[doc(hidden)]
    pub fn validate(&self) {
        self.raw.validate(|_, _| true);
    }
}

impl<V, S, E: Extent> Default for Range2Map<V, S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug, S, E: Extent> fmt::Debug for Range2Map<V, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, V, S, E: Extent> IntoIterator for &'a Range2Map<V, S, E> {
    type Item = Range2<'a, V, E>;
    type IntoIter = Iter<'a, V, S, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V, S, E: Extent> Iterator for Iter<'a, V, S, E> {
    type Item = Range2<'a, V, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let located = self.walk.next(tree)?;
        self.remaining -= 1;
        Some(Range2::new(located, tree.value(located.handle)))
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

/// A traversal-stack cursor over a [`Range2Map`].
pub struct FastCursor<V, S, E> {
    walk: PinnedWalk<E, 2>,
    _marker: PhantomData<fn() -> (V, S)>,
}

impl<V, S, E: Extent> FastCursor<V, S, E> {
    fn new(tree: &Tree<V, S, E>, walk: Walk<E, 2>) -> Self {
        Self {
            walk: PinnedWalk::new(walk, tree.version()),
            _marker: PhantomData,
        }
    }

    /// Returns the next entry in order.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if `map` changed since the cursor was created.
    pub fn next<'a>(&mut self, map: &'a Range2Map<V, S, E>) -> Result<Option<Range2<'a, V, E>>, Error> {
        Ok(self.walk.next(&map.raw)?.map(|located| map.range(located)))
    }
}

impl<V, S, E> fmt::Debug for FastCursor<V, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastCursor").finish_non_exhaustive()
    }
}

/// A re-querying cursor over a [`Range2Map`] that remembers the last start it returned on
/// one side.
#[derive(Clone, Copy, Debug)]
pub struct RobustCursor<E> {
    start: E,
    side: Side,
    started: bool,
}

impl<E: Extent> RobustCursor<E> {
    /// Returns the next entry at or after the cursor's position on its side, or `None` past
    /// the last one.
    pub fn next<'a, V, S: Balance>(&mut self, map: &'a mut Range2Map<V, S, E>) -> Option<Range2<'a, V, E>> {
        let nearest = if self.started { Nearest::Greater } else { Nearest::GreaterOrEqual };
        let located = map.raw.nearest(at(self.start, self.side), nearest)?;
        self.start = located.start[self.side.index()];
        self.started = true;
        Some(map.range(located))
    }
}

/// A cursor chosen by [`Range2Map::cursor`] to suit the balancing strategy.
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
    pub fn next<'a>(&mut self, map: &'a mut Range2Map<V, S, E>) -> Result<Option<Range2<'a, V, E>>, Error> {
        match self {
            Cursor::Fast(cursor) => cursor.next(map),
            Cursor::Robust(cursor) => Ok(cursor.next(map)),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::Splay;

    fn sample<S: Balance>() -> Range2Map<char, S, u32> {
        let mut map = Range2Map::new();
        map.push(2, 5, 'a');
        map.push(3, 1, 'b');
        map.push(1, 4, 'c');
        map
    }

    fn starts<S>(map: &Range2Map<char, S, u32>) -> Vec<(u32, u32, char)> {
        map.iter().map(|range| (range.x_start, range.y_start, *range.value)).collect()
    }

    #[test]
    fn both_sides_advance_together() {
        fn check<S: Balance>() {
            let mut map = sample::<S>();
            assert_eq!(starts(&map), [(0, 0, 'a'), (2, 5, 'b'), (5, 6, 'c')]);
            assert_eq!(map.extent(Side::X), 6);
            assert_eq!(map.extent(Side::Y), 10);

            assert_eq!(map.get_range(3, Side::X).map(|r| *r.value), Some('b'));
            assert_eq!(map.get_range(3, Side::Y).map(|r| *r.value), Some('a'));
            assert_eq!(map.get(6, Side::Y), Some(&'c'));
            assert_eq!(map.get(6, Side::X), None);
            map.validate();
        }
        check::<Avl>();
        check::<Splay>();
    }

    #[test]
    fn insert_by_either_side() {
        let mut map = sample::<Avl>();
        map.insert(5, Side::Y, 4, 4, 'x');
        assert_eq!(starts(&map), [(0, 0, 'a'), (2, 5, 'x'), (6, 9, 'b'), (9, 10, 'c')]);
        assert_eq!(map.try_insert(1, Side::X, 1, 1, 'y'), Err(Error::KeyConflict));
        assert!(matches!(map.try_insert(0, Side::X, 1, 0, 'y'), Err(Error::ArgumentInvalid(_))));
        assert_eq!(map.remove(9, Side::Y), 'b');
        assert_eq!(starts(&map), [(0, 0, 'a'), (2, 5, 'x'), (6, 9, 'c')]);
        map.validate();
    }

    #[test]
    fn adjust_length_needs_both_sides_to_empty() {
        let mut map = sample::<Splay>();
        map.adjust_length(2, Side::X, 1, 2);
        assert_eq!(starts(&map), [(0, 0, 'a'), (2, 5, 'b'), (6, 8, 'c')]);
        assert!(matches!(map.try_adjust_length(2, Side::X, -4, 0), Err(Error::ArgumentInvalid(_))));
        map.adjust_length(2, Side::X, -4, -3);
        assert_eq!(starts(&map), [(0, 0, 'a'), (2, 5, 'c')]);
        map.validate();
    }

    #[test]
    fn nearest_greater_reports_extent_of_the_side() {
        let mut map = sample::<Avl>();
        assert_eq!(map.nearest_greater(5, Side::X).err(), Some(6));
        assert_eq!(map.nearest_greater(6, Side::Y).err(), Some(10));
        assert_eq!(map.nearest_greater(0, Side::Y).map(|r| *r.value), Ok('b'));
        assert_eq!(map.nearest_less(2, Side::X).map(|r| r.length(Side::Y)), Some(5));
    }

    #[test]
    fn cursors_walk_in_order() {
        let mut map = sample::<Splay>();
        let mut cursor = map.cursor();
        let mut seen = Vec::new();
        while let Some(range) = cursor.next(&mut map).unwrap() {
            seen.push(*range.value);
        }
        assert_eq!(seen, ['a', 'b', 'c']);

        let mut fast = map.fast_cursor_from(1, Side::Y);
        assert_eq!(fast.next(&map).unwrap().map(|r| *r.value), Some('b'));
    }
}
