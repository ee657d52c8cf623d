use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use crate::cursor::PinnedWalk;
use crate::extent::{self, Extent};
use crate::raw::{AllocationMode, Nearest, RawTree, Walk};
use crate::{Avl, Balance, Error};

type Tree<K, V, S, E> = RawTree<K, V, E, S, 1>;

fn by_key<K, Q, E>(key: &Q) -> impl FnMut(&K, &[E; 1]) -> Ordering + '_
where
    K: Borrow<Q>,
    Q: ?Sized + Ord,
{
    move |entry, _| key.cmp(entry.borrow())
}

/// Comparison locating the entry whose rank range covers `rank`.
fn by_rank<K, E: Extent>(rank: E) -> impl FnMut(&K, &[E; 1]) -> Ordering {
    move |_, start| rank.cmp(&start[0])
}

/// An ordered multimap: every key carries a count, and the counts lay the keys out along
/// a rank axis.
///
/// A key with count `c` occupies ranks `rank_of(key) .. rank_of(key) + c`, so the map can
/// answer "which key holds the r-th occurrence" and "how many occurrences precede this
/// key" in O(log n). The total of all counts is the [`extent`](Self::extent) and must fit
/// in `E`.
///
/// # Examples
///
/// ```
/// use offset_tree::MultiRankMap;
///
/// let mut words: MultiRankMap<&str, ()> = MultiRankMap::new();
/// words.insert("pear", (), 2);
/// words.insert("apple", (), 3);
///
/// assert_eq!(words.extent(), 5);
/// assert_eq!(words.rank_of("pear"), Some(3));
/// assert_eq!(words.get_by_rank(4).map(|(key, _, _)| *key), Some("pear"));
///
/// words.adjust_count("apple", -3);
/// assert_eq!(words.rank_of("pear"), Some(0));
/// ```
#[derive(Clone)]
pub struct MultiRankMap<K, V, S = Avl, E = usize> {
    raw: Tree<K, V, S, E>,
}

/// An in-order iterator over a [`MultiRankMap`], yielding key, value and count.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V, S, E> {
    tree: &'a Tree<K, V, S, E>,
    walk: Walk<E, 1>,
    remaining: usize,
}

impl<K, V, S, E: Extent> MultiRankMap<K, V, S, E> {
    /// Creates an empty map that grows on demand.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: RawTree::new(AllocationMode::default()),
        }
    }

    /// Creates an empty map with `capacity` node slots reserved.
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

    /// Returns the number of distinct keys.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map holds no keys.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Returns the sum of all counts.
    #[must_use]
    pub fn extent(&self) -> E {
        self.raw.extent()[0]
    }

    /// Removes every key.
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

    /// Returns an iterator over `(key, value, count)` in key order.
    ///
    /// # Complexity
    ///
    /// O(1) amortized per key.
    pub fn iter(&self) -> Iter<'_, K, V, S, E> {
        Iter {
            tree: &self.raw,
            walk: Walk::first(&self.raw),
            remaining: self.raw.len(),
        }
    }

    /// Returns a cursor over the current tree shape, failing with [`Error::InvalidState`] once
    /// the map changes.
    #[must_use]
    pub fn fast_cursor(&self) -> FastCursor<K, V, S, E> {
        FastCursor {
            walk: PinnedWalk::new(Walk::first(&self.raw), self.raw.version()),
            _marker: PhantomData,
        }
    }

    /// Returns a cursor that re-queries the map on every step and tolerates modifications.
    #[must_use]
    pub fn robust_cursor(&self) -> RobustCursor<K> {
        RobustCursor {
            position: Position::Start(None),
        }
    }

    /// Returns a robust cursor positioned at the first key not less than `start`.
    #[must_use]
    pub fn robust_cursor_from(&self, start: K) -> RobustCursor<K> {
        RobustCursor {
            position: Position::Start(Some(start)),
        }
    }

    /// Height of the tree, counting the root as 1. Used by balance checks.
    #[doc(hidden)]
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }
}

impl<K: Ord, V, S: Balance, E: Extent> MultiRankMap<K, V, S, E> {
    /// Inserts `key` with `count` occurrences.
    ///
    /// # Errors
    ///
    /// - [`Error::ArgumentInvalid`] if `count` is zero.
    /// - [`Error::KeyConflict`] if `key` is already present.
    /// - [`Error::Overflow`] if the extent or key count would not fit in `E`.
    /// - [`Error::CapacityExhausted`] if a fixed-capacity map is full.
    pub fn try_insert(&mut self, key: K, value: V, count: E) -> Result<(), Error> {
        let count = extent::positive(count)?;
        self.raw.insert_by(|new, entry, _| new.cmp(entry), [count], key, value).map(|_| ())
    }

    /// Inserts `key` with `count` occurrences.
    ///
    /// # Panics
    ///
    /// Panics if [`try_insert`](Self::try_insert) fails.
    pub fn insert(&mut self, key: K, value: V, count: E) {
        if let Err(err) = self.try_insert(key, value, count) {
            panic!("`MultiRankMap::insert()` - {err}");
        }
    }

    /// Removes `key` and all its occurrences, returning its value.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `key` is absent.
    pub fn try_remove<Q>(&mut self, key: &Q) -> Result<V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(by_key(key)).map(|removed| removed.value)
    }

    /// Removes `key`, returning the stored key, its value and the count it held.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V, E)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let removed = self.raw.remove(by_key(key)).ok()?;
        Some((removed.key, removed.value, removed.weight[0]))
    }

    /// Removes `key` and all its occurrences, returning its value.
    ///
    /// # Panics
    ///
    /// Panics if `key` is absent.
    pub fn remove<Q>(&mut self, key: &Q) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.try_remove(key) {
            Ok(value) => value,
            Err(err) => panic!("`MultiRankMap::remove()` - {err}"),
        }
    }

    /// Returns the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::MultiRankMap;
    ///
    /// let mut map: MultiRankMap<&str, u8> = MultiRankMap::new();
    /// map.insert("x", 7, 3);
    /// assert_eq!(map.get("x"), Some(&7));
    /// assert_eq!(map.count_of("x"), 3);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n); amortized for a splay map.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let located = self.raw.find(by_key(key))?;
        Some(self.raw.value(located.handle))
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let located = self.raw.find(by_key(key))?;
        Some(self.raw.value_mut(located.handle))
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.find(by_key(key)).is_some()
    }

    /// Replaces the value under `key`, returning the old one.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `key` is absent.
    pub fn try_set<Q>(&mut self, key: &Q, value: V) -> Result<V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let slot = self.get_mut(key).ok_or(Error::NotFound)?;
        Ok(core::mem::replace(slot, value))
    }

    /// Replaces the value under `key`, returning the old one.
    ///
    /// # Panics
    ///
    /// Panics if `key` is absent.
    pub fn set<Q>(&mut self, key: &Q, value: V) -> V
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        match self.try_set(key, value) {
            Ok(old) => old,
            Err(err) => panic!("`MultiRankMap::set()` - {err}"),
        }
    }

    /// Returns the number of occurrences of `key`, zero if absent.
    pub fn count_of<Q>(&mut self, key: &Q) -> E
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.find(by_key(key)).map_or(E::ZERO, |located| located.weight[0])
    }

    /// Returns the rank of the first occurrence of `key`: the total count of all smaller
    /// keys.
    pub fn rank_of<Q>(&mut self, key: &Q) -> Option<E>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.find(by_key(key)).map(|located| located.start[0])
    }

    /// Returns the key whose occurrences cover `rank`, with its value and count.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn get_by_rank(&mut self, rank: E) -> Option<(&K, &V, E)> {
        if rank >= self.extent() {
            return None;
        }
        let located = self.raw.nearest(by_rank(rank), Nearest::LessOrEqual)?;
        let (key, value) = self.raw.entry(located.handle);
        Some((key, value, located.weight[0]))
    }

    /// Changes the count of `key` by `delta` and returns the new count.
    ///
    /// An absent key is inserted with `V::default()` when `delta` is positive; a key whose
    /// count drops to zero is removed.
    ///
    /// # Errors
    ///
    /// - [`Error::ArgumentInvalid`] if the count would drop below zero.
    /// - [`Error::Overflow`] if the count or extent would not fit in `E`.
    /// - [`Error::CapacityExhausted`] if a new key does not fit a fixed-capacity map.
    pub fn try_adjust_count(&mut self, key: K, delta: isize) -> Result<E, Error>
    where
        V: Default,
    {
        let Some(located) = self.raw.find(by_key(&key)) else {
            let count = extent::adjust(E::ZERO, delta)?;
            if count != E::ZERO {
                self.try_insert(key, V::default(), count)?;
            }
            return Ok(count);
        };

        let count = extent::adjust(located.weight[0], delta)?;
        if count == E::ZERO {
            self.raw.remove(by_key(&key))?;
        } else {
            self.raw.set_weight(by_key(&key), [count])?;
        }
        Ok(count)
    }

    /// Adds `delta` occurrences of `key`, returning the new count.
    ///
    /// # Panics
    ///
    /// Panics if [`try_adjust_count`](Self::try_adjust_count) fails.
    pub fn adjust_count(&mut self, key: K, delta: isize) -> E
    where
        V: Default,
    {
        match self.try_adjust_count(key, delta) {
            Ok(count) => count,
            Err(err) => panic!("`MultiRankMap::adjust_count()` - {err}"),
        }
    }

    fn nearest_entry<Q>(&mut self, key: &Q, nearest: Nearest) -> Option<(&K, &V, E)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let located = self.raw.nearest(by_key(key), nearest)?;
        let (key, value) = self.raw.entry(located.handle);
        Some((key, value, located.weight[0]))
    }

    /// Returns the entry with the largest key strictly less than `key`, with its count.
    pub fn nearest_less<Q>(&mut self, key: &Q) -> Option<(&K, &V, E)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.nearest_entry(key, Nearest::Less)
    }

    /// Returns the entry under `key`, else the one with the largest key less than it.
    pub fn nearest_less_or_equal<Q>(&mut self, key: &Q) -> Option<(&K, &V, E)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.nearest_entry(key, Nearest::LessOrEqual)
    }

    /// Returns the entry with the smallest key strictly greater than `key`, with its count.
    pub fn nearest_greater<Q>(&mut self, key: &Q) -> Option<(&K, &V, E)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.nearest_entry(key, Nearest::Greater)
    }

    /// Returns the entry under `key`, else the one with the smallest key greater than it.
    pub fn nearest_greater_or_equal<Q>(&mut self, key: &Q) -> Option<(&K, &V, E)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.nearest_entry(key, Nearest::GreaterOrEqual)
    }

    /// Returns the cursor suited to the balancing strategy: robust for a self-adjusting map,
    /// fast otherwise.
    #[must_use]
    pub fn cursor(&self) -> Cursor<K, V, S, E> {
        if S::SELF_ADJUSTING {
            Cursor::Robust(self.robust_cursor())
        } else {
            Cursor::Fast(self.fast_cursor())
        }
    }

    /// Returns a fast cursor positioned at the first key not less than `start`.
    #[must_use]
    pub fn fast_cursor_from<Q>(&self, start: &Q) -> FastCursor<K, V, S, E>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        FastCursor {
            walk: PinnedWalk::new(Walk::seek(&self.raw, by_key(start)), self.raw.version()),
            _marker: PhantomData,
        }
    }

    /// Checks key order and the tree invariants, panicking on any violation.
    #[doc(hidden)]
    pub fn validate(&self) {
        self.raw.validate(|a, b| a < b);
    }
}

/// Collects `(key, value, count)` triples; a repeated key adds to the count and keeps the
/// first value.
///
/// # Panics
///
/// Panics if a count is zero or the extent would overflow `E`.
impl<K: Ord, V, S: Balance, E: Extent> FromIterator<(K, V, E)> for MultiRankMap<K, V, S, E> {
    fn from_iter<I: IntoIterator<Item = (K, V, E)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V, S: Balance, E: Extent> Extend<(K, V, E)> for MultiRankMap<K, V, S, E> {
    fn extend<I: IntoIterator<Item = (K, V, E)>>(&mut self, iter: I) {
        for (key, value, count) in iter {
            let result = match self.count_of(&key) {
                current if current == E::ZERO => self.try_insert(key, value, count),
                current => current
                    .checked_add(count)
                    .ok_or(Error::Overflow)
                    .and_then(|total| self.raw.set_weight(by_key(&key), [total]).map(|_| ())),
            };
            if let Err(err) = result {
                panic!("`MultiRankMap::extend()` - {err}");
            }
        }
    }
}

impl<'a, K, V, S, E: Extent> IntoIterator for &'a MultiRankMap<K, V, S, E> {
    type Item = (&'a K, &'a V, E);
    type IntoIter = Iter<'a, K, V, S, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S, E: Extent> Default for MultiRankMap<K, V, S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S, E: Extent> fmt::Debug for MultiRankMap<K, V, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S, E: Extent> Iterator for Iter<'a, K, V, S, E> {
    type Item = (&'a K, &'a V, E);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let located = self.walk.next(tree)?;
        self.remaining -= 1;
        let (key, value) = tree.entry(located.handle);
        Some((key, value, located.weight[0]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S, E: Extent> ExactSizeIterator for Iter<'_, K, V, S, E> {}

impl<K, V, S, E: Extent> FusedIterator for Iter<'_, K, V, S, E> {}

impl<K, V, S, E: Extent> fmt::Debug for Iter<'_, K, V, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish()
    }
}

/// A traversal-stack cursor over a [`MultiRankMap`]; see
/// [`keyed_map::FastCursor`](crate::keyed_map::FastCursor).
pub struct FastCursor<K, V, S, E> {
    walk: PinnedWalk<E, 1>,
    _marker: PhantomData<fn() -> (K, V, S)>,
}

impl<K, V, S, E: Extent> FastCursor<K, V, S, E> {
    /// Returns the next key with its value and count.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if `map` changed since the cursor was created.
    pub fn next<'a>(&mut self, map: &'a MultiRankMap<K, V, S, E>) -> Result<Option<(&'a K, &'a V, E)>, Error> {
        let Some(located) = self.walk.next(&map.raw)? else {
            return Ok(None);
        };
        let (key, value) = map.raw.entry(located.handle);
        Ok(Some((key, value, located.weight[0])))
    }
}

impl<K, V, S, E> fmt::Debug for FastCursor<K, V, S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FastCursor").finish_non_exhaustive()
    }
}

/// A re-querying cursor over a [`MultiRankMap`] that remembers the last key returned.
#[derive(Clone, Debug)]
pub struct RobustCursor<K> {
    position: Position<K>,
}

#[derive(Clone, Debug)]
enum Position<K> {
    Start(Option<K>),
    After(K),
}

impl<K: Ord + Clone> RobustCursor<K> {
    /// Returns the entry after the last key returned, or `None` past the largest key.
    pub fn next<'a, V, S: Balance, E: Extent>(&mut self, map: &'a mut MultiRankMap<K, V, S, E>) -> Option<(&'a K, &'a V, E)> {
        let located = match &self.position {
            Position::Start(None) => map.raw.first(),
            Position::Start(Some(start)) => map.raw.nearest(by_key(start), Nearest::GreaterOrEqual),
            Position::After(last) => map.raw.nearest(by_key(last), Nearest::Greater),
        }?;
        let (key, value) = map.raw.entry(located.handle);
        self.position = Position::After(key.clone());
        Some((key, value, located.weight[0]))
    }
}

/// A cursor chosen by [`MultiRankMap::cursor`] to suit the balancing strategy.
#[derive(Debug)]
pub enum Cursor<K, V, S, E> {
    Fast(FastCursor<K, V, S, E>),
    Robust(RobustCursor<K>),
}

impl<K: Ord + Clone, V, S: Balance, E: Extent> Cursor<K, V, S, E> {
    /// Advances whichever cursor this is.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] from a fast cursor whose map changed.
    pub fn next<'a>(&mut self, map: &'a mut MultiRankMap<K, V, S, E>) -> Result<Option<(&'a K, &'a V, E)>, Error> {
        match self {
            Cursor::Fast(cursor) => cursor.next(map),
            Cursor::Robust(cursor) => Ok(cursor.next(map)),
        }
    }
}
