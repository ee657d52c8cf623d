use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;

use crate::raw::{AllocationMode, Nearest, RawTree, Walk};
use crate::{Avl, Balance, Error};

mod cursor;

pub use cursor::{Cursor, FastCursor, RobustCursor};

type Tree<K, V, S> = RawTree<K, V, usize, S, 0>;

/// Comparison driving a search for `key`.
fn by_key<K, Q>(key: &Q) -> impl FnMut(&K, &[usize; 0]) -> Ordering + '_
where
    K: Borrow<Q>,
    Q: ?Sized + Ord,
{
    move |entry, _| key.cmp(entry.borrow())
}

/// An ordered dictionary backed by a balanced binary tree.
///
/// `S` picks the balancing strategy: [`Avl`] (the default) keeps lookups read-only, while
/// [`Splay`](crate::Splay) moves every accessed key to the root. Because of the latter,
/// lookups take `&mut self`.
///
/// Every fallible operation comes in two forms: `try_*` returns an [`Error`], the plain
/// form panics with it.
///
/// # Examples
///
/// ```
/// use offset_tree::KeyedMap;
///
/// let mut ages: KeyedMap<&str, u32> = KeyedMap::new();
/// ages.insert("Ada", 36);
/// ages.insert("Grace", 85);
/// ages.insert("Alan", 41);
///
/// assert_eq!(ages.get("Alan"), Some(&41));
/// assert_eq!(ages.nearest_greater("Ada"), Some((&"Alan", &41)));
///
/// let names: Vec<_> = ages.iter().map(|(name, _)| *name).collect();
/// assert_eq!(names, ["Ada", "Alan", "Grace"]);
/// ```
#[derive(Clone)]
pub struct KeyedMap<K, V, S = Avl> {
    raw: Tree<K, V, S>,
}

/// An in-order iterator over the entries of a [`KeyedMap`].
///
/// This `struct` is created by [`KeyedMap::iter`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V, S> {
    tree: &'a Tree<K, V, S>,
    walk: Walk<usize, 0>,
    remaining: usize,
}

impl<K, V, S> KeyedMap<K, V, S> {
    /// Creates an empty map that grows on demand.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: RawTree::new(AllocationMode::default()),
        }
    }

    /// Creates an empty map with `capacity` node slots reserved.
    ///
    /// With [`AllocationMode::FixedCapacity`] the map never holds more than `capacity`
    /// entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::{AllocationMode, Error, KeyedMap};
    ///
    /// let mut map = KeyedMap::<i32, i32>::with_capacity(1, AllocationMode::FixedCapacity);
    /// map.insert(1, 1);
    /// assert_eq!(map.try_insert(2, 2), Err(Error::CapacityExhausted));
    /// ```
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

    /// Reserves node slots so the map can hold `capacity` entries without allocating.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExhausted`] if the map has a fixed capacity below `capacity`.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), Error> {
        self.raw.ensure_capacity(capacity)
    }

    /// Returns the number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map holds no entries.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.len() == 0
    }

    /// Removes every entry. Storage is kept or released according to the allocation mode.
    ///
    /// # Complexity
    ///
    /// O(n), without recursion.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the modification counter. It changes on every structural change, and on
    /// every lookup of a self-adjusting map.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.raw.version()
    }

    /// Returns an in-order iterator over the entries.
    ///
    /// # Complexity
    ///
    /// O(1) amortized per entry.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            tree: &self.raw,
            walk: Walk::first(&self.raw),
            remaining: self.raw.len(),
        }
    }

    /// Returns a cursor that walks the current tree shape directly.
    ///
    /// It fails with [`Error::InvalidState`] once the map is modified (for a self-adjusting
    /// map, once it is queried).
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::{Error, KeyedMap};
    ///
    /// let mut map: KeyedMap<i32, char> = [(1, 'a'), (2, 'b')].into_iter().collect();
    /// let mut cursor = map.fast_cursor();
    /// assert_eq!(cursor.next(&map), Ok(Some((&1, &'a'))));
    ///
    /// map.insert(3, 'c');
    /// assert_eq!(cursor.next(&map), Err(Error::InvalidState));
    /// ```
    #[must_use]
    pub fn fast_cursor(&self) -> FastCursor<K, V, S> {
        FastCursor::new(&self.raw, Walk::first(&self.raw))
    }

    /// Returns a cursor that re-queries the map on every step and tolerates modifications.
    #[must_use]
    pub fn robust_cursor(&self) -> RobustCursor<K> {
        RobustCursor::new(None)
    }

    /// Returns a robust cursor positioned at the first key not less than `start`.
    #[must_use]
    pub fn robust_cursor_from(&self, start: K) -> RobustCursor<K> {
        RobustCursor::new(Some(start))
    }

    /// Height of the tree, counting the root as 1. Used by balance checks.
    #[doc(hidden)]
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }
}

impl<K: Ord, V, S: Balance> KeyedMap<K, V, S> {
    /// Inserts a new entry.
    ///
    /// # Errors
    ///
    /// - [`Error::KeyConflict`] if `key` is already present.
    /// - [`Error::CapacityExhausted`] if a fixed-capacity map is full.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(), Error> {
        self.raw.insert_by(|new, entry, _| new.cmp(entry), [], key, value).map(|_| ())
    }

    /// Inserts a new entry.
    ///
    /// # Panics
    ///
    /// Panics if [`try_insert`](Self::try_insert) fails.
    pub fn insert(&mut self, key: K, value: V) {
        if let Err(err) = self.try_insert(key, value) {
            panic!("`KeyedMap::insert()` - {err}");
        }
    }

    /// Removes `key`, returning its value.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `key` is absent.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn try_remove<Q>(&mut self, key: &Q) -> Result<V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(by_key(key)).map(|removed| removed.value)
    }

    /// Removes `key`, returning its value.
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
            Err(err) => panic!("`KeyedMap::remove()` - {err}"),
        }
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let removed = self.raw.remove(by_key(key)).ok()?;
        Some((removed.key, removed.value))
    }

    /// Returns the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::{KeyedMap, Splay};
    ///
    /// let mut map: KeyedMap<&str, u32, Splay> = KeyedMap::new();
    /// map.insert("x", 1);
    /// assert_eq!(map.get("x"), Some(&1));
    /// assert_eq!(map.get("y"), None);
    /// ```
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let located = self.raw.find(by_key(key))?;
        Some(self.raw.value(located.handle))
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::KeyedMap;
    ///
    /// let mut map: KeyedMap<u32, &str> = KeyedMap::new();
    /// map.insert(1, "a");
    /// if let Some(value) = map.get_mut(&1) {
    ///     *value = "b";
    /// }
    /// assert_eq!(map.get(&1), Some(&"b"));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n); amortized for a splay map.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let located = self.raw.find(by_key(key))?;
        Some(self.raw.value_mut(located.handle))
    }

    /// Returns `true` if `key` is present.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::KeyedMap;
    ///
    /// let mut map: KeyedMap<u32, ()> = [(4, ())].into_iter().collect();
    /// assert!(map.contains_key(&4));
    /// assert!(!map.contains_key(&5));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n); amortized for a splay map.
    pub fn contains_key<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.find(by_key(key)).is_some()
    }

    /// Replaces the value under an existing `key`, returning the old one.
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

    /// Replaces the value under an existing `key`, returning the old one.
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
            Err(err) => panic!("`KeyedMap::set()` - {err}"),
        }
    }

    /// Inserts `value` under `key`, replacing and returning any previous value.
    ///
    /// # Panics
    ///
    /// Panics if the key is new and a fixed-capacity map is full.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.get_mut(&key) {
            return Some(core::mem::replace(slot, value));
        }
        self.insert(key, value);
        None
    }

    fn nearest_entry<Q>(&mut self, key: &Q, nearest: Nearest) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let located = self.raw.nearest(by_key(key), nearest)?;
        Some(self.raw.entry(located.handle))
    }

    /// Returns the entry with the largest key strictly less than `key`.
    pub fn nearest_less<Q>(&mut self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.nearest_entry(key, Nearest::Less)
    }

    /// Returns the entry under `key`, else the one with the largest key less than it.
    pub fn nearest_less_or_equal<Q>(&mut self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.nearest_entry(key, Nearest::LessOrEqual)
    }

    /// Returns the entry with the smallest key strictly greater than `key`.
    pub fn nearest_greater<Q>(&mut self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.nearest_entry(key, Nearest::Greater)
    }

    /// Returns the entry under `key`, else the one with the smallest key greater than it.
    pub fn nearest_greater_or_equal<Q>(&mut self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.nearest_entry(key, Nearest::GreaterOrEqual)
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::KeyedMap;
    ///
    /// let mut map: KeyedMap<i32, char> = [(3, 'c'), (1, 'a'), (2, 'b')].into_iter().collect();
    /// assert_eq!(map.first(), Some((&1, &'a')));
    /// assert_eq!(map.last(), Some((&3, &'c')));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn first(&mut self) -> Option<(&K, &V)> {
        let located = self.raw.first()?;
        Some(self.raw.entry(located.handle))
    }

    /// Returns the entry with the largest key.
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn last(&mut self) -> Option<(&K, &V)> {
        let located = self.raw.last()?;
        Some(self.raw.entry(located.handle))
    }

    /// Updates `key` in place, or offers a default value for it and adds it on request.
    ///
    /// `update` receives the key, the value and whether the key was resident. For a
    /// resident key the value is updated in place and the return value is ignored; for a
    /// new key it starts from `V::default()` and is added only if `update` returns `true`.
    /// Returns whether an entry was added.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExhausted`] if the entry should be added but a fixed-capacity map
    /// is full.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::KeyedMap;
    ///
    /// let mut counts: KeyedMap<&str, u32> = KeyedMap::new();
    /// for word in ["a", "b", "a"] {
    ///     counts.conditional_set_or_add(word, |_, count, _| {
    ///         *count += 1;
    ///         true
    ///     });
    /// }
    /// assert_eq!(counts.get("a"), Some(&2));
    /// ```
    pub fn try_conditional_set_or_add<F>(&mut self, key: K, update: F) -> Result<bool, Error>
    where
        F: FnOnce(&K, &mut V, bool) -> bool,
        V: Default,
    {
        if let Some(located) = self.raw.find(by_key(&key)) {
            let (key, value) = self.raw.entry_mut(located.handle);
            update(key, value, true);
            return Ok(false);
        }

        let mut value = V::default();
        if !update(&key, &mut value, false) {
            return Ok(false);
        }
        self.try_insert(key, value)?;
        Ok(true)
    }

    /// Panicking form of [`try_conditional_set_or_add`](Self::try_conditional_set_or_add).
    ///
    /// # Panics
    ///
    /// Panics if the entry should be added but a fixed-capacity map is full.
    pub fn conditional_set_or_add<F>(&mut self, key: K, update: F) -> bool
    where
        F: FnOnce(&K, &mut V, bool) -> bool,
        V: Default,
    {
        match self.try_conditional_set_or_add(key, update) {
            Ok(added) => added,
            Err(err) => panic!("`KeyedMap::conditional_set_or_add()` - {err}"),
        }
    }

    /// Updates a resident `key` in place and removes it if `update` returns `true`.
    ///
    /// Absent keys are left alone and `update` is not called. Returns whether the entry was
    /// removed.
    pub fn conditional_set_or_remove<Q, F>(&mut self, key: &Q, update: F) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
        F: FnOnce(&K, &mut V) -> bool,
    {
        let Some(located) = self.raw.find(by_key(key)) else {
            return false;
        };
        let (resident, value) = self.raw.entry_mut(located.handle);
        if !update(resident, value) {
            return false;
        }
        self.raw.remove(by_key(key)).is_ok()
    }

    /// Returns a cursor fit for the balancing strategy: robust for self-adjusting maps,
    /// fast otherwise.
    #[must_use]
    pub fn cursor(&self) -> Cursor<K, V, S> {
        if S::SELF_ADJUSTING {
            Cursor::Robust(self.robust_cursor())
        } else {
            Cursor::Fast(self.fast_cursor())
        }
    }

    /// Returns a fast cursor positioned at the first key not less than `start`.
    #[must_use]
    pub fn fast_cursor_from<Q>(&self, start: &Q) -> FastCursor<K, V, S>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        FastCursor::new(&self.raw, Walk::seek(&self.raw, by_key(start)))
    }

    /// Checks every structural invariant, panicking on the first violation.
    #[doc(hidden)]
    pub fn validate(&self) {
        self.raw.validate(|a, b| a < b);
    }
}

impl<K, V, S> Default for KeyedMap<K, V, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for KeyedMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V, S: Balance> FromIterator<(K, V)> for KeyedMap<K, V, S> {
    /// Later duplicates replace earlier values.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V, S: Balance> Extend<(K, V)> for KeyedMap<K, V, S> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.upsert(key, value);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a KeyedMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let located = self.walk.next(tree)?;
        self.remaining -= 1;
        Some(tree.entry(located.handle))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V, S> FusedIterator for Iter<'_, K, V, S> {}

impl<K, V, S> Clone for Iter<'_, K, V, S> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            walk: self.walk.clone(),
            remaining: self.remaining,
        }
    }
}

impl<K, V, S> fmt::Debug for Iter<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::Splay;

    #[test]
    fn insert_conflicts_on_duplicate() {
        let mut map: KeyedMap<i32, &str> = KeyedMap::new();
        map.insert(1, "one");
        assert_eq!(map.try_insert(1, "uno"), Err(Error::KeyConflict));
        assert_eq!(map.get(&1), Some(&"one"));
        map.validate();
    }

    #[test]
    #[should_panic(expected = "`KeyedMap::remove()` - no entry exists")]
    fn remove_missing_panics() {
        let mut map: KeyedMap<i32, i32> = KeyedMap::new();
        map.remove(&7);
    }

    #[test]
    fn set_replaces_only_resident_keys() {
        let mut map: KeyedMap<i32, i32, Splay> = KeyedMap::new();
        map.insert(1, 10);
        assert_eq!(map.try_set(&1, 11), Ok(10));
        assert_eq!(map.try_set(&2, 20), Err(Error::NotFound));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn nearest_queries_on_both_strategies() {
        fn check<S: Balance>() {
            let mut map: KeyedMap<i32, (), S> = (0..10).map(|key| (key * 10, ())).collect();
            assert_eq!(map.nearest_less(&30).map(|(k, _)| *k), Some(20));
            assert_eq!(map.nearest_less_or_equal(&30).map(|(k, _)| *k), Some(30));
            assert_eq!(map.nearest_less_or_equal(&35).map(|(k, _)| *k), Some(30));
            assert_eq!(map.nearest_greater(&30).map(|(k, _)| *k), Some(40));
            assert_eq!(map.nearest_greater_or_equal(&31).map(|(k, _)| *k), Some(40));
            assert_eq!(map.nearest_less(&0), None);
            assert_eq!(map.nearest_greater(&90), None);
            assert_eq!(map.first().map(|(k, _)| *k), Some(0));
            assert_eq!(map.last().map(|(k, _)| *k), Some(90));
            map.validate();
        }
        check::<Avl>();
        check::<Splay>();
    }

    #[test]
    fn conditional_updates() {
        let mut map: KeyedMap<&str, i32> = KeyedMap::new();
        assert!(!map.conditional_set_or_add("a", |_, _, resident| {
            assert!(!resident);
            false
        }));
        assert!(map.is_empty());

        assert!(map.conditional_set_or_add("a", |_, value, _| {
            *value = 5;
            true
        }));
        assert!(!map.conditional_set_or_add("a", |_, value, resident| {
            assert!(resident);
            *value += 1;
            false
        }));
        assert_eq!(map.get("a"), Some(&6));

        assert!(!map.conditional_set_or_remove("a", |_, value| {
            *value = 7;
            false
        }));
        assert_eq!(map.get("a"), Some(&7));
        assert!(map.conditional_set_or_remove("a", |_, _| true));
        assert!(!map.conditional_set_or_remove("a", |_, _| unreachable!()));
        assert!(map.is_empty());
    }

    #[test]
    fn robust_cursor_tolerates_edits() {
        let mut map: KeyedMap<i32, i32> = (0..5).map(|key| (key, key)).collect();
        let mut cursor = map.robust_cursor();
        let mut seen = Vec::new();
        while let Some((key, _)) = cursor.next(&mut map) {
            let key = *key;
            seen.push(key);
            if key == 1 {
                map.remove(&2);
                map.insert(10, 10);
            }
        }
        assert_eq!(seen, [0, 1, 3, 4, 10]);
    }

    #[test]
    fn splay_lookup_invalidates_fast_cursor() {
        let mut map: KeyedMap<i32, i32, Splay> = (0..5).map(|key| (key, key)).collect();
        let mut cursor = map.fast_cursor();
        assert_eq!(cursor.next(&map), Ok(Some((&0, &0))));
        let _ = map.get(&3);
        assert_eq!(cursor.next(&map), Err(Error::InvalidState));

        // The strategy-appropriate cursor survives lookups.
        let mut cursor = map.cursor();
        assert!(matches!(cursor, Cursor::Robust(_)));
        assert_eq!(cursor.next(&mut map), Ok(Some((&0, &0))));
    }

    #[test]
    fn cursors_from_a_start_key() {
        let mut map: KeyedMap<i32, ()> = [1, 3, 5, 7].into_iter().map(|key| (key, ())).collect();
        let mut fast = map.fast_cursor_from(&4);
        assert_eq!(fast.next(&map).unwrap().map(|(k, _)| *k), Some(5));

        let mut robust = map.robust_cursor_from(3);
        assert_eq!(robust.next(&mut map).map(|(k, _)| *k), Some(3));
        assert_eq!(robust.next(&mut map).map(|(k, _)| *k), Some(5));
    }

    #[test]
    fn clone_is_independent() {
        let mut original: KeyedMap<i32, i32> = (0..20).map(|key| (key, key)).collect();
        let mut copy = original.clone();
        copy.remove(&5);
        copy.insert(100, 100);
        assert_eq!(original.len(), 20);
        assert_eq!(original.get(&5), Some(&5));
        assert_eq!(original.get(&100), None);
        copy.validate();
    }

    #[test]
    fn debug_lists_entries_in_order() {
        let map: KeyedMap<i32, char> = [(2, 'b'), (1, 'a')].into_iter().collect();
        assert_eq!(alloc::format!("{map:?}"), "{1: 'a', 2: 'b'}");
    }
}
