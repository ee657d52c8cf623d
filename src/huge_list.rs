//! A large mutable sequence stored as a position tree of bounded blocks.

use alloc::vec::{self, Vec};
use core::cmp::Ordering;
use core::fmt;
use core::iter::FusedIterator;
use core::mem;

use crate::log::trace;
use crate::raw::{AllocationMode, Handle, Located, Nearest, RawTree, Walk};
use crate::{Avl, Balance, Error};

mod cursor;

pub use cursor::{Cursor, FastCursor, RobustCursor};

/// Block size used by [`HugeList::new`].
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 512;

type Tree<T, S> = RawTree<(), Vec<T>, usize, S, 1>;

fn at(index: usize) -> impl FnMut(&(), &[usize; 1]) -> Ordering {
    move |_, start| index.cmp(&start[0])
}

fn before(index: usize) -> impl FnMut(&(), &[usize; 1]) -> Ordering {
    move |_, start| if index <= start[0] { Ordering::Less } else { Ordering::Greater }
}

/// Construction options for a [`HugeList`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct HugeListOptions {
    /// Largest number of elements a segment may hold. Must be positive.
    pub max_block_size: usize,
    /// Number of segment slots reserved up front.
    pub segment_capacity: usize,
    pub allocation_mode: AllocationMode,
}

impl Default for HugeListOptions {
    fn default() -> Self {
        Self {
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            segment_capacity: 0,
            allocation_mode: AllocationMode::default(),
        }
    }
}

/// A mutable sequence for very large element counts.
///
/// Elements live in contiguous segments of at most [`max_block_size`](Self::max_block_size)
/// elements, kept in a position tree keyed by each segment's first index. Indexing, insertion
/// and removal anywhere cost O(log n) tree work plus O(block size) element moves.
///
/// Two invariants keep the layout compact:
/// - at most one segment, the *slack* segment, holds spare capacity; it is the segment most
///   recently grown, so runs of nearby inserts fill it without reallocating;
/// - no two neighboring segments fit in one block together; they are merged as soon as they do.
///
/// Queries take `&mut self` because a [`Splay`](crate::Splay) list restructures on reads.
///
/// # Examples
///
/// ```
/// use offset_tree::HugeList;
///
/// let mut list: HugeList<u32> = HugeList::with_block_size(4);
/// list.extend(0..10);
/// list.insert(5, 100);
/// list.remove_range(0, 2);
///
/// assert_eq!(list.get(3), Some(&100));
/// assert_eq!(list.to_vec(), [2, 3, 4, 100, 5, 6, 7, 8, 9]);
/// assert_eq!(list.index_of(&100), Some(3));
/// ```
#[derive(Clone)]
pub struct HugeList<T, S = Avl> {
    raw: Tree<T, S>,
    /// The one segment allowed to hold spare capacity.
    slack: Option<Handle>,
    max_block_size: usize,
}

/// An in-order iterator over a [`HugeList`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T, S> {
    tree: &'a Tree<T, S>,
    walk: Walk<usize, 1>,
    segment: core::slice::Iter<'a, T>,
    remaining: usize,
}

impl<T, S> HugeList<T, S> {
    /// Creates an empty list with blocks of [`DEFAULT_MAX_BLOCK_SIZE`] elements.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: RawTree::new(AllocationMode::default()),
            slack: None,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
        }
    }

    /// Creates a list reserving `capacity` segment slots.
    #[must_use]
    pub fn with_capacity(capacity: usize, mode: AllocationMode) -> Self {
        Self {
            raw: RawTree::with_capacity(capacity, mode),
            slack: None,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
        }
    }

    /// Creates an empty list whose segments hold at most `max_block_size` elements.
    ///
    /// # Panics
    ///
    /// Panics if `max_block_size` is zero.
    #[must_use]
    pub fn with_block_size(max_block_size: usize) -> Self {
        Self::with_options(HugeListOptions {
            max_block_size,
            ..HugeListOptions::default()
        })
    }

    /// Creates an empty list from `options`.
    ///
    /// # Errors
    ///
    /// [`Error::ArgumentInvalid`] if the block size is zero.
    pub fn try_with_options(options: HugeListOptions) -> Result<Self, Error> {
        if options.max_block_size == 0 {
            return Err(Error::ArgumentInvalid("block size must be positive"));
        }
        Ok(Self {
            raw: RawTree::with_capacity(options.segment_capacity, options.allocation_mode),
            slack: None,
            max_block_size: options.max_block_size,
        })
    }

    /// Creates an empty list from `options`.
    ///
    /// # Panics
    ///
    /// Panics if the block size is zero.
    #[must_use]
    pub fn with_options(options: HugeListOptions) -> Self {
        match Self::try_with_options(options) {
            Ok(list) => list,
            Err(err) => panic!("`HugeList::with_options()` - {err}"),
        }
    }

    /// Returns the largest number of elements a segment may hold.
    #[must_use]
    pub const fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Number of segment slots in the node arena.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Returns the allocation mode of the segment arena.
    #[must_use]
    pub const fn allocation_mode(&self) -> AllocationMode {
        self.raw.mode()
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.extent()[0]
    }

    /// Returns `true` if the list holds no elements.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every element. Segment slots are kept or released according to the allocation
    /// mode.
    ///
    /// # Complexity
    ///
    /// O(n), without recursion.
    pub fn clear(&mut self) {
        self.raw.clear();
        self.slack = None;
    }

    /// Returns the modification counter of the segment tree.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.raw.version()
    }

    /// Returns an iterator over the elements in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::HugeList;
    ///
    /// let list: HugeList<u8> = (1..=3).collect();
    /// assert_eq!(list.iter().sum::<u8>(), 6);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1) per element, plus O(1) amortized per segment.
    pub fn iter(&self) -> Iter<'_, T, S> {
        Iter {
            tree: &self.raw,
            walk: Walk::first(&self.raw),
            segment: [].iter(),
            remaining: self.len(),
        }
    }

    /// Returns a cursor over the current segment layout.
    ///
    /// It fails with [`Error::InvalidState`] once the list is modified, and for a self-adjusting
    /// list once it is queried.
    #[must_use]
    pub fn fast_cursor(&self) -> FastCursor<T, S> {
        FastCursor::new(&self.raw, Walk::first(&self.raw), None)
    }

    /// Returns a cursor that reads by index and tolerates modifications between steps.
    #[must_use]
    pub fn robust_cursor(&self) -> RobustCursor {
        RobustCursor::new(0)
    }

    /// Returns a robust cursor whose first step reads the element at `index`.
    #[must_use]
    pub fn robust_cursor_from(&self, index: usize) -> RobustCursor {
        RobustCursor::new(index)
    }

    /// Index of the first element matching `predicate`.
    pub fn find_index<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let mut walk = Walk::first(&self.raw);
        while let Some(located) = walk.next(&self.raw) {
            if let Some(offset) = self.raw.value(located.handle).iter().position(&mut predicate) {
                return Some(located.start[0] + offset);
            }
        }
        None
    }

    /// Index of the last element matching `predicate`.
    pub fn find_last_index<F>(&self, mut predicate: F) -> Option<usize>
    where
        F: FnMut(&T) -> bool,
    {
        let mut walk = Walk::first(&self.raw);
        let mut found = None;
        while let Some(located) = walk.next(&self.raw) {
            if let Some(offset) = self.raw.value(located.handle).iter().rposition(&mut predicate) {
                found = Some(located.start[0] + offset);
            }
        }
        found
    }

    /// Index of the first element equal to `item`.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::HugeList;
    ///
    /// let list: HugeList<char> = "abcab".chars().collect();
    /// assert_eq!(list.index_of(&'b'), Some(1));
    /// assert_eq!(list.last_index_of(&'b'), Some(4));
    /// assert_eq!(list.index_of(&'z'), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.find_index(|candidate| candidate == item)
    }

    /// Index of the last element equal to `item`.
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn last_index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.find_last_index(|candidate| candidate == item)
    }

    /// Clones every element into a `Vec`, in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = Vec::with_capacity(self.len());
        let mut walk = Walk::first(&self.raw);
        while let Some(located) = walk.next(&self.raw) {
            out.extend_from_slice(self.raw.value(located.handle));
        }
        out
    }

    /// Length and capacity of every segment, in order.
    #[doc(hidden)]
    #[must_use]
    pub fn segments(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.raw.len());
        let mut walk = Walk::first(&self.raw);
        while let Some(located) = walk.next(&self.raw) {
            let segment = self.raw.value(located.handle);
            out.push((segment.len(), segment.capacity()));
        }
        out
    }

    /// Height of the segment tree, counting the root as 1. Used by balance checks.
    #[doc(hidden)]
    #[must_use]
    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// Hands the slack role to `handle`, trimming the previous slack segment and reserving
    /// room for a full block.
    fn designate_slack(&mut self, handle: Handle) {
        if let Some(previous) = self.slack.replace(handle) {
            if previous != handle {
                trace!(previous = previous.to_index(), next = handle.to_index(), "moving slack segment");
                self.raw.value_mut(previous).shrink_to_fit();
            }
        }
        let max_block_size = self.max_block_size;
        let segment = self.raw.value_mut(handle);
        segment.reserve_exact(max_block_size.saturating_sub(segment.len()));
    }

    /// Drops spare capacity unless `handle` is the slack segment.
    fn trim(&mut self, handle: Handle) {
        if self.slack != Some(handle) {
            self.raw.value_mut(handle).shrink_to_fit();
        }
    }
}

impl<T, S: Balance> HugeList<T, S> {
    fn segment_at(&mut self, index: usize) -> Option<Located<usize, 1>> {
        if index >= self.len() {
            return None;
        }
        self.raw.nearest(at(index), Nearest::LessOrEqual)
    }

    /// Returns the element at `index`.
    ///
    /// # Examples
    ///
    /// ```
    /// use offset_tree::HugeList;
    ///
    /// let mut list: HugeList<u32> = HugeList::with_block_size(2);
    /// list.extend([10, 20, 30]);
    /// assert_eq!(list.get(2), Some(&30));
    /// assert_eq!(list.get(3), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log(n / block size)); amortized for a splay list.
    pub fn get(&mut self, index: usize) -> Option<&T> {
        let located = self.segment_at(index)?;
        self.raw.value(located.handle).get(index - located.start[0])
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// # Complexity
    ///
    /// O(log(n / block size)); amortized for a splay list.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let located = self.segment_at(index)?;
        self.raw.value_mut(located.handle).get_mut(index - located.start[0])
    }

    /// Replaces the element at `index`, returning the old one.
    ///
    /// # Errors
    ///
    /// [`Error::ArgumentInvalid`] if `index` is out of range.
    pub fn try_set(&mut self, index: usize, item: T) -> Result<T, Error> {
        let slot = self.get_mut(index).ok_or(Error::ArgumentInvalid("index is out of range"))?;
        Ok(mem::replace(slot, item))
    }

    /// Replaces the element at `index`, returning the old one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn set(&mut self, index: usize, item: T) -> T {
        match self.try_set(index, item) {
            Ok(old) => old,
            Err(err) => panic!("`HugeList::set()` - {err}"),
        }
    }

    /// Appends `item` at the end of the list.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExhausted`] if a fixed-capacity list has no segment slot left.
    pub fn try_push(&mut self, item: T) -> Result<(), Error> {
        self.try_insert_range(self.len(), core::iter::once(item))
    }

    /// Appends `item` at the end of the list.
    ///
    /// # Panics
    ///
    /// Panics if [`try_push`](Self::try_push) fails.
    pub fn push(&mut self, item: T) {
        if let Err(err) = self.try_push(item) {
            panic!("`HugeList::push()` - {err}");
        }
    }

    /// Inserts `item` before the element at `index`, or at the end when `index` equals the
    /// length.
    ///
    /// # Errors
    ///
    /// As [`try_insert_range`](Self::try_insert_range).
    pub fn try_insert(&mut self, index: usize, item: T) -> Result<(), Error> {
        self.try_insert_range(index, core::iter::once(item))
    }

    /// Inserts `item` before the element at `index`, or at the end when `index` equals the
    /// length.
    ///
    /// # Panics
    ///
    /// Panics if [`try_insert`](Self::try_insert) fails.
    pub fn insert(&mut self, index: usize, item: T) {
        if let Err(err) = self.try_insert(index, item) {
            panic!("`HugeList::insert()` - {err}");
        }
    }

    /// Inserts `items` before the element at `index`, or at the end when `index` equals the
    /// length.
    ///
    /// An insert inside a segment first cuts the segment there, carrying its tail behind the
    /// new items. The items are then placed by, in order of preference: topping up the
    /// segment before the insertion point, adding full blocks, prepending a short remainder
    /// to the segment after the insertion point, or starting a new slack segment.
    ///
    /// # Errors
    ///
    /// - [`Error::ArgumentInvalid`] if `index` is past the end.
    /// - [`Error::CapacityExhausted`] if a fixed-capacity list lacks the segment slots; the
    ///   list is unchanged then.
    pub fn try_insert_range<I>(&mut self, index: usize, items: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
    {
        if index > self.len() {
            return Err(Error::ArgumentInvalid("index is out of range"));
        }
        let mut pending: Vec<T> = items.into_iter().collect();
        if pending.is_empty() {
            return Ok(());
        }

        let split = self
            .raw
            .nearest(at(index), Nearest::LessOrEqual)
            .filter(|located| index > located.start[0] && index < located.start[0] + located.weight[0]);
        let tail_len = split.map_or(0, |located| located.start[0] + located.weight[0] - index);

        if self.raw.mode() == AllocationMode::FixedCapacity {
            let needed = self.planned_segments(index, pending.len() + tail_len, split);
            self.raw.ensure_capacity(self.raw.len() + needed)?;
        }

        if let Some(located) = split {
            let offset = index - located.start[0];
            trace!(start = located.start[0], offset, "splitting segment");
            let mut tail = self.raw.value_mut(located.handle).split_off(offset);
            pending.append(&mut tail);
            self.resize(located.start[0], offset);
        }

        self.place(index, pending.into_iter())
    }

    /// Inserts `items` before the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if [`try_insert_range`](Self::try_insert_range) fails.
    pub fn insert_range<I>(&mut self, index: usize, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        if let Err(err) = self.try_insert_range(index, items) {
            panic!("`HugeList::insert_range()` - {err}");
        }
    }

    /// Number of segments [`place`](Self::place) will allocate for `count` items inserted
    /// at `index`, once `split` (the segment cut at `index`, if any) has been cut.
    fn planned_segments(&mut self, index: usize, count: usize, split: Option<Located<usize, 1>>) -> usize {
        let max_block_size = self.max_block_size;
        let (previous, next) = match split {
            Some(located) => (
                Some(index - located.start[0]),
                self.raw.nearest(at(located.start[0]), Nearest::Greater),
            ),
            None => (
                self.raw.nearest(at(index), Nearest::Less).map(|previous| previous.weight[0]),
                self.raw.nearest(at(index), Nearest::GreaterOrEqual),
            ),
        };
        let room = previous.map_or(0, |length| max_block_size.saturating_sub(length));
        let remaining = count.saturating_sub(room);
        let rest = remaining % max_block_size;
        let prepended = next.is_some_and(|next| next.weight[0] + rest <= max_block_size);
        remaining / max_block_size + usize::from(rest > 0 && !prepended)
    }

    /// Lays `items` out starting at the segment boundary `position`.
    fn place(&mut self, mut position: usize, mut items: vec::IntoIter<T>) -> Result<(), Error> {
        let max_block_size = self.max_block_size;
        while items.len() > 0 {
            let remaining = items.len();

            if let Some(previous) = self.raw.nearest(at(position), Nearest::Less) {
                let room = max_block_size.saturating_sub(previous.weight[0]);
                if room > 0 {
                    let taken = room.min(remaining);
                    self.designate_slack(previous.handle);
                    self.raw.value_mut(previous.handle).extend(items.by_ref().take(taken));
                    self.resize(previous.start[0], previous.weight[0] + taken);
                    position += taken;
                    continue;
                }
            }

            if remaining >= max_block_size {
                let mut block = Vec::with_capacity(max_block_size);
                block.extend(items.by_ref().take(max_block_size));
                trace!(position, "adding full segment");
                self.raw.insert(before(position), [max_block_size], (), block)?;
                position += max_block_size;
                continue;
            }

            if let Some(next) = self.raw.nearest(at(position), Nearest::GreaterOrEqual) {
                if next.weight[0] + remaining <= max_block_size {
                    self.designate_slack(next.handle);
                    self.raw.value_mut(next.handle).splice(0..0, items.by_ref());
                    self.resize(position, next.weight[0] + remaining);
                    return Ok(());
                }
            }

            let mut block = Vec::with_capacity(max_block_size);
            block.extend(items.by_ref());
            let located = self.raw.insert(before(position), [remaining], (), block)?;
            self.designate_slack(located.handle);
            return Ok(());
        }
        Ok(())
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::ArgumentInvalid`] if `index` is out of range.
    pub fn try_remove_at(&mut self, index: usize) -> Result<T, Error> {
        let located = self.segment_at(index).ok_or(Error::ArgumentInvalid("index is out of range"))?;
        let item = if located.weight[0] == 1 {
            let mut segment = self.remove_segment(located);
            segment.swap_remove(0)
        } else {
            let item = self.raw.value_mut(located.handle).remove(index - located.start[0]);
            self.resize(located.start[0], located.weight[0] - 1);
            self.designate_slack(located.handle);
            item
        };
        self.coalesce_around(index);
        Ok(item)
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> T {
        match self.try_remove_at(index) {
            Ok(item) => item,
            Err(err) => panic!("`HugeList::remove_at()` - {err}"),
        }
    }

    /// Removes `count` elements starting at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::ArgumentInvalid`] if the range reaches past the end.
    pub fn try_remove_range(&mut self, index: usize, count: usize) -> Result<(), Error> {
        self.check_range(index, count)?;
        self.remove_checked(index, count);
        Ok(())
    }

    /// Removes `count` elements starting at `index`.
    ///
    /// # Panics
    ///
    /// Panics if the range reaches past the end.
    pub fn remove_range(&mut self, index: usize, count: usize) {
        if let Err(err) = self.try_remove_range(index, count) {
            panic!("`HugeList::remove_range()` - {err}");
        }
    }

    fn check_range(&self, index: usize, count: usize) -> Result<usize, Error> {
        index
            .checked_add(count)
            .filter(|&end| end <= self.len())
            .ok_or(Error::ArgumentInvalid("range is out of bounds"))
    }

    fn remove_checked(&mut self, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let mut remaining = count;
        while remaining > 0 {
            let located = self
                .raw
                .nearest(at(index), Nearest::LessOrEqual)
                .expect("`HugeList::remove_range()` - range was checked");
            let offset = index - located.start[0];
            let taken = (located.weight[0] - offset).min(remaining);
            if taken == located.weight[0] {
                drop(self.remove_segment(located));
            } else {
                self.raw.value_mut(located.handle).drain(offset..offset + taken);
                self.resize(located.start[0], located.weight[0] - taken);
                self.trim(located.handle);
            }
            remaining -= taken;
        }
        self.coalesce_around(index);
    }

    /// Removes every element matching `predicate`, returning how many were removed.
    ///
    /// One pass from left to right; a segment left empty is dropped and a segment that fits
    /// into its predecessor is merged into it.
    pub fn remove_all<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut removed = 0;
        let mut position = 0;
        while let Some(located) = self.segment_at(position) {
            let segment = self.raw.value_mut(located.handle);
            segment.retain(|item| !predicate(item));
            let length = segment.len();
            removed += located.weight[0] - length;

            if length == 0 {
                drop(self.remove_segment(located));
                continue;
            }
            let mut current = located;
            if length < located.weight[0] {
                self.resize(located.start[0], length);
                self.trim(located.handle);
                current.weight = [length];
            }
            if let Some(previous) = self.raw.nearest(at(position), Nearest::Less) {
                if previous.weight[0] + length <= self.max_block_size {
                    current = self.merge(previous, current);
                }
            }
            position = current.start[0] + current.weight[0];
        }
        removed
    }

    /// Replaces `count` elements starting at `index` with `items`.
    ///
    /// # Errors
    ///
    /// - [`Error::ArgumentInvalid`] if the range reaches past the end.
    /// - [`Error::CapacityExhausted`] if a fixed-capacity list cannot grow; the list is
    ///   unchanged then.
    pub fn try_replace_range<I>(&mut self, index: usize, count: usize, items: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
    {
        let end = self.check_range(index, count)?;
        let mut items: Vec<T> = items.into_iter().collect();
        match items.len().cmp(&count) {
            Ordering::Less => self.remove_checked(index + items.len(), count - items.len()),
            Ordering::Greater => {
                let extra = items.split_off(count);
                self.try_insert_range(end, extra)?;
            }
            Ordering::Equal => {}
        }
        self.overwrite(index, items.into_iter());
        Ok(())
    }

    /// Replaces `count` elements starting at `index` with `items`.
    ///
    /// # Panics
    ///
    /// Panics if [`try_replace_range`](Self::try_replace_range) fails.
    pub fn replace_range<I>(&mut self, index: usize, count: usize, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        if let Err(err) = self.try_replace_range(index, count, items) {
            panic!("`HugeList::replace_range()` - {err}");
        }
    }

    fn overwrite(&mut self, mut index: usize, mut items: vec::IntoIter<T>) {
        while items.len() > 0 {
            let located = self
                .raw
                .nearest(at(index), Nearest::LessOrEqual)
                .expect("`HugeList::overwrite()` - range was checked");
            let slots = &mut self.raw.value_mut(located.handle)[index - located.start[0]..];
            for (slot, item) in slots.iter_mut().zip(items.by_ref()) {
                *slot = item;
                index += 1;
            }
        }
    }

    /// Clones the elements starting at `index` into `dest`, filling it.
    ///
    /// # Errors
    ///
    /// [`Error::ArgumentInvalid`] if the list has fewer than `dest.len()` elements from
    /// `index` on.
    pub fn copy_to(&mut self, index: usize, dest: &mut [T]) -> Result<(), Error>
    where
        T: Clone,
    {
        self.check_range(index, dest.len())?;
        let mut copied = 0;
        while copied < dest.len() {
            let position = index + copied;
            let located = self
                .raw
                .nearest(at(position), Nearest::LessOrEqual)
                .expect("`HugeList::copy_to()` - range was checked");
            let source = &self.raw.value(located.handle)[position - located.start[0]..];
            let count = source.len().min(dest.len() - copied);
            dest[copied..copied + count].clone_from_slice(&source[..count]);
            copied += count;
        }
        Ok(())
    }

    /// Binary searches a list sorted by `f`, which returns the element's ordering relative
    /// to the target.
    ///
    /// # Errors
    ///
    /// When nothing matches, returns the index where a matching element could be inserted.
    pub fn binary_search_by<F>(&mut self, mut f: F) -> Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        let (mut low, mut high) = (0, self.len());
        while low < high {
            let middle = low + (high - low) / 2;
            match f(self.item(middle)) {
                Ordering::Less => low = middle + 1,
                Ordering::Greater => high = middle,
                Ordering::Equal => return Ok(middle),
            }
        }
        Err(low)
    }

    /// As [`binary_search_by`](Self::binary_search_by), but among equal elements reports
    /// the first.
    ///
    /// # Errors
    ///
    /// When nothing matches, returns the insertion index.
    pub fn binary_search_first_by<F>(&mut self, mut f: F) -> Result<usize, usize>
    where
        F: FnMut(&T) -> Ordering,
    {
        let found = self.binary_search_by(&mut f)?;
        let (mut low, mut high) = (0, found);
        while low < high {
            let middle = low + (high - low) / 2;
            if f(self.item(middle)) == Ordering::Less {
                low = middle + 1;
            } else {
                high = middle;
            }
        }
        Ok(low)
    }

    fn item(&mut self, index: usize) -> &T {
        self.get(index).expect("`HugeList::item()` - index is in bounds")
    }

    /// Returns a fast cursor positioned at `index`, or past the end if `index` is not below
    /// the length.
    #[must_use]
    pub fn fast_cursor_from(&mut self, index: usize) -> FastCursor<T, S> {
        let Some(located) = self.segment_at(index) else {
            return FastCursor::new(&self.raw, Walk::empty(), None);
        };
        let mut walk = Walk::seek(&self.raw, at(located.start[0]));
        let first = walk.next(&self.raw).map(|found| (found.handle, index - found.start[0]));
        FastCursor::new(&self.raw, walk, first)
    }

    /// Returns the cursor suited to the balancing strategy: robust for a self-adjusting list,
    /// fast otherwise.
    #[must_use]
    pub fn cursor(&self) -> Cursor<T, S> {
        if S::SELF_ADJUSTING {
            Cursor::Robust(self.robust_cursor())
        } else {
            Cursor::Fast(self.fast_cursor())
        }
    }

    /// Shrinks or grows the tree weight of the segment starting at `start`.
    fn resize(&mut self, start: usize, length: usize) {
        self.raw
            .set_weight(at(start), [length])
            .expect("`HugeList::resize()` - a segment starts there");
    }

    fn remove_segment(&mut self, located: Located<usize, 1>) -> Vec<T> {
        if self.slack == Some(located.handle) {
            self.slack = None;
        }
        self.raw
            .remove(at(located.start[0]))
            .expect("`HugeList::remove_segment()` - a segment starts there")
            .value
    }

    /// Appends segment `right` to its predecessor `left`.
    fn merge(&mut self, left: Located<usize, 1>, right: Located<usize, 1>) -> Located<usize, 1> {
        trace!(start = left.start[0], left = left.weight[0], right = right.weight[0], "merging segments");
        let mut moved = self.remove_segment(right);
        let segment = self.raw.value_mut(left.handle);
        segment.reserve_exact(moved.len());
        segment.append(&mut moved);
        let length = left.weight[0] + right.weight[0];
        self.resize(left.start[0], length);
        self.trim(left.handle);
        Located {
            handle: left.handle,
            start: left.start,
            weight: [length],
        }
    }

    /// Merges the segments on both sides of `index` with their neighbors while they fit.
    fn coalesce_around(&mut self, index: usize) {
        if index > 0 {
            self.coalesce(index - 1);
        }
        if index < self.len() {
            self.coalesce(index);
        }
    }

    fn coalesce(&mut self, index: usize) {
        let Some(mut current) = self.segment_at(index) else {
            return;
        };
        while let Some(previous) = self.raw.nearest(at(current.start[0]), Nearest::Less) {
            if previous.weight[0] + current.weight[0] > self.max_block_size {
                break;
            }
            current = self.merge(previous, current);
        }
        while let Some(next) = self.raw.nearest(at(current.start[0]), Nearest::Greater) {
            if current.weight[0] + next.weight[0] > self.max_block_size {
                break;
            }
            current = self.merge(current, next);
        }
    }

    /// Checks the tree and the segment layout, panicking on any violation.
    #[doc(hidden)]
    pub fn validate(&self) {
        self.raw.validate(|_, _| true);

        let mut walk = Walk::first(&self.raw);
        let mut previous_len: Option<usize> = None;
        let mut slack_seen = self.slack.is_none();
        while let Some(located) = walk.next(&self.raw) {
            let segment = self.raw.value(located.handle);
            assert_eq!(segment.len(), located.weight[0], "`HugeList::validate()` - segment length disagrees with tree");
            assert!(segment.len() <= self.max_block_size, "`HugeList::validate()` - segment exceeds the block size");
            if mem::size_of::<T>() != 0 && segment.capacity() > segment.len() {
                assert_eq!(self.slack, Some(located.handle), "`HugeList::validate()` - spare capacity outside the slack segment");
            }
            if let Some(previous_len) = previous_len {
                assert!(previous_len + segment.len() > self.max_block_size, "`HugeList::validate()` - neighbors fit in one block");
            }
            slack_seen |= self.slack == Some(located.handle);
            previous_len = Some(segment.len());
        }
        assert!(slack_seen, "`HugeList::validate()` - slack segment is not in the tree");
    }
}

impl<T, S> Default for HugeList<T, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, S> fmt::Debug for HugeList<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, S: Balance> Extend<T> for HugeList<T, S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let end = self.len();
        self.insert_range(end, iter);
    }
}

impl<T, S: Balance> FromIterator<T> for HugeList<T, S> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a, T, S> IntoIterator for &'a HugeList<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, S> Iterator for Iter<'a, T, S> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.segment.next() {
                self.remaining -= 1;
                return Some(item);
            }
            let tree = self.tree;
            let located = self.walk.next(tree)?;
            self.segment = tree.value(located.handle).iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, S> ExactSizeIterator for Iter<'_, T, S> {}

impl<T, S> FusedIterator for Iter<'_, T, S> {}

impl<T, S> fmt::Debug for Iter<'_, T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish()
    }
}
