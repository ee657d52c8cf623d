use alloc::vec::Vec;

use super::handle::Handle;
use crate::Error;
use crate::log::{debug, trace};

/// How a collection's node arena obtains and releases storage.
///
/// # Examples
///
/// ```
/// use offset_tree::{AllocationMode, Error, RangeMap};
///
/// let mut map: RangeMap<&str> = RangeMap::with_capacity(2, AllocationMode::FixedCapacity);
/// map.try_insert(0, 5, "a").unwrap();
/// map.try_insert(5, 5, "b").unwrap();
/// assert_eq!(map.try_insert(10, 5, "c"), Err(Error::CapacityExhausted));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum AllocationMode {
    /// All node slots are reserved up front; inserting past them fails with
    /// [`Error::CapacityExhausted`].
    FixedCapacity,
    /// The arena grows on demand and keeps its slots when cleared.
    #[default]
    GrowAndRetainFreed,
    /// The arena grows on demand and hands its storage back to the allocator when cleared.
    GrowDiscardFreed,
}

/// Slot storage with a freelist.
///
/// `capacity()` counts slots, occupied or free. Freed slots hold `None`, so a freed
/// node's key and value are dropped immediately.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
    mode: AllocationMode,
}

impl<T> Arena<T> {
    pub(crate) const fn new(mode: AllocationMode) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            mode,
        }
    }

    /// Creates an arena with `capacity` free slots.
    ///
    /// A capacity larger than the handle space is clamped to it.
    pub(crate) fn with_capacity(capacity: usize, mode: AllocationMode) -> Self {
        let mut arena = Self::new(mode);
        arena.grow_to(capacity.min(Handle::MAX + 1));
        arena
    }

    pub(crate) const fn mode(&self) -> AllocationMode {
        self.mode
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes sure at least `capacity` slots exist.
    pub(crate) fn ensure_capacity(&mut self, capacity: usize) -> Result<(), Error> {
        if capacity <= self.slots.len() {
            return Ok(());
        }
        if self.mode == AllocationMode::FixedCapacity || capacity > Handle::MAX + 1 {
            debug!(capacity, current = self.slots.len(), "arena cannot reach requested capacity");
            return Err(Error::CapacityExhausted);
        }
        self.grow_to(capacity);
        Ok(())
    }

    pub(crate) fn alloc(&mut self, element: T) -> Result<Handle, Error> {
        if self.free.is_empty() {
            if self.mode == AllocationMode::FixedCapacity || self.slots.len() > Handle::MAX {
                debug!(capacity = self.slots.len(), "node arena exhausted");
                return Err(Error::CapacityExhausted);
            }
            // At least double, at least one more slot, never past the handle space.
            let target = (self.slots.len() * 2).max(self.slots.len() + 1).min(Handle::MAX + 1);
            self.grow_to(target);
        }

        let Some(handle) = self.free.pop() else {
            return Err(Error::CapacityExhausted);
        };
        self.slots[handle.to_index()] = Some(element);
        Ok(handle)
    }

    fn grow_to(&mut self, target: usize) {
        let start = self.slots.len();
        if target <= start {
            return;
        }
        trace!(from = start, to = target, "growing node arena");

        self.slots.reserve_exact(target - start);
        self.slots.resize_with(target, || None);
        // Push in reverse so the lowest new index is handed out first.
        self.free.reserve(target - start);
        self.free.extend((start..target).rev().map(Handle::from_index));
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    #[cfg(test)]
    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    /// Frees every slot. Iterative: dropping the slot vector never recurses.
    pub(crate) fn clear(&mut self) {
        match self.mode {
            AllocationMode::GrowDiscardFreed => {
                self.slots = Vec::new();
                self.free = Vec::new();
            }
            AllocationMode::FixedCapacity | AllocationMode::GrowAndRetainFreed => {
                let capacity = self.slots.len();
                self.slots.clear();
                self.free.clear();
                self.grow_to(capacity);
            }
        }
    }
}
