use core::cmp::Ordering;
use core::marker::PhantomData;

use super::arena::{AllocationMode, Arena};
use super::handle::Handle;
use super::node::{Dir, Node};
use super::walk::Walk;
use crate::extent::{self, Extent};
use crate::{Balance, Error};

/// The position-augmented binary search tree behind every collection.
///
/// `K` orders entries for keyed shapes (`()` for positional ones), `V` is the payload,
/// `E` the integer width of positions, `S` the balancing strategy and `D` the number of
/// position dimensions (0 for plain dictionaries, 2 for two-sided range maps).
///
/// Searches are driven by a comparison closure returning `target.cmp(entry)`, given the
/// entry's key and absolute start, so one engine serves keyed and positional lookups.
#[derive(Clone)]
pub(crate) struct RawTree<K, V, E, S, const D: usize> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, V, E, D>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Number of entries.
    count: usize,
    /// Sum of all entry weights, per dimension.
    extent: [E; D],
    /// Bumped by every structural change, and by every lookup of a self-adjusting tree.
    version: u64,
    _strategy: PhantomData<S>,
}

/// An entry found by a search: its node, absolute start and weight.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Located<E, const D: usize> {
    pub(crate) handle: Handle,
    pub(crate) start: [E; D],
    pub(crate) weight: [E; D],
}

/// An entry unlinked by a removal.
pub(crate) struct Removed<K, V, E, const D: usize> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) weight: [E; D],
}

/// Direction of a nearest-neighbor query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Nearest {
    /// Largest entry strictly before the target.
    Less,
    /// The exact entry, else the largest before the target.
    LessOrEqual,
    /// Smallest entry strictly after the target.
    Greater,
    /// The exact entry, else the smallest after the target.
    GreaterOrEqual,
}

impl<K, V, E: Extent, S, const D: usize> RawTree<K, V, E, S, D> {
    pub(crate) fn new(mode: AllocationMode) -> Self {
        Self {
            nodes: Arena::new(mode),
            root: None,
            count: 0,
            extent: extent::zero(),
            version: 0,
            _strategy: PhantomData,
        }
    }

    pub(crate) fn with_capacity(capacity: usize, mode: AllocationMode) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity, mode),
            ..Self::new(mode)
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.count
    }

    pub(crate) const fn extent(&self) -> [E; D] {
        self.extent
    }

    pub(crate) const fn version(&self) -> u64 {
        self.version
    }

    pub(crate) const fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    pub(crate) const fn mode(&self) -> AllocationMode {
        self.nodes.mode()
    }

    pub(crate) fn ensure_capacity(&mut self, capacity: usize) -> Result<(), Error> {
        self.nodes.ensure_capacity(capacity)
    }

    /// Removes every entry.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.count = 0;
        self.extent = extent::zero();
        self.version = self.version.wrapping_add(1);
    }

    #[inline]
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, V, E, D> {
        self.nodes.get(handle)
    }

    #[inline]
    pub(super) fn node_mut(&mut self, handle: Handle) -> &mut Node<K, V, E, D> {
        self.nodes.get_mut(handle)
    }

    #[inline]
    pub(super) fn nodes_mut(&mut self) -> &mut Arena<Node<K, V, E, D>> {
        &mut self.nodes
    }

    #[inline]
    pub(crate) fn key(&self, handle: Handle) -> &K {
        &self.nodes.get(handle).key
    }

    #[inline]
    pub(crate) fn value(&self, handle: Handle) -> &V {
        &self.nodes.get(handle).value
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, handle: Handle) -> &mut V {
        &mut self.nodes.get_mut(handle).value
    }

    #[inline]
    pub(crate) fn entry(&self, handle: Handle) -> (&K, &V) {
        let node = self.nodes.get(handle);
        (&node.key, &node.value)
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, handle: Handle) -> (&K, &mut V) {
        let node = self.nodes.get_mut(handle);
        (&node.key, &mut node.value)
    }

    pub(super) fn set_root(&mut self, root: Option<Handle>) {
        self.root = root;
    }

    pub(super) fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Records one more entry of `weight`, with the extent already checked.
    pub(super) fn commit_insert(&mut self, new_extent: [E; D]) {
        self.count += 1;
        self.extent = new_extent;
        self.bump_version();
    }

    pub(super) fn commit_remove(&mut self, weight: [E; D]) {
        self.count -= 1;
        self.extent = extent::sub(self.extent, weight);
        self.bump_version();
    }

    pub(super) fn commit_extent(&mut self, new_extent: [E; D]) {
        self.extent = new_extent;
        self.bump_version();
    }

    /// Fails with `Overflow` if adding an entry of `weight` exceeds the width.
    pub(super) fn check_insert(&self, weight: [E; D]) -> Result<[E; D], Error> {
        let new_extent = extent::checked_add(self.extent, weight).ok_or(Error::Overflow)?;
        if D > 0 && E::from_usize(self.count + 1).is_none() {
            return Err(Error::Overflow);
        }
        Ok(new_extent)
    }

    /// Start of the leftmost entry of the subtree at `handle`, whose own start is `start`.
    pub(super) fn first_start(&self, mut handle: Handle, mut start: [E; D]) -> [E; D] {
        while let Some(left) = self.nodes.get(handle).left {
            start = extent::add(start, self.nodes.get(left).offset);
            handle = left;
        }
        start
    }

    /// Builds the [`Located`] for `handle`. `bound` is the start of the nearest ancestor the
    /// node sits to the left of (the extent if none), which is its successor when it has no
    /// right subtree.
    pub(super) fn locate(&self, handle: Handle, start: [E; D], bound: [E; D]) -> Located<E, D> {
        let successor = match self.nodes.get(handle).right {
            Some(right) => self.first_start(right, extent::add(start, self.nodes.get(right).offset)),
            None => bound,
        };
        Located {
            handle,
            start,
            weight: extent::sub(successor, start),
        }
    }

    /// Leftmost entry of the subtree at `handle`; `after` is the start following the subtree.
    pub(super) fn first_in(&self, handle: Handle, start: [E; D], after: [E; D]) -> Located<E, D> {
        let (mut handle, mut start, mut bound) = (handle, start, after);
        while let Some(left) = self.nodes.get(handle).left {
            bound = start;
            start = extent::add(start, self.nodes.get(left).offset);
            handle = left;
        }
        self.locate(handle, start, bound)
    }

    /// Rightmost entry of the subtree at `handle`; `after` is the start following the subtree.
    pub(super) fn last_in(&self, handle: Handle, start: [E; D], after: [E; D]) -> Located<E, D> {
        let (mut handle, mut start) = (handle, start);
        while let Some(right) = self.nodes.get(handle).right {
            start = extent::add(start, self.nodes.get(right).offset);
            handle = right;
        }
        Located {
            handle,
            start,
            weight: extent::sub(after, start),
        }
    }

    /// Points `parent`'s `dir` link (or the root) at `child`.
    pub(super) fn relink(&mut self, parent: Option<(Handle, Dir)>, child: Option<Handle>) {
        match parent {
            Some((parent, dir)) => self.nodes.get_mut(parent).set_child(dir, child),
            None => self.root = child,
        }
    }

    /// Height of the tree. Iterative, so degenerate splay trees are fine.
    pub(crate) fn height(&self) -> usize {
        let mut height = 0;
        let mut stack: alloc::vec::Vec<(Handle, usize)> = self.root.map(|root| (root, 1)).into_iter().collect();
        while let Some((handle, depth)) = stack.pop() {
            height = height.max(depth);
            let node = self.nodes.get(handle);
            stack.extend(node.left.map(|child| (child, depth + 1)));
            stack.extend(node.right.map(|child| (child, depth + 1)));
        }
        height
    }
}

impl<K, V, E: Extent, S: Balance, const D: usize> RawTree<K, V, E, S, D> {
    /// Finds the entry the comparison reports as equal.
    pub(crate) fn find<F>(&mut self, cmp: F) -> Option<Located<E, D>>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        if S::SELF_ADJUSTING { self.splay_find(cmp) } else { self.avl_find(cmp) }
    }

    /// Directional search; see [`Nearest`].
    pub(crate) fn nearest<F>(&mut self, cmp: F, nearest: Nearest) -> Option<Located<E, D>>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        if S::SELF_ADJUSTING { self.splay_nearest(cmp, nearest) } else { self.avl_nearest(cmp, nearest) }
    }

    pub(crate) fn first(&mut self) -> Option<Located<E, D>> {
        self.nearest(|_, _| Ordering::Less, Nearest::GreaterOrEqual)
    }

    pub(crate) fn last(&mut self) -> Option<Located<E, D>> {
        self.nearest(|_, _| Ordering::Greater, Nearest::LessOrEqual)
    }

    /// Inserts a new entry of `weight` at the slot the comparison leads to; every later
    /// entry shifts by `weight`.
    ///
    /// # Errors
    ///
    /// `KeyConflict` if the comparison reports an equal entry, `Overflow` if the extent or
    /// count would not fit in `E`, `CapacityExhausted` from a fixed-capacity arena.
    pub(crate) fn insert<F>(&mut self, mut cmp: F, weight: [E; D], key: K, value: V) -> Result<Located<E, D>, Error>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        self.insert_by(move |_, entry, start| cmp(entry, start), weight, key, value)
    }

    /// [`insert`](Self::insert) with a comparison that also sees the key being inserted,
    /// for keyed shapes that cannot lend the key out while handing it over.
    pub(crate) fn insert_by<F>(&mut self, cmp: F, weight: [E; D], key: K, value: V) -> Result<Located<E, D>, Error>
    where
        F: FnMut(&K, &K, &[E; D]) -> Ordering,
    {
        if S::SELF_ADJUSTING {
            self.splay_insert(cmp, weight, key, value)
        } else {
            self.avl_insert(cmp, weight, key, value)
        }
    }

    /// Removes the entry the comparison reports as equal; every later entry shifts back.
    pub(crate) fn remove<F>(&mut self, cmp: F) -> Result<Removed<K, V, E, D>, Error>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        if S::SELF_ADJUSTING { self.splay_remove(cmp) } else { self.avl_remove(cmp) }
    }

    /// Changes the weight of the matching entry in place, shifting every later entry.
    pub(crate) fn set_weight<F>(&mut self, cmp: F, weight: [E; D]) -> Result<Located<E, D>, Error>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        if S::SELF_ADJUSTING {
            self.splay_set_weight(cmp, weight)
        } else {
            self.avl_set_weight(cmp, weight)
        }
    }

    /// Walks the whole tree and panics on any broken invariant.
    ///
    /// `ordered(a, b)` must report whether key `a` sorts strictly before key `b`; positional
    /// shapes pass `|_, _| true` and rely on the start checks.
    pub(crate) fn validate<F>(&self, mut ordered: F)
    where
        F: FnMut(&K, &K) -> bool,
    {
        let mut walk = Walk::first(self);
        let mut seen = 0usize;
        let mut total: [E; D] = extent::zero();
        let mut previous: Option<Handle> = None;

        while let Some(located) = walk.next(self) {
            seen += 1;
            assert!(seen <= self.count, "`RawTree::validate()` - more reachable nodes than entries");
            assert_eq!(located.start, total, "`RawTree::validate()` - entry start disagrees with preceding weights");
            for weight in located.weight {
                assert!(weight > E::ZERO, "`RawTree::validate()` - entry weight is not positive");
            }
            total = extent::checked_add(total, located.weight).expect("`RawTree::validate()` - weights overflow");
            if let Some(previous) = previous {
                assert!(ordered(self.key(previous), self.key(located.handle)), "`RawTree::validate()` - keys out of order");
            }
            previous = Some(located.handle);
        }

        assert_eq!(seen, self.count, "`RawTree::validate()` - entry count mismatch");
        assert_eq!(self.nodes.len(), self.count, "`RawTree::validate()` - leaked arena slots");
        assert_eq!(total, self.extent, "`RawTree::validate()` - extent is not the sum of weights");

        if !S::SELF_ADJUSTING {
            if let Some(root) = self.root {
                self.avl_check_heights(root);
            }
        }
    }
}
