use core::cmp::Ordering;

use smallvec::SmallVec;

use super::handle::Handle;
use super::tree::{Located, RawTree};
use crate::extent::{self, Extent};

/// In-order traversal driven by an explicit stack of pending nodes and their starts.
///
/// The stack holds every ancestor whose left subtree is still being visited, so the top
/// is always the next entry and each step is amortized O(1). It holds handles into one
/// tree: any structural change to that tree leaves it stale.
#[derive(Clone, Debug)]
pub(crate) struct Walk<E, const D: usize> {
    stack: SmallVec<[(Handle, [E; D]); 32]>,
}

impl<E: Extent, const D: usize> Walk<E, D> {
    pub(crate) fn empty() -> Self {
        Self { stack: SmallVec::new() }
    }

    /// Positions the walk before the first entry.
    pub(crate) fn first<K, V, S>(tree: &RawTree<K, V, E, S, D>) -> Self {
        let mut walk = Self::empty();
        if let Some(root) = tree.root() {
            walk.push_left_spine(tree, root, extent::zero());
        }
        walk
    }

    /// Positions the walk before the first entry the comparison does not report as
    /// greater than the target, i.e. the first entry at or after it.
    pub(crate) fn seek<K, V, S, F>(tree: &RawTree<K, V, E, S, D>, mut cmp: F) -> Self
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        let mut walk = Self::empty();
        let mut current = tree.root();
        let mut base = extent::zero();
        while let Some(handle) = current {
            let node = tree.node(handle);
            let start = extent::add(base, node.offset);
            base = start;
            if cmp(&node.key, &start) == Ordering::Greater {
                current = node.right;
            } else {
                walk.stack.push((handle, start));
                current = node.left;
            }
        }
        walk
    }

    fn push_left_spine<K, V, S>(&mut self, tree: &RawTree<K, V, E, S, D>, handle: Handle, mut base: [E; D]) {
        let mut current = Some(handle);
        while let Some(handle) = current {
            let node = tree.node(handle);
            let start = extent::add(base, node.offset);
            self.stack.push((handle, start));
            base = start;
            current = node.left;
        }
    }

    /// Yields the next entry with its weight.
    pub(crate) fn next<K, V, S>(&mut self, tree: &RawTree<K, V, E, S, D>) -> Option<Located<E, D>> {
        let (handle, start) = self.stack.pop()?;
        if let Some(right) = tree.node(handle).right {
            self.push_left_spine(tree, right, start);
        }
        let successor = self.stack.last().map_or(tree.extent(), |&(_, start)| start);
        Some(Located {
            handle,
            start,
            weight: extent::sub(successor, start),
        })
    }
}
