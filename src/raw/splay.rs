//! Top-down splaying.
//!
//! Every access rotates the touched entry to the root, so lookups restructure the tree and
//! bump its version. Splitting into left and right trees while descending keeps the pass
//! single and iterative; offsets are rewritten from the absolute starts tracked along the way.

use core::cmp::Ordering;

use super::handle::Handle;
use super::node::Node;
use super::tree::{Located, Nearest, RawTree, Removed};
use crate::Error;
use crate::extent::{self, Extent};

/// A side tree built during a splay: its root and its attachment point, with absolute starts.
type Side<E, const D: usize> = Option<((Handle, [E; D]), (Handle, [E; D]))>;

impl<K, V, E: Extent, S, const D: usize> RawTree<K, V, E, S, D> {
    /// Splays the subtree at `root`, whose parent starts at `base`, around the comparison
    /// target. Returns the new subtree root (its offset relative to `base` again), its
    /// absolute start and the comparison result there.
    fn splay<F>(&mut self, root: Handle, base: [E; D], cmp: &mut F) -> (Handle, [E; D], Ordering)
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        // `lesser` collects entries before the target, hanging new ones off its tail's right.
        let mut lesser: Side<E, D> = None;
        let mut greater: Side<E, D> = None;
        let mut top = root;
        let mut top_start = extent::add(base, self.node(root).offset);

        let ord = loop {
            let node = self.node(top);
            let ord = cmp(&node.key, &top_start);
            let (next, next_start) = match ord {
                Ordering::Equal => break ord,
                Ordering::Less => {
                    let Some(child) = node.left else { break ord };
                    let mut child = (child, extent::add(top_start, self.node(child).offset));
                    let child_node = self.node(child.0);
                    if cmp(&child_node.key, &child.1) == Ordering::Less {
                        if let Some(grandchild) = child_node.left {
                            // Zig-zig: rotate right before linking.
                            let grandchild_start = extent::add(child.1, self.node(grandchild).offset);
                            self.splay_rotate_right(top, child.0);
                            (top, top_start) = child;
                            child = (grandchild, grandchild_start);
                        }
                    }
                    self.hang(&mut greater, top, top_start, false);
                    child
                }
                Ordering::Greater => {
                    let Some(child) = node.right else { break ord };
                    let mut child = (child, extent::add(top_start, self.node(child).offset));
                    let child_node = self.node(child.0);
                    if cmp(&child_node.key, &child.1) == Ordering::Greater {
                        if let Some(grandchild) = child_node.right {
                            let grandchild_start = extent::add(child.1, self.node(grandchild).offset);
                            self.splay_rotate_left(top, child.0);
                            (top, top_start) = child;
                            child = (grandchild, grandchild_start);
                        }
                    }
                    self.hang(&mut lesser, top, top_start, true);
                    child
                }
            };
            top = next;
            top_start = next_start;
        };

        // Reassemble: the top's subtrees go under the side trees' tails, the side trees
        // become the top's children.
        let (inner_left, inner_right) = {
            let node = self.node(top);
            (node.left, node.right)
        };
        if let Some(((head, head_start), (tail, tail_start))) = lesser {
            self.reparent(inner_left, top_start, tail_start);
            self.node_mut(tail).right = inner_left;
            self.node_mut(head).offset = extent::sub(head_start, top_start);
            self.node_mut(top).left = Some(head);
        }
        if let Some(((head, head_start), (tail, tail_start))) = greater {
            self.reparent(inner_right, top_start, tail_start);
            self.node_mut(tail).left = inner_right;
            self.node_mut(head).offset = extent::sub(head_start, top_start);
            self.node_mut(top).right = Some(head);
        }
        self.node_mut(top).offset = extent::sub(top_start, base);

        (top, top_start, ord)
    }

    /// Links `handle` under the side tree's tail (right link if `right`), or makes it the root.
    fn hang(&mut self, side: &mut Side<E, D>, handle: Handle, start: [E; D], right: bool) {
        match side {
            Some((_, tail)) => {
                let (parent, parent_start) = *tail;
                let node = self.node_mut(parent);
                if right {
                    node.right = Some(handle);
                } else {
                    node.left = Some(handle);
                }
                self.node_mut(handle).offset = extent::sub(start, parent_start);
                *tail = (handle, start);
            }
            None => *side = Some(((handle, start), (handle, start))),
        }
    }

    /// Moves `child`'s offset from a parent at `from` to a parent at `to`.
    fn reparent(&mut self, child: Option<Handle>, from: [E; D], to: [E; D]) {
        if let Some(child) = child {
            let node = self.node_mut(child);
            node.offset = extent::sub(extent::add(from, node.offset), to);
        }
    }

    /// `child` is `parent`'s left child. `child`'s own offset is left stale for the caller.
    fn splay_rotate_right(&mut self, parent: Handle, child: Handle) {
        let (child_offset, inner) = {
            let node = self.node(child);
            (node.offset, node.right)
        };
        if let Some(inner) = inner {
            let node = self.node_mut(inner);
            node.offset = extent::add(child_offset, node.offset);
        }
        let node = self.node_mut(parent);
        node.left = inner;
        node.offset = extent::sub(extent::zero(), child_offset);
        self.node_mut(child).right = Some(parent);
    }

    fn splay_rotate_left(&mut self, parent: Handle, child: Handle) {
        let (child_offset, inner) = {
            let node = self.node(child);
            (node.offset, node.left)
        };
        if let Some(inner) = inner {
            let node = self.node_mut(inner);
            node.offset = extent::add(child_offset, node.offset);
        }
        let node = self.node_mut(parent);
        node.right = inner;
        node.offset = extent::sub(extent::zero(), child_offset);
        self.node_mut(child).left = Some(parent);
    }

    /// Splays the whole tree and records the restructuring.
    fn splay_root<F>(&mut self, cmp: &mut F) -> Option<(Handle, [E; D], Ordering)>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        let root = self.root()?;
        let splayed = self.splay(root, extent::zero(), cmp);
        self.set_root(Some(splayed.0));
        self.bump_version();
        Some(splayed)
    }

    pub(super) fn splay_find<F>(&mut self, mut cmp: F) -> Option<Located<E, D>>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        match self.splay_root(&mut cmp)? {
            (root, start, Ordering::Equal) => Some(self.locate(root, start, self.extent())),
            _ => None,
        }
    }

    pub(super) fn splay_nearest<F>(&mut self, mut cmp: F, nearest: Nearest) -> Option<Located<E, D>>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        let (root, start, ord) = self.splay_root(&mut cmp)?;
        let use_root = match nearest {
            Nearest::LessOrEqual => ord != Ordering::Less,
            Nearest::Less => ord == Ordering::Greater,
            Nearest::GreaterOrEqual => ord != Ordering::Greater,
            Nearest::Greater => ord == Ordering::Less,
        };
        if use_root {
            return Some(self.locate(root, start, self.extent()));
        }

        // After splaying, everything before the target sits in the root's left subtree and
        // everything after it in the right one.
        let node = self.node(root);
        match nearest {
            Nearest::LessOrEqual | Nearest::Less => {
                let left = node.left?;
                Some(self.last_in(left, extent::add(start, self.node(left).offset), start))
            }
            Nearest::GreaterOrEqual | Nearest::Greater => {
                let right = node.right?;
                Some(self.first_in(right, extent::add(start, self.node(right).offset), self.extent()))
            }
        }
    }

    pub(super) fn splay_insert<F>(&mut self, mut cmp: F, weight: [E; D], key: K, value: V) -> Result<Located<E, D>, Error>
    where
        F: FnMut(&K, &K, &[E; D]) -> Ordering,
    {
        let new_extent = self.check_insert(weight)?;

        let mut probe = |entry: &K, start: &[E; D]| cmp(&key, entry, start);
        let Some((top, top_start, ord)) = self.splay_root(&mut probe) else {
            let handle = self.nodes_mut().alloc(Node::new(key, value, extent::zero()))?;
            self.set_root(Some(handle));
            self.commit_insert(new_extent);
            return Ok(Located {
                handle,
                start: extent::zero(),
                weight,
            });
        };
        if ord == Ordering::Equal {
            return Err(Error::KeyConflict);
        }

        let handle = self.nodes_mut().alloc(Node::new(key, value, extent::zero()))?;
        let start = if ord == Ordering::Less {
            // New entry goes right before the root and takes over its left subtree.
            let inner = self.node(top).left;
            let node = self.node_mut(top);
            node.left = None;
            node.offset = weight;
            let node = self.node_mut(handle);
            node.left = inner;
            node.right = Some(top);
            top_start
        } else {
            // New entry goes between the root and its successor.
            let inner = self.node(top).right;
            let start = match inner {
                Some(right) => self.first_start(right, extent::add(top_start, self.node(right).offset)),
                None => self.extent(),
            };
            if let Some(right) = inner {
                let node = self.node_mut(right);
                let shifted = extent::add(extent::add(top_start, node.offset), weight);
                node.offset = extent::sub(shifted, start);
            }
            let node = self.node_mut(top);
            node.right = None;
            node.offset = extent::sub(top_start, start);
            let node = self.node_mut(handle);
            node.left = Some(top);
            node.right = inner;
            start
        };

        self.node_mut(handle).offset = start;
        self.set_root(Some(handle));
        self.commit_insert(new_extent);
        Ok(Located { handle, start, weight })
    }

    pub(super) fn splay_remove<F>(&mut self, mut cmp: F) -> Result<Removed<K, V, E, D>, Error>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        let Some((top, start, Ordering::Equal)) = self.splay_root(&mut cmp) else {
            return Err(Error::NotFound);
        };
        let weight = self.locate(top, start, self.extent()).weight;
        let (left, right) = {
            let node = self.node(top);
            (node.left, node.right)
        };

        // The right subtree moves back by the removed weight.
        let right_start = right.map(|right| extent::sub(extent::add(start, self.node(right).offset), weight));
        let root = match left {
            None => {
                if let (Some(right), Some(right_start)) = (right, right_start) {
                    self.node_mut(right).offset = right_start;
                }
                right
            }
            Some(left) => {
                // The largest entry before the removed one becomes the root.
                let mut last = |_: &K, _: &[E; D]| Ordering::Greater;
                let (max, max_start, _) = self.splay(left, start, &mut last);
                if let (Some(right), Some(right_start)) = (right, right_start) {
                    self.node_mut(right).offset = extent::sub(right_start, max_start);
                }
                let node = self.node_mut(max);
                node.right = right;
                node.offset = max_start;
                Some(max)
            }
        };

        self.set_root(root);
        let Node { key, value, .. } = self.nodes_mut().take(top);
        self.commit_remove(weight);
        Ok(Removed { key, value, weight })
    }

    pub(super) fn splay_set_weight<F>(&mut self, mut cmp: F, weight: [E; D]) -> Result<Located<E, D>, Error>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        let Some((top, start, Ordering::Equal)) = self.splay_root(&mut cmp) else {
            return Err(Error::NotFound);
        };
        let old = self.locate(top, start, self.extent()).weight;
        let new_extent = extent::checked_add(extent::sub(self.extent(), old), weight).ok_or(Error::Overflow)?;
        if let Some(right) = self.node(top).right {
            let node = self.node_mut(right);
            node.offset = extent::add(node.offset, extent::sub(weight, old));
        }
        self.commit_extent(new_extent);
        Ok(Located { handle: top, start, weight })
    }
}
