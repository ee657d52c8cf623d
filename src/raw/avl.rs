//! Height-balanced rotation.
//!
//! Mutations descend once, recording the path, then apply the positional shift to the
//! recorded path only: every node passed on its left side is a successor of the edit
//! point, so it moves by the delta and its left child is compensated by the opposite
//! delta. Rebalancing walks the same path back up.

use core::cmp::Ordering;

use smallvec::SmallVec;

use super::handle::Handle;
use super::node::{Dir, Node};
use super::tree::{Located, Nearest, RawTree, Removed};
use crate::Error;
use crate::extent::{self, Extent};

/// Path from the root to an edit point. AVL height stays below 1.45 log2(n + 2), under 64 for
/// any handle space.
type Path = SmallVec<[(Handle, Dir); 64]>;

impl<K, V, E: Extent, S, const D: usize> RawTree<K, V, E, S, D> {
    pub(super) fn avl_find<F>(&self, mut cmp: F) -> Option<Located<E, D>>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        let mut current = self.root();
        let mut base = extent::zero();
        let mut bound = self.extent();

        while let Some(handle) = current {
            let node = self.node(handle);
            let start = extent::add(base, node.offset);
            match cmp(&node.key, &start) {
                Ordering::Equal => return Some(self.locate(handle, start, bound)),
                Ordering::Less => {
                    bound = start;
                    current = node.left;
                }
                Ordering::Greater => current = node.right,
            }
            base = start;
        }
        None
    }

    pub(super) fn avl_nearest<F>(&self, mut cmp: F, nearest: Nearest) -> Option<Located<E, D>>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        let mut current = self.root();
        let mut base = extent::zero();
        let mut bound = self.extent();
        let mut best = None;

        while let Some(handle) = current {
            let node = self.node(handle);
            let start = extent::add(base, node.offset);
            let ord = cmp(&node.key, &start);
            let (candidate, dir) = match nearest {
                Nearest::LessOrEqual => (ord != Ordering::Less, if ord == Ordering::Less { Dir::Left } else { Dir::Right }),
                Nearest::Less => (ord == Ordering::Greater, if ord == Ordering::Greater { Dir::Right } else { Dir::Left }),
                Nearest::GreaterOrEqual => (ord != Ordering::Greater, if ord == Ordering::Greater { Dir::Right } else { Dir::Left }),
                Nearest::Greater => (ord == Ordering::Less, if ord == Ordering::Less { Dir::Left } else { Dir::Right }),
            };
            if candidate {
                best = Some((handle, start, bound));
                if ord == Ordering::Equal {
                    break;
                }
            }
            if dir == Dir::Left {
                bound = start;
            }
            base = start;
            current = node.child(dir);
        }

        best.map(|(handle, start, bound)| self.locate(handle, start, bound))
    }

    pub(super) fn avl_insert<F>(&mut self, mut cmp: F, weight: [E; D], key: K, value: V) -> Result<Located<E, D>, Error>
    where
        F: FnMut(&K, &K, &[E; D]) -> Ordering,
    {
        let new_extent = self.check_insert(weight)?;

        let mut path = Path::new();
        let mut current = self.root();
        let mut base = extent::zero();
        let mut bound = self.extent();
        while let Some(handle) = current {
            let node = self.node(handle);
            let start = extent::add(base, node.offset);
            match cmp(&key, &node.key, &start) {
                Ordering::Equal => return Err(Error::KeyConflict),
                Ordering::Less => {
                    path.push((handle, Dir::Left));
                    bound = start;
                    current = node.left;
                }
                Ordering::Greater => {
                    path.push((handle, Dir::Right));
                    current = node.right;
                }
            }
            base = start;
        }

        // The new entry takes its successor's start; the successor and everything after moves.
        let start = bound;
        let handle = self.nodes_mut().alloc(Node::new(key, value, extent::zero()))?;
        self.shift_path(&path, weight);

        match path.last().copied() {
            Some((parent, dir)) => {
                let parent_start = if dir == Dir::Left { extent::add(base, weight) } else { base };
                self.node_mut(handle).offset = extent::sub(start, parent_start);
                self.node_mut(parent).set_child(dir, Some(handle));
            }
            None => {
                self.node_mut(handle).offset = start;
                self.set_root(Some(handle));
            }
        }

        self.commit_insert(new_extent);
        self.rebalance_after_insert(&mut path);
        Ok(Located { handle, start, weight })
    }

    pub(super) fn avl_remove<F>(&mut self, mut cmp: F) -> Result<Removed<K, V, E, D>, Error>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        let mut path = Path::new();
        let mut current = self.root();
        let mut base = extent::zero();
        let mut bound = self.extent();
        let (target, start) = loop {
            let Some(handle) = current else {
                return Err(Error::NotFound);
            };
            let node = self.node(handle);
            let start = extent::add(base, node.offset);
            match cmp(&node.key, &start) {
                Ordering::Equal => break (handle, start),
                Ordering::Less => {
                    path.push((handle, Dir::Left));
                    bound = start;
                    current = node.left;
                }
                Ordering::Greater => {
                    path.push((handle, Dir::Right));
                    current = node.right;
                }
            }
            base = start;
        };

        let weight = self.locate(target, start, bound).weight;
        let negative = extent::sub(extent::zero(), weight);
        self.shift_path(&path, negative);
        if let Some(right) = self.node(target).right {
            let node = self.node_mut(right);
            node.offset = extent::add(node.offset, negative);
        }

        let (left, right, offset, balance) = {
            let node = self.node(target);
            (node.left, node.right, node.offset, node.balance)
        };

        match (left, right) {
            (Some(left), Some(right)) => {
                // Splice the in-order successor into the target's place. After the shift it
                // starts where the target did, so offsets relative to it carry over unchanged.
                let slot = path.len();
                path.push((target, Dir::Right));
                let mut successor = right;
                while let Some(next) = self.node(successor).left {
                    path.push((successor, Dir::Left));
                    successor = next;
                }

                if successor != right {
                    let (successor_right, successor_offset) = {
                        let node = self.node(successor);
                        (node.right, node.offset)
                    };
                    if let Some(child) = successor_right {
                        let node = self.node_mut(child);
                        node.offset = extent::add(node.offset, successor_offset);
                    }
                    let (parent, _) = path[path.len() - 1];
                    self.node_mut(parent).left = successor_right;
                    self.node_mut(successor).right = Some(right);
                }

                let node = self.node_mut(successor);
                node.left = Some(left);
                node.offset = offset;
                node.balance = balance;
                path[slot] = (successor, Dir::Right);
                let parent = slot.checked_sub(1).map(|index| path[index]);
                self.relink(parent, Some(successor));
            }
            (child, None) | (None, child) => {
                if let Some(child) = child {
                    let node = self.node_mut(child);
                    node.offset = extent::add(node.offset, offset);
                }
                self.relink(path.last().copied(), child);
            }
        }

        let Node { key, value, .. } = self.nodes_mut().take(target);
        self.commit_remove(weight);
        self.rebalance_after_remove(&mut path);
        Ok(Removed { key, value, weight })
    }

    pub(super) fn avl_set_weight<F>(&mut self, mut cmp: F, weight: [E; D]) -> Result<Located<E, D>, Error>
    where
        F: FnMut(&K, &[E; D]) -> Ordering,
    {
        let mut path = Path::new();
        let mut current = self.root();
        let mut base = extent::zero();
        let mut bound = self.extent();
        let (target, start) = loop {
            let Some(handle) = current else {
                return Err(Error::NotFound);
            };
            let node = self.node(handle);
            let start = extent::add(base, node.offset);
            match cmp(&node.key, &start) {
                Ordering::Equal => break (handle, start),
                Ordering::Less => {
                    path.push((handle, Dir::Left));
                    bound = start;
                    current = node.left;
                }
                Ordering::Greater => {
                    path.push((handle, Dir::Right));
                    current = node.right;
                }
            }
            base = start;
        };

        let old = self.locate(target, start, bound).weight;
        let new_extent = extent::checked_add(extent::sub(self.extent(), old), weight).ok_or(Error::Overflow)?;
        let delta = extent::sub(weight, old);
        self.shift_path(&path, delta);
        if let Some(right) = self.node(target).right {
            let node = self.node_mut(right);
            node.offset = extent::add(node.offset, delta);
        }
        self.commit_extent(new_extent);
        Ok(Located { handle: target, start, weight })
    }

    /// Moves every path node passed on its left side by `delta`, keeping its left child
    /// where it was.
    fn shift_path(&mut self, path: &Path, delta: [E; D]) {
        if D == 0 {
            return;
        }
        for &(handle, dir) in path {
            if dir == Dir::Left {
                let node = self.node_mut(handle);
                node.offset = extent::add(node.offset, delta);
                if let Some(left) = node.left {
                    let child = self.node_mut(left);
                    child.offset = extent::sub(child.offset, delta);
                }
            }
        }
    }

    fn rebalance_after_insert(&mut self, path: &mut Path) {
        while let Some((handle, dir)) = path.pop() {
            let balance = self.node(handle).balance + if dir == Dir::Left { -1 } else { 1 };
            self.node_mut(handle).balance = balance;
            match balance {
                0 => break,
                -1 | 1 => {}
                _ => {
                    let subtree = self.fix(handle);
                    self.relink(path.last().copied(), Some(subtree));
                    break;
                }
            }
        }
    }

    fn rebalance_after_remove(&mut self, path: &mut Path) {
        while let Some((handle, dir)) = path.pop() {
            // The `dir` side got shorter.
            let balance = self.node(handle).balance + if dir == Dir::Left { 1 } else { -1 };
            self.node_mut(handle).balance = balance;
            match balance {
                -1 | 1 => break,
                0 => {}
                _ => {
                    let subtree = self.fix(handle);
                    self.relink(path.last().copied(), Some(subtree));
                    if self.node(subtree).balance != 0 {
                        break;
                    }
                }
            }
        }
    }

    /// Restores balance at a node whose factor reached ±2; returns the new subtree root.
    fn fix(&mut self, handle: Handle) -> Handle {
        if self.node(handle).balance > 0 {
            let right = self.node(handle).right.expect("`RawTree::fix()` - right-heavy node has no right child");
            if self.node(right).balance < 0 {
                let rotated = self.rotate_right(right);
                self.node_mut(handle).right = Some(rotated);
            }
            self.rotate_left(handle)
        } else {
            let left = self.node(handle).left.expect("`RawTree::fix()` - left-heavy node has no left child");
            if self.node(left).balance > 0 {
                let rotated = self.rotate_left(left);
                self.node_mut(handle).left = Some(rotated);
            }
            self.rotate_right(handle)
        }
    }

    /// Rotates `handle`'s right child above it. The child inherits `handle`'s offset plus its
    /// own; `handle` becomes relative to the child; the child's left subtree changes parents.
    fn rotate_left(&mut self, handle: Handle) -> Handle {
        let right = self.node(handle).right.expect("`RawTree::rotate_left()` - no right child");
        let (offset, balance) = (self.node(handle).offset, self.node(handle).balance);
        let (right_offset, right_balance, inner) = {
            let node = self.node(right);
            (node.offset, node.balance, node.left)
        };

        if let Some(inner) = inner {
            let node = self.node_mut(inner);
            node.offset = extent::add(right_offset, node.offset);
        }
        let new_balance = balance - 1 - right_balance.max(0);
        let node = self.node_mut(handle);
        node.right = inner;
        node.offset = extent::sub(extent::zero(), right_offset);
        node.balance = new_balance;

        let node = self.node_mut(right);
        node.left = Some(handle);
        node.offset = extent::add(offset, right_offset);
        node.balance = right_balance - 1 + new_balance.min(0);
        right
    }

    /// Mirror of [`rotate_left`](Self::rotate_left).
    fn rotate_right(&mut self, handle: Handle) -> Handle {
        let left = self.node(handle).left.expect("`RawTree::rotate_right()` - no left child");
        let (offset, balance) = (self.node(handle).offset, self.node(handle).balance);
        let (left_offset, left_balance, inner) = {
            let node = self.node(left);
            (node.offset, node.balance, node.right)
        };

        if let Some(inner) = inner {
            let node = self.node_mut(inner);
            node.offset = extent::add(left_offset, node.offset);
        }
        let new_balance = balance + 1 - left_balance.min(0);
        let node = self.node_mut(handle);
        node.left = inner;
        node.offset = extent::sub(extent::zero(), left_offset);
        node.balance = new_balance;

        let node = self.node_mut(left);
        node.right = Some(handle);
        node.offset = extent::add(offset, left_offset);
        node.balance = left_balance + 1 + new_balance.max(0);
        left
    }

    /// Returns the subtree height, asserting every stored balance factor.
    pub(super) fn avl_check_heights(&self, handle: Handle) -> i32 {
        let node = self.node(handle);
        let left = node.left.map_or(0, |child| self.avl_check_heights(child));
        let right = node.right.map_or(0, |child| self.avl_check_heights(child));
        assert_eq!(i32::from(node.balance), right - left, "`RawTree::validate()` - stale balance factor");
        assert!((right - left).abs() <= 1, "`RawTree::validate()` - AVL balance violated");
        1 + left.max(right)
    }
}
