use super::handle::Handle;

/// A binary tree node.
///
/// `offset` is the node's start minus its parent's start in each dimension (the root's is
/// its absolute start). Absolute starts are rebuilt by summing offsets along a search path
/// and are never stored, so shifting every later entry only touches one path.
#[derive(Clone, Debug)]
pub(crate) struct Node<K, V, E, const D: usize> {
    pub(crate) left: Option<Handle>,
    pub(crate) right: Option<Handle>,
    // AVL balance: height(right) - height(left). Unused by splay trees.
    pub(crate) balance: i8,
    pub(crate) offset: [E; D],
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V, E, const D: usize> Node<K, V, E, D> {
    pub(crate) const fn new(key: K, value: V, offset: [E; D]) -> Self {
        Self {
            left: None,
            right: None,
            balance: 0,
            offset,
            key,
            value,
        }
    }

    #[inline]
    pub(crate) const fn child(&self, dir: Dir) -> Option<Handle> {
        match dir {
            Dir::Left => self.left,
            Dir::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, dir: Dir, child: Option<Handle>) {
        match dir {
            Dir::Left => self.left = child,
            Dir::Right => self.right = child,
        }
    }
}

/// Which child a search descended into.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Dir {
    Left,
    Right,
}
