//! State shared by the collections' fast cursors.

use crate::Error;
use crate::extent::Extent;
use crate::log::debug;
use crate::raw::{Located, RawTree, Walk};

/// An in-order walk pinned to the tree version it was created at.
#[derive(Clone, Debug)]
pub(crate) struct PinnedWalk<E, const D: usize> {
    walk: Walk<E, D>,
    version: u64,
}

impl<E: Extent, const D: usize> PinnedWalk<E, D> {
    pub(crate) fn new(walk: Walk<E, D>, version: u64) -> Self {
        Self { walk, version }
    }

    /// Advances the walk.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] if `tree` changed since the walk was created. The walk stays
    /// invalid from then on.
    pub(crate) fn next<K, V, S>(&mut self, tree: &RawTree<K, V, E, S, D>) -> Result<Option<Located<E, D>>, Error> {
        self.check(tree)?;
        Ok(self.walk.next(tree))
    }

    /// Fails with [`Error::InvalidState`] if `tree` changed since the walk was created.
    pub(crate) fn check<K, V, S>(&self, tree: &RawTree<K, V, E, S, D>) -> Result<(), Error> {
        if tree.version() != self.version {
            debug!(expected = self.version, found = tree.version(), "fast cursor invalidated by a modification");
            return Err(Error::InvalidState);
        }
        Ok(())
    }
}
