//! Balancing strategies for the position tree.
//!
//! A collection picks its strategy with a type parameter. Both strategies keep the
//! same relative-offset bookkeeping; they differ in how the tree is kept shallow and in
//! whether lookups restructure it.

mod sealed {
    pub trait Sealed {}
}

/// A tree balancing strategy.
///
/// This trait is sealed; the strategies are [`Avl`] and [`Splay`].
pub trait Balance: sealed::Sealed + Copy + Default + core::fmt::Debug + 'static {
    /// `true` when every operation, including lookups, restructures the tree.
    ///
    /// Self-adjusting trees bump their version on lookups too, which invalidates any
    /// [fast cursor](crate::keyed_map::FastCursor) taken before the lookup. Collections use
    /// this to pick a robust cursor by default.
    const SELF_ADJUSTING: bool;
}

/// Height-balanced rotation (AVL).
///
/// Every node keeps a balance factor in `-1..=1`; inserts and deletes walk back up the
/// search path rotating where a factor would leave that range. Lookups are read-only.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Avl;

/// Top-down self-adjusting splay.
///
/// Every operation moves the accessed entry (or its nearest neighbor) to the root, giving
/// amortized O(log n) cost with strong locality for repeated nearby accesses.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Splay;

impl sealed::Sealed for Avl {}
impl sealed::Sealed for Splay {}

impl Balance for Avl {
    const SELF_ADJUSTING: bool = false;
}

impl Balance for Splay {
    const SELF_ADJUSTING: bool = true;
}
