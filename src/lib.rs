//! Position-augmented balanced trees for Rust.
//!
//! Every collection in this crate is a shape of one engine: a binary search tree whose
//! nodes store their start position *relative to their parent*. Inserting, removing or
//! resizing an entry anywhere only touches the O(log n) nodes on its search path, yet
//! every entry still knows its absolute position in a virtual sequence.
//!
//! - [`KeyedMap`] - an ordered dictionary with nearest-key queries
//! - [`MultiRankMap`] - keys with multiplicities, queried by rank
//! - [`RangeMap`] - a tiling of `0..extent` into ranges, each carrying a value
//! - [`Range2Map`] - two parallel tilings advancing together
//! - [`HugeList`] - a mutable sequence stored as bounded blocks, cheap to edit anywhere
//!
//! # Example
//!
//! ```
//! use offset_tree::RangeMap;
//!
//! // Lines of a document, by byte length.
//! let mut lines: RangeMap<&str> = RangeMap::new();
//! lines.push(6, "first");
//! lines.push(7, "second");
//! lines.push(6, "third");
//!
//! // Which line holds byte 9, and where does it start?
//! assert_eq!(lines.get_range(9), Some((6, 7, &"second")));
//!
//! // Grow the first line; every later line shifts.
//! lines.adjust_length(0, 4);
//! assert_eq!(lines.get_range(9), Some((0, 10, &"first")));
//! assert_eq!(lines.extent(), 23);
//! ```
//!
//! # Balancing
//!
//! Each collection takes a strategy parameter: [`Avl`] (the default) keeps the tree
//! height-balanced and leaves it untouched on lookups, while [`Splay`] moves every
//! accessed entry to the root, favoring workloads with strong locality. Because a splay
//! tree restructures on reads, lookups take `&mut self` throughout.
//!
//! # Cursors
//!
//! Besides the borrowing `iter()`, collections hand out cursors that do not borrow:
//! a *fast* cursor follows the tree shape and fails with [`Error::InvalidState`] once the
//! collection changes, a *robust* cursor re-queries from the last position it returned
//! and tolerates edits between steps.
//!
//! # Features
//!
//! - **`tracing`** (default) - emits `trace`/`debug` events for arena growth, capacity
//!   exhaustion, `HugeList` segment splits and merges, and cursor invalidation.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![warn(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod balance;
mod cursor;
mod error;
mod extent;
mod log;
mod raw;

pub mod huge_list;
pub mod keyed_map;
pub mod multi_rank_map;
pub mod range2_map;
pub mod range_map;

pub use balance::{Avl, Balance, Splay};
pub use error::Error;
pub use extent::Extent;
pub use huge_list::{DEFAULT_MAX_BLOCK_SIZE, HugeList, HugeListOptions};
pub use keyed_map::KeyedMap;
pub use multi_rank_map::MultiRankMap;
pub use range_map::RangeMap;
pub use range2_map::{Range2, Range2Map, Side};
pub use raw::AllocationMode;
