mod arena;
mod avl;
mod handle;
mod node;
mod splay;
mod tree;
mod walk;

pub use arena::AllocationMode;
pub(crate) use handle::Handle;
pub(crate) use tree::{Located, Nearest, RawTree, Removed};
pub(crate) use walk::Walk;
