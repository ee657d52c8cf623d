/// The ways an operation on one of this crate's collections can fail.
///
/// Every fallible mutation has a `try_*` form that returns this error and a plain form
/// that panics with its message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An argument was out of range (zero length, index past the end, ...).
    #[error("invalid argument: {0}")]
    ArgumentInvalid(&'static str),
    /// An entry already occupies the key or position.
    #[error("an entry already occupies that key or position")]
    KeyConflict,
    /// No entry exists at the key or position.
    #[error("no entry exists at that key or position")]
    NotFound,
    /// A fixed-capacity collection has no free node left.
    #[error("the fixed-capacity node arena is exhausted")]
    CapacityExhausted,
    /// The extent or entry count would not fit in the configured width.
    #[error("the extent or count would overflow the configured integer width")]
    Overflow,
    /// The collection was modified while a fast cursor was walking it.
    #[error("the collection was modified after the cursor was created")]
    InvalidState,
}
