use core::fmt::Debug;
use core::hash::Hash;

use crate::Error;

mod sealed {
    pub trait Sealed {}
}

/// An unsigned integer width used for positions, lengths and extents.
///
/// The width bounds both the total extent of a collection and its entry count:
/// an insertion that would exceed [`Extent::MAX`] fails with [`Error::Overflow`].
/// Narrow widths (`u16`, `u32`) halve the per-node offset storage.
///
/// This trait is sealed; it is implemented for `u16`, `u32`, `u64` and `usize`.
///
/// [`Error::Overflow`]: crate::Error::Overflow
pub trait Extent: Copy + Ord + Default + Debug + Hash + sealed::Sealed {
    /// The zero position.
    const ZERO: Self;
    /// The largest representable extent.
    const MAX: Self;

    #[doc(hidden)]
    fn checked_add(self, rhs: Self) -> Option<Self>;
    #[doc(hidden)]
    fn checked_sub(self, rhs: Self) -> Option<Self>;
    #[doc(hidden)]
    fn wrapping_add(self, rhs: Self) -> Self;
    #[doc(hidden)]
    fn wrapping_sub(self, rhs: Self) -> Self;
    #[doc(hidden)]
    fn from_usize(value: usize) -> Option<Self>;
}

macro_rules! impl_extent {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Extent for $ty {
                const ZERO: Self = 0;
                const MAX: Self = <$ty>::MAX;

                #[inline]
                fn checked_add(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_add(self, rhs)
                }

                #[inline]
                fn checked_sub(self, rhs: Self) -> Option<Self> {
                    <$ty>::checked_sub(self, rhs)
                }

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$ty>::wrapping_add(self, rhs)
                }

                #[inline]
                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$ty>::wrapping_sub(self, rhs)
                }

                #[inline]
                fn from_usize(value: usize) -> Option<Self> {
                    <$ty>::try_from(value).ok()
                }
            }
        )*
    };
}

impl_extent!(u16, u32, u64, usize);

/// Adds per-dimension offsets modulo the width.
#[inline]
pub(crate) fn add<E: Extent, const D: usize>(a: [E; D], b: [E; D]) -> [E; D] {
    core::array::from_fn(|i| a[i].wrapping_add(b[i]))
}

/// Subtracts per-dimension offsets modulo the width.
#[inline]
pub(crate) fn sub<E: Extent, const D: usize>(a: [E; D], b: [E; D]) -> [E; D] {
    core::array::from_fn(|i| a[i].wrapping_sub(b[i]))
}

/// Adds per-dimension extents, failing if any dimension overflows.
#[inline]
pub(crate) fn checked_add<E: Extent, const D: usize>(a: [E; D], b: [E; D]) -> Option<[E; D]> {
    let mut out = a;
    for (slot, rhs) in out.iter_mut().zip(b) {
        *slot = slot.checked_add(rhs)?;
    }
    Some(out)
}

#[inline]
pub(crate) fn zero<E: Extent, const D: usize>() -> [E; D] {
    [E::ZERO; D]
}

/// Applies a signed adjustment to a length.
///
/// # Errors
///
/// `ArgumentInvalid` if the result would be negative, `Overflow` if it does not fit `E`.
pub(crate) fn adjust<E: Extent>(value: E, delta: isize) -> Result<E, Error> {
    // A magnitude too wide for `E` exceeds every length, so it fails the same way.
    let magnitude = E::from_usize(delta.unsigned_abs());
    if delta < 0 {
        magnitude
            .and_then(|magnitude| value.checked_sub(magnitude))
            .ok_or(Error::ArgumentInvalid("adjustment would make the length negative"))
    } else {
        magnitude.and_then(|magnitude| value.checked_add(magnitude)).ok_or(Error::Overflow)
    }
}

/// Fails with `ArgumentInvalid` unless `length` is positive.
pub(crate) fn positive<E: Extent>(length: E) -> Result<E, Error> {
    if length == E::ZERO {
        Err(Error::ArgumentInvalid("length must be positive"))
    } else {
        Ok(length)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn checked_add_reports_overflow_per_dimension() {
        assert_eq!(checked_add([1u16, 2], [3, 4]), Some([4, 6]));
        assert_eq!(checked_add([1u16, u16::MAX], [3, 1]), None);
    }

    #[test]
    fn from_usize_respects_width() {
        assert_eq!(<u16 as Extent>::from_usize(65_535), Some(u16::MAX));
        assert_eq!(<u16 as Extent>::from_usize(65_536), None);
    }

    #[test]
    fn adjust_distinguishes_negative_from_overflow() {
        assert_eq!(adjust(5u16, -2), Ok(3));
        assert_eq!(adjust(5u16, -5), Ok(0));
        assert!(matches!(adjust(5u16, -6), Err(Error::ArgumentInvalid(_))));
        assert_eq!(adjust(u16::MAX, 1), Err(Error::Overflow));
    }

    #[test]
    fn adjust_handles_deltas_wider_than_the_width() {
        assert_eq!(adjust(5u16, 70_000), Err(Error::Overflow));
        assert!(matches!(adjust(u16::MAX, -70_000), Err(Error::ArgumentInvalid(_))));
        assert_eq!(adjust(u64::MAX - 1, 1), Ok(u64::MAX));
        assert_eq!(adjust(u64::MAX, isize::MIN), Ok(u64::MAX - isize::MIN.unsigned_abs() as u64));
    }

    proptest! {
        #[test]
        fn wrapping_offsets_round_trip(a in any::<u32>(), b in any::<u32>()) {
            // Relative offsets are stored modulo 2^N; adding back the parent restores the child.
            let relative = sub([a], [b]);
            prop_assert_eq!(add(relative, [b]), [a]);
        }
    }
}
