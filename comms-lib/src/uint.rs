use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unsigned integer with a fixed width of `N` bits, `1 <= N <= 64`.
///
/// Used for the sub-byte fields of protocol headers. Construction silently
/// truncates to the lower `N` bits, so the stored value always equals
/// `raw & UInt::<N>::MASK`. Values compare equal when their truncated values are
/// equal, also across different widths.
#[derive(Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "u64", into = "u64"))]
pub struct UInt<const N: u32>(u64);

impl<const N: u32> UInt<N> {
    pub const BITS: u32 = N;
    pub const MASK: u64 = {
        assert!(N >= 1 && N <= 64, "UInt width must be between 1 and 64 bits");
        u64::MAX >> (64 - N)
    };
    pub const MAX: Self = Self(Self::MASK);
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value & Self::MASK)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn wrapping_add(self, rhs: u64) -> Self {
        Self::new(self.0.wrapping_add(rhs))
    }
}

/// Truncates to `N` bits.
impl<const N: u32> From<u64> for UInt<N> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<const N: u32> From<UInt<N>> for u64 {
    fn from(value: UInt<N>) -> Self {
        value.0
    }
}

impl<const N: u32, const M: u32> PartialEq<UInt<M>> for UInt<N> {
    fn eq(&self, other: &UInt<M>) -> bool {
        self.0 == other.0
    }
}

impl<const N: u32> Eq for UInt<N> {}

impl<const N: u32> PartialOrd for UInt<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const N: u32> Ord for UInt<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<const N: u32> Hash for UInt<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<const N: u32> fmt::Debug for UInt<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UInt<{N}>({:#x})", self.0)
    }
}

impl<const N: u32> fmt::Display for UInt<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
