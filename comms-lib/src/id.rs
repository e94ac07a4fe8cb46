//! Identifiers whose valid values form a small, fixed set.
//!
//! Values received from the wire are held as-is, even when they are not part of
//! the valid set, so that parsers can report *which* identifier was wrong.
//! Identifiers the spacecraft owns itself are built with `make`, which fails
//! const evaluation for values outside the set:
//!
//! ```
//! use comms::{RestrictedId, Vcid};
//!
//! const PUS: Vcid = Vcid::make(0b011);
//! assert!(PUS.is_valid());
//! assert!(!Vcid::from_raw(0b111).is_valid());
//! ```
use std::fmt::Debug;

pub trait RestrictedId: Copy + Eq + Debug {
    /// Raw values of all valid identifiers. Order defines [`RestrictedId::index`].
    const VALID_VALUES: &'static [u64];

    fn raw(&self) -> u64;

    fn is_valid(&self) -> bool {
        Self::VALID_VALUES.contains(&self.raw())
    }

    /// Position of this identifier in the valid set, or `None` if it is not valid.
    fn index(&self) -> Option<usize> {
        let raw = self.raw();
        Self::VALID_VALUES.iter().position(|v| *v == raw)
    }
}

#[doc(hidden)]
#[must_use]
pub const fn contains(set: &[u64], value: u64) -> bool {
    let mut i = 0;
    while i < set.len() {
        if set[i] == value {
            return true;
        }
        i += 1;
    }
    false
}

macro_rules! restricted_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(UInt<$bits:literal>) = [$($valid:expr),+ $(,)?];
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name($crate::UInt<$bits>);

        impl $name {
            pub const VALID_VALUES: &'static [u64] = &[$($valid),+];

            #[must_use]
            pub const fn new(value: $crate::UInt<$bits>) -> Self {
                Self(value)
            }

            /// Wrap a raw value, truncated to the field width. Never rejects.
            #[must_use]
            pub const fn from_raw(raw: u64) -> Self {
                Self($crate::UInt::new(raw))
            }

            /// Build an identifier from a value known to be valid.
            ///
            /// # Panics
            /// If `raw` is not a valid value. In a `const` item this is a compile error.
            #[must_use]
            pub const fn make(raw: u64) -> Self {
                assert!(
                    $crate::id::contains(Self::VALID_VALUES, raw),
                    concat!("not a valid ", stringify!($name))
                );
                Self::from_raw(raw)
            }

            #[must_use]
            pub const fn value(self) -> $crate::UInt<$bits> {
                self.0
            }

            #[must_use]
            pub const fn raw(self) -> u64 {
                self.0.value()
            }
        }

        impl $crate::id::RestrictedId for $name {
            const VALID_VALUES: &'static [u64] = $name::VALID_VALUES;

            fn raw(&self) -> u64 {
                self.0.value()
            }
        }
    };
}

pub(crate) use restricted_id;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UInt;

    restricted_id! {
        struct TestId(UInt<4>) = [0x3, 0xA, 0x7];
    }

    const OWNED: TestId = TestId::make(0xA);

    #[test]
    fn made_ids_are_valid() {
        assert!(OWNED.is_valid());
        assert!(TestId::make(0x3).is_valid());
        assert!(TestId::make(0x7).is_valid());
    }

    #[test]
    fn values_outside_set_are_held_but_invalid() {
        for raw in [0x0, 0x1, 0x2, 0x4, 0xB, 0xF] {
            let id = TestId::from_raw(raw);
            assert_eq!(id.raw(), raw);
            assert!(!id.is_valid(), "{raw:#x} should not be valid");
            assert_eq!(id.index(), None);
        }
    }

    #[test]
    fn from_raw_truncates_to_width() {
        // 0x1A truncated to 4 bits is 0xA
        assert_eq!(TestId::from_raw(0x1A), OWNED);
    }

    #[test]
    fn default_is_zero_and_invalid() {
        let id = TestId::default();
        assert_eq!(id.value(), UInt::<4>::ZERO);
        assert!(!id.is_valid());
    }

    #[test]
    fn index_follows_declaration_order() {
        assert_eq!(TestId::make(0x3).index(), Some(0));
        assert_eq!(TestId::make(0xA).index(), Some(1));
        assert_eq!(TestId::make(0x7).index(), Some(2));
    }

    #[test]
    fn contains_finds_members() {
        assert!(contains(&[1, 2, 3], 2));
        assert!(!contains(&[1, 2, 3], 4));
        assert!(!contains(&[], 0));
    }
}
