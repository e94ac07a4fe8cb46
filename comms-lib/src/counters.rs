use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::id::RestrictedId;
use crate::UInt;

/// A sequence counter value that wraps on overflow of its storage type.
pub trait Counter: Copy + Default {
    #[must_use]
    fn wrapping_increment(self) -> Self;
}

macro_rules! impl_counter {
    ($($t:ty),*) => {
        $(
            impl Counter for $t {
                fn wrapping_increment(self) -> Self {
                    self.wrapping_add(1)
                }
            }
        )*
    };
}

impl_counter!(u8, u16, u32, u64);

impl<const N: u32> Counter for UInt<N> {
    fn wrapping_increment(self) -> Self {
        self.wrapping_add(1)
    }
}

/// One independent counter per valid value of the identifier type `I`.
///
/// All counters start at zero. Access to the whole table is serialized by a
/// single lock held only for the index-and-increment, so a table can be shared
/// between frame builders running on different threads.
#[derive(Debug)]
pub struct IdCounters<C, I> {
    counts: Mutex<Vec<C>>,
    _id: PhantomData<fn(I)>,
}

impl<C: Counter, I: RestrictedId> IdCounters<C, I> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: Mutex::new(vec![C::default(); I::VALID_VALUES.len()]),
            _id: PhantomData,
        }
    }

    /// Current value of the counter for `id`, or `None` if `id` is not valid.
    pub fn get(&self, id: I) -> Option<C> {
        let index = id.index()?;
        Some(self.lock()[index])
    }

    /// Return the current value of the counter for `id` and advance it.
    ///
    /// Returns `None`, leaving all counters untouched, if `id` is not valid.
    pub fn post_increment(&self, id: I) -> Option<C> {
        let index = id.index()?;
        let mut counts = self.lock();
        let value = counts[index];
        counts[index] = value.wrapping_increment();
        Some(value)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<C>> {
        // The counters are plain integers, a panic while holding the lock
        // cannot leave them inconsistent.
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Counter, I: RestrictedId> Default for IdCounters<C, I> {
    fn default() -> Self {
        Self::new()
    }
}
