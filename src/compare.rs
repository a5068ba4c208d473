//! Key ordering.
//!
//! The tree never looks inside a key; identity and order come only from a
//! [`Comparator`]. The ordering must be total and must not change for a key
//! while it is stored in a tree.

use std::cmp::Ordering;

/// Three-way comparison over keys of type `K`.
///
/// Implemented for every `Fn(&K, &K) -> Ordering`, so a closure or a plain
/// `fn` item can be passed wherever a comparator is expected.
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

impl<K: ?Sized, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}
