pub mod chained;
pub mod resize;
pub mod table;
pub mod utils;

use std::hash::{BuildHasher, Hash};

/// Hash a value with the set's hasher.
#[inline]
pub fn hash<Q>(hasher: &impl BuildHasher, value: &Q) -> u64
where
    Q: Hash + ?Sized,
{
    hasher.hash_one(value)
}

/// Map a hash onto one of `len` slots.
///
/// `len` is not required to be a power of two, the initial capacity is
/// caller-supplied and only ever doubled.
#[inline]
pub fn index(hash: u64, len: usize) -> usize {
    debug_assert!(len > 0);
    (hash % len as u64) as usize
}

/// Double a capacity, panicking on overflow.
#[inline]
pub fn doubled(capacity: usize) -> usize {
    capacity.checked_mul(2).expect("capacity overflow")
}
