use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

use super::table::Table;
use crate::ResizePolicy;

/// An unsynchronized chained hash table.
///
/// This is the reference implementation of the set contract. `SequentialSet`
/// runs it behind a `RefCell` and `CoarseSet` behind a single mutex.
#[derive(Debug)]
pub struct Chained<T> {
    table: Table<T>,
    len: usize,
}

impl<T> Chained<T> {
    pub fn new(capacity: usize) -> Chained<T> {
        Chained {
            table: Table::new(capacity),
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    #[cfg(test)]
    pub(crate) fn table(&self) -> &Table<T> {
        &self.table
    }
}

impl<T> Chained<T>
where
    T: Hash + Eq,
{
    pub fn add(&mut self, value: T, hasher: &impl BuildHasher, policy: ResizePolicy) -> bool {
        let i = super::index(super::hash(hasher, &value), self.capacity());

        if !self.table.bucket_mut(i).insert(value) {
            return false;
        }

        self.len += 1;

        if policy.should_grow(self.len, self.capacity()) {
            self.resize(hasher, policy);
        }

        true
    }

    pub fn remove<Q>(&mut self, value: &Q, hasher: &impl BuildHasher) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = super::index(super::hash(hasher, value), self.capacity());

        if !self.table.bucket_mut(i).remove(value) {
            return false;
        }

        self.len -= 1;
        true
    }

    pub fn contains<Q>(&self, value: &Q, hasher: &impl BuildHasher) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = super::index(super::hash(hasher, value), self.capacity());
        self.table.bucket(i).contains(value)
    }

    // Double the table until the policy is satisfied.
    fn resize(&mut self, hasher: &impl BuildHasher, policy: ResizePolicy) {
        let mut capacity = self.capacity();

        while policy.should_grow(self.len, capacity) {
            capacity = super::doubled(capacity);
        }

        self.table.grow(capacity, |value| {
            super::index(super::hash(hasher, value), capacity)
        });

        debug_assert_eq!(self.table.count(), self.len);
    }
}
