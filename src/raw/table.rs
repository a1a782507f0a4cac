use std::borrow::Borrow;
use std::mem;

/// A single chain of elements that share a bucket.
///
/// Order within a chain is irrelevant, removal swaps the last element into
/// the vacated slot.
#[derive(Debug)]
pub struct Bucket<T> {
    chain: Vec<T>,
}

impl<T> Default for Bucket<T> {
    fn default() -> Bucket<T> {
        Bucket { chain: Vec::new() }
    }
}

impl<T> Bucket<T> {
    /// Returns the number of elements in this chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns the elements of this chain.
    #[cfg(test)]
    pub fn as_slice(&self) -> &[T] {
        &self.chain
    }

    /// Returns `true` if an element equal to `value` is in the chain.
    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.position(value).is_some()
    }

    /// Insert `value` unless an equal element is already present.
    ///
    /// Returns `true` if the element was inserted.
    #[inline]
    pub fn insert(&mut self, value: T) -> bool
    where
        T: Eq,
    {
        if self.contains(&value) {
            return false;
        }

        self.chain.push(value);
        true
    }

    /// Remove the element equal to `value`.
    ///
    /// Returns `true` if an element was removed.
    #[inline]
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        match self.position(value) {
            Some(i) => {
                self.chain.swap_remove(i);
                true
            }
            None => false,
        }
    }

    /// Append an element that is known to be absent.
    ///
    /// Only used while rehashing, where elements come from another chain of the
    /// same set and are therefore unique.
    #[inline]
    pub fn push_unique(&mut self, value: T) {
        self.chain.push(value);
    }

    /// Remove and return every element for which `stays` returns `false`.
    pub fn split_off(&mut self, mut stays: impl FnMut(&T) -> bool) -> Vec<T> {
        let (kept, moved) = mem::take(&mut self.chain)
            .into_iter()
            .partition(|value| stays(value));

        self.chain = kept;
        moved
    }

    fn position<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.chain.iter().position(|x| x.borrow() == value)
    }
}

/// An array of chains.
///
/// Every element lives in the bucket selected by the owner's index function,
/// which is a function of the current table length.
#[derive(Debug)]
pub struct Table<T> {
    buckets: Vec<Bucket<T>>,
}

impl<T> Table<T> {
    /// Allocate a table with `capacity` empty buckets.
    pub fn new(capacity: usize) -> Table<T> {
        Table {
            buckets: (0..capacity).map(|_| Bucket::default()).collect(),
        }
    }

    /// Returns the number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub fn bucket(&self, i: usize) -> &Bucket<T> {
        &self.buckets[i]
    }

    #[inline]
    pub fn bucket_mut(&mut self, i: usize) -> &mut Bucket<T> {
        &mut self.buckets[i]
    }

    #[cfg(test)]
    pub fn buckets(&self) -> impl Iterator<Item = &Bucket<T>> {
        self.buckets.iter()
    }

    /// Returns the total number of elements across all chains.
    pub fn count(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    /// Grow the table to `capacity` buckets, rehashing every element with
    /// `index`, which must map into the grown table.
    ///
    /// Existing buckets are split in place: an element either stays in its
    /// bucket or moves into one of the newly appended buckets.
    pub fn grow(&mut self, capacity: usize, index: impl Fn(&T) -> usize) {
        let old = self.buckets.len();
        debug_assert!(capacity >= old);

        self.buckets.resize_with(capacity, Bucket::default);

        for i in 0..old {
            let moved = self.buckets[i].split_off(|value| index(value) == i);

            for value in moved {
                let j = index(&value);
                debug_assert!(j >= old, "element moved into an existing bucket");
                self.buckets[j].push_unique(value);
            }
        }
    }
}
