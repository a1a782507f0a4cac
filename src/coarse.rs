use crate::raw::chained::Chained;
use crate::{Builder, FromBuilder, ResizePolicy, Set, DEFAULT_CAPACITY};

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use parking_lot::Mutex;

/// A concurrent hash set guarded by a single lock.
///
/// Every operation, including a resize triggered by [`add`](CoarseSet::add),
/// runs to completion while holding the lock. Operations are therefore totally
/// ordered and trivially linearizable, at the cost of any parallelism.
///
/// # Examples
///
/// ```
/// use chainset::CoarseSet;
/// use std::thread;
///
/// let set = CoarseSet::with_capacity(4);
///
/// thread::scope(|s| {
///     for t in 0..4 {
///         let set = &set;
///         s.spawn(move || {
///             for i in 0..16 {
///                 set.add(t * 16 + i);
///             }
///         });
///     }
/// });
///
/// assert_eq!(set.len(), 64);
/// ```
pub struct CoarseSet<T, S = RandomState> {
    raw: Mutex<Chained<T>>,
    hasher: S,
    resize_policy: ResizePolicy,
}

impl<T> CoarseSet<T> {
    /// Creates an empty `CoarseSet` with `capacity` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> CoarseSet<T> {
        CoarseSet::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Returns a builder for a `CoarseSet`.
    pub fn builder() -> Builder {
        Builder::new()
    }
}

impl<T, S> CoarseSet<T, S> {
    /// Creates an empty `CoarseSet` with `capacity` buckets, using `hasher`
    /// to hash elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> CoarseSet<T, S> {
        Builder::new().capacity(capacity).hasher(hasher).build()
    }

    /// Returns the number of elements in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.lock().len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.lock().capacity()
    }

    /// Returns a reference to the set's hasher.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<T, S> CoarseSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Adds a value to the set.
    ///
    /// Returns `true` if the value was inserted, or `false` if an equal value
    /// was already present. A resize, if required, happens before the lock is
    /// released.
    #[inline]
    pub fn add(&self, value: T) -> bool {
        self.raw.lock().add(value, &self.hasher, self.resize_policy)
    }

    /// Removes a value from the set, returning `true` if it was present.
    #[inline]
    pub fn remove<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.lock().remove(value, &self.hasher)
    }

    /// Returns `true` if the set contains the value.
    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.lock().contains(value, &self.hasher)
    }
}

impl<T, S> FromBuilder<S> for CoarseSet<T, S> {
    fn from_builder(builder: Builder<S>) -> CoarseSet<T, S> {
        let (capacity, hasher, resize_policy) = builder.into_parts();

        CoarseSet {
            raw: Mutex::new(Chained::new(capacity)),
            hasher,
            resize_policy,
        }
    }
}

impl<T, S> Set<T> for CoarseSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn add(&self, value: T) -> bool {
        CoarseSet::add(self, value)
    }

    fn remove(&self, value: &T) -> bool {
        CoarseSet::remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        CoarseSet::contains(self, value)
    }

    fn len(&self) -> usize {
        CoarseSet::len(self)
    }

    fn capacity(&self) -> usize {
        CoarseSet::capacity(self)
    }
}

impl<T, S> Default for CoarseSet<T, S>
where
    S: Default,
{
    fn default() -> CoarseSet<T, S> {
        CoarseSet::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<T, S> fmt::Debug for CoarseSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.raw.lock();

        f.debug_struct("CoarseSet")
            .field("len", &raw.len())
            .field("capacity", &raw.capacity())
            .field("resize_policy", &self.resize_policy)
            .finish()
    }
}

impl<T, S> Extend<T> for &CoarseSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl<T, S> FromIterator<T> for CoarseSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> CoarseSet<T, S> {
        let set = CoarseSet::default();
        (&set).extend(iter);
        set
    }
}
