use crate::raw::{self, table::Bucket, table::Table};
use crate::{Builder, FromBuilder, ResizePolicy, Set, DEFAULT_CAPACITY};

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

/// A concurrent hash set with a fixed array of stripe locks.
///
/// The set is created with one stripe per initial bucket, and the number of
/// stripes never changes. A stripe guards every bucket whose index is congruent
/// to it modulo the stripe count. Because the capacity is only ever doubled from
/// its initial value, `hash mod capacity` and `hash mod stripes` always agree on
/// the stripe, so an element's stripe is stable across resizes and operations
/// on different stripes proceed in parallel.
///
/// A resize acquires every stripe in ascending order, rehashes, and releases
/// them. Threads blocked on a stripe during a resize observe the new capacity
/// once they acquire it.
///
/// # Examples
///
/// ```
/// use chainset::StripedSet;
/// use std::thread;
///
/// let set = StripedSet::with_capacity(4);
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
/// assert!(set.capacity() > 4);
/// ```
pub struct StripedSet<T, S = RandomState> {
    // Stripe `s` owns the buckets `s, s + stripes, s + 2 * stripes, ...`, stored
    // densely: bucket `b` lives at slot `b / stripes` of its stripe's table.
    stripes: Box<[Mutex<Table<T>>]>,

    // The total number of buckets, a multiple of `stripes.len()`.
    //
    // Only written while holding every stripe lock.
    capacity: AtomicUsize,

    // The number of elements, only modified while holding the element's stripe.
    count: AtomicUsize,

    hasher: S,
    resize_policy: ResizePolicy,
}

impl<T> StripedSet<T> {
    /// Creates an empty `StripedSet` with `capacity` buckets and as many stripes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> StripedSet<T> {
        StripedSet::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Returns a builder for a `StripedSet`.
    pub fn builder() -> Builder {
        Builder::new()
    }
}

impl<T, S> StripedSet<T, S> {
    /// Creates an empty `StripedSet` with `capacity` buckets and as many
    /// stripes, using `hasher` to hash elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> StripedSet<T, S> {
        Builder::new().capacity(capacity).hasher(hasher).build()
    }

    /// Returns the number of elements in the set.
    ///
    /// This acquires every stripe, waiting for in-flight operations to finish.
    pub fn len(&self) -> usize {
        let _stripes = self.lock_all();
        self.count.load(Ordering::Relaxed)
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Returns the number of stripe locks.
    #[inline]
    pub fn stripes(&self) -> usize {
        self.stripes.len()
    }

    /// Returns a reference to the set's hasher.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    // Acquire every stripe in ascending order.
    //
    // Any thread that holds more than one stripe acquires them through this
    // method, so the fixed order rules out deadlock.
    fn lock_all(&self) -> Vec<parking_lot::MutexGuard<'_, Table<T>>> {
        self.stripes.iter().map(|stripe| stripe.lock()).collect()
    }
}

impl<T, S> StripedSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Adds a value to the set.
    ///
    /// Returns `true` if the value was inserted, or `false` if an equal value
    /// was already present. If the resize policy is exceeded afterwards, the
    /// calling thread resizes the set before returning.
    pub fn add(&self, value: T) -> bool {
        let hash = raw::hash(&self.hasher, &value);

        let (inserted, capacity) = self.with_bucket(hash, |bucket| {
            let inserted = bucket.insert(value);
            if inserted {
                self.count.fetch_add(1, Ordering::Relaxed);
            }
            inserted
        });

        // An unsynchronized check, the resize re-validates under the locks.
        if inserted
            && self
                .resize_policy
                .should_grow(self.count.load(Ordering::Relaxed), capacity)
        {
            self.resize(capacity);
        }

        inserted
    }

    /// Removes a value from the set, returning `true` if it was present.
    pub fn remove<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = raw::hash(&self.hasher, value);

        let (removed, _) = self.with_bucket(hash, |bucket| {
            let removed = bucket.remove(value);
            if removed {
                self.count.fetch_sub(1, Ordering::Relaxed);
            }
            removed
        });

        removed
    }

    /// Returns `true` if the set contains the value.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = raw::hash(&self.hasher, value);
        self.with_bucket(hash, |bucket| bucket.contains(value)).0
    }

    // Run `f` on the bucket for `hash` while holding its stripe.
    //
    // Returns the result of `f` along with the capacity it ran under.
    #[inline]
    fn with_bucket<R>(&self, hash: u64, f: impl FnOnce(&mut Bucket<T>) -> R) -> (R, usize) {
        let stripes = self.stripes.len();
        let mut table = self.stripes[raw::index(hash, stripes)].lock();

        // The capacity cannot change while we hold a stripe.
        let capacity = self.capacity.load(Ordering::Relaxed);
        let slot = raw::index(hash, capacity) / stripes;

        (f(table.bucket_mut(slot)), capacity)
    }

    // Grow the set, given the capacity that was observed to exceed the policy.
    #[cold]
    #[inline(never)]
    fn resize(&self, observed: usize) {
        let mut tables = self.lock_all();

        let from = self.capacity.load(Ordering::Relaxed);

        // Someone else resized while we were acquiring the stripes.
        if from != observed {
            tracing::trace!(observed, current = from, "striped resize already performed");
            return;
        }

        let len = self.count.load(Ordering::Relaxed);
        let mut to = from;
        while self.resize_policy.should_grow(len, to) {
            to = raw::doubled(to);
        }

        if to == from {
            return;
        }

        let stripes = self.stripes.len();
        for table in tables.iter_mut() {
            table.grow(to / stripes, |value| {
                raw::index(raw::hash(&self.hasher, value), to) / stripes
            });
        }

        // Readers of the capacity without a stripe use `Acquire`.
        self.capacity.store(to, Ordering::Release);

        tracing::debug!(from, to, len, "resized striped set");
    }
}

impl<T, S> FromBuilder<S> for StripedSet<T, S> {
    fn from_builder(builder: Builder<S>) -> StripedSet<T, S> {
        let (capacity, hasher, resize_policy) = builder.into_parts();

        StripedSet {
            // Every stripe starts out with a single bucket.
            stripes: (0..capacity).map(|_| Mutex::new(Table::new(1))).collect(),
            capacity: AtomicUsize::new(capacity),
            count: AtomicUsize::new(0),
            hasher,
            resize_policy,
        }
    }
}

impl<T, S> Set<T> for StripedSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn add(&self, value: T) -> bool {
        StripedSet::add(self, value)
    }

    fn remove(&self, value: &T) -> bool {
        StripedSet::remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        StripedSet::contains(self, value)
    }

    fn len(&self) -> usize {
        StripedSet::len(self)
    }

    fn capacity(&self) -> usize {
        StripedSet::capacity(self)
    }
}

impl<T, S> Default for StripedSet<T, S>
where
    S: Default,
{
    fn default() -> StripedSet<T, S> {
        StripedSet::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<T, S> fmt::Debug for StripedSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripedSet")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("stripes", &self.stripes())
            .field("resize_policy", &self.resize_policy)
            .finish()
    }
}

impl<T, S> Extend<T> for &StripedSet<T, S>
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

impl<T, S> FromIterator<T> for StripedSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> StripedSet<T, S> {
        let set = StripedSet::default();
        (&set).extend(iter);
        set
    }
}
