use crate::raw::resize::ResizeState;
use crate::raw::table::Bucket;
use crate::raw::utils::InFlight;
use crate::raw;
use crate::{Builder, FromBuilder, ResizePolicy, Set, DEFAULT_CAPACITY};

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

// The lock array. Each bucket's chain lives inside its own lock.
type Locks<T> = Arc<[Arc<Mutex<Bucket<T>>>]>;

/// A concurrent hash set with one lock per bucket, where the lock array itself
/// grows with the table.
///
/// Operations only ever hold a single bucket lock. A resize doubles both the
/// buckets and their locks while other operations are in flight:
///
/// - One thread claims resize ownership with a compare-and-set. Threads that
///   lose the claim carry on without waiting.
/// - The owner acquires and immediately releases every bucket lock in ascending
///   order. Once it has passed every lock, no operation is mid-way through a bucket.
/// - The owner splits every bucket into the doubled table, appends the new
///   bucket locks, and publishes the grown lock array under an exclusive guard.
/// - Finally the owner publishes the new capacity and releases ownership.
///
/// An operation validates, after acquiring its bucket lock, that no resize is in
/// progress and that the capacity it computed its bucket from is still current.
/// If validation fails it releases the lock, waits for the resize, and retries, so
/// any lock held past validation belongs to the live layout.
///
/// # Examples
///
/// ```
/// use chainset::RefinableSet;
/// use std::thread;
///
/// let set = RefinableSet::with_capacity(4);
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
pub struct RefinableSet<T, S = RandomState> {
    // Guards the lock array. Operations hold it shared only long enough to clone a
    // bucket's lock, the resize owner holds it exclusively to swap in the grown array.
    locks: RwLock<Locks<T>>,

    // The number of buckets the live layout is hashed against.
    //
    // Published after the lock array, so the array is never shorter than the
    // capacity a reader observes.
    capacity: AtomicUsize,

    // The number of elements, only modified while holding a bucket lock.
    count: AtomicUsize,

    // Add and remove operations between entry and release of their bucket.
    in_flight: InFlight,

    resize: ResizeState,
    hasher: S,
    resize_policy: ResizePolicy,
}

impl<T> RefinableSet<T> {
    /// Creates an empty `RefinableSet` with `capacity` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> RefinableSet<T> {
        RefinableSet::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Returns a builder for a `RefinableSet`.
    pub fn builder() -> Builder {
        Builder::new()
    }
}

impl<T, S> RefinableSet<T, S> {
    /// Creates an empty `RefinableSet` with `capacity` buckets, using `hasher`
    /// to hash elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> RefinableSet<T, S> {
        Builder::new().capacity(capacity).hasher(hasher).build()
    }

    /// Returns the number of elements in the set.
    ///
    /// This blocks until no additions or removals are in flight, and returns the
    /// number of elements at that instant.
    pub fn len(&self) -> usize {
        self.in_flight.wait_quiescent();
        self.count.load(Ordering::Acquire)
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current number of buckets, which is also the number of locks.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Returns a reference to the set's hasher.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<T, S> RefinableSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Adds a value to the set.
    ///
    /// Returns `true` if the value was inserted, or `false` if an equal value
    /// was already present. If the resize policy is exceeded afterwards, the
    /// calling thread attempts to claim and perform the resize.
    pub fn add(&self, value: T) -> bool {
        let hash = raw::hash(&self.hasher, &value);

        let (inserted, capacity) = {
            let _modifying = self.in_flight.enter();

            self.with_bucket(hash, |bucket| {
                let inserted = bucket.insert(value);
                if inserted {
                    self.count.fetch_add(1, Ordering::Relaxed);
                }
                inserted
            })
        };

        // An unsynchronized check, the owner re-validates the capacity.
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
        let _modifying = self.in_flight.enter();

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

    // Run `f` on the bucket for `hash` while holding its validated lock.
    //
    // Returns the result of `f` along with the capacity it ran under.
    #[inline]
    fn with_bucket<R>(&self, hash: u64, f: impl FnOnce(&mut Bucket<T>) -> R) -> (R, usize) {
        loop {
            let capacity = self.capacity.load(Ordering::Acquire);

            // Never hold the array guard while acquiring a bucket lock, the resize
            // owner takes them in the opposite order.
            let lock = self.locks.read()[raw::index(hash, capacity)].clone();
            let mut bucket = lock.lock();

            if !self.validate(capacity) {
                drop(bucket);
                self.resize.wait();
                continue;
            }

            return (f(&mut bucket), capacity);
        }
    }

    // Returns `true` if a bucket lock chosen under `capacity` guards the live layout.
    //
    // The resize owner claims ownership before passing any bucket lock, and releases
    // it after publishing the capacity. Either check failing means the lock may not
    // guard its hashes anymore.
    #[inline]
    fn validate(&self, capacity: usize) -> bool {
        !self.resize.in_progress() && self.capacity.load(Ordering::Acquire) == capacity
    }

    // Grow the set, given the capacity that was observed to exceed the policy.
    #[cold]
    #[inline(never)]
    fn resize(&self, observed: usize) {
        let Some(_owner) = self.resize.try_claim() else {
            tracing::trace!(observed, "refinable resize already in progress");
            return;
        };

        // Someone else completed a resize since we observed the capacity.
        if self.capacity.load(Ordering::Acquire) != observed {
            tracing::trace!(observed, "refinable resize already performed");
            return;
        }

        let mut from = observed;
        loop {
            let locks = self.locks.read().clone();
            debug_assert_eq!(locks.len(), from);

            // Quiescence barrier: any operation that validated before we claimed
            // ownership holds its bucket lock until it is done, and any operation
            // that acquires a lock after we pass it fails validation.
            for lock in locks.iter() {
                drop(lock.lock());
            }

            let to = raw::doubled(from);
            let mut grown = (from..to).map(|_| Bucket::default()).collect::<Vec<_>>();

            for (i, lock) in locks.iter().enumerate() {
                let mut bucket = lock.lock();

                // Every element either stays at `i` or moves to `i + from`.
                for value in bucket.split_off(|value| self.index(value, to) == i) {
                    let j = self.index(&value, to);
                    grown[j - from].push_unique(value);
                }
            }

            let grown: Locks<T> = locks
                .iter()
                .cloned()
                .chain(grown.into_iter().map(|bucket| Arc::new(Mutex::new(bucket))))
                .collect();

            *self.locks.write() = grown;
            self.capacity.store(to, Ordering::Release);

            // Every completed modification happened before we passed its lock.
            let len = self.count.load(Ordering::Relaxed);
            tracing::debug!(from, to, len, "resized refinable set");

            // Threads whose claim lost to us may have pushed the set past the policy again.
            if !self.resize_policy.should_grow(len, to) {
                break;
            }

            from = to;
        }
    }

    #[inline]
    fn index(&self, value: &T, capacity: usize) -> usize {
        raw::index(raw::hash(&self.hasher, value), capacity)
    }
}

impl<T, S> FromBuilder<S> for RefinableSet<T, S> {
    fn from_builder(builder: Builder<S>) -> RefinableSet<T, S> {
        let (capacity, hasher, resize_policy) = builder.into_parts();

        RefinableSet {
            locks: RwLock::new(
                (0..capacity)
                    .map(|_| Arc::new(Mutex::new(Bucket::default())))
                    .collect(),
            ),
            capacity: AtomicUsize::new(capacity),
            count: AtomicUsize::new(0),
            in_flight: InFlight::default(),
            resize: ResizeState::new(),
            hasher,
            resize_policy,
        }
    }
}

impl<T, S> Set<T> for RefinableSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn add(&self, value: T) -> bool {
        RefinableSet::add(self, value)
    }

    fn remove(&self, value: &T) -> bool {
        RefinableSet::remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        RefinableSet::contains(self, value)
    }

    fn len(&self) -> usize {
        RefinableSet::len(self)
    }

    fn capacity(&self) -> usize {
        RefinableSet::capacity(self)
    }
}

impl<T, S> Default for RefinableSet<T, S>
where
    S: Default,
{
    fn default() -> RefinableSet<T, S> {
        RefinableSet::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<T, S> fmt::Debug for RefinableSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Avoid blocking on quiescence, a debug print may race with modifications.
        f.debug_struct("RefinableSet")
            .field("len", &self.count.load(Ordering::Relaxed))
            .field("capacity", &self.capacity())
            .field("in_flight", &self.in_flight.count())
            .field("resizing", &self.resize.in_progress())
            .field("resize_policy", &self.resize_policy)
            .finish()
    }
}

impl<T, S> Extend<T> for &RefinableSet<T, S>
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

impl<T, S> FromIterator<T> for RefinableSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> RefinableSet<T, S> {
        let set = RefinableSet::default();
        (&set).extend(iter);
        set
    }
}
