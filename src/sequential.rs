use crate::raw::chained::Chained;
use crate::{Builder, FromBuilder, ResizePolicy, Set, DEFAULT_CAPACITY};

use std::borrow::Borrow;
use std::cell::RefCell;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

/// A single-threaded chained hash set.
///
/// `SequentialSet` is the reference semantics for the concurrent sets in this
/// crate: every concurrent schedule must be explainable as some sequence of
/// operations on a `SequentialSet`. It shares the `&self` API of the other
/// strategies through interior mutability, and is therefore `Send` but not `Sync`.
///
/// The set grows synchronously inside [`add`](SequentialSet::add) whenever the
/// [`ResizePolicy`] asks for it.
///
/// # Examples
///
/// ```
/// use chainset::SequentialSet;
///
/// let set = SequentialSet::with_capacity(4);
/// assert!(set.add("a"));
/// assert!(!set.add("a"));
/// assert!(set.contains("a"));
/// assert!(set.remove("a"));
/// assert!(set.is_empty());
/// ```
pub struct SequentialSet<T, S = RandomState> {
    raw: RefCell<Chained<T>>,
    hasher: S,
    resize_policy: ResizePolicy,
}

impl<T> SequentialSet<T> {
    /// Creates an empty `SequentialSet` with `capacity` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> SequentialSet<T> {
        SequentialSet::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Returns a builder for a `SequentialSet`.
    pub fn builder() -> Builder {
        Builder::new()
    }
}

impl<T, S> SequentialSet<T, S> {
    /// Creates an empty `SequentialSet` with `capacity` buckets, using `hasher`
    /// to hash elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> SequentialSet<T, S> {
        Builder::new().capacity(capacity).hasher(hasher).build()
    }

    /// Returns the number of elements in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.borrow().len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current number of buckets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.borrow().capacity()
    }

    /// Returns a reference to the set's hasher.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<T, S> SequentialSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Adds a value to the set.
    ///
    /// Returns `true` if the value was inserted, or `false` if an equal value
    /// was already present.
    #[inline]
    pub fn add(&self, value: T) -> bool {
        self.raw
            .borrow_mut()
            .add(value, &self.hasher, self.resize_policy)
    }

    /// Removes a value from the set, returning `true` if it was present.
    #[inline]
    pub fn remove<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.borrow_mut().remove(value, &self.hasher)
    }

    /// Returns `true` if the set contains the value.
    #[inline]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.raw.borrow().contains(value, &self.hasher)
    }
}

impl<T, S> FromBuilder<S> for SequentialSet<T, S> {
    fn from_builder(builder: Builder<S>) -> SequentialSet<T, S> {
        let (capacity, hasher, resize_policy) = builder.into_parts();

        SequentialSet {
            raw: RefCell::new(Chained::new(capacity)),
            hasher,
            resize_policy,
        }
    }
}

impl<T, S> Set<T> for SequentialSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn add(&self, value: T) -> bool {
        SequentialSet::add(self, value)
    }

    fn remove(&self, value: &T) -> bool {
        SequentialSet::remove(self, value)
    }

    fn contains(&self, value: &T) -> bool {
        SequentialSet::contains(self, value)
    }

    fn len(&self) -> usize {
        SequentialSet::len(self)
    }

    fn capacity(&self) -> usize {
        SequentialSet::capacity(self)
    }
}

impl<T, S> Default for SequentialSet<T, S>
where
    S: Default,
{
    fn default() -> SequentialSet<T, S> {
        SequentialSet::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default())
    }
}

impl<T, S> fmt::Debug for SequentialSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialSet")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("resize_policy", &self.resize_policy)
            .finish()
    }
}

impl<T, S> Extend<T> for SequentialSet<T, S>
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

impl<T, S> FromIterator<T> for SequentialSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> SequentialSet<T, S> {
        let mut set = SequentialSet::default();
        set.extend(iter);
        set
    }
}
