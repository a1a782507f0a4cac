use std::collections::hash_map::RandomState;
use std::fmt;

/// The initial capacity used by `Default` implementations and [`Builder::new`].
pub const DEFAULT_CAPACITY: usize = 16;

/// The operations shared by every set in this crate.
///
/// Each locking strategy implements the same contract, so callers can be written
/// against `&dyn Set<T>` and stay agnostic to the strategy they were handed.
///
/// # Examples
///
/// ```
/// use chainset::{RefinableSet, Set, StripedSet};
///
/// fn fill(set: &dyn Set<u64>) {
///     for i in 0..32 {
///         assert!(set.add(i));
///     }
/// }
///
/// let striped: StripedSet<u64> = StripedSet::with_capacity(4);
/// let refinable: RefinableSet<u64> = RefinableSet::with_capacity(4);
/// fill(&striped);
/// fill(&refinable);
/// assert_eq!(striped.len(), refinable.len());
/// ```
pub trait Set<T> {
    /// Adds a value to the set.
    ///
    /// Returns `true` if the value was absent and is now present, or `false`
    /// if an equal value was already present. May grow the set.
    fn add(&self, value: T) -> bool;

    /// Removes a value from the set.
    ///
    /// Returns `true` if the value was present and is now absent.
    fn remove(&self, value: &T) -> bool;

    /// Returns `true` if the set contains the value.
    fn contains(&self, value: &T) -> bool;

    /// Returns the number of elements in the set.
    ///
    /// The result is the number of elements present at some instant during the
    /// call. Concurrent strategies may block until in-flight modifications finish.
    fn len(&self) -> usize;

    /// Returns the current number of buckets.
    fn capacity(&self) -> usize;

    /// Returns `true` if the set contains no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// When a set doubles its bucket count.
///
/// Concurrent sets evaluate the policy without mutual exclusion, so it is a hint
/// rather than an exact bound. The thread that performs a resize re-evaluates the
/// policy afterwards and keeps doubling until it is satisfied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizePolicy {
    /// Grow once the set holds at least `n` elements per bucket on average,
    /// i.e. `len >= n * capacity`.
    ///
    /// `LoadFactor(1)` is the default.
    LoadFactor(usize),

    /// Grow once at least one in `n` buckets would be occupied on average,
    /// i.e. `len * n >= capacity`.
    ///
    /// `n` may not exceed [`ResizePolicy::MAX_SPARSE_FACTOR`].
    Sparse(usize),

    /// Never grow. Chains lengthen without bound.
    Fixed,
}

impl Default for ResizePolicy {
    fn default() -> ResizePolicy {
        ResizePolicy::LoadFactor(1)
    }
}

impl ResizePolicy {
    /// The largest factor accepted for [`ResizePolicy::Sparse`].
    pub const MAX_SPARSE_FACTOR: usize = 1 << 16;

    /// Returns `true` if a set with `len` elements and `capacity` buckets should grow.
    ///
    /// A capacity that cannot be doubled without overflow never grows.
    #[inline]
    pub fn should_grow(self, len: usize, capacity: usize) -> bool {
        if capacity > usize::MAX / 2 {
            return false;
        }

        match self {
            ResizePolicy::LoadFactor(n) => capacity
                .checked_mul(n)
                .map_or(false, |limit| len >= limit),
            ResizePolicy::Sparse(n) => {
                len > 0 && len.checked_mul(n).map_or(true, |used| used >= capacity)
            }
            ResizePolicy::Fixed => false,
        }
    }

    fn validate(self) {
        match self {
            ResizePolicy::LoadFactor(0) | ResizePolicy::Sparse(0) => {
                panic!("resize policy factor must be positive")
            }
            ResizePolicy::Sparse(n) if n > ResizePolicy::MAX_SPARSE_FACTOR => {
                panic!(
                    "sparse resize factor must not exceed {}",
                    ResizePolicy::MAX_SPARSE_FACTOR
                )
            }
            _ => {}
        }
    }
}

/// A builder for any of the sets in this crate.
///
/// # Examples
///
/// ```rust
/// use chainset::{Builder, ResizePolicy, StripedSet};
/// use std::collections::hash_map::RandomState;
///
/// let set: StripedSet<i32> = Builder::new()
///     // Set the initial capacity, which is also the number of stripes.
///     .capacity(64)
///     // Set the hasher.
///     .hasher(RandomState::new())
///     // Grow once the average chain holds four elements.
///     .resize_policy(ResizePolicy::LoadFactor(4))
///     // Construct the set.
///     .build();
///
/// assert_eq!(set.capacity(), 64);
/// ```
pub struct Builder<S = RandomState> {
    capacity: usize,
    hasher: S,
    resize_policy: ResizePolicy,
}

impl Builder {
    /// Returns a builder with the default capacity, hasher, and resize policy.
    pub fn new() -> Builder {
        Builder {
            capacity: DEFAULT_CAPACITY,
            hasher: RandomState::new(),
            resize_policy: ResizePolicy::default(),
        }
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::new()
    }
}

impl<S> Builder<S> {
    /// Set the initial number of buckets.
    ///
    /// For [`StripedSet`](crate::StripedSet) this is also the number of stripes,
    /// which stays fixed as the set grows.
    pub fn capacity(self, capacity: usize) -> Builder<S> {
        Builder { capacity, ..self }
    }

    /// Set the hash builder used to hash elements.
    ///
    /// The hasher only ever selects a bucket (and a stripe) for an element, it must
    /// be deterministic for the lifetime of the set.
    pub fn hasher<H>(self, hasher: H) -> Builder<H> {
        Builder {
            hasher,
            capacity: self.capacity,
            resize_policy: self.resize_policy,
        }
    }

    /// Set the resize policy. See [`ResizePolicy`] for details.
    pub fn resize_policy(self, resize_policy: ResizePolicy) -> Builder<S> {
        Builder {
            resize_policy,
            ..self
        }
    }

    /// Construct a set from the builder, using the configured options.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is zero, if the resize policy has a zero factor, or
    /// if a sparse factor exceeds [`ResizePolicy::MAX_SPARSE_FACTOR`].
    pub fn build<C>(self) -> C
    where
        C: FromBuilder<S>,
    {
        C::from_builder(self)
    }

    fn validate(self) -> Builder<S> {
        assert!(self.capacity > 0, "initial capacity must be positive");
        self.resize_policy.validate();
        self
    }

    // Validate the options and split them out for a set constructor.
    pub(crate) fn into_parts(self) -> (usize, S, ResizePolicy) {
        let builder = self.validate();
        (builder.capacity, builder.hasher, builder.resize_policy)
    }
}

impl<S> fmt::Debug for Builder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("capacity", &self.capacity)
            .field("resize_policy", &self.resize_policy)
            .finish()
    }
}

/// A set that can be constructed from a [`Builder`].
pub trait FromBuilder<S>: Sized {
    /// Construct the set from the builder.
    ///
    /// # Panics
    ///
    /// Panics if the builder's options are invalid, see [`Builder::build`].
    fn from_builder(builder: Builder<S>) -> Self;
}
