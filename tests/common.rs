#![allow(dead_code)]

use chainset::{
    Builder, CoarseSet, RefinableSet, ResizePolicy, SequentialSet, Set, StripedSet,
};

use std::hash::Hash;

pub type SharedSet<T> = Box<dyn Set<T> + Send + Sync>;

// Run the test on different configurations of every set, including `SequentialSet`.
pub fn with_set<T>(mut test: impl FnMut(&dyn Fn() -> Box<dyn Set<T>>))
where
    T: Hash + Eq + Send + 'static,
{
    test(&(|| -> Box<dyn Set<T>> { Box::new(SequentialSet::<T>::with_capacity(1)) }));
    with_concurrent_set::<T>(|set| test(&(|| -> Box<dyn Set<T>> { set() })));
}

// Run the test on different configurations of every concurrent set.
pub fn with_concurrent_set<T>(mut test: impl FnMut(&dyn Fn() -> SharedSet<T>))
where
    T: Hash + Eq + Send + 'static,
{
    // A single lock, no parallelism to interfere with.
    if !cfg!(chainset_stress) {
        test(&(|| -> SharedSet<T> { Box::new(CoarseSet::<T>::with_capacity(1)) }));
    }

    // A single stripe degenerates to a coarse-grained lock with a separate resize.
    if !cfg!(chainset_stress) {
        test(&(|| -> SharedSet<T> { Box::new(StripedSet::<T>::with_capacity(1)) }));
    }

    // Several stripes, each owning a growing number of buckets.
    test(&(|| -> SharedSet<T> { Box::new(StripedSet::<T>::with_capacity(4)) }));

    // A single bucket lock, so the first insertions contend on resize ownership.
    test(&(|| -> SharedSet<T> { Box::new(RefinableSet::<T>::with_capacity(1)) }));

    // Long chains and infrequent resizes.
    test(
        &(|| -> SharedSet<T> {
            let set: RefinableSet<T> = Builder::new()
                .capacity(16)
                .resize_policy(ResizePolicy::LoadFactor(4))
                .build();

            Box::new(set)
        }),
    );

    // A sparse table that resizes on almost every insertion early on.
    test(
        &(|| -> SharedSet<T> {
            let set: StripedSet<T> = Builder::new()
                .capacity(2)
                .resize_policy(ResizePolicy::Sparse(2))
                .build();

            Box::new(set)
        }),
    );
}

// Prints a log message if `RUST_LOG=debug` is set.
#[macro_export]
macro_rules! debug {
    ($($x:tt)*) => {
        if std::env::var("RUST_LOG").as_deref() == Ok("debug") {
            println!($($x)*);
        }
    };
}

// Returns the number of threads to use for stress testing.
pub fn threads() -> usize {
    if cfg!(miri) {
        2
    } else {
        num_cpus::get_physical().next_power_of_two()
    }
}
