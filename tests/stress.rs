// adapted from: https://github.com/jonhoo/flurry/tree/main/tests/jdk

use chainset::{CoarseSet, RefinableSet, Set, StripedSet};
use rand::prelude::*;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;

mod common;
use common::{threads, with_concurrent_set, SharedSet};

// Run the test on every concurrent set, starting out with `capacity` buckets.
fn with_capacity<T>(capacity: usize, mut test: impl FnMut(SharedSet<T>))
where
    T: std::hash::Hash + Eq + Send + 'static,
{
    test(Box::new(CoarseSet::<T>::with_capacity(capacity)));
    test(Box::new(StripedSet::<T>::with_capacity(capacity)));
    test(Box::new(RefinableSet::<T>::with_capacity(capacity)));
}

#[test]
fn twenty_threads_from_four_buckets() {
    const THREADS: usize = 20;

    with_capacity::<usize>(4, |set| {
        let barrier = Barrier::new(THREADS);

        thread::scope(|s| {
            for i in 0..THREADS {
                let (set, barrier) = (&set, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    assert!(set.add(i));
                });
            }
        });

        assert_eq!(set.len(), THREADS);
        for i in 0..THREADS {
            assert!(set.contains(&i));
        }
        assert!(set.capacity() >= 16);
    });
}

#[test]
fn contains_during_remove() {
    const ITERATIONS: usize = if cfg!(miri) { 1 } else { 64 };

    with_concurrent_set::<usize>(|set| {
        for _ in 0..ITERATIONS {
            let set = set();
            set.add(7);

            let barrier = Barrier::new(2);
            let removed = AtomicBool::new(false);

            thread::scope(|s| {
                s.spawn(|| {
                    barrier.wait();
                    assert!(set.remove(&7));
                    removed.store(true, Ordering::Release);
                });

                s.spawn(|| {
                    barrier.wait();

                    // The element is observed present until it is observed absent, and
                    // absent for certain once the removal has returned.
                    let mut seen_absent = false;
                    loop {
                        let done = removed.load(Ordering::Acquire);
                        let present = set.contains(&7);
                        assert!(!(seen_absent && present), "element reappeared");
                        seen_absent |= !present;

                        if done {
                            assert!(!present);
                            break;
                        }
                    }
                });
            });

            assert!(set.is_empty());
        }
    });
}

#[test]
fn contains_stress() {
    const ITERATIONS: usize = if cfg!(miri) { 1 } else { 16 };
    const ENTRIES: usize = if cfg!(miri) { 64 } else { 1 << 10 };
    const ROUNDS: usize = if cfg!(miri) { 1 } else { 16 };

    with_concurrent_set::<usize>(|set| {
        let set = set();
        let mut content = [0; ENTRIES];

        for k in 0..ENTRIES {
            set.add(k);
            content[k] = k;
        }

        for _ in 0..ITERATIONS {
            let threads = threads().min(8);
            let barrier = Barrier::new(threads);
            thread::scope(|s| {
                for _ in 0..threads {
                    s.spawn(|| {
                        barrier.wait();
                        for i in 0..ENTRIES * ROUNDS {
                            let key = content[i % content.len()];
                            assert!(set.contains(&key));
                        }
                    });
                }
            });
        }
    });
}

#[test]
fn add_stress() {
    const ITERATIONS: usize = if cfg!(miri) { 1 } else { 16 };
    const ENTRIES: usize = if cfg!(miri) { 64 } else { 1 << 12 };

    #[derive(Hash, PartialEq, Eq, Clone, Copy)]
    struct Key {
        _data: usize,
    }

    impl Key {
        pub fn new() -> Self {
            let mut rng = rand::thread_rng();
            Self { _data: rng.gen() }
        }
    }

    with_concurrent_set::<Key>(|set| {
        for _ in 0..ITERATIONS {
            let set = set();
            let threads = threads().min(8);
            let barrier = Barrier::new(threads);
            let added = AtomicUsize::new(0);

            thread::scope(|s| {
                for _ in 0..threads {
                    s.spawn(|| {
                        barrier.wait();
                        for _ in 0..ENTRIES {
                            let key = Key::new();
                            if set.add(key) {
                                added.fetch_add(1, Ordering::Relaxed);
                            }
                            assert!(set.contains(&key));
                        }
                    });
                }
            });

            assert_eq!(set.len(), added.load(Ordering::Relaxed));
        }
    });
}

#[test]
fn mixed_stress() {
    const ITERATIONS: usize = if cfg!(miri) { 1 } else { 8 };
    const CHUNK: usize = if cfg!(miri) { 48 } else { 1 << 12 };

    let run = |barrier: &Barrier, t: usize, set: &SharedSet<usize>| {
        barrier.wait();

        let (start, end) = (CHUNK * t, CHUNK * (t + 1));

        for i in start..end {
            assert!(set.add(i));
        }

        for i in start..end {
            assert!(set.contains(&i));
            assert!(!set.add(i));
        }

        for i in start..end {
            assert!(set.remove(&i));
        }

        for i in start..end {
            assert!(!set.contains(&i));
            assert!(!set.remove(&i));
        }

        for i in start..end {
            assert!(set.add(i));
        }

        for i in start..end {
            assert!(set.contains(&i));
        }
    };

    with_concurrent_set::<usize>(|set| {
        for _ in 0..ITERATIONS {
            let set = set();
            let threads = threads().min(8);
            let barrier = Barrier::new(threads);

            thread::scope(|s| {
                for t in 0..threads {
                    let set = &set;
                    let barrier = &barrier;

                    s.spawn(move || run(barrier, t, set));
                }
            });

            assert_eq!(set.len(), CHUNK * threads);
            for i in 0..CHUNK * threads {
                assert!(set.contains(&i));
            }
        }
    });
}

#[test]
fn len_during_add() {
    const PER_THREAD: usize = if cfg!(miri) { 64 } else { 1 << 14 };

    with_concurrent_set::<usize>(|set| {
        let set = set();
        let writers = threads().clamp(2, 8);
        let total = writers * PER_THREAD;

        let barrier = Barrier::new(writers + 1);
        let finished = AtomicUsize::new(0);

        thread::scope(|s| {
            for t in 0..writers {
                let (set, barrier, finished) = (&set, &barrier, &finished);
                s.spawn(move || {
                    barrier.wait();
                    for i in t * PER_THREAD..(t + 1) * PER_THREAD {
                        assert!(set.add(i));
                    }
                    finished.fetch_add(1, Ordering::Release);
                });
            }

            s.spawn(|| {
                barrier.wait();

                // Additions only, so every observed length is bounded by the total and
                // no smaller than the one observed before it.
                let mut last = 0;
                let mut reads = 0;
                loop {
                    let done = finished.load(Ordering::Acquire) == writers;
                    let len = set.len();
                    assert!(len >= last, "len went from {last} to {len}");
                    assert!(len <= total, "len {len} exceeds {total}");
                    last = len;
                    reads += 1;

                    if done {
                        assert_eq!(len, total);
                        break;
                    }
                }

                debug!("{reads} concurrent reads of len");
            });
        });

        assert_eq!(set.len(), total);
    });
}

// Every thread toggles the same small set of keys. In any linearization, the successful
// additions and removals of a key alternate, starting with an addition, so their counts
// differ by exactly the key's final membership.
#[test]
fn alternating_add_remove() {
    const KEYS: usize = 32;
    const OPERATIONS: usize = if cfg!(miri) { 64 } else { 1 << 14 };

    with_concurrent_set::<usize>(|set| {
        let set = set();
        let threads = threads().max(2);
        let barrier = Barrier::new(threads);

        let added: Vec<_> = (0..KEYS).map(|_| AtomicUsize::new(0)).collect();
        let removed: Vec<_> = (0..KEYS).map(|_| AtomicUsize::new(0)).collect();

        thread::scope(|s| {
            for t in 0..threads {
                let (set, barrier, added, removed) = (&set, &barrier, &added, &removed);

                s.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(t as u64);
                    barrier.wait();

                    for _ in 0..OPERATIONS {
                        let key = rng.gen_range(0..KEYS);
                        if rng.gen_bool(0.5) {
                            if set.add(key) {
                                added[key].fetch_add(1, Ordering::Relaxed);
                            }
                        } else if set.remove(&key) {
                            removed[key].fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        let mut len = 0;
        for key in 0..KEYS {
            let added = added[key].load(Ordering::Relaxed);
            let removed = removed[key].load(Ordering::Relaxed);
            let present = set.contains(&key);

            debug!("key {key}: added {added}, removed {removed}, present {present}");
            assert_eq!(added - removed, present as usize, "key {key}");
            len += present as usize;
        }

        assert_eq!(set.len(), len);
    });
}

const SIZE: usize = if cfg!(miri) { 12 } else { 50_000 };

// there must be more things absent than present!
const ABSENT_SIZE: usize = if cfg!(miri) { 1 << 5 } else { 1 << 17 };
const ABSENT_MASK: usize = ABSENT_SIZE - 1;

fn t1(set: &dyn Set<usize>, keys: &[usize], expect: usize) {
    let mut sum = 0;
    let iters = 4;
    for _ in 0..iters {
        for key in keys {
            if set.contains(key) {
                sum += 1;
            }
        }
    }
    assert_eq!(sum, expect * iters);
}

fn t2(set: &dyn Set<usize>, keys: &[usize], expect: usize) {
    let mut sum = 0;
    for key in keys {
        if set.remove(key) {
            sum += 1;
        }
    }
    assert_eq!(sum, expect);
}

fn t3(set: &dyn Set<usize>, keys: &[usize], expect: usize) {
    let mut sum = 0;
    for &key in keys {
        if set.add(key) {
            sum += 1;
        }
    }
    assert_eq!(sum, expect);
}

fn t4(set: &dyn Set<usize>, keys: &[usize], expect: usize) {
    let mut sum = 0;
    for key in keys {
        if set.contains(key) {
            sum += 1;
        }
    }
    assert_eq!(sum, expect);
}

fn t5(set: &dyn Set<usize>, keys: &[usize], expect: usize) {
    let mut sum = 0;
    let mut i = keys.len() as isize - 2;
    while i >= 0 {
        if set.remove(&keys[i as usize]) {
            sum += 1;
        }
        i -= 2;
    }
    assert_eq!(sum, expect);
}

fn t6(set: &dyn Set<usize>, keys1: &[usize], keys2: &[usize], expect: usize) {
    let mut sum = 0;
    for i in 0..expect {
        if set.contains(&keys1[i]) {
            sum += 1;
        }
        if set.contains(&keys2[i & ABSENT_MASK]) {
            sum += 1;
        }
    }
    assert_eq!(sum, expect);
}

fn t7(set: &dyn Set<usize>, k1: &[usize], k2: &[usize]) {
    let mut sum = 0;
    for i in 0..k1.len() {
        if set.contains(&k1[i]) {
            sum += 1;
        }
        if set.contains(&k2[i]) {
            sum += 1;
        }
    }
    assert_eq!(sum, k1.len());
}

#[test]
fn everything() {
    let mut rng = rand::thread_rng();

    with_concurrent_set::<usize>(|set| {
        let set = set();
        let set = &*set as &dyn Set<usize>;

        let mut keys: Vec<_> = (0..ABSENT_SIZE + SIZE).collect();
        keys.shuffle(&mut rng);
        let absent_keys = &keys[0..ABSENT_SIZE];
        let keys = &keys[ABSENT_SIZE..];

        // add (absent)
        t3(set, keys, SIZE);
        // add (present)
        t3(set, keys, 0);
        // contains (present & absent)
        t7(set, keys, absent_keys);
        // contains (present)
        t4(set, keys, SIZE);
        // contains (absent)
        t4(set, absent_keys, 0);
        // contains (mixed)
        t6(set, keys, absent_keys, SIZE);
        // contains (present, repeated)
        t1(set, keys, SIZE);
        // contains (absent, repeated)
        t1(set, absent_keys, 0);
        // remove (absent)
        t2(set, absent_keys, 0);
        // remove (present)
        t5(set, keys, SIZE / 2);
        // add (half present)
        t3(set, keys, SIZE / 2);
        // len
        assert_eq!(set.len(), SIZE);
    });
}
