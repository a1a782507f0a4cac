#![no_main]

use libfuzzer_sys::fuzz_target;

use arbitrary::Arbitrary;
use chainset::{Builder, CoarseSet, RefinableSet, ResizePolicy, SequentialSet, Set, StripedSet};
use std::collections::HashSet as StdHashSet;

#[derive(Debug, Arbitrary)]
enum Operation<T> {
    Add(T),
    Remove(T),
    Contains(T),
    Len,
    IsEmpty,
}

#[derive(Debug, Arbitrary)]
enum Policy {
    LoadFactor(u8),
    Sparse(u8),
    Fixed,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    capacity: u8,
    policy: Policy,
    operations: Vec<Operation<u16>>,
}

fn fuzz_sets(input: FuzzInput) {
    let capacity = usize::from(input.capacity).max(1);
    let policy = match input.policy {
        Policy::LoadFactor(n) => ResizePolicy::LoadFactor(usize::from(n % 8) + 1),
        Policy::Sparse(n) => ResizePolicy::Sparse(usize::from(n % 8) + 1),
        Policy::Fixed => ResizePolicy::Fixed,
    };

    let builder = || Builder::new().capacity(capacity).resize_policy(policy);
    let sets: [Box<dyn Set<u16>>; 4] = [
        Box::new(builder().build::<SequentialSet<u16>>()),
        Box::new(builder().build::<CoarseSet<u16>>()),
        Box::new(builder().build::<StripedSet<u16>>()),
        Box::new(builder().build::<RefinableSet<u16>>()),
    ];

    let mut std_set = StdHashSet::new();

    for op in input.operations {
        match op {
            Operation::Add(value) => {
                let std_result = std_set.insert(value);
                for set in &sets {
                    assert_eq!(std_result, set.add(value));
                }
            }
            Operation::Remove(value) => {
                let std_result = std_set.remove(&value);
                for set in &sets {
                    assert_eq!(std_result, set.remove(&value));
                }
            }
            Operation::Contains(value) => {
                let std_result = std_set.contains(&value);
                for set in &sets {
                    assert_eq!(std_result, set.contains(&value));
                }
            }
            Operation::Len => {
                for set in &sets {
                    assert_eq!(std_set.len(), set.len());
                }
            }
            Operation::IsEmpty => {
                for set in &sets {
                    assert_eq!(std_set.is_empty(), set.is_empty());
                }
            }
        }
    }

    // Final consistency checks
    for set in &sets {
        for value in std_set.iter() {
            assert!(set.contains(value));
        }
        assert_eq!(std_set.len(), set.len());

        // Every strategy doubles from the same capacity under the same policy.
        assert_eq!(sets[0].capacity(), set.capacity());
    }
}

fuzz_target!(|data: FuzzInput| {
    fuzz_sets(data);
});
