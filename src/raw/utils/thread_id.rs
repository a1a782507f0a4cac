use std::cell::Cell;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

// The next identifier to hand out. Zero is reserved to mean "no thread".
static NEXT: AtomicU32 = AtomicU32::new(1);

thread_local! {
    static ID: Cell<Option<NonZeroU32>> = const { Cell::new(None) };
}

// Returns a process-wide identifier for the current thread.
//
// Identifiers are never reused. 2^32 - 1 threads is well beyond what a single
// process spawns, running out is treated as a bug.
pub fn current() -> NonZeroU32 {
    ID.with(|id| match id.get() {
        Some(id) => id,
        None => {
            let next = NEXT.fetch_add(1, Ordering::Relaxed);
            let new = NonZeroU32::new(next).expect("exhausted thread identifiers");
            id.set(Some(new));
            new
        }
    })
}
