mod in_flight;
mod thread_id;

pub use in_flight::InFlight;
pub use thread_id::current as thread_id;

use std::hint;
use std::sync::atomic::{AtomicU32, Ordering};

// Block the current thread until `should_wait` returns `false` for the value of `atomic`.
//
// Waits are expected to be short (a rehash or a bucket critical section), so spin for
// a bit before parking on the atomic. Anyone changing `atomic` to a value that ends
// the wait must call `atomic_wait::wake_all` afterwards.
pub fn wait_while(atomic: &AtomicU32, should_wait: impl Fn(u32) -> bool) {
    // Avoid spinning in tests, which can hide race conditions.
    const SPIN_WAIT: usize = if cfg!(any(test, debug_assertions)) {
        1
    } else {
        7
    };

    for spun in 0.. {
        // `Acquire` synchronizes with the `Release` store that ended the wait,
        // making the writer's modifications visible.
        let value = atomic.load(Ordering::Acquire);

        if !should_wait(value) {
            return;
        }

        if spun <= SPIN_WAIT {
            for _ in 0..(spun * spun) {
                hint::spin_loop();
            }

            continue;
        }

        // Returns immediately if the value already changed, so a wake that
        // raced with the load above is not lost.
        atomic_wait::wait(atomic, value);
    }
}
