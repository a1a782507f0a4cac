use std::sync::atomic::{AtomicU32, Ordering};

use super::wait_while;

// A counter of operations currently modifying the set.
//
// Modifiers register for the span of their critical section, and readers that
// must not race with a modification wait for the count to drain to zero.
#[derive(Default)]
pub struct InFlight(AtomicU32);

impl InFlight {
    // Register a modification, which ends when the returned guard is dropped.
    #[inline]
    pub fn enter(&self) -> Modifying<'_> {
        let previous = self.0.fetch_add(1, Ordering::AcqRel);
        debug_assert!(previous < u32::MAX, "in-flight counter overflow");
        Modifying(self)
    }

    // Returns the number of modifications currently in flight.
    #[inline]
    pub fn count(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    // Block until no modifications are in flight.
    //
    // Note that this is not a barrier against new modifications, which may
    // begin as soon as this returns.
    pub fn wait_quiescent(&self) {
        wait_while(&self.0, |count| count != 0);
    }
}

// A registered modification.
pub struct Modifying<'a>(&'a InFlight);

impl Drop for Modifying<'_> {
    #[inline]
    fn drop(&mut self) {
        // `Release` publishes the modification to threads waiting for quiescence.
        if self.0 .0.fetch_sub(1, Ordering::AcqRel) == 1 {
            atomic_wait::wake_all(&self.0 .0);
        }
    }
}
