use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};

use super::utils::{self, wait_while};

/// Ownership of an in-progress resize.
///
/// The marker is a single word, either `IDLE` or the identifier of the thread
/// that owns the resize. Claiming is a compare-and-set from `IDLE` to the
/// caller's identifier, so at most one thread resizes at a time. Threads that
/// lose the claim never wait on it, they observe the resize when they next
/// validate a bucket lock.
pub struct ResizeState {
    owner: AtomicU32,
}

impl ResizeState {
    /// No resize is in progress.
    const IDLE: u32 = 0;

    pub fn new() -> ResizeState {
        ResizeState {
            owner: AtomicU32::new(ResizeState::IDLE),
        }
    }

    /// Attempt to become the resize owner.
    ///
    /// Returns `None` if another thread already owns the resize. Ownership is
    /// released when the returned guard is dropped.
    #[inline]
    pub fn try_claim(&self) -> Option<Owner<'_>> {
        let id = utils::thread_id();

        // `SeqCst` orders the claim before the quiescence barrier's lock
        // acquisitions, see `RefinableSet::resize`.
        match self.owner.compare_exchange(
            ResizeState::IDLE,
            id.get(),
            Ordering::SeqCst,
            Ordering::Relaxed,
        ) {
            Ok(_) => Some(Owner { state: self }),
            Err(owner) => {
                debug_assert_ne!(owner, id.get(), "resize claimed recursively");
                None
            }
        }
    }

    /// Returns the thread currently owning the resize, if any.
    #[inline]
    pub fn owner(&self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.owner.load(Ordering::Acquire))
    }

    /// Returns `true` if a resize is in progress.
    #[inline]
    pub fn in_progress(&self) -> bool {
        self.owner().is_some()
    }

    /// Block until any in-progress resize completes.
    pub fn wait(&self) {
        debug_assert!(
            self.owner() != Some(utils::thread_id()),
            "resize owner waiting on itself"
        );

        wait_while(&self.owner, |owner| owner != ResizeState::IDLE);
    }
}

/// Exclusive ownership of a resize.
pub struct Owner<'a> {
    state: &'a ResizeState,
}

impl Drop for Owner<'_> {
    fn drop(&mut self) {
        // `Release` publishes the resized table to threads that observe the
        // marker return to idle.
        self.state.owner.store(ResizeState::IDLE, Ordering::Release);
        atomic_wait::wake_all(&self.state.owner);
    }
}
