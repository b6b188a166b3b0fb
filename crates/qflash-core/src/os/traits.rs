//! OS primitive trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, waits are async (Embassy-style executors)
//! - With the `is_sync` feature, waits block the calling thread

use crate::error::{Error, Result};
use maybe_async::maybe_async;

/// Mutual-exclusion lock with a bounded acquisition wait
///
/// # Safety
///
/// When [`try_lock_for`](Self::try_lock_for) returns true the caller owns
/// the lock exclusively until it calls [`unlock`](Self::unlock): no other
/// call may return true in between, from any thread or task. The driver
/// relies on this to touch its cached state without further checks.
///
/// A lock that always succeeds is therefore not a valid implementation:
///
/// ```compile_fail
/// use qflash_core::os::TimedMutex;
///
/// struct AlwaysYes;
///
/// impl TimedMutex for AlwaysYes {
///     async fn try_lock_for(&self, _timeout_ms: u32) -> bool {
///         true
///     }
///
///     fn unlock(&self) {}
/// }
/// ```
#[maybe_async(AFIT)]
pub unsafe trait TimedMutex {
    /// Try to take the lock, giving up after `timeout_ms`
    ///
    /// Returns true if the lock is now held by the caller.
    async fn try_lock_for(&self, timeout_ms: u32) -> bool;

    /// Release a lock taken by [`try_lock_for`](Self::try_lock_for)
    fn unlock(&self);
}

/// Single-permit completion event
///
/// `post` may be called from interrupt context: it must not block or
/// allocate. Posting an already posted signal has no further effect, so a
/// burst of interrupts still satisfies exactly one wait.
#[maybe_async(AFIT)]
pub trait CompletionSignal {
    /// Make the permit available and wake a waiter
    fn post(&self);

    /// Drop any pending permit
    fn reset(&self);

    /// Wait for the permit and consume it
    ///
    /// Returns false if `timeout_ms` elapsed first.
    async fn wait_for(&self, timeout_ms: u32) -> bool;
}

/// Held lock, released when dropped
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a, M: TimedMutex> {
    mutex: &'a M,
}

impl<'a, M: TimedMutex> LockGuard<'a, M> {
    /// Acquire `mutex` within `timeout_ms`
    #[maybe_async]
    pub async fn acquire(mutex: &'a M, timeout_ms: u32) -> Result<Self> {
        if mutex.try_lock_for(timeout_ms).await {
            Ok(Self { mutex })
        } else {
            log::warn!("flash lock not acquired within {} ms", timeout_ms);
            Err(Error::LockTimeout)
        }
    }
}

impl<M: TimedMutex> Drop for LockGuard<'_, M> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}
