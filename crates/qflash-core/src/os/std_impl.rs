//! Hosted implementations of the OS primitives
//!
//! Built on `std::sync::Mutex` and `Condvar`, for running the driver on a
//! desktop against a simulated controller.

use std::sync::{Condvar, LockResult, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::{CompletionSignal, TimedMutex};

fn relock<T>(guard: LockResult<MutexGuard<'_, T>>) -> MutexGuard<'_, T> {
    // A panicking holder leaves a plain bool behind, still meaningful
    guard.unwrap_or_else(PoisonError::into_inner)
}

/// Timed mutex over a flag and a condition variable
#[derive(Debug, Default)]
pub struct StdMutex {
    locked: Mutex<bool>,
    released: Condvar,
}

impl StdMutex {
    /// Create an unlocked mutex
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if some caller currently holds the lock
    pub fn is_locked(&self) -> bool {
        *relock(self.locked.lock())
    }
}

// SAFETY: `locked` flips to true only under the inner mutex, after waiting
// for it to be false, and back to false only in `unlock`.
unsafe impl TimedMutex for StdMutex {
    fn try_lock_for(&self, timeout_ms: u32) -> bool {
        let guard = relock(self.locked.lock());
        let (mut locked, _) = self
            .released
            .wait_timeout_while(guard, Duration::from_millis(timeout_ms.into()), |held| *held)
            .unwrap_or_else(PoisonError::into_inner);
        if *locked {
            return false;
        }
        *locked = true;
        true
    }

    fn unlock(&self) {
        *relock(self.locked.lock()) = false;
        self.released.notify_one();
    }
}

/// Binary semaphore over a flag and a condition variable
#[derive(Debug, Default)]
pub struct StdSignal {
    permit: Mutex<bool>,
    posted: Condvar,
}

impl StdSignal {
    /// Create a signal with no pending permit
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a permit is waiting to be consumed
    pub fn is_pending(&self) -> bool {
        *relock(self.permit.lock())
    }
}

impl CompletionSignal for StdSignal {
    fn post(&self) {
        *relock(self.permit.lock()) = true;
        self.posted.notify_one();
    }

    fn reset(&self) {
        *relock(self.permit.lock()) = false;
    }

    fn wait_for(&self, timeout_ms: u32) -> bool {
        let guard = relock(self.permit.lock());
        let (mut permit, _) = self
            .posted
            .wait_timeout_while(guard, Duration::from_millis(timeout_ms.into()), |p| !*p)
            .unwrap_or_else(PoisonError::into_inner);
        core::mem::replace(&mut *permit, false)
    }
}
