//! Operating system primitives
//!
//! The RTOS lock and completion signal are external collaborators. The
//! driver only needs the small surface described by these traits; board
//! code implements them on top of its kernel objects (a FreeRTOS mutex and
//! binary semaphore, an embassy `Mutex` and `Signal`, ...).

mod traits;

#[cfg(all(feature = "std", feature = "is_sync"))]
mod std_impl;

pub use traits::*;

#[cfg(all(feature = "std", feature = "is_sync"))]
pub use std_impl::{StdMutex, StdSignal};
