//! Interrupt boundary
//!
//! The controller's status-match and receive-complete interrupts carry no
//! payload: all they do is wake the operation waiting on the driver's
//! completion signal. Vendor HALs usually expose them as free callback
//! functions, so the driver must be reachable from there without a lookup.
//! Either place the driver itself in a `static` ([`QspiFlash::new`] is
//! `const`) or bind it to an [`IrqSlot`] at startup:
//!
//! ```ignore
//! static FLASH_IRQ: IrqSlot<Flash> = IrqSlot::new();
//!
//! #[no_mangle]
//! extern "C" fn HAL_QSPI_StatusMatchCallback(_: *mut QspiHandle) {
//!     FLASH_IRQ.status_match();
//! }
//!
//! #[no_mangle]
//! extern "C" fn HAL_QSPI_RxCpltCallback(_: *mut QspiHandle) {
//!     FLASH_IRQ.receive_complete();
//! }
//! ```
//!
//! [`QspiFlash::new`]: crate::flash::QspiFlash::new

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

/// Interrupt entry points of a flash driver
///
/// Both are called from interrupt context: they must not block, allocate
/// or take locks.
pub trait QspiIrq {
    /// Auto-polling matched
    fn status_match(&self);

    /// Interrupt-driven receive finished
    fn receive_complete(&self);
}

/// Static binding from interrupt vectors to a driver instance
///
/// Unbound slots drop interrupts.
pub struct IrqSlot<T: QspiIrq + Sync + 'static> {
    target: AtomicPtr<T>,
}

impl<T: QspiIrq + Sync + 'static> IrqSlot<T> {
    /// Create an unbound slot
    pub const fn new() -> Self {
        Self {
            target: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Route interrupts to `target`
    pub fn bind(&self, target: &'static T) {
        self.target
            .store(target as *const T as *mut T, Ordering::Release);
    }

    /// Stop routing interrupts
    pub fn unbind(&self) {
        self.target.store(ptr::null_mut(), Ordering::Release);
    }

    /// Returns true if a driver is bound
    pub fn is_bound(&self) -> bool {
        !self.target.load(Ordering::Acquire).is_null()
    }

    fn target(&self) -> Option<&'static T> {
        let p = self.target.load(Ordering::Acquire);
        // SAFETY: only ever set from a `&'static T`, never written through
        unsafe { p.cast_const().as_ref() }
    }

    /// Forward a status-match interrupt
    pub fn status_match(&self) {
        if let Some(t) = self.target() {
            t.status_match();
        }
    }

    /// Forward a receive-complete interrupt
    pub fn receive_complete(&self) {
        if let Some(t) = self.target() {
            t.receive_complete();
        }
    }
}

impl<T: QspiIrq + Sync + 'static> Default for IrqSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}
