//! Bus controller trait definitions
//!
//! Controller submissions are immediate: they either start the transaction
//! or report why they could not. Completion of interrupt-driven phases is
//! announced later through [`crate::irq::QspiIrq`].

use crate::error::BusResult;
use crate::qspi::{AutoPoll, MemoryMapped, QspiCommand};
use bitflags::bitflags;

bitflags! {
    /// QSPI controller feature flags
    ///
    /// These flags indicate which line widths and modes a controller supports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BusFeatures: u32 {
        /// Can drive phases on two lines
        const DUAL          = 1 << 0;
        /// Can drive phases on four lines
        const QUAD          = 1 << 1;
        /// Can map the flash into the address space
        const MEMORY_MAPPED = 1 << 2;
    }
}

impl Default for BusFeatures {
    fn default() -> Self {
        BusFeatures::empty()
    }
}

/// QSPI controller trait
///
/// The controller handle is configured and owned elsewhere (usually a
/// register block set up by board code); the flash driver only borrows it,
/// which is why every method takes `&self`. Implementations serialise
/// register access internally if they need to.
///
/// ## Completion
///
/// [`receive_it`](Self::receive_it) completes with the receive-complete
/// interrupt and [`auto_polling_it`](Self::auto_polling_it) with the
/// status-match interrupt. Both must be routed to the owning driver's
/// [`QspiIrq`](crate::irq::QspiIrq) implementation. The remaining
/// methods are blocking and bounded by their timeout argument.
///
/// ## Example
///
/// ```ignore
/// impl QspiBus for Stm32Qspi {
///     fn features(&self) -> BusFeatures {
///         BusFeatures::DUAL | BusFeatures::QUAD | BusFeatures::MEMORY_MAPPED
///     }
///
///     fn command(&self, cmd: &QspiCommand, timeout_ms: u32) -> BusResult<()> {
///         self.write_ccr(cmd);
///         self.wait_flag(Flag::TransferComplete, timeout_ms)
///     }
///     // ...
/// }
/// ```
pub trait QspiBus {
    /// Get the features supported by this controller
    fn features(&self) -> BusFeatures;

    /// Configure and start a command
    ///
    /// Commands without a data phase finish before this returns. Commands
    /// with a data phase are followed by one of the receive or transmit
    /// calls.
    fn command(&self, cmd: &QspiCommand, timeout_ms: u32) -> BusResult<()>;

    /// Receive the data phase of the current command, blocking
    fn receive(&self, buf: &mut [u8], timeout_ms: u32) -> BusResult<()>;

    /// Start receiving the data phase of the current command
    ///
    /// Returns as soon as the transfer is started. The receive-complete
    /// interrupt fires once `buf` is filled.
    ///
    /// # Safety
    ///
    /// The controller keeps writing into `buf` after this returns. The
    /// caller must keep `buf` alive and untouched until the completion
    /// interrupt fired or [`abort`](Self::abort) returned.
    unsafe fn receive_it(&self, buf: &mut [u8]) -> BusResult<()>;

    /// Transmit the data phase of the current command, blocking
    fn transmit(&self, data: &[u8], timeout_ms: u32) -> BusResult<()>;

    /// Start hardware status polling
    ///
    /// The status-match interrupt fires once the status read by `cmd`
    /// satisfies `poll`.
    fn auto_polling_it(&self, cmd: &QspiCommand, poll: &AutoPoll) -> BusResult<()>;

    /// Switch the controller to memory-mapped mode using `cmd` as read template
    fn memory_mapped(&self, cmd: &QspiCommand, cfg: &MemoryMapped) -> BusResult<()>;

    /// Abort whatever is in flight and return the controller to idle
    fn abort(&self) -> BusResult<()>;
}

impl<T: QspiBus + ?Sized> QspiBus for &T {
    fn features(&self) -> BusFeatures {
        (**self).features()
    }

    fn command(&self, cmd: &QspiCommand, timeout_ms: u32) -> BusResult<()> {
        (**self).command(cmd, timeout_ms)
    }

    fn receive(&self, buf: &mut [u8], timeout_ms: u32) -> BusResult<()> {
        (**self).receive(buf, timeout_ms)
    }

    unsafe fn receive_it(&self, buf: &mut [u8]) -> BusResult<()> {
        // SAFETY: forwarded contract
        unsafe { (**self).receive_it(buf) }
    }

    fn transmit(&self, data: &[u8], timeout_ms: u32) -> BusResult<()> {
        (**self).transmit(data, timeout_ms)
    }

    fn auto_polling_it(&self, cmd: &QspiCommand, poll: &AutoPoll) -> BusResult<()> {
        (**self).auto_polling_it(cmd, poll)
    }

    fn memory_mapped(&self, cmd: &QspiCommand, cfg: &MemoryMapped) -> BusResult<()> {
        (**self).memory_mapped(cmd, cfg)
    }

    fn abort(&self) -> BusResult<()> {
        (**self).abort()
    }
}

/// Information about a bus backend
#[derive(Debug, Clone)]
pub struct BusInfo {
    /// Name of the backend
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Description
    pub description: &'static str,
}
