//! Error types for qflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Status reported by the bus controller when it refuses a submission
///
/// Mirrors the status codes of vendor QSPI HALs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Controller rejected the request (bad parameters, peripheral error)
    Rejected,
    /// Controller is busy with another transaction
    Busy,
    /// Blocking phase did not finish in time
    Timeout,
}

/// Core error type - no_std compatible, Copy for efficiency
///
/// Every variant is recoverable by the caller. The driver never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Resource errors
    /// Driver lock could not be acquired within the configured bound
    LockTimeout,
    /// Bus controller refused a command submission
    Bus(BusError),
    /// Interrupt-driven completion was not signalled in time
    CompletionTimeout,

    // Chip errors
    /// Operation needs a chip identity but `identify()` has not succeeded
    NotIdentified,
    /// No chip answered the identification command
    ChipNotFound,
    /// Manufacturer code has no vendor strategy
    UnsupportedManufacturer(u8),
    /// Chip identified but its geometry cannot be driven
    ChipNotSupported,
    /// Quad enable bit did not read back as set
    QuadEnableFailed,

    // Mode errors
    /// Command-mode operation requested while memory-mapped
    MemoryMapped,
    /// Descriptor needs more data lines than the controller provides
    IoModeNotSupported,

    // Address/size errors
    /// Address is beyond flash chip size
    AddressOutOfBounds,
    /// Operation requires aligned address
    InvalidAlignment,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected => write!(f, "request rejected"),
            Self::Busy => write!(f, "controller busy"),
            Self::Timeout => write!(f, "controller timed out"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LockTimeout => write!(f, "timed out waiting for the flash lock"),
            Self::Bus(e) => write!(f, "QSPI bus error: {}", e),
            Self::CompletionTimeout => write!(f, "timed out waiting for QSPI completion"),
            Self::NotIdentified => write!(f, "flash chip not identified"),
            Self::ChipNotFound => write!(f, "flash chip not found"),
            Self::UnsupportedManufacturer(id) => {
                write!(f, "unsupported flash manufacturer 0x{:02X}", id)
            }
            Self::ChipNotSupported => write!(f, "flash chip not supported"),
            Self::QuadEnableFailed => write!(f, "quad enable bit did not stick"),
            Self::MemoryMapped => write!(f, "flash is in memory-mapped mode"),
            Self::IoModeNotSupported => write!(f, "I/O mode not supported by controller"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BusError {}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;

/// Result type for bus controller submissions
pub type BusResult<T> = core::result::Result<T, BusError>;
