//! Serial NOR flash opcodes
//!
//! The JEDEC command set shared by Winbond and Macronix parts, plus the
//! vendor-specific instructions their strategies need.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Enable for Volatile Status Register (Winbond)
pub const VOLATILE_SR_WREN: u8 = 0x50;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Write Status Register 1
pub const WRSR: u8 = 0x01;
/// Write Status Register 2 (Winbond)
pub const WRSR2: u8 = 0x31;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + memory type + capacity)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read commands
// ============================================================================

/// Fast Read Quad Output (1-1-4)
pub const FAST_READ_QUAD_OUT: u8 = 0x6B;

// ============================================================================
// Page Program
// ============================================================================

/// Quad Input Page Program, 1-1-4 (Winbond)
pub const QPP: u8 = 0x32;
/// Quad Page Program, 1-4-4 (Macronix)
pub const PP_4IO: u8 = 0x38;

// ============================================================================
// Erase commands - 3-byte address
// ============================================================================

/// Sector Erase 4KB with 3-byte address
pub const SE_20: u8 = 0x20;
/// Block Erase 32KB with 3-byte address
pub const BE_52: u8 = 0x52;
/// Block Erase 64KB with 3-byte address
pub const BE_D8: u8 = 0xD8;
/// Chip Erase (entire chip)
pub const CE_C7: u8 = 0xC7;

// ============================================================================
// Status register bit definitions
// ============================================================================

bitflags::bitflags! {
    /// Status Register 1 bits
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Status1: u8 {
        /// Write In Progress / Busy
        const WIP = 0x01;
        /// Write Enable Latch
        const WEL = 0x02;
        /// Block Protect bit 0
        const BP0 = 0x04;
        /// Block Protect bit 1
        const BP1 = 0x08;
        /// Block Protect bit 2
        const BP2 = 0x10;
        /// Block Protect bit 3 (Macronix) / Top-Bottom (Winbond)
        const BP3 = 0x20;
        /// Quad Enable on Macronix parts
        const MX_QE = 0x40;
        /// Status Register Write Disable / Protect 0
        const SRWD = 0x80;
    }
}

bitflags::bitflags! {
    /// Status Register 2 bits (Winbond)
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Status2: u8 {
        /// Status Register Protect 1
        const SRP1 = 0x01;
        /// Quad Enable
        const QE = 0x02;
        /// Suspend Status
        const SUS = 0x80;
    }
}
