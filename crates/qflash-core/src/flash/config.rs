//! Driver configuration

/// Timeouts and addresses used by the driver
///
/// `Default` gives values that suit the supported parts at their typical
/// worst-case program and erase times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct FlashConfig {
    /// Bound on acquiring the driver lock
    pub lock_timeout_ms: u32,
    /// Bound on one command, read or page program
    pub command_timeout_ms: u32,
    /// Bound on a sector or block erase
    pub erase_timeout_ms: u32,
    /// Bound on a whole-chip erase
    pub chip_erase_timeout_ms: u32,
    /// Address at which the controller maps the flash
    pub mapped_base: u32,
}

impl FlashConfig {
    /// Default lock acquisition bound
    pub const DEFAULT_LOCK_TIMEOUT_MS: u32 = 100;
    /// Default command bound
    pub const DEFAULT_COMMAND_TIMEOUT_MS: u32 = 100;
    /// Default sector/block erase bound
    pub const DEFAULT_ERASE_TIMEOUT_MS: u32 = 2_000;
    /// Default chip erase bound
    pub const DEFAULT_CHIP_ERASE_TIMEOUT_MS: u32 = 250_000;
    /// Default memory-mapped base (STM32 QUADSPI bank)
    pub const DEFAULT_MAPPED_BASE: u32 = 0x9000_0000;

    /// Configuration with every field at its default
    pub const fn new() -> Self {
        Self {
            lock_timeout_ms: Self::DEFAULT_LOCK_TIMEOUT_MS,
            command_timeout_ms: Self::DEFAULT_COMMAND_TIMEOUT_MS,
            erase_timeout_ms: Self::DEFAULT_ERASE_TIMEOUT_MS,
            chip_erase_timeout_ms: Self::DEFAULT_CHIP_ERASE_TIMEOUT_MS,
            mapped_base: Self::DEFAULT_MAPPED_BASE,
        }
    }
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self::new()
    }
}
