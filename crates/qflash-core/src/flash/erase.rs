//! Erase granularities

use super::FlashConfig;
use crate::qspi::{opcodes, QspiCommand};

/// Which erase command to issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum EraseKind {
    /// 4 KiB sector (0x20)
    Sector,
    /// 32 KiB block (0x52)
    Block32K,
    /// 64 KiB block (0xD8)
    Block64K,
    /// Whole chip (0xC7), no address
    Chip,
}

impl EraseKind {
    /// All granularities, smallest first
    pub const ALL: [EraseKind; 4] = [
        EraseKind::Sector,
        EraseKind::Block32K,
        EraseKind::Block64K,
        EraseKind::Chip,
    ];

    /// Instruction code
    pub const fn opcode(&self) -> u8 {
        match self {
            Self::Sector => opcodes::SE_20,
            Self::Block32K => opcodes::BE_52,
            Self::Block64K => opcodes::BE_D8,
            Self::Chip => opcodes::CE_C7,
        }
    }

    /// Bytes erased, `None` for the whole chip
    pub const fn size(&self) -> Option<u32> {
        match self {
            Self::Sector => Some(4 * 1024),
            Self::Block32K => Some(32 * 1024),
            Self::Block64K => Some(64 * 1024),
            Self::Chip => None,
        }
    }

    /// Whether the command carries an address
    pub const fn has_address(&self) -> bool {
        !matches!(self, Self::Chip)
    }

    /// How long to wait for the chip to finish
    pub fn timeout_ms(&self, config: &FlashConfig) -> u32 {
        match self {
            Self::Chip => config.chip_erase_timeout_ms,
            _ => config.erase_timeout_ms,
        }
    }

    /// Build the erase command for `address`
    pub fn command(&self, address: u32) -> QspiCommand {
        if self.has_address() {
            QspiCommand::erase(self.opcode(), address)
        } else {
            QspiCommand::simple(self.opcode())
        }
    }

    /// Short name, as used on the command line
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sector => "sector",
            Self::Block32K => "block32k",
            Self::Block64K => "block64k",
            Self::Chip => "chip",
        }
    }
}

impl core::fmt::Display for EraseKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_erase_uses_long_timeout() {
        let config = FlashConfig::default();
        let chip = EraseKind::Chip.timeout_ms(&config);
        let sector = EraseKind::Sector.timeout_ms(&config);

        assert_ne!(chip, sector);
        assert_eq!(chip, 250_000);
        assert_eq!(sector, 2_000);
        assert_eq!(EraseKind::Block64K.timeout_ms(&config), sector);
    }

    #[test]
    fn test_timeouts_follow_config() {
        let config = FlashConfig {
            erase_timeout_ms: 7,
            chip_erase_timeout_ms: 9,
            ..FlashConfig::default()
        };
        assert_eq!(EraseKind::Block32K.timeout_ms(&config), 7);
        assert_eq!(EraseKind::Chip.timeout_ms(&config), 9);
    }

    #[test]
    fn test_commands() {
        let cmd = EraseKind::Sector.command(0x1000);
        assert_eq!(cmd.instruction, 0x20);
        assert_eq!(cmd.address, Some(0x1000));
        assert!(!cmd.has_data());

        let cmd = EraseKind::Chip.command(0x1000);
        assert_eq!(cmd.instruction, 0xC7);
        assert_eq!(cmd.address, None);
    }
}
