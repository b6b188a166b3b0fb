//! Address width types

/// Address width for QSPI commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// No address phase
    #[default]
    None,
    /// 3-byte (24-bit) address - supports up to 16 MiB
    ThreeByte,
    /// 4-byte (32-bit) address - supports up to 4 GiB
    FourByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 3,
            Self::FourByte => 4,
        }
    }

    /// Returns the maximum addressable size in bytes
    pub const fn max_size(&self) -> u64 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 1 << 24,
            Self::FourByte => 1 << 32,
        }
    }

    /// Truncate an address to the bits carried by this width
    pub const fn mask(&self, address: u32) -> u32 {
        match self {
            Self::None => 0,
            Self::ThreeByte => address & 0x00FF_FFFF,
            Self::FourByte => address,
        }
    }
}
