//! Simulated chip models

/// Where a chip keeps its quad enable bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadEnableBit {
    /// Status register 2, bit 1 (Winbond)
    Sr2Bit1,
    /// Status register 1, bit 6 (Macronix)
    Sr1Bit6,
}

/// A NOR part the simulator can pretend to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimChip {
    /// Part name
    pub name: &'static str,
    /// JEDEC manufacturer ID
    pub manufacturer: u8,
    /// JEDEC memory type
    pub memory_type: u8,
    /// JEDEC capacity code (log2 of the size)
    pub capacity: u8,
    /// Quad enable bit location
    pub quad_enable: QuadEnableBit,
}

impl SimChip {
    /// Winbond W25Q80, 1 MiB
    pub const fn w25q80() -> Self {
        Self {
            name: "w25q80",
            manufacturer: 0xEF,
            memory_type: 0x40,
            capacity: 0x14,
            quad_enable: QuadEnableBit::Sr2Bit1,
        }
    }

    /// Winbond W25Q16, 2 MiB
    pub const fn w25q16() -> Self {
        Self {
            name: "w25q16",
            capacity: 0x15,
            ..Self::w25q80()
        }
    }

    /// Winbond W25Q128, 16 MiB
    pub const fn w25q128() -> Self {
        Self {
            name: "w25q128",
            capacity: 0x18,
            ..Self::w25q80()
        }
    }

    /// Macronix MX25L1606E, 2 MiB
    pub const fn mx25l1606() -> Self {
        Self {
            name: "mx25l1606",
            manufacturer: 0xC2,
            memory_type: 0x20,
            capacity: 0x15,
            quad_enable: QuadEnableBit::Sr1Bit6,
        }
    }

    /// Every model, smallest Winbond first
    pub const ALL: [SimChip; 4] = [
        Self::w25q80(),
        Self::w25q16(),
        Self::w25q128(),
        Self::mx25l1606(),
    ];

    /// Look a model up by name (case-insensitive)
    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Comma-separated model names
    pub fn names() -> String {
        Self::ALL.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        1usize << self.capacity
    }

    /// Raw RDID response
    pub fn jedec_id(&self) -> [u8; 3] {
        [self.manufacturer, self.memory_type, self.capacity]
    }
}

impl Default for SimChip {
    fn default() -> Self {
        Self::w25q80()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(SimChip::by_name("W25Q16"), Some(SimChip::w25q16()));
        assert_eq!(SimChip::by_name("mx25l1606").unwrap().size(), 2 * 1024 * 1024);
        assert!(SimChip::by_name("at25").is_none());
    }

    #[test]
    fn test_jedec_id() {
        assert_eq!(SimChip::w25q128().jedec_id(), [0xEF, 0x40, 0x18]);
        assert_eq!(SimChip::w25q80().size(), 1 << 20);
    }
}
