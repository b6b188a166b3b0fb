//! Static table of known parts
//!
//! Only used for reporting. Geometry always comes from the capacity code,
//! so an unlisted part of a supported manufacturer still works.

use super::types::{ChipIdentity, MFR_MACRONIX, MFR_WINBOND};

/// A known flash part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipInfo {
    /// Vendor name (e.g., "Winbond")
    pub vendor: &'static str,
    /// Chip model name (e.g., "W25Q128FV")
    pub name: &'static str,
    /// JEDEC manufacturer ID
    pub jedec_manufacturer: u8,
    /// JEDEC device ID (memory type << 8 | capacity)
    pub jedec_device: u16,
}

impl ChipInfo {
    const fn new(vendor: &'static str, name: &'static str, mfr: u8, device: u16) -> Self {
        Self {
            vendor,
            name,
            jedec_manufacturer: mfr,
            jedec_device: device,
        }
    }

    /// Total flash size in bytes
    pub fn total_size(&self) -> u32 {
        1u32 << (self.jedec_device & 0xFF)
    }

    /// Check if this chip matches the given JEDEC ID
    pub fn matches_jedec_id(&self, manufacturer: u8, device: u16) -> bool {
        self.jedec_manufacturer == manufacturer && self.jedec_device == device
    }
}

/// Parts the driver has been brought up on
pub static KNOWN_CHIPS: &[ChipInfo] = &[
    ChipInfo::new("Winbond", "W25Q80DV", MFR_WINBOND, 0x4014),
    ChipInfo::new("Winbond", "W25Q16JV", MFR_WINBOND, 0x4015),
    ChipInfo::new("Winbond", "W25Q32JV", MFR_WINBOND, 0x4016),
    ChipInfo::new("Winbond", "W25Q64JV", MFR_WINBOND, 0x4017),
    ChipInfo::new("Winbond", "W25Q128JV", MFR_WINBOND, 0x4018),
    ChipInfo::new("Winbond", "W25Q128JV-DTR", MFR_WINBOND, 0x7018),
    ChipInfo::new("Macronix", "MX25L8006E", MFR_MACRONIX, 0x2014),
    ChipInfo::new("Macronix", "MX25L1606E", MFR_MACRONIX, 0x2015),
    ChipInfo::new("Macronix", "MX25L3233F", MFR_MACRONIX, 0x2016),
    ChipInfo::new("Macronix", "MX25L6433F", MFR_MACRONIX, 0x2017),
    ChipInfo::new("Macronix", "MX25L12835F", MFR_MACRONIX, 0x2018),
];

/// Find a chip by its JEDEC ID
pub fn find_by_jedec_id(manufacturer: u8, device: u16) -> Option<&'static ChipInfo> {
    KNOWN_CHIPS
        .iter()
        .find(|c| c.matches_jedec_id(manufacturer, device))
}

/// Find the table entry for an identity
pub fn find_by_identity(id: &ChipIdentity) -> Option<&'static ChipInfo> {
    find_by_jedec_id(id.manufacturer, id.device())
}

/// Find a chip by name (case-insensitive exact match)
pub fn find_by_name(name: &str) -> Option<&'static ChipInfo> {
    KNOWN_CHIPS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Vendor name for a JEDEC manufacturer code
pub fn manufacturer_name(manufacturer: u8) -> &'static str {
    match manufacturer {
        MFR_WINBOND => "Winbond",
        MFR_MACRONIX => "Macronix",
        0x20 => "Micron",
        0x01 => "Spansion",
        0xC8 => "GigaDevice",
        0xBF => "SST",
        0x1F => "Adesto",
        0x9D => "ISSI",
        _ => "Unknown",
    }
}
