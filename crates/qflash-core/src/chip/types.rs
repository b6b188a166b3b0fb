//! Flash chip type definitions

use crate::error::{Error, Result};
use crate::qspi::AddressWidth;

/// JEDEC manufacturer code for Winbond
pub const MFR_WINBOND: u8 = 0xEF;
/// JEDEC manufacturer code for Macronix
pub const MFR_MACRONIX: u8 = 0xC2;

/// Program page size shared by every supported part
pub const PAGE_SIZE: u32 = 256;
/// Smallest erase unit shared by every supported part
pub const SECTOR_SIZE: u32 = 4096;

/// Chip identity as reported by the Read JEDEC ID command
///
/// An identity only exists once a chip answered: the driver keeps an
/// `Option<ChipIdentity>` and treats `None` as "not identified".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ChipIdentity {
    /// JEDEC manufacturer ID (first byte of RDID response)
    pub manufacturer: u8,
    /// Memory type (second byte of RDID response)
    pub memory_type: u8,
    /// Capacity code, log2 of the size in bytes (third byte)
    pub capacity: u8,
}

impl ChipIdentity {
    /// Decode a raw RDID response
    ///
    /// A floating or shorted data line reads back as all zeros or all ones,
    /// which means no chip answered.
    pub fn from_jedec(raw: [u8; 3]) -> Result<Self> {
        match raw[0] {
            0x00 | 0xFF => Err(Error::ChipNotFound),
            manufacturer => Ok(Self {
                manufacturer,
                memory_type: raw[1],
                capacity: raw[2],
            }),
        }
    }

    /// Device ID (memory type and capacity) as a 16-bit value
    pub fn device(&self) -> u16 {
        ((self.memory_type as u16) << 8) | self.capacity as u16
    }

    /// Get the JEDEC ID as a 24-bit value (manufacturer << 16 | device)
    pub fn jedec_id(&self) -> u32 {
        ((self.manufacturer as u32) << 16) | self.device() as u32
    }

    /// Derive the chip geometry from the capacity code
    pub fn geometry(&self) -> Result<Geometry> {
        Geometry::from_capacity(self.capacity)
    }
}

impl core::fmt::Display for ChipIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:02X} {:02X} {:02X}",
            self.manufacturer, self.memory_type, self.capacity
        )
    }
}

/// Page and sector layout of an identified chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    /// Page size in bytes (for programming)
    pub page_size: u32,
    /// Sector size in bytes (smallest erase unit)
    pub sector_size: u32,
    /// Number of sectors
    pub sector_count: u32,
}

impl Geometry {
    /// Geometry of a chip whose size is `1 << capacity` bytes
    ///
    /// Only 24-bit addressing is driven, so parts above 16 MiB (and codes
    /// too small to hold one sector) are rejected.
    pub fn from_capacity(capacity: u8) -> Result<Self> {
        let max = AddressWidth::ThreeByte.max_size();
        if capacity < SECTOR_SIZE.trailing_zeros() as u8 || 1u64 << capacity.min(63) > max {
            return Err(Error::ChipNotSupported);
        }
        let total = 1u32 << capacity;
        Ok(Self {
            page_size: PAGE_SIZE,
            sector_size: SECTOR_SIZE,
            sector_count: total / SECTOR_SIZE,
        })
    }

    /// Total size in bytes
    pub fn total_size(&self) -> u32 {
        self.sector_size * self.sector_count
    }

    /// Check if an address range is valid for this chip
    pub fn is_valid_range(&self, addr: u32, len: usize) -> bool {
        let end = addr as u64 + len as u64;
        end <= self.total_size() as u64
    }

    /// Start address of a sector
    pub fn sector_address(&self, index: u32) -> Result<u32> {
        if index >= self.sector_count {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(index * self.sector_size)
    }
}
