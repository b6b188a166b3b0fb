//! QSPI command descriptor

use super::{AddressWidth, IoMode, Lines};

/// Direction of the data phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DataDirection {
    /// No data phase
    #[default]
    None,
    /// Controller receives data from the flash
    Read,
    /// Controller sends data to the flash
    Write,
}

/// Alternate-byte ("mode byte") phase sent between address and dummy cycles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AlternateBytes {
    /// Value shifted out, most significant byte first
    pub value: u32,
    /// Number of bytes (1-4)
    pub size: u8,
    /// Lines used for the phase
    pub lines: Lines,
}

impl AlternateBytes {
    /// Number of clock cycles the phase occupies
    pub const fn cycles(&self) -> u32 {
        self.lines.cycles_for(self.size as u32)
    }
}

/// A single QSPI transaction
///
/// A pure value: built fresh for every operation, handed to the controller
/// by shared reference and dropped once the transaction is over. Data
/// buffers are not part of the descriptor; they are passed to the receive
/// or transmit call that follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QspiCommand {
    /// The instruction byte
    pub instruction: u8,

    /// Lines used for the instruction phase
    pub instruction_lines: Lines,

    /// Address (if any)
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,

    /// Lines used for the address phase
    pub address_lines: Lines,

    /// Optional alternate-byte phase
    pub alternate: Option<AlternateBytes>,

    /// Number of dummy cycles after address/alternate bytes
    pub dummy_cycles: u8,

    /// Lines used for the data phase
    pub data_lines: Lines,

    /// Number of data bytes (0 for none)
    pub data_len: usize,

    /// Direction of the data phase
    pub direction: DataDirection,
}

impl QspiCommand {
    const fn base(instruction: u8) -> Self {
        Self {
            instruction,
            instruction_lines: Lines::Single,
            address: None,
            address_width: AddressWidth::None,
            address_lines: Lines::None,
            alternate: None,
            dummy_cycles: 0,
            data_lines: Lines::None,
            data_len: 0,
            direction: DataDirection::None,
        }
    }

    /// Create a simple command with no address or data (e.g., WREN)
    pub const fn simple(instruction: u8) -> Self {
        Self::base(instruction)
    }

    /// Create a read register command with no address (e.g., RDSR, RDID)
    pub const fn read_reg(instruction: u8, len: usize) -> Self {
        let mut cmd = Self::base(instruction);
        cmd.data_lines = Lines::Single;
        cmd.data_len = len;
        cmd.direction = DataDirection::Read;
        cmd
    }

    /// Create a write register command with no address (e.g., WRSR)
    pub const fn write_reg(instruction: u8, len: usize) -> Self {
        let mut cmd = Self::base(instruction);
        cmd.data_lines = Lines::Single;
        cmd.data_len = len;
        cmd.direction = DataDirection::Write;
        cmd
    }

    /// Create a read command with 3-byte address
    pub const fn read(instruction: u8, addr: u32, len: usize) -> Self {
        let mut cmd = Self::addressed(instruction, addr);
        cmd.data_lines = Lines::Single;
        cmd.data_len = len;
        cmd.direction = DataDirection::Read;
        cmd
    }

    /// Create a program command with 3-byte address
    pub const fn program(instruction: u8, addr: u32, len: usize) -> Self {
        let mut cmd = Self::addressed(instruction, addr);
        cmd.data_lines = Lines::Single;
        cmd.data_len = len;
        cmd.direction = DataDirection::Write;
        cmd
    }

    /// Create an erase command with 3-byte address
    pub const fn erase(instruction: u8, addr: u32) -> Self {
        Self::addressed(instruction, addr)
    }

    const fn addressed(instruction: u8, addr: u32) -> Self {
        let mut cmd = Self::base(instruction);
        cmd.address = Some(addr);
        cmd.address_width = AddressWidth::ThreeByte;
        cmd.address_lines = Lines::Single;
        cmd
    }

    /// Apply an I/O mode preset to every phase this command uses
    pub const fn with_io_mode(mut self, mode: IoMode) -> Self {
        self.instruction_lines = mode.cmd_lines();
        if self.address.is_some() {
            self.address_lines = mode.addr_lines();
        }
        if !matches!(self.direction, DataDirection::None) {
            self.data_lines = mode.data_lines();
        }
        self
    }

    /// Set the number of dummy cycles
    pub const fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Add an alternate-byte phase
    pub const fn with_alternate(mut self, alternate: AlternateBytes) -> Self {
        self.alternate = Some(alternate);
        self
    }

    /// Drop the data length while keeping the data phase layout
    ///
    /// Used for memory-mapped descriptors, where the length is open-ended.
    pub const fn open_ended(mut self) -> Self {
        self.data_len = 0;
        self
    }

    /// Returns true if this command has a data phase
    pub fn has_data(&self) -> bool {
        self.direction != DataDirection::None
    }

    /// Returns true if this command has an address phase
    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Clock cycles between the end of the address and the first data bit
    pub fn turnaround_cycles(&self) -> u32 {
        let alt = self.alternate.map(|a| a.cycles()).unwrap_or(0);
        alt + self.dummy_cycles as u32
    }
}
