//! Line widths and I/O modes

use crate::bus::BusFeatures;
use crate::error::{Error, Result};

use super::QspiCommand;

/// Number of data lines used by one phase of a transaction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lines {
    /// Phase is skipped
    #[default]
    None,
    /// One line (IO0 out, IO1 in)
    Single,
    /// Two lines (IO0-IO1)
    Dual,
    /// Four lines (IO0-IO3)
    Quad,
}

impl Lines {
    /// Returns the number of lines, 0 when the phase is skipped
    pub const fn count(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Single => 1,
            Self::Dual => 2,
            Self::Quad => 4,
        }
    }

    /// Number of clock cycles needed to shift `bytes` bytes over these lines
    pub const fn cycles_for(&self, bytes: u32) -> u32 {
        match self.count() {
            0 => 0,
            n => bytes * 8 / n as u32,
        }
    }
}

/// I/O mode presets
///
/// Sets the instruction, address and data phases together, following the
/// usual `cmd-addr-data` line notation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IoMode {
    /// Standard SPI: 1-1-1
    #[default]
    Single,
    /// Dual Output: 1-1-2
    DualOut,
    /// Dual I/O: 1-2-2
    DualIo,
    /// Quad Output: 1-1-4
    QuadOut,
    /// Quad I/O: 1-4-4
    QuadIo,
    /// QPI mode: 4-4-4
    Qpi,
}

impl IoMode {
    /// Lines used for the instruction phase
    pub const fn cmd_lines(&self) -> Lines {
        match self {
            Self::Qpi => Lines::Quad,
            _ => Lines::Single,
        }
    }

    /// Lines used for the address phase
    pub const fn addr_lines(&self) -> Lines {
        match self {
            Self::Single | Self::DualOut | Self::QuadOut => Lines::Single,
            Self::DualIo => Lines::Dual,
            Self::QuadIo | Self::Qpi => Lines::Quad,
        }
    }

    /// Lines used for the data phase
    pub const fn data_lines(&self) -> Lines {
        match self {
            Self::Single => Lines::Single,
            Self::DualOut | Self::DualIo => Lines::Dual,
            Self::QuadOut | Self::QuadIo | Self::Qpi => Lines::Quad,
        }
    }
}

/// Check if a controller can carry every phase of a command
///
/// Returns `Ok(())` if the command is supported, or `Err(IoModeNotSupported)` if not.
pub fn check_io_mode_supported(cmd: &QspiCommand, features: BusFeatures) -> Result<()> {
    let widest = [
        cmd.instruction_lines,
        cmd.address_lines,
        cmd.alternate.map(|alt| alt.lines).unwrap_or(Lines::None),
        cmd.data_lines,
    ]
    .iter()
    .map(Lines::count)
    .max()
    .unwrap_or(0);

    match widest {
        4 if !features.contains(BusFeatures::QUAD) => Err(Error::IoModeNotSupported),
        2 if !features.contains(BusFeatures::DUAL) => Err(Error::IoModeNotSupported),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qspi::opcodes;

    #[test]
    fn test_io_mode_lines() {
        assert_eq!(IoMode::QuadOut.cmd_lines(), Lines::Single);
        assert_eq!(IoMode::QuadOut.addr_lines(), Lines::Single);
        assert_eq!(IoMode::QuadOut.data_lines(), Lines::Quad);
        assert_eq!(IoMode::QuadIo.addr_lines(), Lines::Quad);
        assert_eq!(IoMode::Qpi.cmd_lines(), Lines::Quad);
    }

    #[test]
    fn test_cycles_for() {
        // 8-bit mode byte on four lines takes two clocks
        assert_eq!(Lines::Quad.cycles_for(1), 2);
        assert_eq!(Lines::Single.cycles_for(3), 24);
        assert_eq!(Lines::None.cycles_for(3), 0);
    }

    #[test]
    fn test_check_io_mode() {
        let quad = QspiCommand::read(opcodes::FAST_READ_QUAD_OUT, 0, 16)
            .with_io_mode(IoMode::QuadOut);
        let single = QspiCommand::read_reg(opcodes::RDSR, 1);

        assert!(check_io_mode_supported(&single, BusFeatures::empty()).is_ok());
        assert_eq!(
            check_io_mode_supported(&quad, BusFeatures::DUAL),
            Err(Error::IoModeNotSupported)
        );
        assert!(check_io_mode_supported(&quad, BusFeatures::QUAD).is_ok());
    }
}
