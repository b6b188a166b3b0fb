//! QSPI command descriptors
//!
//! This module provides the value types that describe one QSPI
//! transaction (instruction, address, alternate bytes, dummy cycles and
//! data phase), the auto-polling and memory-mapped configurations, and
//! the opcodes and status register bits the driver uses.

mod address;
mod command;
mod lines;
pub mod opcodes;
mod poll;

pub use address::AddressWidth;
pub use command::{AlternateBytes, DataDirection, QspiCommand};
pub use lines::{check_io_mode_supported, IoMode, Lines};
pub use opcodes::*;
pub use poll::{AutoPoll, MatchMode, MemoryMapped};
