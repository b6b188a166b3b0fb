//! qflash-sim - Simulated QSPI controller with a NOR flash behind it
//!
//! `SimQspi` implements [`QspiBus`] over an in-memory NOR array. It decodes
//! the command descriptors the driver sends, behaves like a real part where
//! it matters to the driver (write enable latch, programs only clearing
//! bits, page wrap, quad enable gating quad data phases, busy bit), and
//! delivers completion interrupts to an attached [`QspiIrq`] target either
//! inline or after a configurable latency. Faults can be injected and every
//! bus call is recorded for tests to inspect.

mod chip;
mod error;
mod options;

pub use chip::{QuadEnableBit, SimChip};
pub use error::{Result, SimError};
pub use options::{parse_options, SimConfig};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

use bitflags::bitflags;
use qflash_core::bus::{BusFeatures, QspiBus};
use qflash_core::error::{BusError, BusResult};
use qflash_core::flash::{FlashConfig, QspiFlash};
use qflash_core::irq::QspiIrq;
use qflash_core::os::{StdMutex, StdSignal};
use qflash_core::qspi::{opcodes, AutoPoll, DataDirection, Lines, MemoryMapped, QspiCommand};

const PAGE_SIZE: usize = 256;

/// Instructions the chip model answers that the driver never issues
mod standard_ops {
    /// Write Disable
    pub const WRDI: u8 = 0x04;
    /// Read Status Register 3
    pub const RDSR3: u8 = 0x15;
    /// Read Data, no dummy cycles
    pub const READ: u8 = 0x03;
    /// Fast Read, 8 dummy cycles
    pub const FAST_READ: u8 = 0x0B;
    /// Single-line Page Program
    pub const PP: u8 = 0x02;
    /// Reset Enable
    pub const RSTEN: u8 = 0x66;
    /// Reset Device
    pub const RST: u8 = 0x99;
}

bitflags! {
    /// Injectable faults
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct SimFaults: u32 {
        /// Swallow completion interrupts
        const DROP_IRQ = 1 << 0;
        /// Busy bit never clears after a program or erase
        const NEVER_READY = 1 << 1;
        /// Refuse every command submission
        const REJECT_COMMANDS = 1 << 2;
    }
}

/// Completion interrupt kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqKind {
    /// Auto-polling matched
    StatusMatch,
    /// Interrupt-driven receive finished
    ReceiveComplete,
}

/// One recorded bus interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// `command` accepted
    Command {
        /// Instruction byte
        instruction: u8,
        /// Address phase
        address: Option<u32>,
        /// Data phase width
        data_lines: Lines,
        /// Data phase length
        data_len: usize,
    },
    /// Data phase received
    Receive {
        /// Bytes delivered
        len: usize,
        /// Interrupt-driven variant
        interrupt: bool,
    },
    /// Data phase transmitted
    Transmit {
        /// Bytes accepted
        len: usize,
    },
    /// Auto-polling started
    AutoPoll {
        /// Status read instruction
        instruction: u8,
    },
    /// Memory-mapped mode entered
    MemoryMapped {
        /// Read template instruction
        instruction: u8,
    },
    /// Controller aborted
    Abort,
    /// Interrupt delivered
    Irq(IrqKind),
    /// Interrupt swallowed by [`SimFaults::DROP_IRQ`]
    IrqDropped(IrqKind),
}

struct SimState {
    memory: Vec<u8>,
    sr1: u8,
    sr2: u8,
    sr3: u8,
    volatile_wren: bool,
    pending: Option<QspiCommand>,
    mapped: Option<QspiCommand>,
    faults: SimFaults,
    programs_left: Option<u32>,
    trace: Vec<TraceEvent>,
}

/// Simulated QSPI controller and flash chip
pub struct SimQspi {
    chip: SimChip,
    features: BusFeatures,
    latency: Option<Duration>,
    state: Mutex<SimState>,
    irq: OnceLock<&'static (dyn QspiIrq + Sync)>,
    generation: Arc<AtomicU64>,
}

/// Driver type used against the simulator
pub type SimFlash = QspiFlash<'static, SimQspi, StdMutex, StdSignal>;

impl SimQspi {
    /// Create an erased chip behind a controller with every feature
    pub fn new(chip: SimChip) -> Self {
        Self {
            chip,
            features: BusFeatures::DUAL | BusFeatures::QUAD | BusFeatures::MEMORY_MAPPED,
            latency: None,
            state: Mutex::new(SimState {
                memory: vec![0xFF; chip.size()],
                sr1: 0,
                sr2: 0,
                sr3: 0,
                volatile_wren: false,
                pending: None,
                mapped: None,
                faults: SimFaults::empty(),
                programs_left: None,
                trace: Vec::new(),
            }),
            irq: OnceLock::new(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Build a simulator from parsed options, loading the image if any
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        let sim = Self::new(config.chip).with_latency(config.latency);
        if let Some(path) = &config.image {
            let image = std::fs::read(path).map_err(|source| SimError::ImageRead {
                path: path.display().to_string(),
                source,
            })?;
            sim.load(0, &image)?;
            log::info!("sim: loaded {} bytes from {}", image.len(), path.display());
        }
        Ok(sim)
    }

    /// Restrict the controller features
    pub fn with_features(mut self, features: BusFeatures) -> Self {
        self.features = features;
        self
    }

    /// Deliver completion interrupts from a helper thread after `latency`
    pub fn with_latency(mut self, latency: Option<Duration>) -> Self {
        self.latency = latency;
        self
    }

    /// Route completion interrupts to `target`
    pub fn attach_irq(&self, target: &'static (dyn QspiIrq + Sync)) -> Result<()> {
        self.irq
            .set(target)
            .map_err(|_| SimError::IrqAlreadyAttached)
    }

    /// The simulated chip model
    pub fn chip(&self) -> SimChip {
        self.chip
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // state stays consistent between statements, a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Test and tooling access
    // ------------------------------------------------------------------

    /// Copy `data` into the array at `offset`, bypassing the command set
    pub fn load(&self, offset: usize, data: &[u8]) -> Result<()> {
        let mut st = self.lock();
        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= st.memory.len())
            .ok_or(SimError::ImageTooLarge {
                image: offset.saturating_add(data.len()),
                chip: st.memory.len(),
            })?;
        st.memory[offset..end].copy_from_slice(data);
        Ok(())
    }

    /// Snapshot of the whole array
    pub fn memory(&self) -> Vec<u8> {
        self.lock().memory.clone()
    }

    /// Status registers 1, 2 and 3
    pub fn status_registers(&self) -> (u8, u8, u8) {
        let st = self.lock();
        (st.sr1, st.sr2, st.sr3)
    }

    /// Whether the chip currently accepts quad data phases
    pub fn quad_enabled(&self) -> bool {
        let st = self.lock();
        self.qe_set(&st)
    }

    /// Replace the injected faults
    pub fn set_faults(&self, faults: SimFaults) {
        self.lock().faults = faults;
    }

    /// Currently injected faults
    pub fn faults(&self) -> SimFaults {
        self.lock().faults
    }

    /// Let `n` more page programs succeed, then fail every following one
    pub fn fail_program_after(&self, n: u32) {
        self.lock().programs_left = Some(n);
    }

    /// Whether the controller is in memory-mapped mode
    pub fn is_mapped(&self) -> bool {
        self.lock().mapped.is_some()
    }

    /// Read through the memory-mapped window
    pub fn mapped_read(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        let st = self.lock();
        if st.mapped.is_none() {
            return Err(SimError::NotMapped);
        }
        let src = offset
            .checked_add(buf.len())
            .and_then(|end| st.memory.get(offset..end))
            .ok_or(SimError::MappedOutOfRange {
                offset,
                len: buf.len(),
            })?;
        buf.copy_from_slice(src);
        Ok(())
    }

    /// Every bus interaction since the last [`clear_trace`](Self::clear_trace)
    pub fn trace(&self) -> Vec<TraceEvent> {
        self.lock().trace.clone()
    }

    /// Forget recorded interactions
    pub fn clear_trace(&self) {
        self.lock().trace.clear();
    }

    /// Instruction bytes of every accepted command, in order
    pub fn commands(&self) -> Vec<u8> {
        self.lock()
            .trace
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Command { instruction, .. } => Some(*instruction),
                _ => None,
            })
            .collect()
    }

    /// Number of accepted commands with this instruction
    pub fn count_commands(&self, instruction: u8) -> usize {
        self.commands().iter().filter(|&&i| i == instruction).count()
    }

    // ------------------------------------------------------------------
    // Chip model
    // ------------------------------------------------------------------

    fn qe_set(&self, st: &SimState) -> bool {
        match self.chip.quad_enable {
            QuadEnableBit::Sr2Bit1 => st.sr2 & 0x02 != 0,
            QuadEnableBit::Sr1Bit6 => st.sr1 & 0x40 != 0,
        }
    }

    fn wel(st: &SimState) -> bool {
        st.sr1 & opcodes::Status1::WEL.bits() != 0
    }

    fn set_wel(st: &mut SimState, on: bool) {
        if on {
            st.sr1 |= opcodes::Status1::WEL.bits();
        } else {
            st.sr1 &= !opcodes::Status1::WEL.bits();
        }
    }

    fn set_busy(st: &mut SimState) {
        st.sr1 |= opcodes::Status1::WIP.bits();
        Self::set_wel(st, false);
    }

    /// Time passes: a busy chip finishes unless it is stuck
    fn settle(st: &mut SimState) {
        if !st.faults.contains(SimFaults::NEVER_READY) {
            st.sr1 &= !opcodes::Status1::WIP.bits();
        }
    }

    fn check_lines(&self, st: &SimState, cmd: &QspiCommand) -> BusResult<()> {
        let widest = [cmd.instruction_lines, cmd.address_lines, cmd.data_lines]
            .into_iter()
            .chain(cmd.alternate.map(|a| a.lines))
            .map(|l| l.count())
            .max()
            .unwrap_or(0);
        if widest == 4 && !self.features.contains(BusFeatures::QUAD) {
            return Err(BusError::Rejected);
        }
        if widest == 2 && !self.features.contains(BusFeatures::DUAL) {
            return Err(BusError::Rejected);
        }
        // the chip ignores IO2/IO3 as data lines until QE is set
        let quad_data = cmd.data_lines == Lines::Quad || cmd.address_lines == Lines::Quad;
        if quad_data && !self.qe_set(st) {
            log::debug!("sim: quad phase for {:02X} with QE clear", cmd.instruction);
            return Err(BusError::Rejected);
        }
        Ok(())
    }

    fn accept(&self, st: &mut SimState, cmd: &QspiCommand) -> BusResult<()> {
        if st.faults.contains(SimFaults::REJECT_COMMANDS) {
            return Err(BusError::Rejected);
        }
        if st.mapped.is_some() {
            return Err(BusError::Busy);
        }
        self.check_lines(st, cmd)
    }

    fn execute_simple(&self, st: &mut SimState, cmd: &QspiCommand) -> BusResult<()> {
        let erase_size = match cmd.instruction {
            opcodes::WREN => {
                Self::set_wel(st, true);
                return Ok(());
            }
            standard_ops::WRDI => {
                Self::set_wel(st, false);
                return Ok(());
            }
            opcodes::VOLATILE_SR_WREN => {
                st.volatile_wren = true;
                return Ok(());
            }
            standard_ops::RSTEN | standard_ops::RST => return Ok(()),
            opcodes::SE_20 => 4 * 1024,
            opcodes::BE_52 => 32 * 1024,
            opcodes::BE_D8 => 64 * 1024,
            opcodes::CE_C7 => st.memory.len(),
            _ => return Err(BusError::Rejected),
        };

        if !Self::wel(st) {
            // real parts silently ignore erases without WEL
            log::debug!("sim: erase {:02X} ignored, WEL clear", cmd.instruction);
            return Ok(());
        }
        let base = cmd.address.unwrap_or(0) as usize & !(erase_size - 1);
        let end = (base + erase_size).min(st.memory.len());
        st.memory[base..end].fill(0xFF);
        Self::set_busy(st);
        Ok(())
    }

    fn write_status(&self, st: &mut SimState, instruction: u8, data: &[u8]) -> BusResult<()> {
        let volatile = std::mem::take(&mut st.volatile_wren);
        if !Self::wel(st) && !volatile {
            log::debug!("sim: status write {:02X} ignored", instruction);
            return Ok(());
        }
        match (instruction, data) {
            (opcodes::WRSR2, [sr2, ..]) => st.sr2 = *sr2,
            (opcodes::WRSR, [sr1, rest @ ..]) => {
                let keep = st.sr1 & (opcodes::Status1::WIP | opcodes::Status1::WEL).bits();
                st.sr1 = (sr1 & !(opcodes::Status1::WIP | opcodes::Status1::WEL).bits()) | keep;
                if let [sr2, ..] = rest {
                    st.sr2 = *sr2;
                }
            }
            _ => return Err(BusError::Rejected),
        }
        if volatile {
            Self::set_wel(st, false);
        } else {
            // non-volatile write takes a while
            Self::set_busy(st);
        }
        Ok(())
    }

    fn program(&self, st: &mut SimState, cmd: &QspiCommand, data: &[u8]) -> BusResult<()> {
        if data.len() > PAGE_SIZE {
            return Err(BusError::Rejected);
        }
        if let Some(left) = st.programs_left.as_mut() {
            if *left == 0 {
                log::debug!("sim: injected program failure");
                return Err(BusError::Timeout);
            }
            *left -= 1;
        }
        if !Self::wel(st) {
            log::debug!("sim: program ignored, WEL clear");
            return Ok(());
        }
        let address = cmd.address.unwrap_or(0) as usize % st.memory.len();
        let page = address & !(PAGE_SIZE - 1);
        for (i, byte) in data.iter().enumerate() {
            // wraps inside the page like real parts
            let at = page + (address - page + i) % PAGE_SIZE;
            st.memory[at] &= byte;
        }
        Self::set_busy(st);
        Ok(())
    }

    fn fill_receive(&self, st: &mut SimState, buf: &mut [u8]) -> BusResult<()> {
        let cmd = st.pending.take().ok_or(BusError::Rejected)?;
        if cmd.direction != DataDirection::Read || cmd.data_len != buf.len() {
            return Err(BusError::Rejected);
        }
        match cmd.instruction {
            opcodes::RDID => {
                let id = self.chip.jedec_id();
                for (dst, src) in buf.iter_mut().zip(id.iter().cycle()) {
                    *dst = *src;
                }
            }
            opcodes::RDSR => {
                buf.fill(st.sr1);
                Self::settle(st);
            }
            opcodes::RDSR2 => buf.fill(st.sr2),
            standard_ops::RDSR3 => buf.fill(st.sr3),
            standard_ops::READ | standard_ops::FAST_READ | opcodes::FAST_READ_QUAD_OUT => {
                let size = st.memory.len();
                let start = cmd.address.unwrap_or(0) as usize;
                for (i, dst) in buf.iter_mut().enumerate() {
                    *dst = st.memory[(start + i) % size];
                }
            }
            _ => return Err(BusError::Rejected),
        }
        Ok(())
    }

    fn raise(&self, st: &mut SimState, kind: IrqKind) {
        if st.faults.contains(SimFaults::DROP_IRQ) {
            st.trace.push(TraceEvent::IrqDropped(kind));
            return;
        }
        st.trace.push(TraceEvent::Irq(kind));
        let Some(&target) = self.irq.get() else {
            return;
        };
        match self.latency {
            None => Self::deliver(target, kind),
            Some(delay) => {
                let generation = Arc::clone(&self.generation);
                let issued = generation.load(Ordering::Acquire);
                thread::spawn(move || {
                    thread::sleep(delay);
                    // an abort in between cancels the interrupt
                    if generation.load(Ordering::Acquire) == issued {
                        Self::deliver(target, kind);
                    }
                });
            }
        }
    }

    fn deliver(target: &(dyn QspiIrq + Sync), kind: IrqKind) {
        match kind {
            IrqKind::StatusMatch => target.status_match(),
            IrqKind::ReceiveComplete => target.receive_complete(),
        }
    }
}

impl QspiBus for SimQspi {
    fn features(&self) -> BusFeatures {
        self.features
    }

    fn command(&self, cmd: &QspiCommand, _timeout_ms: u32) -> BusResult<()> {
        let mut st = self.lock();
        self.accept(&mut st, cmd)?;
        st.trace.push(TraceEvent::Command {
            instruction: cmd.instruction,
            address: cmd.address,
            data_lines: cmd.data_lines,
            data_len: cmd.data_len,
        });
        if cmd.has_data() {
            st.pending = Some(*cmd);
            Ok(())
        } else {
            st.pending = None;
            self.execute_simple(&mut st, cmd)
        }
    }

    fn receive(&self, buf: &mut [u8], _timeout_ms: u32) -> BusResult<()> {
        let mut st = self.lock();
        self.fill_receive(&mut st, buf)?;
        st.trace.push(TraceEvent::Receive {
            len: buf.len(),
            interrupt: false,
        });
        Ok(())
    }

    unsafe fn receive_it(&self, buf: &mut [u8]) -> BusResult<()> {
        let mut st = self.lock();
        // filled before returning, so the buffer is never touched later
        self.fill_receive(&mut st, buf)?;
        st.trace.push(TraceEvent::Receive {
            len: buf.len(),
            interrupt: true,
        });
        self.raise(&mut st, IrqKind::ReceiveComplete);
        Ok(())
    }

    fn transmit(&self, data: &[u8], _timeout_ms: u32) -> BusResult<()> {
        let mut st = self.lock();
        let cmd = st.pending.take().ok_or(BusError::Rejected)?;
        if cmd.direction != DataDirection::Write || cmd.data_len != data.len() {
            return Err(BusError::Rejected);
        }
        match cmd.instruction {
            opcodes::WRSR | opcodes::WRSR2 => self.write_status(&mut st, cmd.instruction, data)?,
            standard_ops::PP | opcodes::QPP | opcodes::PP_4IO => self.program(&mut st, &cmd, data)?,
            _ => return Err(BusError::Rejected),
        }
        st.trace.push(TraceEvent::Transmit { len: data.len() });
        Ok(())
    }

    fn auto_polling_it(&self, cmd: &QspiCommand, poll: &AutoPoll) -> BusResult<()> {
        let mut st = self.lock();
        self.accept(&mut st, cmd)?;
        if cmd.instruction != opcodes::RDSR {
            return Err(BusError::Rejected);
        }
        st.trace.push(TraceEvent::AutoPoll {
            instruction: cmd.instruction,
        });
        Self::settle(&mut st);
        if poll.matches(st.sr1 as u32) {
            self.raise(&mut st, IrqKind::StatusMatch);
        } else {
            log::debug!("sim: auto-poll never matches (SR1 {:02X})", st.sr1);
        }
        Ok(())
    }

    fn memory_mapped(&self, cmd: &QspiCommand, _cfg: &MemoryMapped) -> BusResult<()> {
        let mut st = self.lock();
        if !self.features.contains(BusFeatures::MEMORY_MAPPED) {
            return Err(BusError::Rejected);
        }
        self.accept(&mut st, cmd)?;
        st.trace.push(TraceEvent::MemoryMapped {
            instruction: cmd.instruction,
        });
        st.mapped = Some(*cmd);
        Ok(())
    }

    fn abort(&self) -> BusResult<()> {
        let mut st = self.lock();
        st.pending = None;
        st.mapped = None;
        self.generation.fetch_add(1, Ordering::AcqRel);
        st.trace.push(TraceEvent::Abort);
        Ok(())
    }
}

/// Build a driver over `sim` and wire its interrupts
///
/// Both are leaked: interrupt targets must live for the rest of the
/// program, as they would in firmware.
pub fn leak_driver(sim: SimQspi, config: FlashConfig) -> (&'static SimQspi, &'static SimFlash) {
    let sim: &'static SimQspi = Box::leak(Box::new(sim));
    let flash: &'static SimFlash = Box::leak(Box::new(QspiFlash::new(
        sim,
        StdMutex::new(),
        StdSignal::new(),
        config,
    )));
    // fresh simulator, nothing attached yet
    let _ = sim.attach_irq(flash);
    (sim, flash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qflash_core::qspi::IoMode;

    fn read_reg(sim: &SimQspi, opcode: u8) -> u8 {
        let mut buf = [0u8];
        sim.command(&QspiCommand::read_reg(opcode, 1), 10).unwrap();
        sim.receive(&mut buf, 10).unwrap();
        buf[0]
    }

    #[test]
    fn test_read_jedec_id() {
        let sim = SimQspi::new(SimChip::w25q128());
        let mut buf = [0u8; 3];
        sim.command(&QspiCommand::read_reg(opcodes::RDID, 3), 10).unwrap();
        sim.receive(&mut buf, 10).unwrap();
        assert_eq!(buf, [0xEF, 0x40, 0x18]);
    }

    #[test]
    fn test_program_clears_bits_and_wraps() {
        let sim = SimQspi::new(SimChip::w25q80());
        sim.command(&QspiCommand::simple(opcodes::WREN), 10).unwrap();
        sim.command(&QspiCommand::program(standard_ops::PP, 0x10FE, 4), 10).unwrap();
        sim.transmit(&[0x12, 0x34, 0x56, 0x78], 10).unwrap();

        let mem = sim.memory();
        assert_eq!(&mem[0x10FE..0x1100], &[0x12, 0x34]);
        // wrapped to the start of the same page
        assert_eq!(&mem[0x1000..0x1002], &[0x56, 0x78]);
        assert_eq!(mem[0x1100], 0xFF);

        // WEL consumed, WIP set until the next status read
        assert_eq!(read_reg(&sim, opcodes::RDSR) & 0x03, 0x01);
        assert_eq!(read_reg(&sim, opcodes::RDSR) & 0x03, 0x00);
    }

    #[test]
    fn test_program_without_wren_is_ignored() {
        let sim = SimQspi::new(SimChip::w25q80());
        sim.command(&QspiCommand::program(standard_ops::PP, 0, 1), 10).unwrap();
        sim.transmit(&[0x00], 10).unwrap();
        assert_eq!(sim.memory()[0], 0xFF);
    }

    #[test]
    fn test_quad_needs_qe() {
        let sim = SimQspi::new(SimChip::w25q80());
        let quad = QspiCommand::read(opcodes::FAST_READ_QUAD_OUT, 0, 4).with_io_mode(IoMode::QuadOut);
        assert_eq!(sim.command(&quad, 10), Err(BusError::Rejected));

        sim.command(&QspiCommand::simple(opcodes::VOLATILE_SR_WREN), 10).unwrap();
        sim.command(&QspiCommand::write_reg(opcodes::WRSR2, 1), 10).unwrap();
        sim.transmit(&[0x02], 10).unwrap();
        assert!(sim.quad_enabled());
        assert!(sim.command(&quad, 10).is_ok());
    }

    #[test]
    fn test_write_disable_and_plain_read() {
        let sim = SimQspi::new(SimChip::w25q80());
        sim.load(0x40, &[0x5A; 4]).unwrap();
        sim.command(&QspiCommand::simple(opcodes::WREN), 10).unwrap();
        sim.command(&QspiCommand::simple(standard_ops::WRDI), 10).unwrap();
        assert_eq!(read_reg(&sim, standard_ops::RDSR3), 0);
        assert_eq!(read_reg(&sim, opcodes::RDSR) & 0x02, 0);

        // program ignored after WRDI
        sim.command(&QspiCommand::program(standard_ops::PP, 0x40, 1), 10).unwrap();
        sim.transmit(&[0x00], 10).unwrap();

        let mut buf = [0u8; 4];
        sim.command(&QspiCommand::read(standard_ops::READ, 0x40, 4), 10).unwrap();
        sim.receive(&mut buf, 10).unwrap();
        assert_eq!(buf, [0x5A; 4]);
    }

    #[test]
    fn test_erase() {
        let sim = SimQspi::new(SimChip::w25q80());
        sim.load(0x1000, &[0u8; 16]).unwrap();
        sim.command(&QspiCommand::simple(opcodes::WREN), 10).unwrap();
        sim.command(&QspiCommand::erase(opcodes::SE_20, 0x1008), 10).unwrap();
        assert!(sim.memory()[0x1000..0x1010].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_mapped_mode() {
        let sim = SimQspi::new(SimChip::w25q80());
        sim.load(0x20, b"mapped").unwrap();
        sim.lock().sr2 = 0x02;

        let mut buf = [0u8; 6];
        assert!(matches!(sim.mapped_read(0x20, &mut buf), Err(SimError::NotMapped)));

        let cmd = QspiCommand::read(opcodes::FAST_READ_QUAD_OUT, 0, 0).with_io_mode(IoMode::QuadOut);
        sim.memory_mapped(&cmd, &MemoryMapped::continuous()).unwrap();
        sim.mapped_read(0x20, &mut buf).unwrap();
        assert_eq!(&buf, b"mapped");
        assert_eq!(
            sim.command(&QspiCommand::simple(opcodes::WREN), 10),
            Err(BusError::Busy)
        );

        sim.abort().unwrap();
        assert!(!sim.is_mapped());
    }

    #[test]
    fn test_reject_fault() {
        let sim = SimQspi::new(SimChip::w25q80());
        sim.set_faults(SimFaults::REJECT_COMMANDS);
        assert_eq!(
            sim.command(&QspiCommand::simple(opcodes::WREN), 10),
            Err(BusError::Rejected)
        );
        assert!(sim.commands().is_empty());
    }

    #[test]
    fn test_load_out_of_range() {
        let sim = SimQspi::new(SimChip::w25q80());
        assert!(matches!(
            sim.load((1 << 20) - 1, &[0, 0]),
            Err(SimError::ImageTooLarge { .. })
        ));
    }
}
