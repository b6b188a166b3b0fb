//! Bus command sequences
//!
//! `QspiPort` bundles what a command sequence needs: the borrowed bus
//! controller, the completion signal and the timeouts. It is handed to the
//! vendor strategies so they can describe their quirks in terms of these
//! helpers instead of talking to the controller directly.
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: completion waits block the calling thread
//! - Without `is_sync` feature: completion waits are awaited

use crate::bus::QspiBus;
use crate::error::{Error, Result};
use crate::flash::FlashConfig;
use crate::os::CompletionSignal;
use crate::qspi::{check_io_mode_supported, opcodes, AutoPoll, MemoryMapped, QspiCommand};
use maybe_async::maybe_async;

/// Access to the bus for the duration of one locked operation
pub struct QspiPort<'a, B: QspiBus + ?Sized, S: CompletionSignal> {
    bus: &'a B,
    done: &'a S,
    config: &'a FlashConfig,
}

impl<'a, B: QspiBus + ?Sized, S: CompletionSignal> QspiPort<'a, B, S> {
    /// Bundle a bus, its completion signal and the driver timeouts
    pub fn new(bus: &'a B, done: &'a S, config: &'a FlashConfig) -> Self {
        Self { bus, done, config }
    }

    /// The driver timeouts
    pub fn config(&self) -> &FlashConfig {
        self.config
    }

    /// Submit a command, checking the controller can carry it
    pub fn command(&self, cmd: &QspiCommand) -> Result<()> {
        check_io_mode_supported(cmd, self.bus.features())?;
        log::debug!(
            "qspi cmd {:02X} addr {:?} data {} bytes",
            cmd.instruction,
            cmd.address,
            cmd.data_len
        );
        self.bus.command(cmd, self.config.command_timeout_ms)?;
        Ok(())
    }

    /// Read a one-byte register with a blocking receive
    pub fn read_register(&self, opcode: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.command(&QspiCommand::read_reg(opcode, 1))?;
        self.bus.receive(&mut buf, self.config.command_timeout_ms)?;
        Ok(buf[0])
    }

    /// Write a one-byte register with a blocking transmit
    ///
    /// The caller is responsible for the preceding write enable.
    pub fn write_register(&self, opcode: u8, value: u8) -> Result<()> {
        self.command(&QspiCommand::write_reg(opcode, 1))?;
        self.bus.transmit(&[value], self.config.command_timeout_ms)?;
        Ok(())
    }

    /// Send the Write Enable command
    pub fn write_enable(&self) -> Result<()> {
        self.command(&QspiCommand::simple(opcodes::WREN))
    }

    /// Send a command followed by a blocking transmit of its data phase
    pub fn program(&self, cmd: &QspiCommand, data: &[u8]) -> Result<()> {
        self.command(cmd)?;
        self.bus.transmit(data, self.config.command_timeout_ms)?;
        Ok(())
    }

    /// Send a read command and receive its data phase by interrupt
    ///
    /// Waits up to `timeout_ms` for the receive-complete interrupt. On any
    /// failure after the receive started the transfer is aborted before
    /// returning, so `buf` is never written once this returns.
    #[maybe_async]
    pub async fn receive_and_wait(
        &self,
        cmd: &QspiCommand,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<()> {
        self.done.reset();
        self.command(cmd)?;
        // SAFETY: `buf` outlives the transfer: we either see the completion
        // or abort the controller before the borrow ends.
        unsafe { self.bus.receive_it(buf)? };
        if let Err(e) = self.wait(timeout_ms).await {
            // ignore abort failure, the timeout is the error to report
            let _ = self.abort();
            return Err(e);
        }
        Ok(())
    }

    /// Program a page, then wait until the chip reports ready
    #[maybe_async]
    pub async fn program_and_wait(&self, cmd: &QspiCommand, data: &[u8]) -> Result<()> {
        self.program(cmd, data)?;
        self.poll_until_ready(self.config.command_timeout_ms).await
    }

    /// Auto-poll SR1 until the write-in-progress bit clears
    #[maybe_async]
    pub async fn poll_until_ready(&self, timeout_ms: u32) -> Result<()> {
        self.done.reset();
        let cmd = QspiCommand::read_reg(opcodes::RDSR, 1);
        check_io_mode_supported(&cmd, self.bus.features())?;
        self.bus.auto_polling_it(&cmd, &AutoPoll::until_ready())?;
        self.wait(timeout_ms).await
    }

    /// Hand the controller a read template for memory-mapped mode
    pub fn memory_mapped(&self, cmd: &QspiCommand, cfg: &MemoryMapped) -> Result<()> {
        check_io_mode_supported(cmd, self.bus.features())?;
        log::debug!("qspi mapped cmd {:02X}", cmd.instruction);
        self.bus.memory_mapped(cmd, cfg)?;
        Ok(())
    }

    /// Abort whatever the controller is doing
    pub fn abort(&self) -> Result<()> {
        self.bus.abort()?;
        Ok(())
    }

    #[maybe_async]
    async fn wait(&self, timeout_ms: u32) -> Result<()> {
        if self.done.wait_for(timeout_ms).await {
            Ok(())
        } else {
            log::warn!("qspi completion not signalled within {} ms", timeout_ms);
            Err(Error::CompletionTimeout)
        }
    }
}
