//! The flash driver object
//!
//! `QspiFlash` owns the lock, the completion signal and the cached chip
//! state, and borrows the bus controller. Every public operation takes the
//! lock for its whole command sequence, and every failure after a bus
//! command was issued aborts the controller before the lock is released.

use core::cell::UnsafeCell;

use crate::bus::{BusFeatures, QspiBus};
use crate::chip::{self, ChipIdentity, Geometry};
use crate::error::{Error, Result};
use crate::irq::QspiIrq;
use crate::os::{CompletionSignal, LockGuard, TimedMutex};
use crate::qspi::{opcodes, QspiCommand};
use crate::vendor::{Vendor, VendorOps};
use maybe_async::maybe_async;

use super::{page_chunks, EraseKind, FlashConfig, QspiPort};

/// Driver version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What the controller is currently set up for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BusMode {
    /// Indirect mode: the driver issues commands
    #[default]
    Command,
    /// The flash is mapped into the address space
    MemoryMapped,
}

#[derive(Debug, Clone, Copy, Default)]
struct DriverState {
    identity: Option<ChipIdentity>,
    geometry: Option<Geometry>,
    vendor: Option<Vendor>,
    quad_enabled: bool,
    mode: BusMode,
}

/// Chip facts a command-mode operation needs
#[derive(Debug, Clone, Copy)]
struct Ready {
    vendor: Vendor,
    geometry: Geometry,
}

impl DriverState {
    const fn new() -> Self {
        Self {
            identity: None,
            geometry: None,
            vendor: None,
            quad_enabled: false,
            mode: BusMode::Command,
        }
    }

    fn command_mode(&self) -> Result<()> {
        match self.mode {
            BusMode::Command => Ok(()),
            BusMode::MemoryMapped => Err(Error::MemoryMapped),
        }
    }

    fn ready(&self) -> Result<Ready> {
        self.command_mode()?;
        match (self.vendor, self.geometry) {
            (Some(vendor), Some(geometry)) => Ok(Ready { vendor, geometry }),
            _ => Err(Error::NotIdentified),
        }
    }

    fn forget_chip(&mut self) {
        // dropping the old strategy here is what keeps re-identification bounded
        self.identity = None;
        self.geometry = None;
        self.vendor = None;
        self.quad_enabled = false;
    }
}

/// QSPI NOR flash driver
///
/// All operations take `&self`, so one instance can be shared between
/// threads (or placed in a `static`, [`new`](Self::new) is `const`).
/// The cached state is only touched while the lock is held.
///
/// Completion interrupts must reach the driver through its [`QspiIrq`]
/// implementation, either directly or via an [`IrqSlot`](crate::irq::IrqSlot).
pub struct QspiFlash<'b, B: QspiBus + ?Sized, M: TimedMutex, S: CompletionSignal> {
    bus: &'b B,
    lock: M,
    done: S,
    config: FlashConfig,
    state: UnsafeCell<DriverState>,
}

// SAFETY: `state` is only read or written through a `Session`, which holds
// `lock` for its whole lifetime, and `TimedMutex` implementors guarantee
// that holder is exclusive. Everything else is shared immutably.
unsafe impl<B, M, S> Sync for QspiFlash<'_, B, M, S>
where
    B: QspiBus + Sync + ?Sized,
    M: TimedMutex + Sync,
    S: CompletionSignal + Sync,
{
}

/// A held driver lock and the state it protects
struct Session<'s, 'b, B: QspiBus + ?Sized, M: TimedMutex, S: CompletionSignal> {
    flash: &'s QspiFlash<'b, B, M, S>,
    _guard: LockGuard<'s, M>,
}

impl<'s, B: QspiBus + ?Sized, M: TimedMutex, S: CompletionSignal> Session<'s, '_, B, M, S> {
    fn state(&self) -> DriverState {
        // SAFETY: the lock is held while the session lives
        unsafe { *self.flash.state.get() }
    }

    fn update(&mut self, f: impl FnOnce(&mut DriverState)) {
        // SAFETY: the lock is held, and `&mut self` rules out another
        // reference derived from this session
        unsafe { f(&mut *self.flash.state.get()) }
    }

    fn port(&self) -> QspiPort<'s, B, S> {
        QspiPort::new(self.flash.bus, &self.flash.done, &self.flash.config)
    }
}

/// Abort the bus if `result` is an error, then hand the result back
fn finish<B, S, T>(port: &QspiPort<'_, B, S>, op: &str, result: Result<T>) -> Result<T>
where
    B: QspiBus + ?Sized,
    S: CompletionSignal,
{
    if let Err(e) = &result {
        log::warn!("{} failed: {}, aborting bus", op, e);
        if let Err(abort) = port.abort() {
            log::warn!("abort after failed {} also failed: {}", op, abort);
        }
    }
    result
}

fn check_range(geometry: &Geometry, address: u32, len: usize) -> Result<()> {
    if geometry.is_valid_range(address, len) {
        Ok(())
    } else {
        Err(Error::AddressOutOfBounds)
    }
}

impl<'b, B: QspiBus + ?Sized, M: TimedMutex, S: CompletionSignal> QspiFlash<'b, B, M, S> {
    /// Create a driver for the flash behind `bus`
    ///
    /// Nothing is sent to the chip until [`identify`](Self::identify).
    pub const fn new(bus: &'b B, lock: M, done: S, config: FlashConfig) -> Self {
        Self {
            bus,
            lock,
            done,
            config,
            state: UnsafeCell::new(DriverState::new()),
        }
    }

    /// Driver version string
    pub fn version() -> &'static str {
        VERSION
    }

    /// The configuration this driver was created with
    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// The borrowed bus controller
    pub fn bus(&self) -> &'b B {
        self.bus
    }

    /// The completion signal posted by the interrupt handlers
    pub fn signal(&self) -> &S {
        &self.done
    }

    /// Address the flash appears at while memory-mapped
    pub fn mapped_base(&self) -> u32 {
        self.config.mapped_base
    }

    #[maybe_async]
    async fn session(&self) -> Result<Session<'_, 'b, B, M, S>> {
        let guard = LockGuard::acquire(&self.lock, self.config.lock_timeout_ms).await?;
        Ok(Session {
            flash: self,
            _guard: guard,
        })
    }

    // ------------------------------------------------------------------
    // Identification
    // ------------------------------------------------------------------

    /// Read the JEDEC ID and select the vendor strategy
    ///
    /// Any previous identity is dropped first, so a failure leaves the
    /// driver unidentified. Success replaces the previous strategy.
    #[maybe_async]
    pub async fn identify(&self) -> Result<ChipIdentity> {
        let mut session = self.session().await?;
        session.state().command_mode()?;
        session.update(DriverState::forget_chip);

        let port = session.port();
        let result = Self::read_identity(&port).await;
        let (identity, geometry, vendor) = finish(&port, "identify", result)?;

        session.update(|s| {
            s.identity = Some(identity);
            s.geometry = Some(geometry);
            s.vendor = Some(vendor);
        });
        log::info!(
            "identified {} {} ({}), {} x {} byte sectors",
            chip::manufacturer_name(identity.manufacturer),
            chip::find_by_identity(&identity).map_or("unknown part", |c| c.name),
            identity,
            geometry.sector_count,
            geometry.sector_size
        );
        Ok(identity)
    }

    #[maybe_async]
    async fn read_identity(port: &QspiPort<'_, B, S>) -> Result<(ChipIdentity, Geometry, Vendor)> {
        port.abort()?;
        let mut raw = [0u8; 3];
        let cmd = QspiCommand::read_reg(opcodes::RDID, raw.len());
        let timeout = port.config().command_timeout_ms;
        port.receive_and_wait(&cmd, &mut raw, timeout).await?;

        let identity = ChipIdentity::from_jedec(raw)?;
        let vendor = Vendor::for_manufacturer(identity.manufacturer)?;
        let geometry = identity.geometry()?;
        Ok((identity, geometry, vendor))
    }

    /// Identity read by the last successful [`identify`](Self::identify)
    #[maybe_async]
    pub async fn identity(&self) -> Result<ChipIdentity> {
        let session = self.session().await?;
        session.state().identity.ok_or(Error::NotIdentified)
    }

    /// Page and sector layout of the identified chip
    #[maybe_async]
    pub async fn geometry(&self) -> Result<Geometry> {
        let session = self.session().await?;
        session.state().geometry.ok_or(Error::NotIdentified)
    }

    /// Sector size in bytes
    #[maybe_async]
    pub async fn sector_size(&self) -> Result<u32> {
        Ok(self.geometry().await?.sector_size)
    }

    /// Number of sectors
    #[maybe_async]
    pub async fn sector_count(&self) -> Result<u32> {
        Ok(self.geometry().await?.sector_count)
    }

    /// Vendor name of the identified chip
    #[maybe_async]
    pub async fn manufacturer_name(&self) -> Result<&'static str> {
        let id = self.identity().await?;
        Ok(chip::manufacturer_name(id.manufacturer))
    }

    /// Part name of the identified chip, if it is in the table
    #[maybe_async]
    pub async fn part_name(&self) -> Result<Option<&'static str>> {
        let id = self.identity().await?;
        Ok(chip::find_by_identity(&id).map(|c| c.name))
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    /// Make sure the chip accepts quad data phases
    ///
    /// Does nothing on the bus beyond a status read when quad mode is
    /// already on.
    #[maybe_async]
    pub async fn enter_quad_mode(&self) -> Result<()> {
        let mut session = self.session().await?;
        let ready = session.state().ready()?;

        let port = session.port();
        let result = ready.vendor.mode_quad(&port).await;
        finish(&port, "quad enable", result)?;

        session.update(|s| s.quad_enabled = true);
        log::info!("{}: quad mode enabled", ready.vendor.name());
        Ok(())
    }

    /// Whether [`enter_quad_mode`](Self::enter_quad_mode) succeeded since identification
    #[maybe_async]
    pub async fn is_quad_enabled(&self) -> Result<bool> {
        let session = self.session().await?;
        Ok(session.state().quad_enabled)
    }

    /// Map the flash at [`mapped_base`](Self::mapped_base)
    ///
    /// Command-mode operations fail with [`Error::MemoryMapped`] until
    /// [`exit_memory_mapped`](Self::exit_memory_mapped). Entering twice
    /// is a no-op.
    #[maybe_async]
    pub async fn enter_memory_mapped(&self) -> Result<()> {
        let mut session = self.session().await?;
        let state = session.state();
        if state.mode == BusMode::MemoryMapped {
            log::debug!("already memory-mapped");
            return Ok(());
        }
        let ready = state.ready()?;
        if !self.bus.features().contains(BusFeatures::MEMORY_MAPPED) {
            return Err(Error::IoModeNotSupported);
        }

        let port = session.port();
        let result = Self::map_locked(&port, ready).await;
        finish(&port, "memory-mapped entry", result)?;

        session.update(|s| s.mode = BusMode::MemoryMapped);
        log::info!("flash memory-mapped at {:#010X}", self.config.mapped_base);
        Ok(())
    }

    #[maybe_async]
    async fn map_locked(port: &QspiPort<'_, B, S>, ready: Ready) -> Result<()> {
        port.abort()?;
        ready.vendor.memory_mapped(port).await
    }

    /// Abort the mapped transaction and return to command mode
    ///
    /// Also succeeds when the flash was not mapped, after resetting the
    /// controller all the same.
    #[maybe_async]
    pub async fn exit_memory_mapped(&self) -> Result<()> {
        let mut session = self.session().await?;
        session.port().abort()?;
        if session.state().mode == BusMode::MemoryMapped {
            log::info!("flash back in command mode");
        }
        session.update(|s| s.mode = BusMode::Command);
        Ok(())
    }

    /// Whether the flash is currently memory-mapped
    #[maybe_async]
    pub async fn is_memory_mapped(&self) -> Result<bool> {
        let session = self.session().await?;
        Ok(session.state().mode == BusMode::MemoryMapped)
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Read `buf.len()` bytes starting at `address`
    ///
    /// One read command, no retry. On failure the contents of `buf` are
    /// unspecified.
    #[maybe_async]
    pub async fn read(&self, address: u32, buf: &mut [u8]) -> Result<()> {
        let session = self.session().await?;
        let ready = session.state().ready()?;
        check_range(&ready.geometry, address, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }

        let port = session.port();
        let result = Self::read_locked(&port, ready, address, buf).await;
        finish(&port, "read", result)
    }

    #[maybe_async]
    async fn read_locked(
        port: &QspiPort<'_, B, S>,
        ready: Ready,
        address: u32,
        buf: &mut [u8],
    ) -> Result<()> {
        port.abort()?;
        ready.vendor.read(port, address, buf).await
    }

    /// Program `data` starting at `address`
    ///
    /// The write is cut at page boundaries and each piece is programmed
    /// and polled to completion in turn. The first failing page stops the
    /// write; pages already programmed stay programmed. The region must
    /// have been erased.
    #[maybe_async]
    pub async fn write(&self, address: u32, data: &[u8]) -> Result<()> {
        let session = self.session().await?;
        let ready = session.state().ready()?;
        check_range(&ready.geometry, address, data.len())?;
        if data.is_empty() {
            return Ok(());
        }

        let port = session.port();
        let result = Self::write_locked(&port, ready, address, data).await;
        finish(&port, "write", result)
    }

    #[maybe_async]
    async fn write_locked(
        port: &QspiPort<'_, B, S>,
        ready: Ready,
        address: u32,
        data: &[u8],
    ) -> Result<()> {
        port.abort()?;
        for chunk in page_chunks(address, data.len(), ready.geometry.page_size) {
            let bytes = &data[chunk.offset..chunk.offset + chunk.len];
            ready.vendor.page_write(port, chunk.address, bytes).await?;
        }
        Ok(())
    }

    /// Erase the unit of size `kind` starting at `address`
    ///
    /// `address` must be aligned to the erase unit. It is ignored for
    /// [`EraseKind::Chip`]. A failed erase may still have erased part of
    /// the unit.
    #[maybe_async]
    pub async fn erase(&self, address: u32, kind: EraseKind) -> Result<()> {
        let session = self.session().await?;
        let ready = session.state().ready()?;
        if let Some(size) = kind.size() {
            if address % size != 0 {
                return Err(Error::InvalidAlignment);
            }
            check_range(&ready.geometry, address, size as usize)?;
        }

        let port = session.port();
        let result = Self::erase_locked(&port, kind, address).await;
        finish(&port, "erase", result)?;
        log::debug!("erased {} at {:#08X}", kind, address);
        Ok(())
    }

    #[maybe_async]
    async fn erase_locked(port: &QspiPort<'_, B, S>, kind: EraseKind, address: u32) -> Result<()> {
        port.abort()?;
        port.write_enable()?;
        port.command(&kind.command(address))?;
        port.poll_until_ready(kind.timeout_ms(port.config())).await
    }

    /// Erase the whole chip
    #[maybe_async]
    pub async fn erase_chip(&self) -> Result<()> {
        self.erase(0, EraseKind::Chip).await
    }

    // ------------------------------------------------------------------
    // Sector helpers
    // ------------------------------------------------------------------

    /// Read the start of sector `index` into `buf` (at most one sector)
    #[maybe_async]
    pub async fn read_sector(&self, index: u32, buf: &mut [u8]) -> Result<()> {
        let session = self.session().await?;
        let ready = session.state().ready()?;
        let address = ready.geometry.sector_address(index)?;
        if buf.len() > ready.geometry.sector_size as usize {
            return Err(Error::AddressOutOfBounds);
        }
        if buf.is_empty() {
            return Ok(());
        }

        let port = session.port();
        let result = Self::read_locked(&port, ready, address, buf).await;
        finish(&port, "sector read", result)
    }

    /// Erase sector `index`, then program `data` at its start
    #[maybe_async]
    pub async fn write_sector(&self, index: u32, data: &[u8]) -> Result<()> {
        let session = self.session().await?;
        let ready = session.state().ready()?;
        let address = ready.geometry.sector_address(index)?;
        if data.len() > ready.geometry.sector_size as usize {
            return Err(Error::AddressOutOfBounds);
        }

        let port = session.port();
        let result = Self::erase_locked(&port, EraseKind::Sector, address).await;
        finish(&port, "sector erase", result)?;
        if data.is_empty() {
            return Ok(());
        }
        let result = Self::write_locked(&port, ready, address, data).await;
        finish(&port, "sector write", result)
    }
}

impl<B: QspiBus + ?Sized, M: TimedMutex, S: CompletionSignal> QspiIrq for QspiFlash<'_, B, M, S> {
    fn status_match(&self) {
        self.done.post();
    }

    fn receive_complete(&self) {
        self.done.post();
    }
}
