//! qflash-core - QSPI NOR flash driver core
//!
//! This crate drives a serial NOR flash chip attached to a quad-SPI
//! controller under an RTOS. It turns logical operations (identify, read,
//! write, erase, quad enable, memory-mapped mode) into sequences of bus
//! commands, waits for interrupt-driven completion, and keeps chip-family
//! quirks behind a per-vendor strategy. It is `no_std` compatible.
//!
//! # Features
//!
//! - `std` - Enable standard library support, hosted
//!   RTOS primitives and `serde` support for [`flash::FlashConfig`]
//! - `is_sync` - Compile the driver as blocking code (RTOS threads) instead
//!   of `async`
//!
//! # Example
//!
//! ```ignore
//! use qflash_core::flash::{EraseKind, FlashConfig, QspiFlash};
//!
//! fn bring_up<B: QspiBus>(bus: &B, lock: MyMutex, done: MySignal) -> qflash_core::Result<()> {
//!     let flash = QspiFlash::new(bus, lock, done, FlashConfig::default());
//!     let id = flash.identify()?;
//!     println!("Found {:02X} {:02X} {:02X}", id.manufacturer, id.memory_type, id.capacity);
//!     flash.enter_quad_mode()?;
//!     flash.erase(0x1000, EraseKind::Sector)?;
//!     flash.write(0x1000, b"hello")?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod chip;
pub mod error;
pub mod flash;
pub mod irq;
pub mod os;
pub mod qspi;
pub mod vendor;

pub use error::{BusError, Error, Result};
