//! Flash driver
//!
//! This module provides the driver object that sequences identification,
//! quad enable, memory-mapped mode, reads, page-bounded writes and erases
//! on a QSPI bus.

mod config;
mod driver;
mod erase;
mod port;
mod split;

pub use config::FlashConfig;
pub use driver::*;
pub use erase::EraseKind;
pub use port::QspiPort;
pub use split::{page_chunks, PageChunk, PageChunks};
