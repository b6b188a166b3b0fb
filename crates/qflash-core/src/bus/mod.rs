//! Bus controller abstraction
//!
//! This module defines the trait a QSPI controller driver must implement
//! so the flash driver can sequence commands on it.

mod traits;

pub use traits::*;
