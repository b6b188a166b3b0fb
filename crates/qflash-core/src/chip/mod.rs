//! Flash chip identity, geometry and database
//!
//! This module decodes the JEDEC identification response, derives the
//! chip geometry from it, and keeps a small table of known parts used for
//! reporting.

mod database;
mod types;

pub use database::*;
pub use types::*;
