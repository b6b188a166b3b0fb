//! Error types for the command-line front end

use thiserror::Error;

/// Errors reported by the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Backend name not recognised
    #[error("Unknown backend: {name} (available: {available})")]
    UnknownBackend { name: String, available: String },

    /// Driver operation failed
    #[error("Flash error: {0}")]
    Flash(#[from] qflash_core::Error),

    /// Simulator setup failed
    #[error("Simulator error: {0}")]
    Sim(#[from] qflash_sim::SimError),

    /// File access failed
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("Invalid config file {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Requested range is outside the chip
    #[error("{len} bytes at {start:#X} do not fit in a {size} byte flash")]
    OutOfRange { start: u32, len: usize, size: u32 },

    /// Read-back differs from what was written
    #[error("Verification failed at {address:#010X}: expected {expected:#04X}, found {found:#04X}")]
    VerifyFailed { address: u32, expected: u8, found: u8 },

    /// Self-test read-back differs from the written block
    #[error("Self-test compare error in sector {sector}")]
    CompareFailed { sector: u32 },
}
