//! Error types for the simulator

use thiserror::Error;

/// Simulator specific errors
#[derive(Debug, Error)]
pub enum SimError {
    /// Chip name not known to the simulator
    #[error("Unknown chip: {0} (known: {known})", known = crate::SimChip::names())]
    UnknownChip(String),

    /// Option value could not be parsed
    #[error("Invalid value for {key}: {value}")]
    InvalidOption { key: String, value: String },

    /// Failed to read the initial image
    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Image does not fit in the chip
    #[error("Image is {image} bytes but the chip holds {chip}")]
    ImageTooLarge { image: usize, chip: usize },

    /// An interrupt target is already attached
    #[error("Interrupt target already attached")]
    IrqAlreadyAttached,

    /// Mapped access while not memory-mapped
    #[error("Controller is not in memory-mapped mode")]
    NotMapped,

    /// Mapped access beyond the chip
    #[error("Mapped read of {len} bytes at {offset:#x} is out of range")]
    MappedOutOfRange { offset: usize, len: usize },
}

/// Result type for simulator operations
pub type Result<T> = std::result::Result<T, SimError>;
