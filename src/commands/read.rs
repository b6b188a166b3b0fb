//! Read command implementation

use crate::backends::Target;
use crate::error::CliError;
use std::path::Path;

use super::{bytes_bar, CHUNK_SIZE};

/// Read `length` bytes from `start` (default: to the end of the chip) into a file
pub fn run_read(
    target: &Target,
    output: &Path,
    start: u32,
    length: Option<u32>,
) -> Result<(), CliError> {
    let flash = target.flash;
    flash.identify()?;
    flash.enter_quad_mode()?;

    let size = flash.geometry()?.total_size();
    let len = length.unwrap_or(size.saturating_sub(start)) as usize;
    if !flash.geometry()?.is_valid_range(start, len) {
        return Err(CliError::OutOfRange { start, len, size });
    }

    let data = read_with_progress(target, start, len)?;
    std::fs::write(output, &data).map_err(|source| CliError::Io {
        path: output.display().to_string(),
        source,
    })?;

    println!("Wrote {} bytes to {}", data.len(), output.display());
    Ok(())
}

/// Read a range in chunks with a progress bar
pub(super) fn read_with_progress(
    target: &Target,
    start: u32,
    len: usize,
) -> Result<Vec<u8>, CliError> {
    let mut data = vec![0u8; len];
    let pb = bytes_bar(len as u64, "Reading");

    for (i, chunk) in data.chunks_mut(CHUNK_SIZE).enumerate() {
        let offset = i * CHUNK_SIZE;
        target.flash.read(start + offset as u32, chunk)?;
        pb.set_position((offset + chunk.len()) as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
