//! Memory-mapped dump command

use crate::backends::Target;
use crate::error::CliError;
use std::path::Path;

use super::{bytes_bar, CHUNK_SIZE};

/// Read the whole chip through the mapped window into a file
///
/// The driver is returned to command mode before reporting any error.
pub fn run_dump_mapped(target: &Target, output: &Path) -> Result<(), CliError> {
    let flash = target.flash;
    flash.identify()?;
    flash.enter_quad_mode()?;
    flash.enter_memory_mapped()?;
    println!("Flash mapped at {:#010X}", flash.mapped_base());

    let result = dump(target);
    flash.exit_memory_mapped()?;
    let data = result?;

    std::fs::write(output, &data).map_err(|source| CliError::Io {
        path: output.display().to_string(),
        source,
    })?;
    println!("Wrote {} bytes to {}", data.len(), output.display());
    Ok(())
}

fn dump(target: &Target) -> Result<Vec<u8>, CliError> {
    let size = target.flash.geometry()?.total_size() as usize;
    let mut data = vec![0u8; size];
    let pb = bytes_bar(size as u64, "Reading mapped");
    for (i, chunk) in data.chunks_mut(CHUNK_SIZE).enumerate() {
        target.window.read_mapped(i * CHUNK_SIZE, chunk)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("Read complete");
    Ok(data)
}
