//! Write command implementation

use crate::backends::Target;
use crate::error::CliError;
use qflash_core::flash::EraseKind;
use std::path::Path;

use super::read::read_with_progress;
use super::{bytes_bar, spinner, CHUNK_SIZE};

/// Erase the sectors covered by the file, program it at `start`, then verify
pub fn run_write(target: &Target, input: &Path, start: u32, verify: bool) -> Result<(), CliError> {
    let data = std::fs::read(input).map_err(|source| CliError::Io {
        path: input.display().to_string(),
        source,
    })?;

    let flash = target.flash;
    flash.identify()?;
    flash.enter_quad_mode()?;

    let geometry = flash.geometry()?;
    if !geometry.is_valid_range(start, data.len()) {
        return Err(CliError::OutOfRange {
            start,
            len: data.len(),
            size: geometry.total_size(),
        });
    }
    if data.is_empty() {
        println!("Nothing to write");
        return Ok(());
    }

    // sectors touched by [start, start + len)
    let first = start / geometry.sector_size;
    let last = (start + data.len() as u32 - 1) / geometry.sector_size;
    let pb = spinner(format!("Erasing {} sectors...", last - first + 1));
    for sector in first..=last {
        pb.set_message(format!("Erasing sector {} of {}...", sector - first + 1, last - first + 1));
        flash.erase(sector * geometry.sector_size, EraseKind::Sector)?;
    }
    pb.finish_and_clear();

    let pb = bytes_bar(data.len() as u64, "Writing");
    for (i, chunk) in data.chunks(CHUNK_SIZE).enumerate() {
        let offset = i * CHUNK_SIZE;
        flash.write(start + offset as u32, chunk)?;
        pb.set_position((offset + chunk.len()) as u64);
    }
    pb.finish_with_message("Write complete");

    if verify {
        let back = read_with_progress(target, start, data.len())?;
        check_equal(start, &data, &back)?;
        println!("Verified {} bytes", data.len());
    }

    println!("Wrote {} bytes at {:#010X}", data.len(), start);
    Ok(())
}

/// Compare written and read-back data, reporting the first difference
fn check_equal(start: u32, expected: &[u8], found: &[u8]) -> Result<(), CliError> {
    match expected.iter().zip(found).position(|(a, b)| a != b) {
        Some(i) => Err(CliError::VerifyFailed {
            address: start + i as u32,
            expected: expected[i],
            found: found[i],
        }),
        None => Ok(()),
    }
}
