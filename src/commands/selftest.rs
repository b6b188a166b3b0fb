//! Self-test command
//!
//! Bring-up check for a board: identify, quad mode, memory-mapped erased
//! check, chip erase when needed, then write and read back pseudo-random
//! data sector by sector with timing.

use crate::backends::Target;
use crate::error::CliError;
use qflash_sim::SimFlash;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

use super::{spinner, CHUNK_SIZE};

/// Run the self-test over the first `sectors` sectors (default: all)
pub fn run_selftest(target: &Target, sectors: Option<u32>, seed: u32) -> Result<(), CliError> {
    let flash = target.flash;

    let sw = Instant::now();
    flash.identify()?;
    println!("Initialized in {:.3} ms", ms(sw.elapsed()));

    let sector_size = flash.sector_size()?;
    let sector_count = flash.sector_count()?;
    println!("Driver version: {}", SimFlash::version());
    println!(
        "Manufacturer: {}, type: {}, sector size: {} bytes, sector count: {}",
        flash.manufacturer_name()?,
        flash.part_name()?.unwrap_or("unknown"),
        sector_size,
        sector_count
    );
    let sectors = sectors.unwrap_or(sector_count).min(sector_count);

    let sw = Instant::now();
    flash.enter_quad_mode()?;
    println!("Entered quad mode in {:.3} ms", ms(sw.elapsed()));

    let sw = Instant::now();
    flash.enter_memory_mapped()?;
    println!("Entered memory mapped mode in {:.3} ms", ms(sw.elapsed()));

    let sw = Instant::now();
    let erased = mapped_is_erased(target, sectors as usize * sector_size as usize);
    flash.exit_memory_mapped()?;
    let erased = erased?;
    println!("Checked if flash is erased in {:.3} ms", ms(sw.elapsed()));

    if !erased {
        println!("Flash not empty, erasing the chip (it will take some time...)");
        let sw = Instant::now();
        let pb = spinner("Erasing chip...".to_string());
        let result = flash.erase_chip();
        pb.finish_and_clear();
        result?;
        println!("Erased in {:.2} s", sw.elapsed().as_secs_f64());
    }

    let mut rng = StdRng::seed_from_u64(u64::from(seed));
    let mut written = vec![0u8; sector_size as usize];
    let mut read = vec![0u8; sector_size as usize];
    let mut total_write = Duration::ZERO;
    let mut total_read = Duration::ZERO;

    for sector in 0..sectors {
        log::info!("Test block #{:5}", sector);
        rng.fill(&mut written[..]);

        let sw = Instant::now();
        flash.write_sector(sector, &written)?;
        total_write += sw.elapsed();

        let sw = Instant::now();
        flash.read_sector(sector, &mut read)?;
        total_read += sw.elapsed();

        if written != read {
            return Err(CliError::CompareFailed { sector });
        }
    }

    println!("Flash test passed");
    println!(
        "Total write time {:.2} s, total read time {:.2} s",
        total_write.as_secs_f64(),
        total_read.as_secs_f64()
    );
    if sectors > 0 {
        println!(
            "Avg. sector write time {:.2} ms, avg. sector read time {:.2} ms",
            ms(total_write / sectors),
            ms(total_read / sectors)
        );
    }
    Ok(())
}

fn mapped_is_erased(target: &Target, len: usize) -> Result<bool, CliError> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut offset = 0;
    while offset < len {
        let n = CHUNK_SIZE.min(len - offset);
        target.window.read_mapped(offset, &mut buf[..n])?;
        if buf[..n].iter().any(|&b| b != 0xFF) {
            log::debug!("First programmed byte in chunk at {:#X}", offset);
            return Ok(false);
        }
        offset += n;
    }
    Ok(true)
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
