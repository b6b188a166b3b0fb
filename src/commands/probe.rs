//! Probe and info commands

use crate::backends::Target;
use crate::error::CliError;
use qflash_sim::SimFlash;

use super::format_size;

/// Identify the chip and print what was found
pub fn run_probe(target: &Target) -> Result<(), CliError> {
    let flash = target.flash;
    let id = flash.identify()?;
    let geometry = flash.geometry()?;

    println!("Found flash chip:");
    println!("  Vendor:   {}", flash.manufacturer_name()?);
    println!("  Name:     {}", flash.part_name()?.unwrap_or("(not in table)"));
    println!(
        "  Size:     {} bytes ({})",
        geometry.total_size(),
        format_size(geometry.total_size())
    );
    println!("  JEDEC ID: {}", id);
    Ok(())
}

/// Identify the chip, enable quad mode and print the driver state
pub fn run_info(target: &Target) -> Result<(), CliError> {
    let flash = target.flash;
    run_probe(target)?;
    flash.enter_quad_mode()?;

    let config = flash.config();
    println!();
    println!("Geometry:");
    println!("  Page size:    {} bytes", flash.geometry()?.page_size);
    println!("  Sector size:  {} bytes", flash.sector_size()?);
    println!("  Sector count: {}", flash.sector_count()?);
    println!();
    println!("Driver {}:", SimFlash::version());
    println!("  Quad mode:      {}", flash.is_quad_enabled()?);
    println!("  Memory-mapped:  {}", flash.is_memory_mapped()?);
    println!("  Mapped base:    {:#010X}", flash.mapped_base());
    println!("  Lock timeout:   {} ms", config.lock_timeout_ms);
    println!("  Cmd timeout:    {} ms", config.command_timeout_ms);
    println!("  Erase timeout:  {} ms", config.erase_timeout_ms);
    println!("  Chip erase:     {} ms", config.chip_erase_timeout_ms);
    Ok(())
}
