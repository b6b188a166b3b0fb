//! List commands implementation

use crate::backends;
use qflash_core::chip::KNOWN_CHIPS;
use qflash_sim::SimChip;

use super::format_size;

/// List the bus backends compiled in
pub fn list_backends() {
    println!("Available backends:");
    println!();
    for b in backends::available_backends() {
        println!("  {:10} - {}", b.name, b.description);
        if !b.aliases.is_empty() {
            println!("  {:10}   aliases: {}", "", b.aliases.join(", "));
        }
    }
    println!();
    println!("Simulated chips: {}", SimChip::names());
}

/// List the chips the driver knows by name
pub fn list_chips(vendor_filter: Option<&str>) {
    println!("Known flash chips:");
    println!();
    println!("{:<12} {:<20} {:>10} {:>10}", "Vendor", "Name", "Size", "JEDEC ID");
    println!("{}", "-".repeat(60));

    for chip in KNOWN_CHIPS {
        if let Some(vendor) = vendor_filter {
            if !chip.vendor.to_lowercase().contains(&vendor.to_lowercase()) {
                continue;
            }
        }

        let jedec = format!("{:02X} {:04X}", chip.jedec_manufacturer, chip.jedec_device);
        println!(
            "{:<12} {:<20} {:>10} {:>10}",
            chip.vendor,
            chip.name,
            format_size(chip.total_size()),
            jedec
        );
    }
}
