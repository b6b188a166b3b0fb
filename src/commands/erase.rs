//! Erase command implementation

use crate::backends::Target;
use crate::error::CliError;
use qflash_core::flash::EraseKind;

use super::spinner;

/// Erase one unit of `kind` at `start`, or the whole chip when `start` is absent
pub fn run_erase(target: &Target, start: Option<u32>, kind: EraseKind) -> Result<(), CliError> {
    let flash = target.flash;
    flash.identify()?;

    let (address, kind) = match start {
        Some(address) => (address, kind),
        None => (0, EraseKind::Chip),
    };

    let pb = match kind {
        EraseKind::Chip => spinner(format!(
            "Erasing {} bytes (this may take a while)...",
            flash.geometry()?.total_size()
        )),
        _ => spinner(format!("Erasing {} at {:#010X}...", kind, address)),
    };
    let result = flash.erase(address, kind);
    pb.finish_and_clear();
    result?;

    match kind {
        EraseKind::Chip => println!("Chip erase complete"),
        _ => println!("Erased {} at {:#010X}", kind, address),
    }
    Ok(())
}
