//! CLI command implementations
//!
//! Every command runs against an opened [`Target`](crate::backends::Target)
//! and identifies the chip first, as the driver refuses everything else
//! until it knows what it is talking to.

mod erase;
mod list;
mod mapped;
mod probe;
mod read;
mod selftest;
mod write;

pub use erase::run_erase;
pub use list::{list_backends, list_chips};
pub use mapped::run_dump_mapped;
pub use probe::{run_info, run_probe};
pub use read::run_read;
pub use selftest::run_selftest;
pub use write::run_write;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Transfer size per driver call
const CHUNK_SIZE: usize = 4096;

/// Byte progress bar labelled with `phase`
fn bytes_bar(total: u64, phase: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Spinner for operations without intermediate progress
fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
