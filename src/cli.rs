//! CLI argument parsing

use crate::backends;
use clap::{Parser, Subcommand};
use qflash_core::flash::EraseKind;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse an erase granularity by its short name
fn parse_erase_kind(s: &str) -> Result<EraseKind, String> {
    EraseKind::ALL
        .into_iter()
        .find(|k| k.name().eq_ignore_ascii_case(s))
        .ok_or_else(|| {
            let names: Vec<_> = EraseKind::ALL.iter().map(|k| k.name()).collect();
            format!("Unknown erase kind '{}' (expected one of: {})", s, names.join(", "))
        })
}

/// Generate dynamic help text for the backend argument
fn backend_help() -> String {
    format!(
        "Bus backend to use [available: {}]",
        backends::backend_names_short()
    )
}

#[derive(Parser)]
#[command(name = "qflash")]
#[command(author, version, about = "QSPI NOR flash driver front end", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Driver timeouts (TOML file with FlashConfig keys)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the flash chip
    Probe {
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,
    },

    /// Show chip, geometry and driver information
    Info {
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,
    },

    /// Read flash contents to file
    Read {
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex, e.g. 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Number of bytes to read (defaults to the rest of the chip)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,
    },

    /// Erase the covered sectors and write a file to flash
    Write {
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Start address (hex, e.g. 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Skip reading the data back after writing
        #[arg(long)]
        no_verify: bool,
    },

    /// Erase one unit, or the whole chip without --start
    Erase {
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,

        /// Start address of the unit (hex, e.g. 0x10000)
        #[arg(long, value_parser = parse_hex_u32)]
        start: Option<u32>,

        /// Erase granularity: sector, block32k, block64k or chip
        #[arg(long, value_parser = parse_erase_kind, default_value = "sector")]
        kind: EraseKind,
    },

    /// Read the whole chip through memory-mapped mode
    DumpMapped {
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Erase, write and read back sectors with pseudo-random data
    Selftest {
        #[arg(short, long, default_value = "sim", help = backend_help())]
        backend: String,

        /// Number of sectors to test (defaults to all)
        #[arg(long)]
        sectors: Option<u32>,

        /// Seed for the test pattern
        #[arg(long, value_parser = parse_hex_u32, default_value = "0xBABA")]
        seed: u32,
    },

    /// List available bus backends
    ListBackends,

    /// List known flash chips
    ListChips {
        /// Filter by vendor
        #[arg(long)]
        vendor: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_parse_erase_kind() {
        assert_eq!(parse_erase_kind("block64k"), Ok(EraseKind::Block64K));
        assert_eq!(parse_erase_kind("CHIP"), Ok(EraseKind::Chip));
        assert!(parse_erase_kind("page").is_err());
    }

    #[test]
    fn test_erase_arguments() {
        let cli = Cli::parse_from(["qflash", "erase", "--start", "0x10000", "--kind", "block64k"]);
        match cli.command {
            Commands::Erase { backend, start, kind } => {
                assert_eq!(backend, "sim");
                assert_eq!(start, Some(0x10000));
                assert_eq!(kind, EraseKind::Block64K);
            }
            _ => panic!("expected erase"),
        }
    }
}
