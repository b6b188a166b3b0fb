//! qflash - QSPI NOR flash driver front end
//!
//! Drives a NOR flash through the `qflash-core` driver over a selectable bus
//! backend. The only backend shipped is the simulator, which makes this a
//! convenient way to exercise the driver end to end:
//!
//! ```text
//! qflash probe -b sim:chip=w25q16
//! qflash write -b sim:chip=w25q16,latency_us=50 -i image.bin
//! qflash selftest -b sim --sectors 32
//! ```

mod backends;
mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use qflash_core::flash::FlashConfig;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Probe { backend } => {
            let target = backends::open_backend(&backend, config)?;
            commands::run_probe(&target)?;
        }
        Commands::Info { backend } => {
            let target = backends::open_backend(&backend, config)?;
            commands::run_info(&target)?;
        }
        Commands::Read {
            backend,
            output,
            start,
            length,
        } => {
            let target = backends::open_backend(&backend, config)?;
            commands::run_read(&target, &output, start, length)?;
        }
        Commands::Write {
            backend,
            input,
            start,
            no_verify,
        } => {
            let target = backends::open_backend(&backend, config)?;
            commands::run_write(&target, &input, start, !no_verify)?;
        }
        Commands::Erase {
            backend,
            start,
            kind,
        } => {
            let target = backends::open_backend(&backend, config)?;
            commands::run_erase(&target, start, kind)?;
        }
        Commands::DumpMapped { backend, output } => {
            let target = backends::open_backend(&backend, config)?;
            commands::run_dump_mapped(&target, &output)?;
        }
        Commands::Selftest {
            backend,
            sectors,
            seed,
        } => {
            let target = backends::open_backend(&backend, config)?;
            commands::run_selftest(&target, sectors, seed)?;
        }
        Commands::ListBackends => commands::list_backends(),
        Commands::ListChips { vendor } => commands::list_chips(vendor.as_deref()),
    }

    Ok(())
}

/// Load driver timeouts from a TOML file, or use the defaults
///
/// Missing keys keep their default value.
fn load_config(path: Option<&Path>) -> Result<FlashConfig, error::CliError> {
    let Some(path) = path else {
        return Ok(FlashConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| error::CliError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = toml::from_str(&text).map_err(|source| error::CliError::Config {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("Loaded driver config from {}: {:?}", path.display(), config);
    Ok(config)
}
