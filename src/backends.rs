//! Bus backend registration and dispatch
//!
//! A backend string names the backend and optionally carries options,
//! e.g. `sim` or `sim:chip=w25q16,image=boot.bin,latency_us=100`.

use qflash_core::bus::BusInfo;
use qflash_core::flash::FlashConfig;
use qflash_sim::{SimFlash, SimQspi};

use crate::error::CliError;

/// Read access to the flash while it is memory-mapped
pub trait MappedWindow {
    /// Copy `buf.len()` bytes starting `offset` bytes into the window
    fn read_mapped(&self, offset: usize, buf: &mut [u8]) -> Result<(), CliError>;
}

impl MappedWindow for SimQspi {
    fn read_mapped(&self, offset: usize, buf: &mut [u8]) -> Result<(), CliError> {
        Ok(self.mapped_read(offset, buf)?)
    }
}

/// An opened backend: the driver and its mapped window
pub struct Target {
    /// Flash driver bound to the backend's bus
    pub flash: &'static SimFlash,
    /// What the CPU sees at the mapped base
    pub window: &'static dyn MappedWindow,
}

/// Backends compiled into this binary
pub fn available_backends() -> Vec<BusInfo> {
    vec![BusInfo {
        name: "sim",
        aliases: &["simulator", "dummy"],
        description: "Simulated QSPI controller and NOR flash \
                      (chip=<model>,image=<file>,latency_us=<n>)",
    }]
}

/// Short list of backend names for CLI help
pub fn backend_names_short() -> String {
    available_backends()
        .iter()
        .map(|b| b.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve a backend name or alias to its canonical name
pub fn find_backend(name: &str) -> Option<&'static str> {
    available_backends()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
        .map(|b| b.name)
}

/// Parse a backend string into name and options
///
/// Format: `name` or `name:key=value,key=value`
pub fn parse_backend_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Open the backend described by `backend` with a driver using `config`
pub fn open_backend(backend: &str, config: FlashConfig) -> Result<Target, CliError> {
    let (name, options) = parse_backend_string(backend);

    match find_backend(name) {
        Some("sim") => {
            let sim_config = qflash_sim::parse_options(&options)?;
            log::info!("Opening simulator ({})", sim_config.chip.name);
            let sim = SimQspi::from_config(&sim_config)?;
            let (sim, flash) = qflash_sim::leak_driver(sim, config);
            Ok(Target { flash, window: sim })
        }
        _ => Err(CliError::UnknownBackend {
            name: name.to_string(),
            available: backend_names_short(),
        }),
    }
}
