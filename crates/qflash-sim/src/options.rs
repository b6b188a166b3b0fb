//! Backend option parsing
//!
//! Options come from a backend string such as
//! `sim:chip=w25q16,image=boot.bin,latency_us=200`.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SimError};
use crate::SimChip;

/// Simulator configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimConfig {
    /// Chip model
    pub chip: SimChip,
    /// Initial flash contents, loaded at offset 0
    pub image: Option<PathBuf>,
    /// Delay between a submission and its completion interrupt
    pub latency: Option<Duration>,
}

/// Parse `key=value` options into a configuration
pub fn parse_options(options: &[(&str, &str)]) -> Result<SimConfig> {
    let mut config = SimConfig::default();

    for (key, value) in options {
        match *key {
            "chip" => {
                config.chip =
                    SimChip::by_name(value).ok_or_else(|| SimError::UnknownChip(value.to_string()))?;
            }
            "image" => {
                config.image = Some(PathBuf::from(value));
            }
            "latency_us" => {
                let us: u64 = value.parse().map_err(|_| SimError::InvalidOption {
                    key: key.to_string(),
                    value: value.to_string(),
                })?;
                config.latency = (us > 0).then(|| Duration::from_micros(us));
            }
            _ => {
                log::warn!("sim: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.chip, SimChip::w25q80());
        assert!(config.image.is_none());
        assert!(config.latency.is_none());
    }

    #[test]
    fn test_parse() {
        let config = parse_options(&[
            ("chip", "mx25l1606"),
            ("image", "/tmp/x.bin"),
            ("latency_us", "250"),
        ])
        .unwrap();
        assert_eq!(config.chip, SimChip::mx25l1606());
        assert_eq!(config.image, Some(PathBuf::from("/tmp/x.bin")));
        assert_eq!(config.latency, Some(Duration::from_micros(250)));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse_options(&[("chip", "nope")]),
            Err(SimError::UnknownChip(_))
        ));
        assert!(matches!(
            parse_options(&[("latency_us", "soon")]),
            Err(SimError::InvalidOption { .. })
        ));
    }
}
