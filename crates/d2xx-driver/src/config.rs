//! TOML driver configuration
//!
//! ```toml
//! [[filter]]
//! type = "FT232R"   # variant name, "any" or "none"
//! index = 1         # optional; -1 or absent = any
//!
//! [[filter]]
//! type = "FT2232H"
//!
//! [setup]
//! latency_timer_ms = 2
//! read_timeout_ms = 500
//! ```
//!
//! Filters are evaluated in file order.

use std::fs;
use std::path::Path;
use std::time::Duration;

use d2xx_core::{Filter, FilterDeviceIdx, FilterDeviceType};

use crate::error::{Error, Result};
use crate::setup::SetupConfig;

/// Filters and setup parameters for a [`Driver`](crate::Driver)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverConfig {
    pub filters: Vec<Filter>,
    pub setup: SetupConfig,
}

/// Configuration file structure
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfigFile {
    #[serde(default)]
    filter: Vec<TomlFilter>,
    #[serde(default)]
    setup: TomlSetup,
}

/// Filter definition in TOML
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlFilter {
    #[serde(rename = "type", default)]
    dev_type: Option<String>,
    #[serde(default)]
    index: Option<TomlIndex>,
}

/// Ordinal given either as an integer or as "any"/"none"
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum TomlIndex {
    Int(i64),
    Str(String),
}

/// Setup overrides in TOML; absent fields keep their defaults
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlSetup {
    read_timeout_ms: Option<u64>,
    write_timeout_ms: Option<u64>,
    latency_timer_ms: Option<u64>,
    usb_in_size: Option<u32>,
    usb_out_size: Option<u32>,
    event_char: Option<u8>,
    error_char: Option<u8>,
    flush_limit: Option<usize>,
}

impl TomlFilter {
    fn into_filter(self) -> Result<Filter> {
        let dev_type = match self.dev_type {
            Some(name) => name.parse()?,
            None => FilterDeviceType::Any,
        };
        let device_idx = match self.index {
            None => FilterDeviceIdx::Any,
            Some(TomlIndex::Int(raw)) => FilterDeviceIdx::from_raw(raw),
            Some(TomlIndex::Str(s)) => s.parse()?,
        };
        Ok(Filter {
            dev_type,
            device_idx,
        })
    }
}

impl TomlSetup {
    fn into_setup(self) -> Result<SetupConfig> {
        let mut setup = SetupConfig::default();
        if let Some(ms) = self.read_timeout_ms {
            setup.read_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.write_timeout_ms {
            setup.write_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.latency_timer_ms {
            setup.latency_timer_ms = match u8::try_from(ms) {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(Error::Config(format!(
                        "latency_timer_ms must be 1-255, got {}",
                        ms
                    )))
                }
            };
        }
        if let Some(size) = self.usb_in_size {
            setup.usb_in_size = check_transfer_size("usb_in_size", size)?;
        }
        if let Some(size) = self.usb_out_size {
            setup.usb_out_size = check_transfer_size("usb_out_size", size)?;
        }
        if let Some(c) = self.event_char {
            setup.event_char = c;
        }
        if let Some(c) = self.error_char {
            setup.error_char = c;
        }
        if let Some(limit) = self.flush_limit {
            setup.flush_limit = limit;
        }
        Ok(setup)
    }
}

/// USB transfer sizes must be a non-zero multiple of 64
fn check_transfer_size(name: &str, size: u32) -> Result<u32> {
    if size == 0 || size % 64 != 0 {
        return Err(Error::Config(format!(
            "{} must be a non-zero multiple of 64, got {}",
            name, size
        )));
    }
    Ok(size)
}

impl DriverConfig {
    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlConfigFile = toml::from_str(content)?;
        let filters = file
            .filter
            .into_iter()
            .map(TomlFilter::into_filter)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            filters,
            setup: file.setup.into_setup()?,
        })
    }

    /// Replace the filter list, e.g. with filters given on the command line
    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }
}
