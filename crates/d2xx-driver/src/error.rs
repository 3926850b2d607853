//! Error types for the driver

use d2xx_core::{FilterParseError, Status};
use thiserror::Error;

/// Result type for driver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning or configuring the driver
///
/// Per-device failures are never reported here; they are attached to the
/// device's registry entry instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The device count query failed, so no scan took place
    #[error("device count query failed: {0}")]
    Count(Status),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file is not valid TOML
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid filter string
    #[error("invalid filter: {0}")]
    Filter(#[from] FilterParseError),
}
