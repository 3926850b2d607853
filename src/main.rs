//! d2xx - FTDI device enumeration and inspection
//!
//! Scans the USB bus for FTDI chips, runs them through the configured
//! filters and reports what was accepted, rejected or failed:
//!
//! ```text
//! $ d2xx list -f FT232R
//! FT232H(0): no match filter
//! FT232R(1)  0403:6001 ordinal 0
//! 2 found, 1 accepted, 1 rejected, 0 failed
//! ```

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, ScanArgs};
use d2xx_driver::{Driver, DriverConfig};
use d2xx_usb::UsbSource;
use std::io;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still overrides the verbosity flags
    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose))
        .parse_env(env_logger::Env::default())
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Types => {
            commands::list_types(&mut out)?;
        }
        Commands::List { scan } => {
            let mut driver = open_driver(&scan)?;
            commands::list_devices(&mut driver, &mut out)?;
        }
        Commands::Eeprom { scan, output } => {
            let mut driver = open_driver(&scan)?;
            let image = commands::read_eeprom(&mut driver)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, image.as_bytes())?;
                    println!("Wrote {} bytes to {}", image.len(), path.display());
                }
                None => commands::hexdump(image.as_bytes(), &mut out)?,
            }
        }
        Commands::UserArea { scan } => {
            let mut driver = open_driver(&scan)?;
            let data = commands::read_user_area(&mut driver)?;
            commands::hexdump(&data, &mut out)?;
        }
    }

    Ok(())
}

/// Log level for the number of -v flags
fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Build the driver configuration from --config and --filter
fn load_config(scan: &ScanArgs) -> Result<DriverConfig, d2xx_driver::Error> {
    let config = match &scan.config {
        Some(path) => {
            log::debug!("Loading configuration from {}", path.display());
            DriverConfig::load(path)?
        }
        None => DriverConfig::default(),
    };
    if scan.filters.is_empty() {
        Ok(config)
    } else {
        Ok(config.with_filters(scan.filters.clone()))
    }
}

fn open_driver(scan: &ScanArgs) -> Result<Driver<UsbSource>, d2xx_driver::Error> {
    let config = load_config(scan)?;
    Ok(Driver::with_config(UsbSource::new(), config))
}
