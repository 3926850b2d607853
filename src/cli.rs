//! CLI argument parsing

use clap::{Parser, Subcommand};
use d2xx_core::Filter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "d2xx")]
#[command(author, version, about = "FTDI device enumeration and inspection", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Device selection shared across commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Device filter `<type>[:<index>]`, e.g. `FT232R`, `FT2232H:1` or `any`.
    /// Each filter accepts one device; repeat it to accept several.
    /// Overrides filters from --config.
    #[arg(short, long = "filter", value_name = "FILTER")]
    pub filters: Vec<Filter>,

    /// Driver configuration file (TOML format)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List attached devices and whether the filters accept them
    List {
        #[command(flatten)]
        scan: ScanArgs,
    },

    /// List device types usable in filters
    Types,

    /// Dump the EEPROM of the first accepted device
    Eeprom {
        #[command(flatten)]
        scan: ScanArgs,

        /// Write the raw image to this file instead of a hexdump to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Dump the EEPROM user area of the first accepted device
    UserArea {
        #[command(flatten)]
        scan: ScanArgs,
    },
}
