//! d2xx-usb - FTDI device source over USB
//!
//! This crate provides a [`DeviceSource`](d2xx_core::DeviceSource) that finds
//! FTDI chips on the USB bus and drives them with the SIO vendor protocol,
//! using the pure-Rust `nusb` crate. No vendor library is required.
//!
//! # Supported Devices
//!
//! - FT232AM / FT232BM / FT232R
//! - FT2232C / FT2232H (one device per channel)
//! - FT4232H (one device per channel)
//! - FT232H
//! - FT-X series
//! - FT4222H (enumeration only)
//!
//! # Example
//!
//! ```no_run
//! use d2xx_driver::Driver;
//! use d2xx_usb::UsbSource;
//!
//! let mut driver = Driver::new(UsbSource::new());
//! driver.init()?;
//! for entry in driver.all() {
//!     println!("{}", entry);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Limitations
//!
//! The EEPROM user area is not exposed; its location depends on the EEPROM
//! layout of each chip.

mod device;
mod error;
pub mod protocol;
mod source;

pub use device::UsbHandle;
pub use source::{is_ftdi, UsbSource};
