//! d2xx-driver - FTDI device enumeration, filtering and registry
//!
//! The [`Driver`] walks every device a [`DeviceSource`](d2xx_core::DeviceSource)
//! reports, classifies it, runs it through the configured filters and keeps
//! the accepted ones open in a [`Registry`] for protocol layers to use.
//!
//! # Example
//!
//! ```
//! use d2xx_core::{DevType, Filter};
//! use d2xx_driver::Driver;
//! use d2xx_fake::{FakeDevice, FakeSource};
//!
//! let source = FakeSource::new(vec![
//!     FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014),
//!     FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001),
//! ]);
//!
//! let mut driver = Driver::new(source);
//! driver.set_filters(vec![Filter::only(DevType::Ft232R)]);
//! driver.init()?;
//!
//! let rendered: Vec<String> = driver.all().iter().map(ToString::to_string).collect();
//! assert_eq!(rendered, ["FT232H(0): no match filter", "FT232R(1)"]);
//! # Ok::<(), d2xx_driver::Error>(())
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod registry;
pub mod setup;

pub use config::DriverConfig;
pub use driver::{Driver, ScanSummary};
pub use error::{Error, Result};
pub use registry::{Entry, FailureStage, OpenedDevice, Registry, NO_MATCH_FILTER};
pub use setup::{configure, SetupConfig, SetupError, SetupStep};
