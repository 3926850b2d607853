//! d2xx-core - Device contracts shared by every d2xx crate
//!
//! This crate holds the pieces that have no state of their own:
//!
//! - [`Status`]: the native `FT_STATUS` codes every handle operation may fail with
//! - [`DevType`], [`DeviceInfo`], [`DeviceIdentity`]: what a device is
//! - [`Handle`] and [`DeviceSource`]: the capability set of an opened device
//!   and the strategy used to enumerate and open devices
//! - [`filter`]: the pure filter engine deciding which devices are kept
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  d2xx (CLI) / protocol layers             │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │   d2xx-driver: Driver (scan), Registry, setup, config     │
//! └──────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │   d2xx-core (this crate) │   │  DeviceSource impls      │
//! │  - Handle / DeviceSource │   │  - d2xx-usb (nusb)       │
//! │  - Status, DevType       │   │  - d2xx-fake (tests)     │
//! │  - filter engine         │   │                          │
//! └──────────────────────────┘   └──────────────────────────┘
//! ```

pub mod filter;
pub mod handle;
pub mod status;
pub mod types;

pub use filter::{
    evaluate, Claims, Decision, Filter, FilterDeviceIdx, FilterDeviceType, FilterParseError,
    OrdinalCounter,
};
pub use handle::{DeviceSource, Handle};
pub use status::{NativeResult, Status};
pub use types::{BitMode, DevType, DeviceIdentity, DeviceInfo, EepromImage, FTDI_VID};
