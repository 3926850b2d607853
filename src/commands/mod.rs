//! CLI command implementations
//!
//! Commands are generic over the device source so they run the same against
//! real hardware and in-memory devices.

mod eeprom;
mod list;

pub use eeprom::{hexdump, read_eeprom, read_user_area};
pub use list::{list_devices, list_types};
