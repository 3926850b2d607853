//! Handle and device source contracts
//!
//! [`Handle`] is the capability set every opened device offers, whether it
//! is backed by real hardware or by a test double. [`DeviceSource`] is the
//! strategy used to count and open devices; the driver only ever talks to
//! devices through these two traits.

use std::time::Duration;

use crate::status::NativeResult;
use crate::types::{BitMode, DevType, DeviceInfo, EepromImage};

/// An opened device
///
/// All operations are synchronous and may fail independently with a native
/// [`Status`](crate::Status). A handle is exclusively owned by whoever opened
/// it until it is closed.
pub trait Handle: Send {
    /// Close the device; later calls fail with `DeviceNotOpened`
    fn close(&mut self) -> NativeResult<()>;

    /// Reset the device
    fn reset_device(&mut self) -> NativeResult<()>;

    /// Query chip variant, vendor ID and product ID
    fn get_device_info(&mut self) -> NativeResult<DeviceInfo>;

    /// Read the EEPROM image laid out for `dev_type`
    fn eeprom_read(&mut self, dev_type: DevType) -> NativeResult<EepromImage>;

    /// Program a full EEPROM image
    fn eeprom_program(&mut self, image: &EepromImage) -> NativeResult<()>;

    /// Erase the EEPROM
    fn erase_ee(&mut self) -> NativeResult<()>;

    /// Write a single 16-bit EEPROM word at word offset `offset`
    fn write_ee(&mut self, offset: u8, value: u16) -> NativeResult<()>;

    /// Size of the EEPROM user area in bytes
    fn user_area_size(&mut self) -> NativeResult<usize>;

    /// Read the user area into `buf`
    fn user_area_read(&mut self, buf: &mut [u8]) -> NativeResult<()>;

    /// Write `buf` to the user area
    fn user_area_write(&mut self, buf: &[u8]) -> NativeResult<()>;

    /// Configure the event and error characters
    fn set_chars(
        &mut self,
        event_char: u8,
        event_enabled: bool,
        error_char: u8,
        error_enabled: bool,
    ) -> NativeResult<()>;

    /// Set USB transfer sizes
    fn set_usb_parameters(&mut self, in_size: u32, out_size: u32) -> NativeResult<()>;

    /// Disable flow control
    fn set_flow_control(&mut self) -> NativeResult<()>;

    /// Set read and write timeouts
    fn set_timeouts(&mut self, read: Duration, write: Duration) -> NativeResult<()>;

    /// Set the latency timer in milliseconds
    fn set_latency_timer(&mut self, ms: u8) -> NativeResult<()>;

    /// Set the baud rate
    fn set_baud_rate(&mut self, hz: u32) -> NativeResult<()>;

    /// Number of bytes waiting in the receive queue
    fn get_queue_status(&mut self) -> NativeResult<usize>;

    /// Read into `buf`, returning the number of bytes read
    fn read(&mut self, buf: &mut [u8]) -> NativeResult<usize>;

    /// Write `buf`, returning the number of bytes written
    fn write(&mut self, buf: &[u8]) -> NativeResult<usize>;

    /// Current bit-mode / pin byte
    fn get_bit_mode(&mut self) -> NativeResult<u8>;

    /// Select a bit mode; `mask` sets pin directions (1 = output)
    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> NativeResult<()>;
}

/// Strategy for enumerating and opening devices
///
/// The driver visits every index in `0..count()` exactly once per scan and
/// calls [`open_at`](Self::open_at) for each.
pub trait DeviceSource {
    /// Number of attached devices
    fn count(&mut self) -> NativeResult<usize>;

    /// Open the device at `index`
    fn open_at(&mut self, index: usize) -> NativeResult<Box<dyn Handle>>;
}
