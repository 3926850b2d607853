//! Enumeration of attached FTDI chips

use d2xx_core::{DevType, DeviceSource, Handle, NativeResult, Status};
use nusb::MaybeFuture;

use crate::device::UsbHandle;
use crate::error::list_status;
use crate::protocol::{channel_count, dev_type_from_bcd, Channel, FTDI_PIDS, FTDI_VID};

/// One enumerable channel
#[derive(Debug, Clone)]
struct Slot {
    info: nusb::DeviceInfo,
    dev_type: DevType,
    channel: Channel,
}

/// [`DeviceSource`] over the FTDI chips on the USB bus
///
/// The device list is captured by [`count`](DeviceSource::count); indices
/// passed to [`open_at`](DeviceSource::open_at) refer to that snapshot.
/// Multi-channel chips contribute one index per channel, in channel order.
#[derive(Debug, Default)]
pub struct UsbSource {
    slots: Vec<Slot>,
}

impl UsbSource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Whether a USB ID pair belongs to an FTDI chip we drive
pub fn is_ftdi(vendor_id: u16, product_id: u16) -> bool {
    vendor_id == FTDI_VID && FTDI_PIDS.contains(&product_id)
}

impl DeviceSource for UsbSource {
    fn count(&mut self) -> NativeResult<usize> {
        let devices = nusb::list_devices().wait().map_err(list_status)?;

        self.slots.clear();
        for info in devices.filter(|d| is_ftdi(d.vendor_id(), d.product_id())) {
            let dev_type = dev_type_from_bcd(info.device_version(), info.serial_number().is_some());
            log::debug!(
                "Found {} {:04X}:{:04X} at bus {} address {}",
                dev_type,
                info.vendor_id(),
                info.product_id(),
                info.busnum(),
                info.device_address()
            );
            for n in 0..channel_count(dev_type) {
                self.slots.push(Slot {
                    info: info.clone(),
                    dev_type,
                    channel: Channel::new(n),
                });
            }
        }
        Ok(self.slots.len())
    }

    fn open_at(&mut self, index: usize) -> NativeResult<Box<dyn Handle>> {
        let slot = self.slots.get(index).ok_or(Status::DeviceNotFound)?;
        let handle = UsbHandle::open(&slot.info, slot.dev_type, slot.channel)?;
        Ok(Box::new(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ftdi() {
        assert!(is_ftdi(0x0403, 0x6001));
        assert!(is_ftdi(0x0403, 0x6014));
        assert!(!is_ftdi(0x0403, 0x1234));
        assert!(!is_ftdi(0x1a86, 0x6001));
    }

    #[test]
    fn test_open_before_count() {
        let mut source = UsbSource::new();
        assert_eq!(source.open_at(0).err(), Some(Status::DeviceNotFound));
    }
}
