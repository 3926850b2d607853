//! Opened FTDI channel speaking the SIO vendor protocol

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use d2xx_core::{BitMode, DevType, DeviceInfo, EepromImage, Handle, NativeResult, Status};
use nusb::transfer::{Buffer, Bulk, ControlIn, ControlOut, ControlType, In, Out, Recipient};
use nusb::MaybeFuture;

use crate::error::{open_status, transfer_status};
use crate::protocol::*;

/// Default read and write timeouts
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Timeout used when polling for queued input
const POLL_TIMEOUT: Duration = Duration::from_millis(20);

/// Default bulk transfer size
const DEFAULT_CHUNK: usize = 4096;

/// USB resources held while the channel is open
struct Link {
    // Kept alive for the lifetime of the interface
    _device: nusb::Device,
    interface: nusb::Interface,
}

/// One channel of an FTDI chip opened over USB
pub struct UsbHandle {
    link: Option<Link>,
    info: DeviceInfo,
    channel: Channel,
    packet_size: usize,
    read_timeout: Duration,
    write_timeout: Duration,
    in_size: usize,
    out_size: usize,
    rx: VecDeque<u8>,
}

impl UsbHandle {
    /// Open and claim `channel` of the device described by `dev_info`
    pub(crate) fn open(
        dev_info: &nusb::DeviceInfo,
        dev_type: DevType,
        channel: Channel,
    ) -> NativeResult<Self> {
        let device = dev_info.open().wait().map_err(open_status)?;
        let interface = device
            .detach_and_claim_interface(channel.interface)
            .wait()
            .map_err(open_status)?;
        let packet_size = packet_size(&device, dev_type, channel.interface);

        log::debug!(
            "Opened {} {:04X}:{:04X} interface {} (packet size {})",
            dev_type,
            dev_info.vendor_id(),
            dev_info.product_id(),
            channel.interface,
            packet_size
        );

        Ok(Self {
            link: Some(Link {
                _device: device,
                interface,
            }),
            info: DeviceInfo::new(dev_type, dev_info.vendor_id(), dev_info.product_id()),
            channel,
            packet_size,
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            in_size: DEFAULT_CHUNK,
            out_size: DEFAULT_CHUNK,
            rx: VecDeque::new(),
        })
    }

    fn interface(&self) -> NativeResult<&nusb::Interface> {
        self.link
            .as_ref()
            .map(|link| &link.interface)
            .ok_or(Status::DeviceNotOpened)
    }

    /// Vendor OUT request addressed to this channel
    fn control_out(&self, request: u8, value: u16) -> NativeResult<()> {
        self.control_out_index(request, value, self.channel.usb_index)
    }

    fn control_out_index(&self, request: u8, value: u16, index: u16) -> NativeResult<()> {
        log::trace!(
            "control_out req={:02X} value={:04X} index={:04X}",
            request,
            value,
            index
        );
        self.interface()?
            .control_out(
                ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    data: &[],
                },
                self.write_timeout,
            )
            .wait()
            .map_err(transfer_status)
    }

    fn control_in(&self, request: u8, index: u16, length: u16) -> NativeResult<Vec<u8>> {
        log::trace!("control_in req={:02X} index={:04X}", request, index);
        let data = self
            .interface()?
            .control_in(
                ControlIn {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value: 0,
                    index,
                    length,
                },
                self.read_timeout,
            )
            .wait()
            .map_err(transfer_status)?;
        if data.len() < usize::from(length) {
            return Err(Status::IoError);
        }
        Ok(data)
    }

    /// One bulk IN transfer into the receive queue
    ///
    /// Returns the number of payload bytes queued. A timeout queues nothing.
    fn fill(&mut self, timeout: Duration) -> NativeResult<usize> {
        let mut ep = self
            .interface()?
            .endpoint::<Bulk, In>(self.channel.read_ep)
            .map_err(open_status)?;

        let len = self.in_size.max(self.packet_size) / self.packet_size * self.packet_size;
        let completion = ep.transfer_blocking(Buffer::new(len), timeout);
        match completion.status {
            Ok(()) => {}
            Err(nusb::transfer::TransferError::Cancelled) => return Ok(0),
            Err(err) => return Err(transfer_status(err)),
        }

        let mut raw = completion.buffer.into_vec();
        raw.truncate(completion.actual_len);
        let n = strip_modem_status(&mut raw, self.packet_size);
        self.rx.extend(&raw[..n]);
        Ok(n)
    }

    fn read_eeprom_word(&self, addr: u16) -> NativeResult<u16> {
        let data = self
            .control_in(SIO_READ_EEPROM, addr, 2)
            .map_err(|_| Status::EepromReadFailed)?;
        Ok(u16::from_le_bytes([data[0], data[1]]))
    }
}

/// Max packet size of the channel's first endpoint
fn packet_size(device: &nusb::Device, dev_type: DevType, interface: u8) -> usize {
    let Ok(config) = device.active_configuration() else {
        return default_packet_size(dev_type);
    };
    for group in config.interfaces() {
        if group.interface_number() != interface {
            continue;
        }
        for alt in group.alt_settings() {
            if let Some(ep) = alt.endpoints().next() {
                if ep.max_packet_size() > MODEM_STATUS_LEN {
                    return ep.max_packet_size();
                }
            }
        }
    }
    default_packet_size(dev_type)
}

impl Handle for UsbHandle {
    fn close(&mut self) -> NativeResult<()> {
        match self.link.take() {
            Some(_) => {
                self.rx.clear();
                Ok(())
            }
            None => Err(Status::DeviceNotOpened),
        }
    }

    fn reset_device(&mut self) -> NativeResult<()> {
        self.control_out(SIO_RESET, SIO_RESET_SIO)?;
        self.rx.clear();
        Ok(())
    }

    fn get_device_info(&mut self) -> NativeResult<DeviceInfo> {
        self.interface()?;
        Ok(self.info)
    }

    fn eeprom_read(&mut self, dev_type: DevType) -> NativeResult<EepromImage> {
        self.interface()?;
        if dev_type != self.info.dev_type {
            return Err(Status::InvalidParameter);
        }
        let size = dev_type.eeprom_size();
        if size == 0 {
            return Err(Status::EepromNotPresent);
        }

        let mut raw = Vec::with_capacity(size);
        for addr in 0..(size / 2) as u16 {
            raw.extend_from_slice(&self.read_eeprom_word(addr)?.to_le_bytes());
        }
        Ok(EepromImage::new(dev_type, raw))
    }

    fn eeprom_program(&mut self, image: &EepromImage) -> NativeResult<()> {
        self.interface()?;
        if image.dev_type() != self.info.dev_type || image.len() > self.info.dev_type.eeprom_size()
        {
            return Err(Status::InvalidParameter);
        }
        for (addr, pair) in image.as_bytes().chunks(2).enumerate() {
            let word = u16::from_le_bytes([pair[0], pair.get(1).copied().unwrap_or(0xFF)]);
            self.control_out_index(SIO_WRITE_EEPROM, word, addr as u16)
                .map_err(|_| Status::EepromWriteFailed)?;
        }
        Ok(())
    }

    fn erase_ee(&mut self) -> NativeResult<()> {
        self.interface()?;
        // The FT232R's internal EEPROM can't be erased
        if self.info.dev_type == DevType::Ft232R {
            return Err(Status::NotSupported);
        }
        self.control_out_index(SIO_ERASE_EEPROM, 0, 0)
            .map_err(|_| Status::EepromEraseFailed)
    }

    fn write_ee(&mut self, offset: u8, value: u16) -> NativeResult<()> {
        self.interface()?;
        if usize::from(offset) * 2 >= self.info.dev_type.eeprom_size() {
            return Err(Status::InvalidParameter);
        }
        self.control_out_index(SIO_WRITE_EEPROM, value, u16::from(offset))
            .map_err(|_| Status::EepromWriteFailed)
    }

    fn user_area_size(&mut self) -> NativeResult<usize> {
        self.interface()?;
        Err(Status::NotSupported)
    }

    fn user_area_read(&mut self, _buf: &mut [u8]) -> NativeResult<()> {
        self.interface()?;
        Err(Status::NotSupported)
    }

    fn user_area_write(&mut self, _buf: &[u8]) -> NativeResult<()> {
        self.interface()?;
        Err(Status::NotSupported)
    }

    fn set_chars(
        &mut self,
        event_char: u8,
        event_enabled: bool,
        error_char: u8,
        error_enabled: bool,
    ) -> NativeResult<()> {
        let event = u16::from(event_char) | (u16::from(event_enabled) << 8);
        let error = u16::from(error_char) | (u16::from(error_enabled) << 8);
        self.control_out(SIO_SET_EVENT_CHAR, event)?;
        self.control_out(SIO_SET_ERROR_CHAR, error)
    }

    fn set_usb_parameters(&mut self, in_size: u32, out_size: u32) -> NativeResult<()> {
        self.interface()?;
        if in_size == 0 || out_size == 0 {
            return Err(Status::InvalidParameter);
        }
        self.in_size = in_size as usize;
        self.out_size = out_size as usize;
        Ok(())
    }

    fn set_flow_control(&mut self) -> NativeResult<()> {
        self.control_out(SIO_SET_FLOW_CTRL, SIO_DISABLE_FLOW_CTRL)
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> NativeResult<()> {
        self.interface()?;
        self.read_timeout = read;
        self.write_timeout = write;
        Ok(())
    }

    fn set_latency_timer(&mut self, ms: u8) -> NativeResult<()> {
        if ms == 0 {
            return Err(Status::InvalidParameter);
        }
        self.control_out(SIO_SET_LATENCY_TIMER, u16::from(ms))
    }

    fn set_baud_rate(&mut self, hz: u32) -> NativeResult<()> {
        self.interface()?;
        let divisor = baud_divisor(hz, self.info.dev_type, self.channel.usb_index)
            .ok_or(Status::InvalidBaudRate)?;
        // More than 5% off can't be used reliably
        if divisor.actual.abs_diff(hz) > hz / 20 {
            return Err(Status::InvalidBaudRate);
        }
        log::debug!("Baud rate {} (requested {})", divisor.actual, hz);
        self.control_out_index(SIO_SET_BAUDRATE, divisor.value, divisor.index)
    }

    fn get_queue_status(&mut self) -> NativeResult<usize> {
        if self.rx.is_empty() {
            self.fill(POLL_TIMEOUT)?;
        }
        Ok(self.rx.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> NativeResult<usize> {
        self.interface()?;
        let deadline = Instant::now() + self.read_timeout;
        while self.rx.len() < buf.len() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.fill(deadline - now)?;
        }

        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> NativeResult<usize> {
        let timeout = self.write_timeout;
        let chunk_size = self.out_size;
        let mut ep = self
            .interface()?
            .endpoint::<Bulk, Out>(self.channel.write_ep)
            .map_err(open_status)?;

        let mut written = 0;
        for chunk in buf.chunks(chunk_size) {
            let mut transfer = Buffer::new(chunk.len());
            transfer.extend_from_slice(chunk);
            let completion = ep.transfer_blocking(transfer, timeout);
            written += completion.actual_len;
            match completion.status {
                Ok(()) => {}
                // Report the partial write on timeout
                Err(nusb::transfer::TransferError::Cancelled) => break,
                Err(err) => return Err(transfer_status(err)),
            }
        }
        Ok(written)
    }

    fn get_bit_mode(&mut self) -> NativeResult<u8> {
        let data = self.control_in(SIO_READ_PINS, self.channel.usb_index, 1)?;
        Ok(data[0])
    }

    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> NativeResult<()> {
        let value = u16::from(mask) | (u16::from(mode.value()) << 8);
        self.control_out(SIO_SET_BITMODE, value)
    }
}
