//! d2xx-fake - In-memory FTDI devices for testing
//!
//! This crate provides a [`DeviceSource`] and [`Handle`] pair that emulate
//! attached FTDI chips in memory. It's useful for testing the driver
//! without real hardware.
//!
//! A [`FakeDevice`] is a cheap, cloneable view onto shared device state:
//! the source hands out handles backed by the same state, so a test keeps
//! its own clone and inspects what the driver did to the device.
//!
//! # Example
//!
//! ```
//! use d2xx_core::{DevType, DeviceSource, Handle};
//! use d2xx_fake::{FakeDevice, FakeSource};
//!
//! let dev = FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014);
//! let mut source = FakeSource::new(vec![dev.clone()]);
//!
//! let mut handle = source.open_at(0).unwrap();
//! handle.reset_device().unwrap();
//! assert!(dev.touched());
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use d2xx_core::{
    BitMode, DevType, DeviceInfo, DeviceSource, EepromImage, Handle, NativeResult, Status,
};

/// Size of the emulated EEPROM user area
const DEFAULT_USER_AREA_SIZE: usize = 32;

/// Operations that can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    /// `close`
    Close,
    /// `reset_device`
    Reset,
    /// `get_device_info`
    DeviceInfo,
    /// `eeprom_read`
    EepromRead,
    /// `eeprom_program`
    EepromProgram,
    /// `erase_ee`
    EraseEe,
    /// `write_ee`
    WriteEe,
    /// `user_area_size`, `user_area_read` and `user_area_write`
    UserArea,
    /// `set_chars`
    SetChars,
    /// `set_usb_parameters`
    SetUsbParameters,
    /// `set_flow_control`
    SetFlowControl,
    /// `set_timeouts`
    SetTimeouts,
    /// `set_latency_timer`
    SetLatencyTimer,
    /// `set_baud_rate`
    SetBaudRate,
    /// `get_queue_status`
    QueueStatus,
    /// `read`
    Read,
    /// `write`
    Write,
    /// `get_bit_mode`
    GetBitMode,
    /// `set_bit_mode`
    SetBitMode,
}

/// Emulated device state
#[derive(Debug)]
struct FakeState {
    info: DeviceInfo,
    failures: HashMap<FakeOp, Status>,
    pending: VecDeque<u8>,
    written: Vec<u8>,
    eeprom: Vec<u8>,
    user_area: Vec<u8>,
    pins: u8,
    bit_mode: (u8, BitMode),
    baud_rate: u32,
    latency_ms: u8,
    timeouts: (Duration, Duration),
    usb_parameters: (u32, u32),
    chars: (u8, bool, u8, bool),
    flow_control_disabled: bool,
    touched: bool,
    open: bool,
    open_count: usize,
    close_count: usize,
}

/// Shared view onto one emulated device
#[derive(Debug, Clone)]
pub struct FakeDevice {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDevice {
    /// Create a device that reports the given identity
    pub fn new(dev_type: DevType, vendor_id: u16, product_id: u16) -> Self {
        let state = FakeState {
            info: DeviceInfo::new(dev_type, vendor_id, product_id),
            failures: HashMap::new(),
            pending: VecDeque::new(),
            written: Vec::new(),
            eeprom: vec![0xFF; dev_type.eeprom_size()],
            user_area: vec![0; DEFAULT_USER_AREA_SIZE],
            pins: 0,
            bit_mode: (0, BitMode::Reset),
            baud_rate: 9600,
            latency_ms: 16,
            timeouts: (Duration::ZERO, Duration::ZERO),
            usb_parameters: (4096, 4096),
            chars: (0, false, 0, false),
            flow_control_disabled: false,
            touched: false,
            open: false,
            open_count: 0,
            close_count: 0,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Make `op` fail with `status`
    pub fn failing(self, op: FakeOp, status: Status) -> Self {
        self.lock().failures.insert(op, status);
        self
    }

    /// Queue bytes to be returned by `read`
    pub fn with_pending(self, data: &[u8]) -> Self {
        self.lock().pending.extend(data.iter().copied());
        self
    }

    /// Replace the EEPROM contents
    pub fn with_eeprom(self, data: &[u8]) -> Self {
        self.lock().eeprom = data.to_vec();
        self
    }

    /// Replace the user area contents
    pub fn with_user_area(self, data: &[u8]) -> Self {
        self.lock().user_area = data.to_vec();
        self
    }

    /// Set the pin byte returned by `get_bit_mode`
    pub fn with_pins(self, pins: u8) -> Self {
        self.lock().pins = pins;
        self
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reported identity
    pub fn info(&self) -> DeviceInfo {
        self.lock().info
    }

    /// Whether any operation other than identity query and close ran
    pub fn touched(&self) -> bool {
        self.lock().touched
    }

    /// Clear the touched flag
    pub fn clear_touched(&self) {
        self.lock().touched = false;
    }

    /// Whether a handle to this device is currently open
    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// How many times the device was opened
    pub fn open_count(&self) -> usize {
        self.lock().open_count
    }

    /// How many times the device was closed
    pub fn close_count(&self) -> usize {
        self.lock().close_count
    }

    /// Bytes written so far
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Bytes still waiting to be read
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// EEPROM contents
    pub fn eeprom(&self) -> Vec<u8> {
        self.lock().eeprom.clone()
    }

    /// User area contents
    pub fn user_area(&self) -> Vec<u8> {
        self.lock().user_area.clone()
    }

    /// Last `(mask, mode)` passed to `set_bit_mode`
    pub fn bit_mode(&self) -> (u8, BitMode) {
        self.lock().bit_mode
    }

    /// Current baud rate
    pub fn baud_rate(&self) -> u32 {
        self.lock().baud_rate
    }

    /// Current latency timer
    pub fn latency_ms(&self) -> u8 {
        self.lock().latency_ms
    }

    /// Current `(read, write)` timeouts
    pub fn timeouts(&self) -> (Duration, Duration) {
        self.lock().timeouts
    }

    /// Current `(in, out)` USB transfer sizes
    pub fn usb_parameters(&self) -> (u32, u32) {
        self.lock().usb_parameters
    }

    /// Current `(event, event_enabled, error, error_enabled)` characters
    pub fn chars(&self) -> (u8, bool, u8, bool) {
        self.lock().chars
    }

    /// Whether flow control was disabled
    pub fn flow_control_disabled(&self) -> bool {
        self.lock().flow_control_disabled
    }

    fn handle(&self) -> FakeHandle {
        let mut state = self.lock();
        state.open = true;
        state.open_count += 1;
        FakeHandle {
            device: self.clone(),
            closed: false,
        }
    }
}

/// Handle onto a [`FakeDevice`]
#[derive(Debug)]
pub struct FakeHandle {
    device: FakeDevice,
    closed: bool,
}

impl FakeHandle {
    /// Lock the device for an operation, honouring closed state and
    /// configured failures
    fn op(&self, op: FakeOp) -> NativeResult<MutexGuard<'_, FakeState>> {
        if self.closed {
            return Err(Status::DeviceNotOpened);
        }
        let mut state = self.device.lock();
        if !matches!(op, FakeOp::DeviceInfo | FakeOp::Close) {
            state.touched = true;
        }
        match state.failures.get(&op) {
            Some(&status) => Err(status),
            None => Ok(state),
        }
    }
}

impl Handle for FakeHandle {
    fn close(&mut self) -> NativeResult<()> {
        let mut state = self.op(FakeOp::Close)?;
        state.open = false;
        state.close_count += 1;
        drop(state);
        self.closed = true;
        Ok(())
    }

    fn reset_device(&mut self) -> NativeResult<()> {
        let mut state = self.op(FakeOp::Reset)?;
        state.bit_mode = (0, BitMode::Reset);
        Ok(())
    }

    fn get_device_info(&mut self) -> NativeResult<DeviceInfo> {
        Ok(self.op(FakeOp::DeviceInfo)?.info)
    }

    fn eeprom_read(&mut self, dev_type: DevType) -> NativeResult<EepromImage> {
        let state = self.op(FakeOp::EepromRead)?;
        if dev_type != state.info.dev_type {
            return Err(Status::InvalidParameter);
        }
        Ok(EepromImage::new(dev_type, state.eeprom.clone()))
    }

    fn eeprom_program(&mut self, image: &EepromImage) -> NativeResult<()> {
        let mut state = self.op(FakeOp::EepromProgram)?;
        if image.len() > state.info.dev_type.eeprom_size() {
            return Err(Status::InvalidParameter);
        }
        state.eeprom = image.as_bytes().to_vec();
        Ok(())
    }

    fn erase_ee(&mut self) -> NativeResult<()> {
        let mut state = self.op(FakeOp::EraseEe)?;
        state.eeprom.iter_mut().for_each(|b| *b = 0xFF);
        Ok(())
    }

    fn write_ee(&mut self, offset: u8, value: u16) -> NativeResult<()> {
        let mut state = self.op(FakeOp::WriteEe)?;
        let at = usize::from(offset) * 2;
        match state.eeprom.get_mut(at..at + 2) {
            Some(word) => {
                word.copy_from_slice(&value.to_le_bytes());
                Ok(())
            }
            None => Err(Status::InvalidParameter),
        }
    }

    fn user_area_size(&mut self) -> NativeResult<usize> {
        Ok(self.op(FakeOp::UserArea)?.user_area.len())
    }

    fn user_area_read(&mut self, buf: &mut [u8]) -> NativeResult<()> {
        let state = self.op(FakeOp::UserArea)?;
        if buf.len() > state.user_area.len() {
            return Err(Status::InvalidParameter);
        }
        buf.copy_from_slice(&state.user_area[..buf.len()]);
        Ok(())
    }

    fn user_area_write(&mut self, buf: &[u8]) -> NativeResult<()> {
        let mut state = self.op(FakeOp::UserArea)?;
        if buf.len() > state.user_area.len() {
            return Err(Status::InvalidParameter);
        }
        state.user_area[..buf.len()].copy_from_slice(buf);
        Ok(())
    }

    fn set_chars(
        &mut self,
        event_char: u8,
        event_enabled: bool,
        error_char: u8,
        error_enabled: bool,
    ) -> NativeResult<()> {
        self.op(FakeOp::SetChars)?.chars = (event_char, event_enabled, error_char, error_enabled);
        Ok(())
    }

    fn set_usb_parameters(&mut self, in_size: u32, out_size: u32) -> NativeResult<()> {
        self.op(FakeOp::SetUsbParameters)?.usb_parameters = (in_size, out_size);
        Ok(())
    }

    fn set_flow_control(&mut self) -> NativeResult<()> {
        self.op(FakeOp::SetFlowControl)?.flow_control_disabled = true;
        Ok(())
    }

    fn set_timeouts(&mut self, read: Duration, write: Duration) -> NativeResult<()> {
        self.op(FakeOp::SetTimeouts)?.timeouts = (read, write);
        Ok(())
    }

    fn set_latency_timer(&mut self, ms: u8) -> NativeResult<()> {
        if ms == 0 {
            return Err(Status::InvalidParameter);
        }
        self.op(FakeOp::SetLatencyTimer)?.latency_ms = ms;
        Ok(())
    }

    fn set_baud_rate(&mut self, hz: u32) -> NativeResult<()> {
        if hz == 0 {
            return Err(Status::InvalidBaudRate);
        }
        self.op(FakeOp::SetBaudRate)?.baud_rate = hz;
        Ok(())
    }

    fn get_queue_status(&mut self) -> NativeResult<usize> {
        Ok(self.op(FakeOp::QueueStatus)?.pending.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> NativeResult<usize> {
        let mut state = self.op(FakeOp::Read)?;
        let n = buf.len().min(state.pending.len());
        for (dst, src) in buf.iter_mut().zip(state.pending.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> NativeResult<usize> {
        self.op(FakeOp::Write)?.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn get_bit_mode(&mut self) -> NativeResult<u8> {
        Ok(self.op(FakeOp::GetBitMode)?.pins)
    }

    fn set_bit_mode(&mut self, mask: u8, mode: BitMode) -> NativeResult<()> {
        self.op(FakeOp::SetBitMode)?.bit_mode = (mask, mode);
        Ok(())
    }
}

/// [`DeviceSource`] over a fixed list of [`FakeDevice`]s
#[derive(Debug, Default)]
pub struct FakeSource {
    devices: Vec<FakeDevice>,
    count_failure: Option<Status>,
    open_failures: HashMap<usize, Status>,
    opened: Vec<usize>,
}

impl FakeSource {
    /// Create a source enumerating `devices` in order
    pub fn new(devices: Vec<FakeDevice>) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    /// Make the device count query fail
    pub fn failing_count(mut self, status: Status) -> Self {
        self.count_failure = Some(status);
        self
    }

    /// Make opening `index` fail
    pub fn failing_open(mut self, index: usize, status: Status) -> Self {
        self.open_failures.insert(index, status);
        self
    }

    /// Indices passed to `open_at`, in call order
    pub fn opened(&self) -> &[usize] {
        &self.opened
    }

    /// Forget the recorded `open_at` calls
    pub fn clear_opened(&mut self) {
        self.opened.clear();
    }

    /// Emulated devices
    pub fn devices(&self) -> &[FakeDevice] {
        &self.devices
    }

    /// Attach another device at the end of the enumeration order
    pub fn attach(&mut self, device: FakeDevice) {
        self.devices.push(device);
    }

    /// Detach the device at `index`; later indices shift down
    pub fn detach(&mut self, index: usize) -> Option<FakeDevice> {
        (index < self.devices.len()).then(|| self.devices.remove(index))
    }
}

impl DeviceSource for FakeSource {
    fn count(&mut self) -> NativeResult<usize> {
        match self.count_failure {
            Some(status) => Err(status),
            None => Ok(self.devices.len()),
        }
    }

    fn open_at(&mut self, index: usize) -> NativeResult<Box<dyn Handle>> {
        self.opened.push(index);
        if let Some(&status) = self.open_failures.get(&index) {
            return Err(status);
        }
        let device = self.devices.get(index).ok_or(Status::DeviceNotFound)?;
        log::trace!("fake: opening {:?} at index {}", device.info(), index);
        Ok(Box::new(device.handle()))
    }
}
