//! Post-accept device setup
//!
//! Once a device is accepted it is brought into a known state before being
//! handed to protocol layers. Every step is best-effort: a failing step is
//! recorded and logged, the remaining steps still run and the device stays
//! accepted.

use std::fmt;
use std::time::Duration;

use d2xx_core::{BitMode, Handle, Status};

/// Size of the scratch buffer used to drain pending input
const FLUSH_CHUNK: usize = 4096;

/// Setup parameters applied to every accepted device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupConfig {
    /// Read timeout
    pub read_timeout: Duration,
    /// Write timeout
    pub write_timeout: Duration,
    /// Latency timer in milliseconds (1-255)
    pub latency_timer_ms: u8,
    /// USB IN transfer size
    pub usb_in_size: u32,
    /// USB OUT transfer size
    pub usb_out_size: u32,
    /// Event character, 0 disables it
    pub event_char: u8,
    /// Error character, 0 disables it
    pub error_char: u8,
    /// Maximum number of reads spent draining stale input
    pub flush_limit: usize,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(1000),
            write_timeout: Duration::from_millis(1000),
            latency_timer_ms: 1,
            usb_in_size: 65536,
            usb_out_size: 65536,
            event_char: 0,
            error_char: 0,
            flush_limit: 16,
        }
    }
}

/// A single setup step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStep {
    Reset,
    UsbParameters,
    Chars,
    Timeouts,
    LatencyTimer,
    FlowControl,
    BitModeReset,
    Flush,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupStep::Reset => "reset",
            SetupStep::UsbParameters => "USB parameters",
            SetupStep::Chars => "special characters",
            SetupStep::Timeouts => "timeouts",
            SetupStep::LatencyTimer => "latency timer",
            SetupStep::FlowControl => "flow control",
            SetupStep::BitModeReset => "bit mode reset",
            SetupStep::Flush => "input flush",
        };
        f.write_str(name)
    }
}

/// A setup step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupError {
    pub step: SetupStep,
    pub status: Status,
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step, self.status)
    }
}

impl std::error::Error for SetupError {}

/// Bring an accepted device into a known state
///
/// Returns the steps that failed, in the order they ran.
pub fn configure(handle: &mut dyn Handle, config: &SetupConfig) -> Vec<SetupError> {
    let mut errors = Vec::new();
    let mut step = |step: SetupStep, result: Result<(), Status>| {
        if let Err(status) = result {
            errors.push(SetupError { step, status });
        }
    };

    step(SetupStep::Reset, handle.reset_device());
    step(
        SetupStep::UsbParameters,
        handle.set_usb_parameters(config.usb_in_size, config.usb_out_size),
    );
    step(
        SetupStep::Chars,
        handle.set_chars(
            config.event_char,
            config.event_char != 0,
            config.error_char,
            config.error_char != 0,
        ),
    );
    step(
        SetupStep::Timeouts,
        handle.set_timeouts(config.read_timeout, config.write_timeout),
    );
    step(
        SetupStep::LatencyTimer,
        handle.set_latency_timer(config.latency_timer_ms),
    );
    step(SetupStep::FlowControl, handle.set_flow_control());
    step(
        SetupStep::BitModeReset,
        handle.set_bit_mode(0, BitMode::Reset),
    );
    step(SetupStep::Flush, flush(handle, config.flush_limit));

    errors
}

/// Read and discard whatever is waiting in the receive queue
fn flush(handle: &mut dyn Handle, limit: usize) -> Result<(), Status> {
    let mut buf = [0u8; FLUSH_CHUNK];
    for _ in 0..limit {
        let pending = handle.get_queue_status()?;
        if pending == 0 {
            break;
        }
        let len = pending.min(buf.len());
        let n = handle.read(&mut buf[..len])?;
        log::trace!("Discarded {} stale bytes", n);
        if n == 0 {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use d2xx_core::{DevType, DeviceSource};
    use d2xx_fake::{FakeDevice, FakeOp, FakeSource};

    fn open(dev: &FakeDevice) -> Box<dyn Handle> {
        FakeSource::new(vec![dev.clone()]).open_at(0).unwrap()
    }

    #[test]
    fn test_configure_applies_defaults() {
        let dev = FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014).with_pending(&[0x55; 10]);
        let mut handle = open(&dev);

        let errors = configure(handle.as_mut(), &SetupConfig::default());
        assert!(errors.is_empty());
        assert_eq!(dev.latency_ms(), 1);
        assert_eq!(
            dev.timeouts(),
            (Duration::from_millis(1000), Duration::from_millis(1000))
        );
        assert_eq!(dev.usb_parameters(), (65536, 65536));
        assert_eq!(dev.chars(), (0, false, 0, false));
        assert!(dev.flow_control_disabled());
        assert_eq!(dev.bit_mode(), (0, BitMode::Reset));
        assert_eq!(dev.pending(), 0);
    }

    #[test]
    fn test_failing_steps_do_not_stop_setup() {
        let dev = FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001)
            .failing(FakeOp::SetTimeouts, Status::IoError)
            .failing(FakeOp::SetBitMode, Status::NotSupported);
        let mut handle = open(&dev);

        let errors = configure(handle.as_mut(), &SetupConfig::default());
        assert_eq!(
            errors,
            vec![
                SetupError {
                    step: SetupStep::Timeouts,
                    status: Status::IoError
                },
                SetupError {
                    step: SetupStep::BitModeReset,
                    status: Status::NotSupported
                },
            ]
        );
        // Steps after the failures still ran
        assert_eq!(dev.latency_ms(), 1);
        assert!(dev.flow_control_disabled());
    }

    #[test]
    fn test_flush_respects_limit() {
        let dev = FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001)
            .with_pending(&vec![0xAA; FLUSH_CHUNK * 3]);
        let mut handle = open(&dev);

        let config = SetupConfig {
            flush_limit: 2,
            ..SetupConfig::default()
        };
        assert!(configure(handle.as_mut(), &config).is_empty());
        assert_eq!(dev.pending(), FLUSH_CHUNK);
    }

    #[test]
    fn test_event_char_enables() {
        let dev = FakeDevice::new(DevType::Ft2232H, 0x0403, 0x6010);
        let mut handle = open(&dev);

        let config = SetupConfig {
            event_char: b'\n',
            ..SetupConfig::default()
        };
        configure(handle.as_mut(), &config);
        assert_eq!(dev.chars(), (b'\n', true, 0, false));
    }

    #[test]
    fn test_error_display() {
        let err = SetupError {
            step: SetupStep::LatencyTimer,
            status: Status::IoError,
        };
        assert_eq!(err.to_string(), "latency timer failed: FT_IO_ERROR (4)");
    }
}
