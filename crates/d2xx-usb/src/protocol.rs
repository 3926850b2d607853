//! FTDI SIO protocol constants and wire helpers
//!
//! Based on the FTDI application notes and libftdi.

// Allow unused constants - they're provided for completeness
#![allow(dead_code)]

use d2xx_core::DevType;

// ============================================================================
// USB VID/PID constants
// ============================================================================

pub use d2xx_core::FTDI_VID;

/// FT232AM/BM/R product ID
pub const FTDI_FT232_PID: u16 = 0x6001;

/// FT2232C/D/H product ID (dual channel)
pub const FTDI_FT2232_PID: u16 = 0x6010;

/// FT4232H product ID (quad channel)
pub const FTDI_FT4232H_PID: u16 = 0x6011;

/// FT232H product ID (single channel)
pub const FTDI_FT232H_PID: u16 = 0x6014;

/// FT-X series product ID
pub const FTDI_FTX_PID: u16 = 0x6015;

/// FT4222H product ID
pub const FTDI_FT4222_PID: u16 = 0x601C;

/// Product IDs enumerated by [`UsbSource`](crate::UsbSource)
pub const FTDI_PIDS: &[u16] = &[
    FTDI_FT232_PID,
    FTDI_FT2232_PID,
    FTDI_FT4232H_PID,
    FTDI_FT232H_PID,
    FTDI_FTX_PID,
    FTDI_FT4222_PID,
];

// ============================================================================
// SIO vendor requests
// ============================================================================

/// Reset the port
pub const SIO_RESET: u8 = 0x00;
/// Set modem control lines
pub const SIO_SET_MODEM_CTRL: u8 = 0x01;
/// Set flow control
pub const SIO_SET_FLOW_CTRL: u8 = 0x02;
/// Set baud rate divisor
pub const SIO_SET_BAUDRATE: u8 = 0x03;
/// Set data characteristics
pub const SIO_SET_DATA: u8 = 0x04;
/// Set event character
pub const SIO_SET_EVENT_CHAR: u8 = 0x06;
/// Set error character
pub const SIO_SET_ERROR_CHAR: u8 = 0x07;
/// Set latency timer
pub const SIO_SET_LATENCY_TIMER: u8 = 0x09;
/// Get latency timer
pub const SIO_GET_LATENCY_TIMER: u8 = 0x0A;
/// Set bit mode
pub const SIO_SET_BITMODE: u8 = 0x0B;
/// Read pin states
pub const SIO_READ_PINS: u8 = 0x0C;
/// Read one EEPROM word
pub const SIO_READ_EEPROM: u8 = 0x90;
/// Write one EEPROM word
pub const SIO_WRITE_EEPROM: u8 = 0x91;
/// Erase the EEPROM
pub const SIO_ERASE_EEPROM: u8 = 0x92;

/// `SIO_RESET` value: reset the SIO engine
pub const SIO_RESET_SIO: u16 = 0;
/// `SIO_RESET` value: purge RX buffer
pub const SIO_RESET_PURGE_RX: u16 = 1;
/// `SIO_RESET` value: purge TX buffer
pub const SIO_RESET_PURGE_TX: u16 = 2;

/// `SIO_SET_FLOW_CTRL` value: no flow control
pub const SIO_DISABLE_FLOW_CTRL: u16 = 0x0000;

/// Length of the modem status header on every bulk IN packet
pub const MODEM_STATUS_LEN: usize = 2;

// ============================================================================
// Timing
// ============================================================================

/// 120 MHz clock of the H-type chips
pub const H_CLK: u32 = 120_000_000;

/// 48 MHz clock of the full-speed chips
pub const C_CLK: u32 = 48_000_000;

/// Sub-integer divisor encoding, indexed by eighths
const FRAC_CODE: [u32; 8] = [0, 3, 2, 4, 1, 5, 6, 7];

// ============================================================================
// Channels
// ============================================================================

/// Bulk endpoints and request index for one channel of a chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    /// USB interface number
    pub interface: u8,
    /// `wIndex` used for SIO requests
    pub usb_index: u16,
    /// Bulk OUT endpoint
    pub write_ep: u8,
    /// Bulk IN endpoint
    pub read_ep: u8,
}

impl Channel {
    /// Channel `n` (0 = A)
    pub fn new(n: u8) -> Self {
        Self {
            interface: n,
            usb_index: u16::from(n) + 1,
            write_ep: 0x02 + 2 * n,
            read_ep: 0x81 + 2 * n,
        }
    }
}

/// Number of UART/MPSSE channels the chip exposes as separate devices
pub fn channel_count(dev_type: DevType) -> u8 {
    match dev_type {
        DevType::Ft2232C | DevType::Ft2232H => 2,
        DevType::Ft4232H => 4,
        _ => 1,
    }
}

/// Classify a chip from its `bcdDevice`
///
/// BM parts with a blank serial number report 0x0200 like the AM.
pub fn dev_type_from_bcd(bcd: u16, has_serial: bool) -> DevType {
    match bcd {
        0x0200 if !has_serial => DevType::Bm,
        0x0200 => DevType::Am,
        0x0400 => DevType::Bm,
        0x0500 => DevType::Ft2232C,
        0x0600 => DevType::Ft232R,
        0x0700 => DevType::Ft2232H,
        0x0800 => DevType::Ft4232H,
        0x0900 => DevType::Ft232H,
        0x1000 => DevType::FtXSeries,
        0x1700 => DevType::Ft4222H0,
        0x1800 => DevType::Ft4222H1And2,
        0x1900 => DevType::Ft4222H3,
        _ => DevType::Unknown,
    }
}

/// Default bulk packet size when the descriptor can't be read
pub fn default_packet_size(dev_type: DevType) -> usize {
    if dev_type.is_h_type() {
        512
    } else {
        64
    }
}

// ============================================================================
// Baud rate
// ============================================================================

/// Register values for `SIO_SET_BAUDRATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudDivisor {
    /// Rate the chip will actually run at
    pub actual: u32,
    pub value: u16,
    pub index: u16,
}

/// Closest divisor for `baud` with clock `clk` and fixed prescaler `prescale`
///
/// Returns the achieved rate and the 17-bit encoded divisor.
fn divisor(baud: u32, clk: u32, prescale: u32) -> (u32, u32) {
    let base = clk / prescale;
    if baud >= base {
        return (base, 0);
    }
    if baud >= clk / (prescale + prescale / 2) {
        return (clk / (prescale + prescale / 2), 1);
    }
    if baud >= base / 2 {
        return (base / 2, 2);
    }

    // Divisor in sixteenths, rounded to the nearest eighth
    let sixteenths = u64::from(clk) * 16 / u64::from(prescale) / u64::from(baud);
    let eighths = (sixteenths / 2 + (sixteenths & 1)).min(0x1FFFF) as u32;

    let doubled = u64::from(clk) * 16 / u64::from(prescale) / u64::from(eighths);
    let actual = (doubled / 2 + (doubled & 1)) as u32;
    let encoded = (eighths >> 3) | (FRAC_CODE[(eighths & 7) as usize] << 14);
    (actual, encoded)
}

/// Compute `SIO_SET_BAUDRATE` arguments for a chip
///
/// Returns `None` for a zero rate or for chips without a UART engine.
pub fn baud_divisor(baud: u32, dev_type: DevType, usb_index: u16) -> Option<BaudDivisor> {
    if baud == 0 {
        return None;
    }

    let (actual, encoded) = match dev_type {
        DevType::Ft2232H | DevType::Ft4232H | DevType::Ft232H => {
            if u64::from(baud) * 10 > u64::from(H_CLK) / 0x3FFF {
                let (actual, encoded) = divisor(baud, H_CLK, 10);
                // Select the 120 MHz clock
                (actual, encoded | 0x20000)
            } else {
                divisor(baud, C_CLK, 16)
            }
        }
        DevType::Bm
        | DevType::Am
        | DevType::Ft100Ax
        | DevType::Ft2232C
        | DevType::Ft232R
        | DevType::FtXSeries => divisor(baud, C_CLK, 16),
        _ => return None,
    };
    if actual == 0 {
        return None;
    }

    let value = (encoded & 0xFFFF) as u16;
    let index = match dev_type {
        DevType::Ft2232H | DevType::Ft4232H | DevType::Ft232H => {
            (((encoded >> 8) as u16) & 0xFF00) | usb_index
        }
        _ => (encoded >> 16) as u16,
    };

    Some(BaudDivisor {
        actual,
        value,
        index,
    })
}

// ============================================================================
// Bulk IN framing
// ============================================================================

/// Drop the modem status header from each packet of a bulk IN transfer
///
/// Payload bytes are compacted in place at the front of `data`; the
/// returned length is the payload size.
pub fn strip_modem_status(data: &mut [u8], packet_size: usize) -> usize {
    if packet_size <= MODEM_STATUS_LEN {
        return 0;
    }

    let mut len = 0;
    let mut start = 0;
    while start < data.len() {
        let end = (start + packet_size).min(data.len());
        let payload = start + MODEM_STATUS_LEN;
        if payload < end {
            data.copy_within(payload..end, len);
            len += end - payload;
        }
        start = end;
    }
    len
}
