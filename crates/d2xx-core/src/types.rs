//! Chip variants and device identity
//!
//! These types describe what the native layer reports about an opened
//! device. They are created once when a device is opened and never change
//! afterwards.

use core::fmt;

/// FTDI vendor ID
pub const FTDI_VID: u16 = 0x0403;

/// Chip variant as reported by the native identity query
///
/// The discriminants follow the driver's `FT_DEVICE` numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum DevType {
    /// FT232BM / FT245BM
    Bm,
    /// FT8U232AM
    Am,
    /// FT8U100AX
    Ft100Ax,
    /// The driver could not classify the chip
    #[default]
    Unknown,
    /// FT2232C/D/L
    Ft2232C,
    /// FT232R / FT245R
    Ft232R,
    /// FT2232H (dual channel, hi-speed)
    Ft2232H,
    /// FT4232H (quad channel, hi-speed)
    Ft4232H,
    /// FT232H (single channel, hi-speed)
    Ft232H,
    /// FT-X series (FT230X, FT231X, FT234XD, ...)
    FtXSeries,
    /// FT4222H in mode 0
    Ft4222H0,
    /// FT4222H in mode 1 or 2
    Ft4222H1And2,
    /// FT4222H in mode 3
    Ft4222H3,
    /// FT4222 OTP programming mode
    Ft4222Prog,
    /// FT900
    Ft900,
    /// FT930
    Ft930,
    /// UMFTPD3A
    FtUmftpd3a,
}

impl DevType {
    /// Every variant, in driver numbering order
    pub const ALL: [DevType; 17] = [
        Self::Bm,
        Self::Am,
        Self::Ft100Ax,
        Self::Unknown,
        Self::Ft2232C,
        Self::Ft232R,
        Self::Ft2232H,
        Self::Ft4232H,
        Self::Ft232H,
        Self::FtXSeries,
        Self::Ft4222H0,
        Self::Ft4222H1And2,
        Self::Ft4222H3,
        Self::Ft4222Prog,
        Self::Ft900,
        Self::Ft930,
        Self::FtUmftpd3a,
    ];

    /// Map a raw `FT_DEVICE` value; unmapped values are `Unknown`
    pub fn from_raw(raw: u32) -> Self {
        Self::ALL
            .get(raw as usize)
            .copied()
            .unwrap_or(Self::Unknown)
    }

    /// The raw `FT_DEVICE` value
    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Name used when rendering devices and in filter strings
    pub fn name(self) -> &'static str {
        match self {
            Self::Bm => "FTBM",
            Self::Am => "FTAM",
            Self::Ft100Ax => "FT100AX",
            Self::Unknown => "Unknown",
            Self::Ft2232C => "FT2232C",
            Self::Ft232R => "FT232R",
            Self::Ft2232H => "FT2232H",
            Self::Ft4232H => "FT4232H",
            Self::Ft232H => "FT232H",
            Self::FtXSeries => "FTXSeries",
            Self::Ft4222H0 => "FT4222H_0",
            Self::Ft4222H1And2 => "FT4222H_1_2",
            Self::Ft4222H3 => "FT4222H_3",
            Self::Ft4222Prog => "FT4222_PROG",
            Self::Ft900 => "FT900",
            Self::Ft930 => "FT930",
            Self::FtUmftpd3a => "FTUMFTPD3A",
        }
    }

    /// Parse a variant name
    ///
    /// Matching is case-insensitive and the `FT` prefix is optional, so
    /// `FT232R`, `ft232r` and `232r` all name the same chip.
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        let wanted = wanted.strip_prefix("FT").unwrap_or(&wanted);
        Self::ALL.iter().copied().find(|t| {
            let name = t.name().to_ascii_uppercase();
            name.strip_prefix("FT").unwrap_or(&name) == wanted
        })
    }

    /// Whether this is a hi-speed (H-type) chip
    pub fn is_h_type(self) -> bool {
        matches!(self, Self::Ft2232H | Self::Ft4232H | Self::Ft232H)
    }

    /// Size in bytes of the EEPROM image read for this variant
    pub fn eeprom_size(self) -> usize {
        match self {
            Self::Bm | Self::Am | Self::Ft100Ax | Self::Ft2232C | Self::Ft232R => 128,
            Self::Ft2232H | Self::Ft4232H | Self::Ft232H => 256,
            Self::Ft4222H0 | Self::Ft4222H1And2 | Self::Ft4222H3 | Self::Ft4222Prog => 256,
            Self::FtXSeries => 2048,
            Self::Unknown | Self::Ft900 | Self::Ft930 | Self::FtUmftpd3a => 0,
        }
    }
}

impl fmt::Display for DevType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of the native identity query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceInfo {
    /// Chip variant
    pub dev_type: DevType,
    /// USB vendor ID
    pub vendor_id: u16,
    /// USB product ID
    pub product_id: u16,
}

impl DeviceInfo {
    /// Create a new identity record
    pub fn new(dev_type: DevType, vendor_id: u16, product_id: u16) -> Self {
        Self {
            dev_type,
            vendor_id,
            product_id,
        }
    }
}

/// Identity of a classified device within one scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    /// Enumeration index the device was opened at
    pub index: usize,
    /// What the device reported about itself
    pub info: DeviceInfo,
    /// 0-based rank among devices of the same variant seen earlier in the scan
    pub ordinal: usize,
}

impl DeviceIdentity {
    /// Chip variant
    pub fn dev_type(&self) -> DevType {
        self.info.dev_type
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.info.dev_type, self.index)
    }
}

/// Raw EEPROM image
///
/// The byte layout belongs to the EEPROM decoder; this type only carries
/// the bytes and the variant they were read for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EepromImage {
    dev_type: DevType,
    raw: Vec<u8>,
}

impl EepromImage {
    /// Wrap raw EEPROM bytes
    pub fn new(dev_type: DevType, raw: Vec<u8>) -> Self {
        Self { dev_type, raw }
    }

    /// A blank (all 0xFF) image sized for the variant
    pub fn blank(dev_type: DevType) -> Self {
        Self::new(dev_type, vec![0xFF; dev_type.eeprom_size()])
    }

    /// Variant the image was read for
    pub fn dev_type(&self) -> DevType {
        self.dev_type
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Consume the image and return the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.raw
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the image holds no bytes
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Little-endian 16-bit word at word offset `n`
    pub fn word(&self, n: usize) -> Option<u16> {
        let lo = *self.raw.get(n * 2)?;
        let hi = *self.raw.get(n * 2 + 1)?;
        Some(u16::from_le_bytes([lo, hi]))
    }
}

/// Bit-mode selection for `set_bit_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitMode {
    /// Normal serial/FIFO mode
    #[default]
    Reset,
    /// Asynchronous bitbang
    AsyncBitbang,
    /// MPSSE (SPI/I2C/JTAG engine)
    Mpsse,
    /// Synchronous bitbang
    SyncBitbang,
    /// MCU host bus emulation
    McuHost,
    /// Fast opto-isolated serial
    FastSerial,
    /// CBUS bitbang (FT232R/FT-X)
    CbusBitbang,
    /// Synchronous 245 FIFO
    SyncFifo,
}

impl BitMode {
    /// Mode byte sent to the chip
    pub fn value(self) -> u8 {
        match self {
            Self::Reset => 0x00,
            Self::AsyncBitbang => 0x01,
            Self::Mpsse => 0x02,
            Self::SyncBitbang => 0x04,
            Self::McuHost => 0x08,
            Self::FastSerial => 0x10,
            Self::CbusBitbang => 0x20,
            Self::SyncFifo => 0x40,
        }
    }
}
