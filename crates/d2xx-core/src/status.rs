//! Native driver status codes
//!
//! Every native call reports an `FT_STATUS` code where `0` means success.
//! Success is represented as `Ok(..)`, so [`Status`] only carries the
//! failure codes.

use core::fmt;

/// Result type for native handle operations
pub type NativeResult<T> = Result<T, Status>;

/// Non-zero native status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// FT_INVALID_HANDLE (1)
    InvalidHandle,
    /// FT_DEVICE_NOT_FOUND (2)
    DeviceNotFound,
    /// FT_DEVICE_NOT_OPENED (3)
    DeviceNotOpened,
    /// FT_IO_ERROR (4)
    IoError,
    /// FT_INSUFFICIENT_RESOURCES (5)
    InsufficientResources,
    /// FT_INVALID_PARAMETER (6)
    InvalidParameter,
    /// FT_INVALID_BAUD_RATE (7)
    InvalidBaudRate,
    /// FT_DEVICE_NOT_OPENED_FOR_ERASE (8)
    DeviceNotOpenedForErase,
    /// FT_DEVICE_NOT_OPENED_FOR_WRITE (9)
    DeviceNotOpenedForWrite,
    /// FT_FAILED_TO_WRITE_DEVICE (10)
    FailedToWriteDevice,
    /// FT_EEPROM_READ_FAILED (11)
    EepromReadFailed,
    /// FT_EEPROM_WRITE_FAILED (12)
    EepromWriteFailed,
    /// FT_EEPROM_ERASE_FAILED (13)
    EepromEraseFailed,
    /// FT_EEPROM_NOT_PRESENT (14)
    EepromNotPresent,
    /// FT_EEPROM_NOT_PROGRAMMED (15)
    EepromNotProgrammed,
    /// FT_INVALID_ARGS (16)
    InvalidArgs,
    /// FT_NOT_SUPPORTED (17)
    NotSupported,
    /// FT_OTHER_ERROR (18)
    OtherError,
    /// FT_DEVICE_LIST_NOT_READY (19)
    DeviceListNotReady,
    /// A code outside the documented table
    Unknown(u32),
}

impl Status {
    /// Map a raw status code; `0` (success) maps to `None`
    pub fn from_code(code: u32) -> Option<Self> {
        let status = match code {
            0 => return None,
            1 => Self::InvalidHandle,
            2 => Self::DeviceNotFound,
            3 => Self::DeviceNotOpened,
            4 => Self::IoError,
            5 => Self::InsufficientResources,
            6 => Self::InvalidParameter,
            7 => Self::InvalidBaudRate,
            8 => Self::DeviceNotOpenedForErase,
            9 => Self::DeviceNotOpenedForWrite,
            10 => Self::FailedToWriteDevice,
            11 => Self::EepromReadFailed,
            12 => Self::EepromWriteFailed,
            13 => Self::EepromEraseFailed,
            14 => Self::EepromNotPresent,
            15 => Self::EepromNotProgrammed,
            16 => Self::InvalidArgs,
            17 => Self::NotSupported,
            18 => Self::OtherError,
            19 => Self::DeviceListNotReady,
            other => Self::Unknown(other),
        };
        Some(status)
    }

    /// Turn a raw status code into a result
    pub fn check(code: u32) -> NativeResult<()> {
        match Self::from_code(code) {
            None => Ok(()),
            Some(status) => Err(status),
        }
    }

    /// The raw status code
    pub fn code(self) -> u32 {
        match self {
            Self::InvalidHandle => 1,
            Self::DeviceNotFound => 2,
            Self::DeviceNotOpened => 3,
            Self::IoError => 4,
            Self::InsufficientResources => 5,
            Self::InvalidParameter => 6,
            Self::InvalidBaudRate => 7,
            Self::DeviceNotOpenedForErase => 8,
            Self::DeviceNotOpenedForWrite => 9,
            Self::FailedToWriteDevice => 10,
            Self::EepromReadFailed => 11,
            Self::EepromWriteFailed => 12,
            Self::EepromEraseFailed => 13,
            Self::EepromNotPresent => 14,
            Self::EepromNotProgrammed => 15,
            Self::InvalidArgs => 16,
            Self::NotSupported => 17,
            Self::OtherError => 18,
            Self::DeviceListNotReady => 19,
            Self::Unknown(code) => code,
        }
    }

    /// The driver's symbolic name for this code
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidHandle => "FT_INVALID_HANDLE",
            Self::DeviceNotFound => "FT_DEVICE_NOT_FOUND",
            Self::DeviceNotOpened => "FT_DEVICE_NOT_OPENED",
            Self::IoError => "FT_IO_ERROR",
            Self::InsufficientResources => "FT_INSUFFICIENT_RESOURCES",
            Self::InvalidParameter => "FT_INVALID_PARAMETER",
            Self::InvalidBaudRate => "FT_INVALID_BAUD_RATE",
            Self::DeviceNotOpenedForErase => "FT_DEVICE_NOT_OPENED_FOR_ERASE",
            Self::DeviceNotOpenedForWrite => "FT_DEVICE_NOT_OPENED_FOR_WRITE",
            Self::FailedToWriteDevice => "FT_FAILED_TO_WRITE_DEVICE",
            Self::EepromReadFailed => "FT_EEPROM_READ_FAILED",
            Self::EepromWriteFailed => "FT_EEPROM_WRITE_FAILED",
            Self::EepromEraseFailed => "FT_EEPROM_ERASE_FAILED",
            Self::EepromNotPresent => "FT_EEPROM_NOT_PRESENT",
            Self::EepromNotProgrammed => "FT_EEPROM_NOT_PROGRAMMED",
            Self::InvalidArgs => "FT_INVALID_ARGS",
            Self::NotSupported => "FT_NOT_SUPPORTED",
            Self::OtherError => "FT_OTHER_ERROR",
            Self::DeviceListNotReady => "FT_DEVICE_LIST_NOT_READY",
            Self::Unknown(_) => "FT_UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl std::error::Error for Status {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_success() {
        assert_eq!(Status::from_code(0), None);
        assert!(Status::check(0).is_ok());
    }

    #[test]
    fn test_known_codes_map_back() {
        for code in 1..=19 {
            let status = Status::from_code(code).unwrap();
            assert!(!matches!(status, Status::Unknown(_)));
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_preserved() {
        assert_eq!(Status::check(42), Err(Status::Unknown(42)));
        assert_eq!(Status::Unknown(42).code(), 42);
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::IoError.to_string(), "FT_IO_ERROR (4)");
        assert_eq!(Status::Unknown(99).to_string(), "FT_UNKNOWN (99)");
    }
}
