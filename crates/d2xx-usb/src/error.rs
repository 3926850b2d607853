//! Mapping of USB errors onto native status codes

use d2xx_core::Status;
use nusb::transfer::TransferError;

/// Status for a failed bulk or control transfer
pub(crate) fn transfer_status(err: TransferError) -> Status {
    match err {
        TransferError::Disconnected => Status::DeviceNotFound,
        TransferError::Stall => {
            log::debug!("Endpoint stalled");
            Status::IoError
        }
        other => {
            log::debug!("USB transfer failed: {}", other);
            Status::IoError
        }
    }
}

/// Status for a failure to open or claim a device
pub(crate) fn open_status(err: nusb::Error) -> Status {
    log::debug!("USB open failed: {}", err);
    Status::DeviceNotOpened
}

/// Status for a failure to list devices
pub(crate) fn list_status(err: nusb::Error) -> Status {
    log::debug!("USB enumeration failed: {}", err);
    Status::DeviceListNotReady
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_mapping() {
        assert_eq!(
            transfer_status(TransferError::Disconnected),
            Status::DeviceNotFound
        );
        assert_eq!(transfer_status(TransferError::Stall), Status::IoError);
        assert_eq!(transfer_status(TransferError::Fault), Status::IoError);
    }
}
