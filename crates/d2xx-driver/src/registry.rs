//! Registry of devices seen by the most recent scan
//!
//! Every enumeration index visited by a scan gets exactly one [`Entry`], in
//! index order. Only accepted entries own a live handle; rejected and failed
//! entries exist for diagnostics.

use std::fmt;

use d2xx_core::{DeviceIdentity, Handle, NativeResult, Status};

use crate::setup::SetupError;

/// Marker carried by the rendering of a rejected device
pub const NO_MATCH_FILTER: &str = "no match filter";

/// An accepted device together with its open handle
///
/// The handle is closed when the device is dropped.
pub struct OpenedDevice {
    handle: Box<dyn Handle>,
    identity: DeviceIdentity,
    filter: Option<usize>,
    setup_errors: Vec<SetupError>,
    closed: bool,
}

impl OpenedDevice {
    pub(crate) fn new(
        handle: Box<dyn Handle>,
        identity: DeviceIdentity,
        filter: Option<usize>,
        setup_errors: Vec<SetupError>,
    ) -> Self {
        Self {
            handle,
            identity,
            filter,
            setup_errors,
            closed: false,
        }
    }

    /// Identity recorded when the device was classified
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Position of the filter that accepted the device
    ///
    /// `None` when no filters were configured.
    pub fn filter(&self) -> Option<usize> {
        self.filter
    }

    /// Setup steps that failed after the device was accepted
    pub fn setup_errors(&self) -> &[SetupError] {
        &self.setup_errors
    }

    /// Whether every setup step succeeded
    pub fn fully_configured(&self) -> bool {
        self.setup_errors.is_empty()
    }

    /// Borrow the live handle
    pub fn handle_mut(&mut self) -> &mut dyn Handle {
        self.handle.as_mut()
    }

    /// Close the handle now instead of on drop
    pub fn close(mut self) -> NativeResult<()> {
        self.closed = true;
        self.handle.close()
    }
}

impl Drop for OpenedDevice {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(status) = self.handle.close() {
            log::warn!("Failed to close {}: {}", self.identity, status);
        }
    }
}

impl fmt::Debug for OpenedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedDevice")
            .field("identity", &self.identity)
            .field("filter", &self.filter)
            .field("setup_errors", &self.setup_errors)
            .finish_non_exhaustive()
    }
}

/// Where a per-index failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Opening the index failed
    Open,
    /// Querying the identity of the opened device failed
    Classify,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Open => f.write_str("open failed"),
            FailureStage::Classify => f.write_str("identity query failed"),
        }
    }
}

/// Outcome of visiting one enumeration index
#[derive(Debug)]
pub enum Entry {
    /// Accepted by the filters and kept open
    Accepted(OpenedDevice),
    /// Classified but matched no filter; the handle was closed
    Rejected(DeviceIdentity),
    /// Could not be opened or classified
    Failed {
        index: usize,
        stage: FailureStage,
        status: Status,
    },
}

impl Entry {
    /// Enumeration index of the entry
    pub fn index(&self) -> usize {
        match self {
            Entry::Accepted(dev) => dev.identity.index,
            Entry::Rejected(identity) => identity.index,
            Entry::Failed { index, .. } => *index,
        }
    }

    /// Identity, if the device got far enough to be classified
    pub fn identity(&self) -> Option<&DeviceIdentity> {
        match self {
            Entry::Accepted(dev) => Some(&dev.identity),
            Entry::Rejected(identity) => Some(identity),
            Entry::Failed { .. } => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Entry::Accepted(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Entry::Rejected(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Entry::Failed { .. })
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Accepted(dev) => write!(f, "{}", dev.identity),
            Entry::Rejected(identity) => write!(f, "{}: {}", identity, NO_MATCH_FILTER),
            Entry::Failed {
                index,
                stage,
                status,
            } => write!(f, "device#{}: {}: {}", index, stage, status),
        }
    }
}

/// Entries from the most recent scan, in enumeration order
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub(crate) fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Every visited index, accepted or not
    pub fn all(&self) -> &[Entry] {
        &self.entries
    }

    /// Accepted devices in open order
    pub fn accepted(&self) -> impl Iterator<Item = &OpenedDevice> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Accepted(dev) => Some(dev),
            _ => None,
        })
    }

    /// Accepted devices in open order, with mutable access to their handles
    pub fn accepted_mut(&mut self) -> impl Iterator<Item = &mut OpenedDevice> {
        self.entries.iter_mut().filter_map(|entry| match entry {
            Entry::Accepted(dev) => Some(dev),
            _ => None,
        })
    }

    /// Entry for an enumeration index
    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.index() == index)
    }

    /// First accepted device whose identity satisfies `pred`
    pub fn find<P>(&self, mut pred: P) -> Option<&OpenedDevice>
    where
        P: FnMut(&DeviceIdentity) -> bool,
    {
        self.accepted().find(|dev| pred(&dev.identity))
    }

    /// Number of visited indices
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rendered string of every entry, in enumeration order
    pub fn render(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Drop every entry, closing retained handles
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
