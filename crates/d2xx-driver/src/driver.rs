//! Enumeration and open driver
//!
//! A scan visits every index reported by the [`DeviceSource`] in order:
//!
//! ```text
//! Counting -> OpeningIndex(i) -> Classifying(i) -> Deciding(i)
//!          -> Accepted(i) | Rejected(i) -> next i -> ... -> Done
//! ```
//!
//! Only the count query can fail a scan. Open and identity failures are
//! recorded against their index and the scan moves on.

use std::fmt;

use d2xx_core::{
    evaluate, Claims, Decision, DeviceIdentity, DeviceSource, Filter, OrdinalCounter,
};

use crate::config::DriverConfig;
use crate::error::{Error, Result};
use crate::registry::{Entry, FailureStage, OpenedDevice, Registry};
use crate::setup::{configure, SetupConfig};

/// Counts from one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Devices reported by the count query
    pub found: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl ScanSummary {
    /// Whether the scan saw no devices at all
    pub fn is_empty(&self) -> bool {
        self.found == 0
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} found, {} accepted, {} rejected, {} failed",
            self.found, self.accepted, self.rejected, self.failed
        )
    }
}

/// Upper bound on the registry space reserved from the count query
const MAX_RESERVED_ENTRIES: usize = 64;

/// State that only lives for the duration of one scan
struct Scan<'a> {
    filters: &'a [Filter],
    setup: &'a SetupConfig,
    ordinals: OrdinalCounter,
    claims: Claims,
    entries: Vec<Entry>,
    summary: ScanSummary,
}

impl<'a> Scan<'a> {
    fn new(filters: &'a [Filter], setup: &'a SetupConfig, found: usize) -> Self {
        Self {
            filters,
            setup,
            ordinals: OrdinalCounter::new(),
            claims: Claims::new(),
            entries: Vec::with_capacity(found.min(MAX_RESERVED_ENTRIES)),
            summary: ScanSummary {
                found,
                ..ScanSummary::default()
            },
        }
    }

    fn fail(&mut self, index: usize, stage: FailureStage, status: d2xx_core::Status) {
        log::warn!("device#{}: {}: {}", index, stage, status);
        self.summary.failed += 1;
        self.entries.push(Entry::Failed {
            index,
            stage,
            status,
        });
    }

    fn visit<S: DeviceSource + ?Sized>(&mut self, source: &mut S, index: usize) {
        log::trace!("device#{}: opening", index);
        let mut handle = match source.open_at(index) {
            Ok(handle) => handle,
            Err(status) => return self.fail(index, FailureStage::Open, status),
        };

        log::trace!("device#{}: classifying", index);
        let info = match handle.get_device_info() {
            Ok(info) => info,
            Err(status) => {
                if let Err(close) = handle.close() {
                    log::warn!("device#{}: close failed: {}", index, close);
                }
                return self.fail(index, FailureStage::Classify, status);
            }
        };

        let ordinal = self.ordinals.next(info.dev_type);
        let identity = DeviceIdentity {
            index,
            info,
            ordinal,
        };
        log::trace!(
            "device#{}: deciding {} ordinal {} ({:04X}:{:04X})",
            index,
            info.dev_type,
            ordinal,
            info.vendor_id,
            info.product_id
        );

        match evaluate(self.filters, &mut self.claims, info.dev_type, ordinal) {
            Decision::Accept { filter } => {
                let errors = configure(handle.as_mut(), self.setup);
                for err in &errors {
                    log::warn!("{}: setup {}", identity, err);
                }
                log::info!("Accepted {}", identity);
                self.summary.accepted += 1;
                self.entries.push(Entry::Accepted(OpenedDevice::new(
                    handle, identity, filter, errors,
                )));
            }
            Decision::Reject => {
                if let Err(status) = handle.close() {
                    log::warn!("{}: close failed: {}", identity, status);
                }
                log::debug!("Rejected {}", identity);
                self.summary.rejected += 1;
                self.entries.push(Entry::Rejected(identity));
            }
        }
    }
}

/// Owned driver context
///
/// Scans take `&mut self`, so two scans can never overlap on the same
/// driver. Share a driver between threads behind a `Mutex`.
pub struct Driver<S: DeviceSource> {
    source: S,
    filters: Vec<Filter>,
    setup: SetupConfig,
    registry: Registry,
}

impl<S: DeviceSource> Driver<S> {
    /// Create a driver with no filters and default setup
    pub fn new(source: S) -> Self {
        Self::with_config(source, DriverConfig::default())
    }

    /// Create a driver from a loaded configuration
    pub fn with_config(source: S, config: DriverConfig) -> Self {
        Self {
            source,
            filters: config.filters,
            setup: config.setup,
            registry: Registry::default(),
        }
    }

    /// Replace the filter list; takes effect at the next [`init`](Self::init)
    pub fn set_filters(&mut self, filters: Vec<Filter>) {
        self.filters = filters;
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Replace the setup parameters; takes effect at the next [`init`](Self::init)
    pub fn set_setup(&mut self, setup: SetupConfig) {
        self.setup = setup;
    }

    pub fn setup(&self) -> &SetupConfig {
        &self.setup
    }

    /// Reset, then scan every attached device
    ///
    /// Succeeds whenever the count query succeeds, even if no device was
    /// accepted. When the count query fails the registry is left empty.
    pub fn init(&mut self) -> Result<ScanSummary> {
        self.reset();

        log::trace!("Counting devices");
        let found = self.source.count().map_err(Error::Count)?;
        if found == 0 {
            log::info!("No devices found");
            return Ok(ScanSummary::default());
        }
        log::debug!("{} device(s) attached", found);

        let mut scan = Scan::new(&self.filters, &self.setup, found);
        for index in 0..found {
            scan.visit(&mut self.source, index);
        }

        let Scan { entries, summary, .. } = scan;
        self.registry = Registry::from_entries(entries);
        log::info!("Scan done: {}", summary);
        Ok(summary)
    }

    /// Close every retained handle and forget the previous scan
    pub fn reset(&mut self) {
        if !self.registry.is_empty() {
            log::debug!("Releasing {} entries", self.registry.len());
        }
        self.registry.clear();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Every entry from the most recent scan, in index order
    pub fn all(&self) -> &[Entry] {
        self.registry.all()
    }

    /// Accepted devices from the most recent scan
    pub fn accepted(&self) -> impl Iterator<Item = &OpenedDevice> {
        self.registry.accepted()
    }

    pub fn accepted_mut(&mut self) -> impl Iterator<Item = &mut OpenedDevice> {
        self.registry.accepted_mut()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: DeviceSource + fmt::Debug> fmt::Debug for Driver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("source", &self.source)
            .field("filters", &self.filters)
            .field("setup", &self.setup)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use d2xx_core::{DevType, Status};
    use d2xx_fake::{FakeDevice, FakeOp, FakeSource};

    #[test]
    fn test_summary_counts() {
        let source = FakeSource::new(vec![
            FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001),
            FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014)
                .failing(FakeOp::DeviceInfo, Status::IoError),
            FakeDevice::new(DevType::Ft2232H, 0x0403, 0x6010),
        ])
        .failing_open(2, Status::DeviceNotOpened);
        let mut driver = Driver::new(source);
        driver.set_filters(vec![Filter::only(DevType::Ft2232H)]);

        let summary = driver.init().unwrap();
        assert_eq!(
            summary,
            ScanSummary {
                found: 3,
                accepted: 0,
                rejected: 1,
                failed: 2,
            }
        );
        assert_eq!(summary.to_string(), "3 found, 0 accepted, 1 rejected, 2 failed");
    }

    #[test]
    fn test_bogus_count_reserves_bounded_space() {
        let setup = SetupConfig::default();
        let scan = Scan::new(&[], &setup, usize::MAX);
        assert_eq!(scan.summary.found, usize::MAX);
        assert!(scan.entries.capacity() <= 2 * MAX_RESERVED_ENTRIES);
    }

    #[test]
    fn test_any_index_filter_claims_one_device() {
        let a = FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001);
        let b = FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001);
        let mut driver = Driver::new(FakeSource::new(vec![a.clone(), b.clone()]));
        driver.set_filters(vec![Filter::only(DevType::Ft232R)]);

        let summary = driver.init().unwrap();
        assert_eq!((summary.accepted, summary.rejected), (1, 1));
        assert!(a.is_open() && !b.is_open());

        // A second copy of the filter takes the next one
        driver.set_filters(vec![Filter::only(DevType::Ft232R); 2]);
        driver.init().unwrap();
        assert!(a.is_open() && b.is_open());
    }

    #[test]
    fn test_filters_apply_on_next_init() {
        let dev = FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001);
        let mut driver = Driver::new(FakeSource::new(vec![dev]));
        driver.init().unwrap();
        assert_eq!(driver.accepted().count(), 1);

        driver.set_filters(vec![Filter::only(DevType::Ft232H)]);
        assert_eq!(driver.accepted().count(), 1);
        driver.init().unwrap();
        assert_eq!(driver.accepted().count(), 0);
    }

    #[test]
    fn test_setup_config_used() {
        let dev = FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014);
        let mut driver = Driver::new(FakeSource::new(vec![dev.clone()]));
        driver.set_setup(SetupConfig {
            latency_timer_ms: 8,
            ..SetupConfig::default()
        });
        driver.init().unwrap();
        assert_eq!(dev.latency_ms(), 8);
    }

    #[test]
    fn test_reset_closes_everything() {
        let a = FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001);
        let b = FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001);
        let mut driver = Driver::new(FakeSource::new(vec![a.clone(), b.clone()]));
        driver.init().unwrap();
        assert!(a.is_open() && b.is_open());

        driver.reset();
        assert!(driver.registry().is_empty());
        assert!(!a.is_open() && !b.is_open());
    }
}
