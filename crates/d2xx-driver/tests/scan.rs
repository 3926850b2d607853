//! End-to-end scans against in-memory devices

use d2xx_core::{DevType, Filter, Status};
use d2xx_driver::{Driver, Entry, Error, FailureStage, SetupStep, NO_MATCH_FILTER};
use d2xx_fake::{FakeDevice, FakeOp, FakeSource};

/// FT232H, FT232R, FT232R (with a non-default PID)
fn three_devices() -> Vec<FakeDevice> {
    vec![
        FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014),
        FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001),
        FakeDevice::new(DevType::Ft232R, 0x0403, 0x6002),
    ]
}

fn rendered<S: d2xx_core::DeviceSource>(driver: &Driver<S>) -> Vec<String> {
    driver.all().iter().map(ToString::to_string).collect()
}

fn accepted_indices<S: d2xx_core::DeviceSource>(driver: &Driver<S>) -> Vec<usize> {
    driver.accepted().map(|dev| dev.identity().index).collect()
}

#[test]
fn variant_filter_accepts_first_ft232r() {
    let devices = three_devices();
    let mut driver = Driver::new(FakeSource::new(devices.clone()));
    driver.set_filters(vec![Filter::only(DevType::Ft232R).raw_index(-1)]);

    let summary = driver.init().unwrap();
    assert_eq!(summary.found, 3);
    assert_eq!(accepted_indices(&driver), vec![1]);

    let strings = rendered(&driver);
    assert!(strings[0].contains(NO_MATCH_FILTER));
    assert_eq!(strings[1], "FT232R(1)");
    assert!(strings[2].contains(NO_MATCH_FILTER));

    // The FT232R at index 2 has a different PID but the same variant
    assert_eq!(driver.all()[2].identity().unwrap().ordinal, 1);
    assert!(!devices[0].is_open());
    assert!(devices[1].is_open());
    assert!(!devices[2].is_open());

    // The second FT232R is classified, closed and left unconfigured
    assert!(!devices[2].touched());
    assert_eq!(devices[2].close_count(), 1);
    assert!(devices[1].touched());
}

#[test]
fn ordinal_filter_accepts_second_ft232r() {
    let devices = three_devices();
    let mut driver = Driver::new(FakeSource::new(devices.clone()));
    driver.set_filters(vec![Filter::only(DevType::Ft232R).index(1)]);

    driver.init().unwrap();
    assert_eq!(accepted_indices(&driver), vec![2]);

    let strings = rendered(&driver);
    assert_eq!(strings[2], "FT232R(2)");
    assert_eq!(strings[1], format!("FT232R(1): {}", NO_MATCH_FILTER));
    assert!(strings[0].contains(NO_MATCH_FILTER));
}

#[test]
fn no_filters_accept_everything() {
    let dev = FakeDevice::new(DevType::Ft4232H, 0x0403, 0x6011);
    let mut driver = Driver::new(FakeSource::new(vec![dev.clone()]));

    let summary = driver.init().unwrap();
    assert_eq!(summary.accepted, 1);
    let accepted: Vec<_> = driver.accepted().collect();
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].filter(), None);
    assert_eq!(accepted[0].identity().dev_type(), DevType::Ft4232H);
    assert!(dev.is_open());
}

#[test]
fn zero_devices_is_not_an_error() {
    let mut driver = Driver::new(FakeSource::new(Vec::new()));
    let summary = driver.init().unwrap();
    assert!(summary.is_empty());
    assert!(driver.registry().is_empty());
}

#[test]
fn open_failure_does_not_stop_the_scan() {
    let devices = three_devices();
    let source = FakeSource::new(devices.clone()).failing_open(1, Status::DeviceNotOpened);
    let mut driver = Driver::new(source);
    driver.set_filters(vec![Filter::only(DevType::Ft232R)]);

    let summary = driver.init().unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(driver.source().opened(), &[0, 1, 2]);

    // The failed index never got a variant, so index 2 is FT232R ordinal 0
    assert_eq!(accepted_indices(&driver), vec![2]);
    assert_eq!(driver.all()[2].identity().unwrap().ordinal, 0);
    assert!(matches!(
        driver.all()[1],
        Entry::Failed {
            index: 1,
            stage: FailureStage::Open,
            status: Status::DeviceNotOpened,
        }
    ));
    assert_eq!(
        rendered(&driver)[1],
        "device#1: open failed: FT_DEVICE_NOT_OPENED (3)"
    );
}

#[test]
fn identity_failure_skips_and_closes() {
    let bad = FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001)
        .failing(FakeOp::DeviceInfo, Status::IoError);
    let good = FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001);
    let mut driver = Driver::new(FakeSource::new(vec![bad.clone(), good.clone()]));

    driver.init().unwrap();
    assert!(driver.all()[0].is_failed());
    assert_eq!(
        rendered(&driver)[0],
        "device#0: identity query failed: FT_IO_ERROR (4)"
    );
    assert!(!bad.is_open());
    assert_eq!(bad.close_count(), 1);
    assert!(!bad.touched());
    assert_eq!(accepted_indices(&driver), vec![1]);
}

#[test]
fn rejected_devices_are_not_configured() {
    let devices = three_devices();
    let mut driver = Driver::new(FakeSource::new(devices.clone()));
    driver.set_filters(vec![Filter::only(DevType::Ft232H)]);

    driver.init().unwrap();
    assert!(devices[0].touched());
    assert!(!devices[1].touched());
    assert!(!devices[2].touched());
    assert_eq!(devices[1].close_count(), 1);
    assert_eq!(devices[2].close_count(), 1);
}

#[test]
fn setup_failure_keeps_device_accepted() {
    let dev = FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014)
        .failing(FakeOp::SetLatencyTimer, Status::IoError)
        .failing(FakeOp::SetFlowControl, Status::OtherError);
    let mut driver = Driver::new(FakeSource::new(vec![dev.clone()]));

    let summary = driver.init().unwrap();
    assert_eq!(summary.accepted, 1);
    let device = driver.accepted().next().unwrap();
    assert!(!device.fully_configured());
    let steps: Vec<SetupStep> = device.setup_errors().iter().map(|e| e.step).collect();
    assert_eq!(steps, vec![SetupStep::LatencyTimer, SetupStep::FlowControl]);
    assert_eq!(rendered(&driver), vec!["FT232H(0)"]);
    assert!(dev.is_open());
}

#[test]
fn count_failure_fails_init_and_empties_registry() {
    let devices = three_devices();
    let mut driver = Driver::new(FakeSource::new(devices.clone()));
    driver.init().unwrap();
    assert_eq!(driver.registry().len(), 3);

    let mut broken = Driver::new(
        FakeSource::new(devices.clone()).failing_count(Status::DeviceListNotReady),
    );
    assert!(matches!(
        broken.init(),
        Err(Error::Count(Status::DeviceListNotReady))
    ));
    assert!(broken.registry().is_empty());
    assert!(broken.source().opened().is_empty());

    // A failing re-scan also releases what the previous scan held
    drop(driver);
    let mut driver = Driver::new(FakeSource::new(devices.clone()));
    driver.init().unwrap();
    *driver.source_mut() = FakeSource::new(devices.clone()).failing_count(Status::OtherError);
    assert!(driver.init().is_err());
    assert!(driver.registry().is_empty());
    assert!(devices.iter().all(|dev| !dev.is_open()));
}

#[test]
fn reinit_is_idempotent() {
    let devices = three_devices();
    let mut driver = Driver::new(FakeSource::new(devices.clone()));
    driver.set_filters(vec![Filter::only(DevType::Ft232R).index(1)]);

    let first_summary = driver.init().unwrap();
    let first = rendered(&driver);
    driver.reset();
    let second_summary = driver.init().unwrap();
    let second = rendered(&driver);
    let third_summary = driver.init().unwrap();

    assert_eq!(first_summary, second_summary);
    assert_eq!(second_summary, third_summary);
    assert_eq!(first, second);
    assert_eq!(second, rendered(&driver));

    // Exactly one handle outstanding per accepted device, none leaked
    for (i, dev) in devices.iter().enumerate() {
        assert_eq!(dev.open_count(), 3);
        let expected_open = i == 2;
        assert_eq!(dev.is_open(), expected_open);
        let expected_closes = if expected_open { 2 } else { 3 };
        assert_eq!(dev.close_count(), expected_closes);
    }
}

#[test]
fn first_matching_filter_is_recorded() {
    let devices = three_devices();
    let mut driver = Driver::new(FakeSource::new(devices));
    driver.set_filters(vec![
        Filter::only(DevType::Ft232H),
        Filter::only(DevType::Ft232R).index(0),
        Filter::any(),
    ]);

    driver.init().unwrap();
    let filters: Vec<Option<usize>> = driver.accepted().map(|dev| dev.filter()).collect();
    assert_eq!(filters, vec![Some(0), Some(1), Some(2)]);
}

#[test]
fn accepted_handles_are_usable() {
    let dev = FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014);
    let mut driver = Driver::new(FakeSource::new(vec![dev.clone()]));
    driver.init().unwrap();

    for device in driver.accepted_mut() {
        assert_eq!(device.handle_mut().write(&[0x80, 0x00, 0xFB]).unwrap(), 3);
    }
    assert_eq!(dev.written(), vec![0x80, 0x00, 0xFB]);

    drop(driver);
    assert!(!dev.is_open());
}

#[test]
fn hotplug_between_scans() {
    let mut driver = Driver::new(FakeSource::new(three_devices()));
    driver.set_filters(vec![Filter::only(DevType::Ft232R)]);
    driver.init().unwrap();
    assert_eq!(accepted_indices(&driver), vec![1]);
    assert_eq!(driver.accepted().next().unwrap().identity().info.product_id, 0x6001);

    driver.source_mut().detach(1);
    driver
        .source_mut()
        .attach(FakeDevice::new(DevType::FtXSeries, 0x0403, 0x6015));
    driver.init().unwrap();
    assert_eq!(accepted_indices(&driver), vec![1]);
    // The FT232R that was at index 2 has moved up and is now the first one
    assert_eq!(driver.accepted().next().unwrap().identity().info.product_id, 0x6002);
    assert_eq!(
        rendered(&driver),
        vec![
            "FT232H(0): no match filter",
            "FT232R(1)",
            "FTXSeries(2): no match filter",
        ]
    );
}
