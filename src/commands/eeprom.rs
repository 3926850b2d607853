//! EEPROM and user area dumps

use std::io::{self, Write};

use d2xx_core::{DeviceSource, EepromImage};
use d2xx_driver::{Driver, OpenedDevice};

/// Scan and return the first accepted device
fn first_accepted<S: DeviceSource>(
    driver: &mut Driver<S>,
) -> Result<&mut OpenedDevice, Box<dyn std::error::Error>> {
    let summary = driver.init()?;
    if summary.is_empty() {
        return Err("No devices found".into());
    }
    driver
        .accepted_mut()
        .next()
        .ok_or_else(|| "No device matched the filters".into())
}

/// Read the EEPROM image of the first accepted device
pub fn read_eeprom<S: DeviceSource>(
    driver: &mut Driver<S>,
) -> Result<EepromImage, Box<dyn std::error::Error>> {
    let dev = first_accepted(driver)?;
    let dev_type = dev.identity().dev_type();
    log::info!("Reading EEPROM of {}", dev.identity());
    let image = dev.handle_mut().eeprom_read(dev_type)?;
    log::info!("Read {} bytes", image.len());
    Ok(image)
}

/// Read the user area of the first accepted device
pub fn read_user_area<S: DeviceSource>(
    driver: &mut Driver<S>,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let dev = first_accepted(driver)?;
    log::info!("Reading user area of {}", dev.identity());
    let handle = dev.handle_mut();
    let size = handle.user_area_size()?;
    let mut data = vec![0u8; size];
    handle.user_area_read(&mut data)?;
    Ok(data)
}

/// Classic 16-bytes-per-line hexdump
pub fn hexdump(data: &[u8], out: &mut impl Write) -> io::Result<()> {
    for (line, chunk) in data.chunks(16).enumerate() {
        write!(out, "{:08x}:", line * 16)?;
        for i in 0..16 {
            match chunk.get(i) {
                Some(b) => write!(out, " {:02x}", b)?,
                None => write!(out, "   ")?,
            }
        }
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        writeln!(out, "  |{}|", ascii)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use d2xx_core::{DevType, Filter, Status};
    use d2xx_fake::{FakeDevice, FakeOp, FakeSource};

    #[test]
    fn test_read_eeprom_first_accepted() {
        let eeprom: Vec<u8> = (0..128).collect();
        let source = FakeSource::new(vec![
            FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014),
            FakeDevice::new(DevType::Ft232R, 0x0403, 0x6001).with_eeprom(&eeprom),
        ]);
        let mut driver = Driver::new(source);
        driver.set_filters(vec![Filter::only(DevType::Ft232R)]);

        let image = read_eeprom(&mut driver).unwrap();
        assert_eq!(image.dev_type(), DevType::Ft232R);
        assert_eq!(image.as_bytes(), &eeprom[..]);
    }

    #[test]
    fn test_nothing_accepted() {
        let source = FakeSource::new(vec![FakeDevice::new(DevType::Ft232H, 0x0403, 0x6014)]);
        let mut driver = Driver::new(source);
        driver.set_filters(vec![Filter::only(DevType::Ft232R)]);
        let err = read_eeprom(&mut driver).unwrap_err();
        assert_eq!(err.to_string(), "No device matched the filters");

        let mut empty = Driver::new(FakeSource::new(Vec::new()));
        assert_eq!(
            read_user_area(&mut empty).unwrap_err().to_string(),
            "No devices found"
        );
    }

    #[test]
    fn test_read_user_area() {
        let dev = FakeDevice::new(DevType::Ft2232H, 0x0403, 0x6010).with_user_area(b"hello");
        let mut driver = Driver::new(FakeSource::new(vec![dev]));
        assert_eq!(read_user_area(&mut driver).unwrap(), b"hello");
    }

    #[test]
    fn test_user_area_failure() {
        let dev = FakeDevice::new(DevType::Ft2232H, 0x0403, 0x6010)
            .failing(FakeOp::UserArea, Status::NotSupported);
        let mut driver = Driver::new(FakeSource::new(vec![dev]));
        let err = read_user_area(&mut driver).unwrap_err();
        assert_eq!(err.to_string(), "FT_NOT_SUPPORTED (17)");
    }

    #[test]
    fn test_hexdump() {
        let mut buf = Vec::new();
        hexdump(b"0123456789abcdefXY", &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "00000000: 30 31 32 33 34 35 36 37 38 39 61 62 63 64 65 66  |0123456789abcdef|"
        );
        assert!(lines[1].starts_with("00000010: 58 59   "));
        assert!(lines[1].ends_with("  |XY|"));
    }
}
