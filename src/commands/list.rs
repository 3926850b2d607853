//! List commands implementation

use std::io::{self, Write};

use d2xx_core::{DevType, DeviceSource};
use d2xx_driver::{Driver, Entry};

/// List every device type name accepted in filters
pub fn list_types(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Device types:")?;
    writeln!(out)?;
    writeln!(out, "{:<14} {:>8}", "Name", "EEPROM")?;
    writeln!(out, "{}", "-".repeat(23))?;
    for dev_type in DevType::ALL {
        let eeprom = match dev_type.eeprom_size() {
            0 => "-".to_string(),
            n => format!("{} B", n),
        };
        writeln!(out, "{:<14} {:>8}", dev_type.name(), eeprom)?;
    }
    writeln!(out)?;
    writeln!(out, "Use `any` to match every type and `<type>:<n>` to pick the n-th of a type.")
}

/// Scan and print one line per visited device, then a summary
pub fn list_devices<S: DeviceSource>(
    driver: &mut Driver<S>,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = driver.init()?;
    if summary.is_empty() {
        writeln!(out, "No devices found")?;
        return Ok(());
    }

    for entry in driver.all() {
        match entry {
            Entry::Accepted(dev) => {
                let id = dev.identity();
                writeln!(
                    out,
                    "{:<12} {:04X}:{:04X} ordinal {}",
                    entry.to_string(),
                    id.info.vendor_id,
                    id.info.product_id,
                    id.ordinal
                )?;
                for err in dev.setup_errors() {
                    writeln!(out, "    warning: setup {}", err)?;
                }
            }
            _ => writeln!(out, "{}", entry)?,
        }
    }
    writeln!(out, "{}", summary)?;
    Ok(())
}
