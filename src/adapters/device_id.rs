//! Device identity derived from the ESP32 factory MAC address.
//!
//! Produces a stable serial number in the form `FL-XXYYZZ` (last 3 bytes
//! of the 6-byte MAC in uppercase hex), reported through the Device
//! Information serial-number characteristic.

/// Fixed-size serial string: "FL-XXYYZZ".
pub type SerialNumber = heapless::String<16>;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: writes exactly 6 bytes into `mac`.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0x24, 0x0A, 0xC4, 0x5F, 0x10, 0x3B]
}

/// Derive the serial number from the last 3 MAC bytes.
pub fn serial_number(mac: &MacAddress) -> SerialNumber {
    use core::fmt::Write;
    let mut id = SerialNumber::new();
    let _ = write!(id, "FL-{:02X}{:02X}{:02X}", mac[3], mac[4], mac[5]);
    id
}
