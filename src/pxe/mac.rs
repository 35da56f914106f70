//! MAC address to PXE config filename.

use super::BootConfigError;

/// ARP hardware type for Ethernet, prefixed by pxelinux to per-MAC names.
const ETHERNET_HW_TYPE: &str = "01";

/// Map a MAC address to the file name a PXE loader requests,
/// e.g. `AA:BB:CC:DD:EE:FF` → `01-aa-bb-cc-dd-ee-ff`.
///
/// `:`, `-` and `.` separators are accepted in any position; what remains
/// must be exactly 12 hex digits.
pub fn pxe_filename(mac: &str) -> Result<String, BootConfigError> {
    let digits: String = mac
        .trim()
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BootConfigError::InvalidAddress(mac.to_string()));
    }

    let mut name = String::with_capacity(ETHERNET_HW_TYPE.len() + 18);
    name.push_str(ETHERNET_HW_TYPE);
    for pair in digits.as_bytes().chunks(2) {
        name.push('-');
        name.push(char::from(pair[0]));
        name.push(char::from(pair[1]));
    }
    Ok(name)
}
