//! Fixed-length keys for the variable-length WiFi list.
//!
//! The flash key-value store limits keys to 15 characters, which rules out
//! using the SSID itself as a key.  Instead each SSID is hashed with CRC-32
//! and stored under a pair of derived keys:
//!
//! ```text
//! s_XXXXXXXX  ->  SSID
//! p_XXXXXXXX  ->  password
//! ```
//!
//! where `XXXXXXXX` is the uppercase hex checksum of the SSID bytes.  Two
//! SSIDs with the same checksum map to the same keys and the later write
//! wins.  That collision is a known limitation of the layout deployed
//! devices already have in flash, so it is left as is.

use crc::{Crc, CRC_32_ISO_HDLC};

/// CRC-32 (ISO HDLC / Ethernet / ZIP).
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Key prefix of SSID entries.
pub const SSID_PREFIX: &str = "s_";

/// Key prefix of password entries.
pub const PASSWORD_PREFIX: &str = "p_";

/// Checksum of the raw SSID bytes.
pub fn ssid_checksum(ssid: &str) -> u32 {
    CRC32.checksum(ssid.as_bytes())
}

/// The key pair under which one WiFi entry is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiKeys {
    pub ssid_key: String,
    pub password_key: String,
}

/// Derives the key pair for `ssid`.
///
/// ```
/// use settings_core::flat::wifi_key::wifi_keys;
///
/// let keys = wifi_keys("Home");
/// assert_eq!(keys.ssid_key, "s_D1E4A3EE");
/// assert_eq!(keys.password_key, "p_D1E4A3EE");
/// ```
pub fn wifi_keys(ssid: &str) -> WifiKeys {
    let crc = ssid_checksum(ssid);
    WifiKeys {
        ssid_key: format!("{SSID_PREFIX}{crc:08X}"),
        password_key: format!("{PASSWORD_PREFIX}{crc:08X}"),
    }
}

/// Maps an SSID key to its password key by swapping the prefix.
///
/// Returns `None` for keys outside the SSID family.
pub fn password_key_for(ssid_key: &str) -> Option<String> {
    ssid_key
        .strip_prefix(SSID_PREFIX)
        .map(|suffix| format!("{PASSWORD_PREFIX}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_known_vectors() {
        assert_eq!(ssid_checksum(""), 0x0000_0000);
        assert_eq!(ssid_checksum("123456789"), 0xCBF4_3926);
        assert_eq!(ssid_checksum("Office"), 0x73FD_6E34);
    }

    #[test]
    fn test_keys_are_fixed_length_regardless_of_ssid_length() {
        let short = wifi_keys("a");
        let long = wifi_keys("a network name that is exactly 32");
        assert_eq!(short.ssid_key.len(), 10);
        assert_eq!(long.ssid_key.len(), 10);
        assert_eq!(long.password_key.len(), 10);
    }

    #[test]
    fn test_hex_suffix_is_zero_padded_uppercase() {
        let keys = wifi_keys("");
        assert_eq!(keys.ssid_key, "s_00000000");
        assert_eq!(wifi_keys("myNetSSID").ssid_key, "s_5F2D6F44");
    }

    #[test]
    fn test_password_key_for_swaps_prefix() {
        assert_eq!(password_key_for("s_D1E4A3EE").as_deref(), Some("p_D1E4A3EE"));
        assert_eq!(password_key_for("p_D1E4A3EE"), None);
        assert_eq!(password_key_for("bright"), None);
    }

    #[test]
    fn test_colliding_ssids_share_keys() {
        // Both names hash to 0xF2E882BD.
        assert_eq!(wifi_keys("net29685295"), wifi_keys("net32060020"));
    }
}
