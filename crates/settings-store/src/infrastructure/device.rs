//! Device identity.
//!
//! The settings document stores the screen rotation under a key derived
//! from the device's MAC address, so one document can be shared between
//! devices without them overwriting each other's orientation.

/// Source of the per-device identity string.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceIdentity {
    fn identity_string(&self) -> String;
}

/// Identity derived from a fixed MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacIdentity {
    mac: [u8; 6],
}

impl MacIdentity {
    pub fn new(mac: [u8; 6]) -> Self {
        Self { mac }
    }

    pub fn mac(&self) -> [u8; 6] {
        self.mac
    }
}

impl DeviceIdentity for MacIdentity {
    fn identity_string(&self) -> String {
        format_mac(&self.mac)
    }
}

/// Renders a MAC the way deployed firmware keys its rotation entry:
/// lowercase hex without zero padding, joined by `:`.
///
/// ```
/// use settings_store::infrastructure::device::format_mac;
///
/// assert_eq!(format_mac(&[0x24, 0x0a, 0xc4, 0x00, 0x1b, 0xff]), "24:a:c4:0:1b:ff");
/// ```
pub fn format_mac(mac: &[u8; 6]) -> String {
    mac.iter()
        .map(|b| format!("{b:x}"))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mac_drops_leading_zeros() {
        assert_eq!(format_mac(&[0, 1, 2, 3, 4, 5]), "0:1:2:3:4:5");
        assert_eq!(format_mac(&[0xff; 6]), "ff:ff:ff:ff:ff:ff");
    }

    #[test]
    fn test_mac_identity_uses_formatted_mac() {
        let identity = MacIdentity::new([0x24, 0x0a, 0xc4, 0x00, 0x1b, 0xff]);
        assert_eq!(identity.identity_string(), "24:a:c4:0:1b:ff");
    }

    #[test]
    fn test_mock_identity_can_stand_in() {
        // Arrange
        let mut mock = MockDeviceIdentity::new();
        mock.expect_identity_string()
            .times(1)
            .returning(|| "aa:bb".to_string());

        // Act
        let id = mock.identity_string();

        // Assert
        assert_eq!(id, "aa:bb");
    }
}
