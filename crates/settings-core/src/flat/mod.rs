//! Vocabulary of the flash key-value store.
//!
//! The flat store has two namespaces:
//!
//! - `launcher` holds one key per scalar or string field of the
//!   [`ConfigRecord`], plus the session token.
//! - `l_wifi` holds the WiFi list as `s_XXXXXXXX` / `p_XXXXXXXX` pairs, see
//!   [`wifi_key`].
//!
//! The tables below ([`ScalarKey`], [`StringKey`]) map each flat key to its
//! record field in both directions so the adapter in `settings-store` never
//! has to spell out field names twice.

use serde::{Deserialize, Serialize};

use crate::domain::record::ConfigRecord;

pub mod wifi_key;

/// Namespace holding the scalar and string fields.
pub const SETTINGS_NAMESPACE: &str = "launcher";

/// Namespace holding the hashed WiFi entries.
pub const WIFI_NAMESPACE: &str = "l_wifi";

/// Key of the web UI session token inside [`SETTINGS_NAMESPACE`].
pub const TOKEN_KEY: &str = "token";

/// Longest key the flash store accepts.
pub const MAX_KEY_LEN: usize = 15;

/// Longest session token that fits the reader's buffer.
pub const MAX_TOKEN_LEN: usize = 64;

/// A value stored in the flat store.
///
/// The flash store is typed; integers of every width collapse into
/// [`FlatValue::Int`] here and are range-checked on the way back into a
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlatValue {
    Int(i64),
    Str(String),
}

impl FlatValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlatValue::Int(v) => Some(*v),
            FlatValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlatValue::Str(s) => Some(s),
            FlatValue::Int(_) => None,
        }
    }
}

/// Numeric fields of the `launcher` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKey {
    DimTime,
    Bright,
    OnlyBins,
    AskSpiffs,
    Rotation,
    FgColor,
    BgColor,
    AlColor,
    OddColor,
    EvenColor,
    DevMode,
}

impl ScalarKey {
    pub const ALL: [ScalarKey; 11] = [
        ScalarKey::DimTime,
        ScalarKey::Bright,
        ScalarKey::OnlyBins,
        ScalarKey::AskSpiffs,
        ScalarKey::Rotation,
        ScalarKey::FgColor,
        ScalarKey::BgColor,
        ScalarKey::AlColor,
        ScalarKey::OddColor,
        ScalarKey::EvenColor,
        ScalarKey::DevMode,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ScalarKey::DimTime => "dimtime",
            ScalarKey::Bright => "bright",
            ScalarKey::OnlyBins => "onlyBins",
            ScalarKey::AskSpiffs => "askSpiffs",
            ScalarKey::Rotation => "rotation",
            ScalarKey::FgColor => "FGCOLOR",
            ScalarKey::BgColor => "BGCOLOR",
            ScalarKey::AlColor => "ALCOLOR",
            ScalarKey::OddColor => "odd_color",
            ScalarKey::EvenColor => "even_color",
            ScalarKey::DevMode => "dev_mode",
        }
    }

    /// Reads the field's current value out of `record`.
    pub fn read(self, record: &ConfigRecord) -> i64 {
        match self {
            ScalarKey::DimTime => i64::from(record.dim_timeout_secs),
            ScalarKey::Bright => i64::from(record.brightness),
            ScalarKey::OnlyBins => i64::from(record.only_bins),
            ScalarKey::AskSpiffs => i64::from(record.ask_spiffs),
            ScalarKey::Rotation => i64::from(record.rotation),
            ScalarKey::FgColor => i64::from(record.colors.fg),
            ScalarKey::BgColor => i64::from(record.colors.bg),
            ScalarKey::AlColor => i64::from(record.colors.alert),
            ScalarKey::OddColor => i64::from(record.colors.odd),
            ScalarKey::EvenColor => i64::from(record.colors.even),
            ScalarKey::DevMode => i64::from(record.dev_mode),
        }
    }

    /// Stores `value` into the field if it fits the field's type.
    ///
    /// Returns `false` (leaving the record untouched) for out-of-range values.
    /// Domain rules such as the brightness clamp are left to
    /// [`ConfigRecord::normalize`].
    pub fn write(self, record: &mut ConfigRecord, value: i64) -> bool {
        match self {
            ScalarKey::DimTime => set_from(&mut record.dim_timeout_secs, value),
            ScalarKey::Bright => set_from(&mut record.brightness, value),
            ScalarKey::OnlyBins => set_flag(&mut record.only_bins, value),
            ScalarKey::AskSpiffs => set_flag(&mut record.ask_spiffs, value),
            ScalarKey::Rotation => set_from(&mut record.rotation, value),
            ScalarKey::FgColor => set_from(&mut record.colors.fg, value),
            ScalarKey::BgColor => set_from(&mut record.colors.bg, value),
            ScalarKey::AlColor => set_from(&mut record.colors.alert, value),
            ScalarKey::OddColor => set_from(&mut record.colors.odd, value),
            ScalarKey::EvenColor => set_from(&mut record.colors.even, value),
            ScalarKey::DevMode => set_flag(&mut record.dev_mode, value),
        }
    }
}

/// String fields of the `launcher` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKey {
    WuiUser,
    WuiPassword,
    DownloadPath,
    HubUrl,
}

impl StringKey {
    pub const ALL: [StringKey; 4] = [
        StringKey::WuiUser,
        StringKey::WuiPassword,
        StringKey::DownloadPath,
        StringKey::HubUrl,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StringKey::WuiUser => "wui_usr",
            StringKey::WuiPassword => "wui_pwd",
            StringKey::DownloadPath => "dwn_path",
            StringKey::HubUrl => "hub_url",
        }
    }

    pub fn read(self, record: &ConfigRecord) -> &str {
        match self {
            StringKey::WuiUser => &record.wui_username,
            StringKey::WuiPassword => &record.wui_password,
            StringKey::DownloadPath => &record.download_path,
            StringKey::HubUrl => &record.hub_url,
        }
    }

    pub fn write(self, record: &mut ConfigRecord, value: String) {
        match self {
            StringKey::WuiUser => record.wui_username = value,
            StringKey::WuiPassword => record.wui_password = value,
            StringKey::DownloadPath => record.download_path = value,
            StringKey::HubUrl => record.hub_url = value,
        }
    }
}

fn set_from<T: TryFrom<i64>>(slot: &mut T, value: i64) -> bool {
    match T::try_from(value) {
        Ok(v) => {
            *slot = v;
            true
        }
        Err(_) => false,
    }
}

fn set_flag(slot: &mut bool, value: i64) -> bool {
    match value {
        0 => *slot = false,
        1 => *slot = true,
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::DeviceProfile;

    fn record() -> ConfigRecord {
        ConfigRecord::defaults(&DeviceProfile::default())
    }

    #[test]
    fn test_all_keys_fit_the_key_length_limit() {
        for k in ScalarKey::ALL {
            assert!(k.key().len() <= MAX_KEY_LEN, "{} too long", k.key());
        }
        for k in StringKey::ALL {
            assert!(k.key().len() <= MAX_KEY_LEN, "{} too long", k.key());
        }
    }

    #[test]
    fn test_scalar_read_write_round_trip() {
        let source = record();
        let mut target = record();
        target.brightness = 3;
        target.only_bins = false;

        for k in ScalarKey::ALL {
            assert!(k.write(&mut target, k.read(&source)));
        }

        assert_eq!(target, source);
    }

    #[test]
    fn test_scalar_write_rejects_out_of_range_values() {
        let mut r = record();
        assert!(!ScalarKey::FgColor.write(&mut r, 70_000));
        assert!(!ScalarKey::Bright.write(&mut r, -1));
        assert!(!ScalarKey::OnlyBins.write(&mut r, 2));
        assert_eq!(r, record());
    }

    #[test]
    fn test_scalar_write_leaves_domain_clamping_to_normalize() {
        let mut r = record();
        assert!(ScalarKey::Bright.write(&mut r, 200));
        assert_eq!(r.brightness(), 200);
        r.normalize(&DeviceProfile::default());
        assert_eq!(r.brightness(), 100);
    }

    #[test]
    fn test_string_keys_round_trip() {
        let mut r = record();
        StringKey::HubUrl.write(&mut r, "https://example.org".to_string());
        assert_eq!(StringKey::HubUrl.read(&r), "https://example.org");
        assert_eq!(r.hub_url(), "https://example.org");
    }

    #[test]
    fn test_flat_value_untagged_serialization() {
        let v: FlatValue = serde_json::from_str("42").unwrap();
        assert_eq!(v, FlatValue::Int(42));
        let s: FlatValue = serde_json::from_str("\"x\"").unwrap();
        assert_eq!(s.as_str(), Some("x"));
        assert_eq!(s.as_int(), None);
    }
}
