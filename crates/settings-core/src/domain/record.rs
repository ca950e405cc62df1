//! The settings record: the single configuration object of the device.
//!
//! [`ConfigRecord`] is a plain in-memory struct.  The legacy on-disk shape
//! (one object wrapped in a one-element array) only exists in the serialized
//! form handled by [`crate::document`]; nothing in this module knows about it.
//!
//! # Validation rules
//!
//! | Field        | Rule                                                      |
//! |--------------|-----------------------------------------------------------|
//! | brightness   | 0–100, larger values are clamped to 100                   |
//! | dim timeout  | 0 = disabled, up to 120 s; stored values above 120 are    |
//! |              | corrupt and reset to 10 s on load                         |
//! | rotation     | 0–3; stored values above 3 fall back to the profile default |
//!
//! Setters enforce these rules for programmatic changes; [`ConfigRecord::normalize`]
//! enforces them for values that come back from a storage backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::palette::{Palette, UiColors};

/// Highest accepted brightness percentage.
pub const MAX_BRIGHTNESS: u8 = 100;

/// Dim timeouts above this many seconds are treated as corrupt.
pub const MAX_DIM_TIMEOUT_SECS: u32 = 120;

/// Value a corrupt dim timeout is reset to on load.
pub const CORRUPT_DIM_TIMEOUT_RESET_SECS: u32 = 10;

/// Dim timeout choices offered by the settings menu (`0` disables dimming).
pub const DIM_TIMEOUT_CHOICES: [u32; 6] = [10, 15, 30, 45, 60, 0];

/// Brightness steps offered by the settings menu.  The "0 %" entry maps to 1
/// so the backlight never switches fully off.
pub const BRIGHTNESS_MENU_STEPS: [u8; 5] = [100, 75, 50, 25, 1];

/// Highest valid screen rotation (quarter turns).
pub const MAX_ROTATION: u8 = 3;

/// SSID written into an otherwise empty WiFi list so users can see where to
/// put their own network.
pub const PLACEHOLDER_SSID: &str = "myNetSSID";

/// Password paired with [`PLACEHOLDER_SSID`].
pub const PLACEHOLDER_PASSWORD: &str = "myNetPassword";

/// Error returned by typed setters when a value is outside its domain.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("dim timeout {0}s exceeds the 120s maximum")]
    DimTimeoutOutOfRange(u32),
    #[error("rotation {0} is outside 0..=3")]
    RotationOutOfRange(u8),
}

// ── Device profile ────────────────────────────────────────────────────────────

/// Hardware-dependent inputs to the compiled-in defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Rotation used on first boot and whenever a stored rotation is invalid.
    pub default_rotation: u8,
    /// E-paper panels use a monochrome palette and ignore document colours.
    pub epaper: bool,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            default_rotation: 1,
            epaper: false,
        }
    }
}

impl DeviceProfile {
    /// Default rotation, clamped to the valid range.
    pub fn rotation(&self) -> u8 {
        if self.default_rotation > MAX_ROTATION {
            1
        } else {
            self.default_rotation
        }
    }

    /// Palette used when nothing has been stored yet.
    pub fn default_colors(&self) -> UiColors {
        if self.epaper {
            UiColors {
                fg: 0x0000,
                bg: 0xFFFF,
                alert: 0x8888,
                odd: 0x5555,
                even: 0x2222,
            }
        } else {
            Palette::Default.colors()
        }
    }
}

/// Returns `true` when rotation `r` swaps the panel's width and height.
pub fn rotation_swaps_axes(r: u8) -> bool {
    r & 0b1 == 1
}

// ── WiFi list ─────────────────────────────────────────────────────────────────

/// One saved WiFi network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiEntry {
    pub ssid: String,
    #[serde(rename = "pwd")]
    pub password: String,
}

impl WifiEntry {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }
}

/// What [`WifiList::upsert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Ordered list of WiFi credentials, unique by SSID (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WifiList {
    entries: Vec<WifiEntry>,
}

impl WifiList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from `entries`, collapsing duplicate SSIDs with upsert
    /// semantics (first position, last password).
    pub fn from_entries(entries: impl IntoIterator<Item = WifiEntry>) -> Self {
        let mut list = Self::new();
        for entry in entries {
            list.upsert(entry.ssid, entry.password);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WifiEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[WifiEntry] {
        &self.entries
    }

    /// Password stored for `ssid`, if any.
    pub fn password_for(&self, ssid: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.ssid == ssid)
            .map(|e| e.password.as_str())
    }

    /// Replaces the password of an existing entry in place or appends a new one.
    pub fn upsert(&mut self, ssid: impl Into<String>, password: impl Into<String>) -> UpsertOutcome {
        let ssid = ssid.into();
        let password = password.into();
        match self.entries.iter_mut().find(|e| e.ssid == ssid) {
            Some(existing) if existing.password == password => UpsertOutcome::Unchanged,
            Some(existing) => {
                existing.password = password;
                UpsertOutcome::Updated
            }
            None => {
                self.entries.push(WifiEntry { ssid, password });
                UpsertOutcome::Inserted
            }
        }
    }

    /// Reserves room for `additional` entries without aborting on allocation failure.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), std::collections::TryReserveError> {
        self.entries.try_reserve(additional)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ── Favorites ─────────────────────────────────────────────────────────────────

/// User-marked items.  Their structure belongs to the file browser; this crate
/// only carries them between the document and memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoritesList(Vec<Value>);

impl FavoritesList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ── Config record ─────────────────────────────────────────────────────────────

/// The device settings.
///
/// Fields are crate-private so every change from outside goes through a
/// setter that applies the validation rules in the module docs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigRecord {
    pub(crate) brightness: u8,
    pub(crate) dim_timeout_secs: u32,
    pub(crate) only_bins: bool,
    pub(crate) ask_spiffs: bool,
    pub(crate) dev_mode: bool,
    pub(crate) colors: UiColors,
    pub(crate) rotation: u8,
    pub(crate) wui_username: String,
    pub(crate) wui_password: String,
    pub(crate) download_path: String,
    pub(crate) hub_url: String,
    pub(crate) wifi: WifiList,
    pub(crate) favorites: FavoritesList,
}

impl ConfigRecord {
    /// The compiled-in defaults for `profile`.
    pub fn defaults(profile: &DeviceProfile) -> Self {
        Self {
            brightness: 100,
            dim_timeout_secs: 20,
            only_bins: true,
            ask_spiffs: true,
            dev_mode: false,
            colors: profile.default_colors(),
            rotation: profile.rotation(),
            wui_username: "admin".to_string(),
            wui_password: "launcher".to_string(),
            download_path: "/downloads/".to_string(),
            hub_url: "https://einkhub.com".to_string(),
            wifi: WifiList::new(),
            favorites: FavoritesList::new(),
        }
    }

    /// Repairs values that no setter would have produced.
    ///
    /// Returns `true` if anything changed.
    pub fn normalize(&mut self, profile: &DeviceProfile) -> bool {
        let mut changed = false;
        if self.brightness > MAX_BRIGHTNESS {
            self.brightness = MAX_BRIGHTNESS;
            changed = true;
        }
        if self.dim_timeout_secs > MAX_DIM_TIMEOUT_SECS {
            self.dim_timeout_secs = CORRUPT_DIM_TIMEOUT_RESET_SECS;
            changed = true;
        }
        if self.rotation > MAX_ROTATION {
            self.rotation = profile.rotation();
            changed = true;
        }
        changed
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Sets the backlight level, clamping to 100.
    pub fn set_brightness(&mut self, percent: u8) {
        self.brightness = percent.min(MAX_BRIGHTNESS);
    }

    pub fn dim_timeout_secs(&self) -> u32 {
        self.dim_timeout_secs
    }

    pub fn set_dim_timeout_secs(&mut self, secs: u32) -> Result<(), RecordError> {
        if secs > MAX_DIM_TIMEOUT_SECS {
            return Err(RecordError::DimTimeoutOutOfRange(secs));
        }
        self.dim_timeout_secs = secs;
        Ok(())
    }

    pub fn only_bins(&self) -> bool {
        self.only_bins
    }

    pub fn set_only_bins(&mut self, value: bool) {
        self.only_bins = value;
    }

    pub fn ask_spiffs(&self) -> bool {
        self.ask_spiffs
    }

    pub fn set_ask_spiffs(&mut self, value: bool) {
        self.ask_spiffs = value;
    }

    pub fn dev_mode(&self) -> bool {
        self.dev_mode
    }

    pub fn set_dev_mode(&mut self, value: bool) {
        self.dev_mode = value;
    }

    pub fn colors(&self) -> UiColors {
        self.colors
    }

    pub fn set_colors(&mut self, colors: UiColors) {
        self.colors = colors;
    }

    /// Applies one of the named colour presets.
    pub fn apply_palette(&mut self, palette: Palette) {
        self.colors = palette.colors();
    }

    pub fn rotation(&self) -> u8 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: u8) -> Result<(), RecordError> {
        if rotation > MAX_ROTATION {
            return Err(RecordError::RotationOutOfRange(rotation));
        }
        self.rotation = rotation;
        Ok(())
    }

    pub fn wui_username(&self) -> &str {
        &self.wui_username
    }

    pub fn set_wui_username(&mut self, value: impl Into<String>) {
        self.wui_username = value.into();
    }

    pub fn wui_password(&self) -> &str {
        &self.wui_password
    }

    pub fn set_wui_password(&mut self, value: impl Into<String>) {
        self.wui_password = value.into();
    }

    pub fn download_path(&self) -> &str {
        &self.download_path
    }

    pub fn set_download_path(&mut self, value: impl Into<String>) {
        self.download_path = value.into();
    }

    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }

    pub fn set_hub_url(&mut self, value: impl Into<String>) {
        self.hub_url = value.into();
    }

    pub fn wifi(&self) -> &WifiList {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut WifiList {
        &mut self.wifi
    }

    pub fn set_wifi(&mut self, list: WifiList) {
        self.wifi = list;
    }

    pub fn favorites(&self) -> &FavoritesList {
        &self.favorites
    }

    pub fn set_favorites(&mut self, favorites: FavoritesList) {
        self.favorites = favorites;
    }
}
