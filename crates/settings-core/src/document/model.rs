//! [`SettingsDocument`]: the JSON tree stored on removable storage.
//!
//! On disk the settings object sits inside a one-element array:
//!
//! ```json
//! [ { "bright": 100, "dimmerSet": 10, "wifi": [ ... ], ... } ]
//! ```
//!
//! The wrapper is a legacy artifact kept for compatibility.  In memory the
//! document holds the inner object directly (`root`) plus whatever followed
//! it in the array (`trailing`, normally empty), so the wrapper can never be
//! "missing" once a document has been parsed.
//!
//! The document is kept between load and save so keys this crate does not
//! know about (other devices' rotation entries, keys from newer firmware)
//! survive a rewrite.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::{keys, DocumentError};
use crate::domain::palette::UiColors;
use crate::domain::record::{
    ConfigRecord, DeviceProfile, FavoritesList, WifiEntry, WifiList, PLACEHOLDER_PASSWORD,
    PLACEHOLDER_SSID,
};

/// Result of pulling a [`ConfigRecord`] out of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Keys that were absent or had the wrong type, in extraction order.
    pub missing: Vec<String>,
}

impl Extraction {
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// The settings document in its JSON form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDocument {
    root: Map<String, Value>,
    trailing: Vec<Value>,
}

impl SettingsDocument {
    /// An empty document: wrapper plus an empty settings object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses document text.
    ///
    /// Text that is valid JSON but has the wrong shape (not an array, or an
    /// array whose first element is not an object) yields an empty document;
    /// every field then counts as missing on extraction.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Parse`] if `text` is not JSON at all.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        Self::from_slice(text.as_bytes())
    }

    /// Parses raw document bytes as read from the medium.
    ///
    /// Bytes that are not UTF-8 are a parse error like any other garbage.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Parse`] if `bytes` are not JSON.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from_value(value))
    }

    /// Builds a document from an already parsed JSON value, repairing the shape.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(mut items) if matches!(items.first(), Some(Value::Object(_))) => {
                let trailing = items.split_off(1);
                let root = match items.pop() {
                    Some(Value::Object(map)) => map,
                    _ => Map::new(),
                };
                Self { root, trailing }
            }
            other => {
                warn!(kind = json_kind(&other), "settings document has no root object, starting empty");
                Self::new()
            }
        }
    }

    /// The first-run document written when removable storage has none.
    ///
    /// `device_id` maps to `default_rotation`, so several devices can share
    /// one template and keep their own orientation.
    pub fn template(device_id: &str, default_rotation: u8) -> Self {
        let mut root = match json!({
            keys::DIMMER: 10,
            keys::ONLY_BINS: 1,
            keys::BRIGHT: 100,
            keys::ASK_SPIFFS: 1,
            keys::WUI_USR: "admin",
            keys::WUI_PWD: "launcher",
            keys::DWN_PATH: "/downloads/",
            keys::HUB_URL: "https://einkhub.com",
            keys::FG_COLOR: 2016,
            keys::BG_COLOR: 0,
            keys::AL_COLOR: 63488,
            keys::EVEN_COLOR: 13029,
            keys::ODD_COLOR: 12485,
            keys::DEV: 0,
            keys::WIFI: [{ keys::SSID: PLACEHOLDER_SSID, keys::PWD: PLACEHOLDER_PASSWORD }],
            keys::FAVORITE: [],
        }) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        root.insert(device_id.to_string(), Value::from(default_rotation));
        Self {
            root,
            trailing: Vec::new(),
        }
    }

    /// The settings object, created empty if the document had none.
    ///
    /// Idempotent and infallible: a parsed document always has a root.
    pub fn ensure_root(&mut self) -> &mut Map<String, Value> {
        &mut self.root
    }

    /// Read-only view of the settings object.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// The `wifi` array, created (or replaced, if it held a non-array) on demand.
    pub fn ensure_wifi_list(&mut self) -> &mut Vec<Value> {
        ensure_array(&mut self.root, keys::WIFI)
    }

    /// The `favorite` array, created (or replaced) on demand.
    pub fn ensure_favorites(&mut self) -> &mut Vec<Value> {
        ensure_array(&mut self.root, keys::FAVORITE)
    }

    /// Copies every field found in the document into `record`.
    ///
    /// Fields that are absent or mistyped keep the value `record` already
    /// holds and are reported in [`Extraction::missing`].  Colours are not
    /// read on e-paper devices, which always use their fixed palette.
    pub fn extract_into(
        &self,
        record: &mut ConfigRecord,
        device_id: &str,
        profile: &DeviceProfile,
    ) -> Extraction {
        let root = &self.root;
        let mut missing = Vec::new();

        if let Some(v) = found(flag(root, keys::ONLY_BINS), keys::ONLY_BINS, &mut missing) {
            record.only_bins = v;
        }
        if let Some(v) = found(flag(root, keys::ASK_SPIFFS), keys::ASK_SPIFFS, &mut missing) {
            record.ask_spiffs = v;
        }
        if let Some(v) = found(unsigned(root, keys::BRIGHT), keys::BRIGHT, &mut missing) {
            // Anything past u8 is clamped later by `normalize`.
            record.brightness = u8::try_from(v).unwrap_or(u8::MAX);
        }
        if let Some(v) = found(unsigned(root, keys::DIMMER), keys::DIMMER, &mut missing) {
            record.dim_timeout_secs = u32::try_from(v).unwrap_or(u32::MAX);
        }
        if let Some(v) = found(unsigned(root, device_id), device_id, &mut missing) {
            record.rotation = u8::try_from(v).unwrap_or(u8::MAX);
        }

        if !profile.epaper {
            let colors = &mut record.colors;
            let slots: [(&str, &mut u16); 5] = [
                (keys::FG_COLOR, &mut colors.fg),
                (keys::BG_COLOR, &mut colors.bg),
                (keys::AL_COLOR, &mut colors.alert),
                (keys::ODD_COLOR, &mut colors.odd),
                (keys::EVEN_COLOR, &mut colors.even),
            ];
            for (key, slot) in slots {
                if let Some(v) = found(color(root, key), key, &mut missing) {
                    *slot = v;
                }
            }
        }

        if let Some(v) = found(flag(root, keys::DEV), keys::DEV, &mut missing) {
            record.dev_mode = v;
        }
        let strings: [(&str, &mut String); 4] = [
            (keys::WUI_USR, &mut record.wui_username),
            (keys::WUI_PWD, &mut record.wui_password),
            (keys::DWN_PATH, &mut record.download_path),
            (keys::HUB_URL, &mut record.hub_url),
        ];
        for (key, slot) in strings {
            if let Some(v) = found(text(root, key), key, &mut missing) {
                *slot = v;
            }
        }

        if let Some(items) = found(array(root, keys::WIFI), keys::WIFI, &mut missing) {
            record.wifi = parse_wifi(items);
        }
        if let Some(items) = found(array(root, keys::FAVORITE), keys::FAVORITE, &mut missing) {
            record.favorites = FavoritesList::from_values(items.clone());
        }

        Extraction { missing }
    }

    /// Writes every field of `record` into the document, keeping unknown keys.
    pub fn write_record(&mut self, record: &ConfigRecord, device_id: &str) {
        *self.ensure_wifi_list() = record
            .wifi
            .iter()
            .map(|e| json!({ keys::SSID: e.ssid, keys::PWD: e.password }))
            .collect();
        *self.ensure_favorites() = record.favorites.as_slice().to_vec();

        let UiColors {
            fg,
            bg,
            alert,
            odd,
            even,
        } = record.colors;
        let root = self.ensure_root();
        root.insert(keys::ONLY_BINS.into(), Value::Bool(record.only_bins));
        root.insert(keys::ASK_SPIFFS.into(), Value::Bool(record.ask_spiffs));
        root.insert(keys::BRIGHT.into(), Value::from(record.brightness));
        root.insert(keys::DIMMER.into(), Value::from(record.dim_timeout_secs));
        root.insert(device_id.to_string(), Value::from(record.rotation));
        root.insert(keys::FG_COLOR.into(), Value::from(fg));
        root.insert(keys::BG_COLOR.into(), Value::from(bg));
        root.insert(keys::AL_COLOR.into(), Value::from(alert));
        root.insert(keys::ODD_COLOR.into(), Value::from(odd));
        root.insert(keys::EVEN_COLOR.into(), Value::from(even));
        root.insert(keys::DEV.into(), Value::Bool(record.dev_mode));
        root.insert(keys::WUI_USR.into(), Value::from(record.wui_username.as_str()));
        root.insert(keys::WUI_PWD.into(), Value::from(record.wui_password.as_str()));
        root.insert(keys::DWN_PATH.into(), Value::from(record.download_path.as_str()));
        root.insert(keys::HUB_URL.into(), Value::from(record.hub_url.as_str()));
    }

    /// Pretty-printed JSON including the wrapper array.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Serialize`] if serialization fails.
    pub fn to_pretty_string(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Serialize)
    }
}

impl Serialize for SettingsDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1 + self.trailing.len()))?;
        seq.serialize_element(&self.root)?;
        for item in &self.trailing {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}

// ── Field helpers ─────────────────────────────────────────────────────────────

fn found<T>(value: Option<T>, key: &str, missing: &mut Vec<String>) -> Option<T> {
    if value.is_none() {
        debug!(key, "settings field missing or mistyped");
        missing.push(key.to_string());
    }
    value
}

/// JSON booleans, plus the integers 0/1 the first-run template uses.
fn flag(root: &Map<String, Value>, key: &str) -> Option<bool> {
    match root.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn unsigned(root: &Map<String, Value>, key: &str) -> Option<u64> {
    root.get(key)?.as_u64()
}

fn color(root: &Map<String, Value>, key: &str) -> Option<u16> {
    unsigned(root, key).and_then(|v| u16::try_from(v).ok())
}

fn text(root: &Map<String, Value>, key: &str) -> Option<String> {
    root.get(key)?.as_str().map(str::to_string)
}

fn array<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    root.get(key)?.as_array()
}

fn parse_wifi(items: &[Value]) -> WifiList {
    let entries = items.iter().filter_map(|item| {
        let ssid = item.get(keys::SSID)?.as_str()?;
        let password = item.get(keys::PWD).and_then(Value::as_str).unwrap_or_default();
        Some(WifiEntry::new(ssid, password))
    });
    WifiList::from_entries(entries)
}

fn ensure_array<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Vec<Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    array_slot(slot)
}

fn array_slot(slot: &mut Value) -> &mut Vec<Value> {
    match slot {
        Value::Array(items) => items,
        other => {
            *other = Value::Array(Vec::new());
            array_slot(other)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
