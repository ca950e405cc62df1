//! # settings-core
//!
//! Storage-independent half of the launcher settings store: the settings
//! record, the JSON document it is written to on removable storage, and the
//! key layout used for the flash key-value store.
//!
//! Nothing in this crate touches a filesystem or flash.  The `settings-store`
//! crate owns the backends and the sync engine that keeps them consistent.
//!
//! # Architecture overview
//!
//! The device keeps its settings in two places:
//!
//! - **`document`** – A pretty-printed JSON file on the SD card that users
//!   may edit by hand.  It is authoritative whenever the card is present.
//!
//! - **`flat`** – A flash key-value store that survives without the card.
//!   Scalar fields live under their own keys; the WiFi list is keyed by a
//!   CRC-32 of each SSID so variable-length names fit the store's short keys.
//!
//! Both are projections of one in-memory **`domain::record::ConfigRecord`**.

pub mod document;
pub mod domain;
pub mod flat;

// Re-export the most-used types so callers can write
// `settings_core::ConfigRecord` instead of the full module path.
pub use document::{DocumentError, Extraction, SettingsDocument, CONFIG_FILE, MIN_PLAUSIBLE_BYTES};
pub use domain::palette::{Palette, UiColors};
pub use domain::record::{
    ConfigRecord, DeviceProfile, FavoritesList, RecordError, UpsertOutcome, WifiEntry, WifiList,
};
pub use flat::wifi_key::{wifi_keys, WifiKeys};
pub use flat::{FlatValue, ScalarKey, StringKey};
