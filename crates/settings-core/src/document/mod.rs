//! The JSON settings document kept on removable storage.
//!
//! The document is the human-editable copy of the settings.  It lives at
//! [`CONFIG_FILE`] on the card and is rewritten in full on every save.

use thiserror::Error;

pub mod model;

pub use model::{Extraction, SettingsDocument};

/// Path of the settings document, relative to the removable storage root.
pub const CONFIG_FILE: &str = "/config.conf";

/// A write shorter than this is treated as failed.
///
/// The smallest meaningful document (`[{}]` plus a newline) is five bytes.
pub const MIN_PLAUSIBLE_BYTES: usize = 5;

/// JSON keys of the settings object.
pub mod keys {
    pub const ONLY_BINS: &str = "onlyBins";
    pub const ASK_SPIFFS: &str = "askSpiffs";
    pub const BRIGHT: &str = "bright";
    pub const DIMMER: &str = "dimmerSet";
    pub const FG_COLOR: &str = "FGCOLOR";
    pub const BG_COLOR: &str = "BGCOLOR";
    pub const AL_COLOR: &str = "ALCOLOR";
    pub const EVEN_COLOR: &str = "even";
    pub const ODD_COLOR: &str = "odd";
    pub const DEV: &str = "dev";
    pub const WUI_USR: &str = "wui_usr";
    pub const WUI_PWD: &str = "wui_pwd";
    pub const DWN_PATH: &str = "dwn_path";
    pub const HUB_URL: &str = "hub_url";
    pub const WIFI: &str = "wifi";
    pub const FAVORITE: &str = "favorite";
    pub const SSID: &str = "ssid";
    pub const PWD: &str = "pwd";
}

/// Errors from parsing or serializing the settings document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("settings document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to serialize settings document: {0}")]
    Serialize(#[source] serde_json::Error),
}
