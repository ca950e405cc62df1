//! TOML host configuration for the `settings-store` binary.
//!
//! Read from `--config <path>` or the platform config directory:
//! - Linux:    `~/.config/launcher-settings/host.toml`
//! - macOS:    `~/Library/Application Support/LauncherSettings/host.toml`
//! - Windows:  `%APPDATA%\LauncherSettings\host.toml`
//!
//! Example:
//!
//! ```toml
//! sd_root = "/mnt/sdcard"
//! nvs_path = "/var/lib/launcher/nvs.toml"
//! device_mac = "24:0a:c4:00:1b:ff"
//! default_rotation = 1
//! epaper = false
//! log_level = "debug"
//! ```
//!
//! Every field has a serde default, so a missing file or a file that only
//! sets some fields both work.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use settings_core::DeviceProfile;
use thiserror::Error;

/// Error type for host configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid device_mac {0:?}: expected six hex bytes separated by ':'")]
    InvalidMac(String),
}

/// Host-side settings of the binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostConfig {
    /// Directory standing in for the SD card.  Absent directory = no card.
    #[serde(default = "default_sd_root")]
    pub sd_root: PathBuf,
    /// TOML file standing in for the NVS partition.
    #[serde(default = "default_nvs_path")]
    pub nvs_path: PathBuf,
    #[serde(default = "default_device_mac")]
    pub device_mac: String,
    #[serde(default = "default_rotation")]
    pub default_rotation: u8,
    #[serde(default)]
    pub epaper: bool,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_sd_root() -> PathBuf {
    PathBuf::from("sdcard")
}
fn default_nvs_path() -> PathBuf {
    PathBuf::from("nvs.toml")
}
fn default_device_mac() -> String {
    "24:0a:c4:00:00:01".to_string()
}
fn default_rotation() -> u8 {
    1
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sd_root: default_sd_root(),
            nvs_path: default_nvs_path(),
            device_mac: default_device_mac(),
            default_rotation: default_rotation(),
            epaper: false,
            log_level: default_log_level(),
        }
    }
}

impl HostConfig {
    pub fn profile(&self) -> DeviceProfile {
        DeviceProfile {
            default_rotation: self.default_rotation,
            epaper: self.epaper,
        }
    }

    /// The configured MAC as bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidMac`] if `device_mac` is malformed.
    pub fn mac(&self) -> Result<[u8; 6], ConfigError> {
        parse_mac(&self.device_mac)
    }
}

/// Parses `aa:bb:cc:dd:ee:ff`.  Bytes may omit their leading zero.
pub fn parse_mac(text: &str) -> Result<[u8; 6], ConfigError> {
    let invalid = || ConfigError::InvalidMac(text.to_string());
    let mut mac = [0u8; 6];
    let mut parts = text.split(':');
    for byte in &mut mac {
        let part = parts.next().ok_or_else(invalid)?;
        if part.is_empty() || part.len() > 2 {
            return Err(invalid());
        }
        *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(mac)
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("host.toml"))
}

/// Loads `HostConfig` from `path` (or the default location), returning
/// `HostConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<HostConfig, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("LauncherSettings"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("launcher-settings"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("LauncherSettings")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_default_config_values() {
        let cfg = HostConfig::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.default_rotation, 1);
        assert!(!cfg.epaper);
        assert_eq!(cfg.mac().unwrap(), [0x24, 0x0a, 0xc4, 0, 0, 1]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        // Arrange
        let toml_str = r#"
epaper = true
log_level = "debug"
"#;

        // Act
        let cfg: HostConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert!(cfg.epaper);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.nvs_path, PathBuf::from("nvs.toml"));
        assert!(cfg.profile().epaper);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut cfg = HostConfig::default();
        cfg.sd_root = PathBuf::from("/mnt/sd");
        cfg.default_rotation = 3;

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: HostConfig = toml::from_str(&text).expect("deserialize");

        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_parse_mac_accepts_unpadded_bytes() {
        assert_eq!(parse_mac("24:a:c4:0:1b:ff").unwrap(), [0x24, 0x0a, 0xc4, 0, 0x1b, 0xff]);
    }

    #[test]
    fn test_parse_mac_rejects_malformed_input() {
        for bad in ["", "24:0a:c4:00:1b", "24:0a:c4:00:1b:ff:00", "zz:0a:c4:00:1b:ff", "124:0a:c4:00:1b:ff"] {
            assert!(matches!(parse_mac(bad), Err(ConfigError::InvalidMac(_))), "{bad}");
        }
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = std::env::temp_dir().join(format!("launcher_cfg_{}", Uuid::new_v4()));
        let cfg = load_config(Some(&path.join("host.toml"))).expect("absent file is fine");
        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_load_config_reads_file() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("launcher_cfg_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("host.toml");
        std::fs::write(&path, "device_mac = \"aa:bb:cc:dd:ee:ff\"\n").unwrap();

        // Act
        let cfg = load_config(Some(&path)).unwrap();

        // Assert
        assert_eq!(cfg.mac().unwrap(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_rejects_invalid_toml() {
        let dir = std::env::temp_dir().join(format!("launcher_cfg_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("host.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_host_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("host.toml"), "got {path:?}");
        }
    }
}
