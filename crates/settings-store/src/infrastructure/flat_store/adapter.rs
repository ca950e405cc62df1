//! Keyed flat store adapter: `ConfigRecord` ⇄ flash keys.
//!
//! Writes are best-effort.  A key that fails is logged and reported in a
//! [`FlatWriteReport`], and the remaining keys are still written; the next
//! save repairs it.  Reads report which keys were absent so the caller can
//! default just those fields.

use settings_core::flat::wifi_key::{password_key_for, wifi_keys, SSID_PREFIX};
use settings_core::flat::{
    ScalarKey, StringKey, MAX_TOKEN_LEN, SETTINGS_NAMESPACE, TOKEN_KEY, WIFI_NAMESPACE,
};
use settings_core::{ConfigRecord, DeviceProfile, FlatValue, WifiList};
use tracing::{debug, warn};

use super::{FlatNamespace, FlatStore, FlatStoreError, OpenMode};

/// Outcome of one best-effort write pass over a namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatWriteReport {
    /// `false` if the namespace could not be opened; nothing was written.
    pub opened: bool,
    /// Keys whose write failed.
    pub failed_keys: Vec<String>,
    pub committed: bool,
}

impl FlatWriteReport {
    pub fn is_clean(&self) -> bool {
        self.opened && self.committed && self.failed_keys.is_empty()
    }
}

/// A record read back from the flat store.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRead {
    /// Stored values, with compiled-in defaults wherever a key was missing.
    pub record: ConfigRecord,
    /// Keys that were absent, mistyped, or out of range.
    pub missing: Vec<String>,
}

/// Writes every scalar and string field of `record` under its own key.
pub fn write_scalar_fields<S: FlatStore + ?Sized>(
    store: &mut S,
    record: &ConfigRecord,
) -> FlatWriteReport {
    let mut ns = match store.open(SETTINGS_NAMESPACE, OpenMode::ReadWrite) {
        Ok(ns) => ns,
        Err(e) => {
            warn!(error = %e, "flat store settings namespace unavailable, skipping mirror");
            return FlatWriteReport::default();
        }
    };

    let mut failed_keys = Vec::new();
    for key in ScalarKey::ALL {
        if let Err(e) = ns.set(key.key(), FlatValue::Int(key.read(record))) {
            warn!(key = key.key(), error = %e, "flat store write failed");
            failed_keys.push(key.key().to_string());
        }
    }
    for key in StringKey::ALL {
        let value = FlatValue::Str(key.read(record).to_string());
        if let Err(e) = ns.set(key.key(), value) {
            warn!(key = key.key(), error = %e, "flat store write failed");
            failed_keys.push(key.key().to_string());
        }
    }

    let committed = commit(ns.as_mut());
    FlatWriteReport {
        opened: true,
        failed_keys,
        committed,
    }
}

/// Replaces the WiFi namespace with `list`.
///
/// The namespace is erased first so deleted networks do not linger.  Entries
/// with an empty SSID are skipped.
pub fn write_wifi_list<S: FlatStore + ?Sized>(store: &mut S, list: &WifiList) -> FlatWriteReport {
    let mut ns = match store.open(WIFI_NAMESPACE, OpenMode::ReadWrite) {
        Ok(ns) => ns,
        Err(e) => {
            warn!(error = %e, "flat store wifi namespace unavailable, skipping mirror");
            return FlatWriteReport::default();
        }
    };

    if let Err(e) = ns.erase_all() {
        // Stale entries may survive; new ones are still written below.
        warn!(error = %e, "failed to erase wifi namespace");
    }

    let mut failed_keys = Vec::new();
    for entry in list.iter().filter(|e| !e.ssid.is_empty()) {
        let keys = wifi_keys(&entry.ssid);
        if let Err(e) = ns.set(&keys.ssid_key, FlatValue::Str(entry.ssid.clone())) {
            warn!(ssid = %entry.ssid, error = %e, "failed to store wifi ssid");
            failed_keys.push(keys.ssid_key);
            continue;
        }
        if let Err(e) = ns.set(&keys.password_key, FlatValue::Str(entry.password.clone())) {
            warn!(ssid = %entry.ssid, error = %e, "failed to store wifi password");
            failed_keys.push(keys.password_key);
        }
    }

    let committed = commit(ns.as_mut());
    debug!(count = list.len(), "wifi list mirrored to flat store");
    FlatWriteReport {
        opened: true,
        failed_keys,
        committed,
    }
}

/// Reads every scalar and string field.
///
/// Missing fields keep their compiled-in default and are listed in
/// [`FlatRead::missing`]; values a setter would have rejected are repaired
/// and listed as well.  The WiFi list is not touched, see [`read_wifi_list`].
///
/// # Errors
///
/// Returns the open error when the settings namespace cannot be opened at
/// all (including when it was never written).
pub fn read_scalar_fields<S: FlatStore + ?Sized>(
    store: &mut S,
    profile: &DeviceProfile,
) -> Result<FlatRead, FlatStoreError> {
    let ns = store.open(SETTINGS_NAMESPACE, OpenMode::ReadOnly)?;
    let mut record = ConfigRecord::defaults(profile);
    let mut missing = Vec::new();

    for key in ScalarKey::ALL {
        let stored = ns.get_int(key.key()).ok();
        if !stored.is_some_and(|v| key.write(&mut record, v)) {
            debug!(key = key.key(), "flat store field missing or out of range");
            missing.push(key.key().to_string());
        }
    }
    for key in StringKey::ALL {
        match ns.get_str(key.key()) {
            Ok(v) => key.write(&mut record, v),
            Err(_) => {
                debug!(key = key.key(), "flat store field missing");
                missing.push(key.key().to_string());
            }
        }
    }

    let stored = record.clone();
    if record.normalize(profile) {
        for key in [ScalarKey::Bright, ScalarKey::DimTime, ScalarKey::Rotation] {
            if key.read(&stored) != key.read(&record) {
                debug!(key = key.key(), "flat store field out of range, repaired");
                missing.push(key.key().to_string());
            }
        }
    }

    Ok(FlatRead { record, missing })
}

/// Rebuilds the WiFi list from its hashed keys.
///
/// A namespace that was never written yields an empty list.  An SSID whose
/// password key is absent yields an entry with an empty password.
///
/// # Errors
///
/// Returns the open error for failures other than a missing namespace.
pub fn read_wifi_list<S: FlatStore + ?Sized>(store: &mut S) -> Result<WifiList, FlatStoreError> {
    let ns = match store.open(WIFI_NAMESPACE, OpenMode::ReadOnly) {
        Ok(ns) => ns,
        Err(FlatStoreError::NamespaceNotFound(_)) => return Ok(WifiList::new()),
        Err(e) => return Err(e),
    };

    let mut list = WifiList::new();
    for ssid_key in ns.keys().iter().filter(|k| k.starts_with(SSID_PREFIX)) {
        let ssid = match ns.get_str(ssid_key) {
            Ok(ssid) if !ssid.is_empty() => ssid,
            _ => continue,
        };
        let password = password_key_for(ssid_key)
            .and_then(|key| ns.get_str(&key).ok())
            .unwrap_or_default();
        list.upsert(ssid, password);
    }
    Ok(list)
}

/// Stores the session token, or erases it when `token` is empty.
///
/// # Errors
///
/// Returns the first open, write, or commit error.
pub fn write_token<S: FlatStore + ?Sized>(store: &mut S, token: &str) -> Result<(), FlatStoreError> {
    let mut ns = store.open(SETTINGS_NAMESPACE, OpenMode::ReadWrite)?;
    if token.is_empty() {
        match ns.erase(TOKEN_KEY) {
            Ok(()) | Err(FlatStoreError::KeyNotFound(_)) => {}
            Err(e) => return Err(e),
        }
    } else {
        ns.set(TOKEN_KEY, FlatValue::Str(token.to_string()))?;
    }
    ns.commit()
}

/// The stored session token, if any.
pub fn read_token<S: FlatStore + ?Sized>(store: &mut S) -> Option<String> {
    let ns = store.open(SETTINGS_NAMESPACE, OpenMode::ReadOnly).ok()?;
    let token = ns.get_str(TOKEN_KEY).ok()?;
    if token.is_empty() {
        return None;
    }
    if token.len() > MAX_TOKEN_LEN {
        warn!(len = token.len(), "stored session token exceeds the reader limit, ignoring");
        return None;
    }
    Some(token)
}

fn commit<N: FlatNamespace + ?Sized>(ns: &mut N) -> bool {
    match ns.commit() {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "flat store commit failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::flat_store::memory::MemoryFlatStore;

    fn profile() -> DeviceProfile {
        DeviceProfile::default()
    }

    #[test]
    fn test_scalar_fields_round_trip() {
        // Arrange
        let mut store = MemoryFlatStore::new();
        let mut record = ConfigRecord::defaults(&profile());
        record.set_brightness(30);
        record.set_dev_mode(true);
        record.set_hub_url("https://hub.example");

        // Act
        let report = write_scalar_fields(&mut store, &record);
        let read = read_scalar_fields(&mut store, &profile()).unwrap();

        // Assert
        assert!(report.is_clean());
        assert!(read.missing.is_empty());
        assert_eq!(read.record, record);
    }

    #[test]
    fn test_write_uses_flat_key_names() {
        let mut store = MemoryFlatStore::new();
        write_scalar_fields(&mut store, &ConfigRecord::defaults(&profile()));

        assert_eq!(store.value("launcher", "dimtime"), Some(&FlatValue::Int(20)));
        assert_eq!(store.value("launcher", "onlyBins"), Some(&FlatValue::Int(1)));
        assert_eq!(
            store.value("launcher", "wui_usr"),
            Some(&FlatValue::Str("admin".into()))
        );
    }

    #[test]
    fn test_failed_key_does_not_block_others() {
        let mut store = MemoryFlatStore::new();
        store.fail_key("bright");

        let report = write_scalar_fields(&mut store, &ConfigRecord::defaults(&profile()));

        assert_eq!(report.failed_keys, vec!["bright".to_string()]);
        assert!(report.committed);
        assert!(store.value("launcher", "dimtime").is_some());
    }

    #[test]
    fn test_unopenable_namespace_reports_not_opened() {
        let mut store = MemoryFlatStore::new();
        store.fail_open("launcher");
        let report = write_scalar_fields(&mut store, &ConfigRecord::defaults(&profile()));
        assert!(!report.opened);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_read_defaults_individually_missing_fields() {
        // Arrange: only brightness stored, plus an out-of-range colour
        let mut store = MemoryFlatStore::new();
        store.insert("launcher", "bright", FlatValue::Int(55));
        store.insert("launcher", "FGCOLOR", FlatValue::Int(70_000));

        // Act
        let read = read_scalar_fields(&mut store, &profile()).unwrap();

        // Assert
        assert_eq!(read.record.brightness(), 55);
        assert_eq!(read.record.colors(), profile().default_colors());
        assert!(read.missing.contains(&"FGCOLOR".to_string()));
        assert!(!read.missing.contains(&"bright".to_string()));
        assert_eq!(read.missing.len(), ScalarKey::ALL.len() + StringKey::ALL.len() - 1);
    }

    #[test]
    fn test_read_repairs_corrupt_dim_timeout() {
        let mut store = MemoryFlatStore::new();
        write_scalar_fields(&mut store, &ConfigRecord::defaults(&profile()));
        store.insert("launcher", "dimtime", FlatValue::Int(600));

        let read = read_scalar_fields(&mut store, &profile()).unwrap();

        assert_eq!(read.record.dim_timeout_secs(), 10);
        assert_eq!(read.missing, vec!["dimtime".to_string()]);
    }

    #[test]
    fn test_read_of_never_written_store_is_an_error() {
        let mut store = MemoryFlatStore::new();
        let err = read_scalar_fields(&mut store, &profile()).unwrap_err();
        assert!(err.is_absent());
    }

    #[test]
    fn test_wifi_list_round_trip() {
        // Arrange
        let mut store = MemoryFlatStore::new();
        let list = WifiList::from_entries(vec![
            settings_core::WifiEntry::new("Home", "pw-home"),
            settings_core::WifiEntry::new("Office", "pw-office"),
            settings_core::WifiEntry::new("", "ignored"),
        ]);

        // Act
        let report = write_wifi_list(&mut store, &list);
        let restored = read_wifi_list(&mut store).unwrap();

        // Assert
        assert!(report.is_clean());
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.password_for("Home"), Some("pw-home"));
        assert_eq!(restored.password_for("Office"), Some("pw-office"));
        assert_eq!(
            store.value("l_wifi", "s_D1E4A3EE"),
            Some(&FlatValue::Str("Home".into()))
        );
    }

    #[test]
    fn test_wifi_write_erases_stale_entries() {
        let mut store = MemoryFlatStore::new();
        store.insert("l_wifi", "s_00000001", FlatValue::Str("Old".into()));

        let list = WifiList::from_entries(vec![settings_core::WifiEntry::new("Home", "x")]);
        write_wifi_list(&mut store, &list);

        let restored = read_wifi_list(&mut store).unwrap();
        assert_eq!(restored.password_for("Old"), None);
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_wifi_write_after_failed_erase_still_stores_new_entries() {
        // Arrange
        let mut store = MemoryFlatStore::new();
        store.insert("l_wifi", "s_00000001", FlatValue::Str("Old".into()));
        store.fail_erase_all(true);
        let list = WifiList::from_entries(vec![settings_core::WifiEntry::new("Home", "pw")]);

        // Act
        let report = write_wifi_list(&mut store, &list);

        // Assert: the stale entry lingers but the new one is written and committed
        assert!(report.is_clean());
        let restored = read_wifi_list(&mut store).unwrap();
        assert_eq!(restored.password_for("Home"), Some("pw"));
        assert_eq!(restored.password_for("Old"), Some(""));
    }

    #[test]
    fn test_failed_commit_is_reported_by_both_writers() {
        // Arrange
        let mut store = MemoryFlatStore::new();
        store.fail_commit(true);
        let record = ConfigRecord::defaults(&profile());
        let list = WifiList::from_entries(vec![settings_core::WifiEntry::new("Home", "pw")]);

        // Act
        let settings = write_scalar_fields(&mut store, &record);
        let wifi = write_wifi_list(&mut store, &list);

        // Assert
        for report in [&settings, &wifi] {
            assert!(report.opened);
            assert!(report.failed_keys.is_empty());
            assert!(!report.committed);
            assert!(!report.is_clean());
        }
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn test_ssid_without_password_yields_empty_password() {
        let mut store = MemoryFlatStore::new();
        store.insert("l_wifi", "s_D1E4A3EE", FlatValue::Str("Home".into()));

        let restored = read_wifi_list(&mut store).unwrap();

        assert_eq!(restored.password_for("Home"), Some(""));
    }

    #[test]
    fn test_wifi_read_of_missing_namespace_is_empty() {
        let mut store = MemoryFlatStore::new();
        assert!(read_wifi_list(&mut store).unwrap().is_empty());
    }

    #[test]
    fn test_token_set_read_and_erase() {
        let mut store = MemoryFlatStore::new();
        assert_eq!(read_token(&mut store), None);

        write_token(&mut store, "abc123").unwrap();
        assert_eq!(read_token(&mut store).as_deref(), Some("abc123"));

        write_token(&mut store, "").unwrap();
        assert_eq!(read_token(&mut store), None);
        assert_eq!(store.value("launcher", "token"), None);
    }

    #[test]
    fn test_erasing_absent_token_is_ok() {
        let mut store = MemoryFlatStore::new();
        assert!(write_token(&mut store, "").is_ok());
    }
}
