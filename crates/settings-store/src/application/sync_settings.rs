//! SyncSettingsUseCase: keeps the SD card document and the flash store in step.
//!
//! The document on removable storage is authoritative whenever a card is
//! present; the flat store is a disaster-recovery copy that is rewritten on
//! every load and save.  Neither `load()` nor `save()` can fail: every
//! problem is logged, recorded in the returned report, and worked around,
//! so the device always ends up with usable settings.
//!
//! # Load
//!
//! ```text
//!                  card mounted?
//!                 /             \
//!               yes              no
//!                |                |
//!     create template if absent   |
//!     parse document              |
//!      /        |         \       |
//!    ok      corrupt   unreadable |
//!     |         |          \      |
//!  extract   read flat ─────┴── read flat
//!     |         |                 |
//!  missing?  save (repair)    open failed? ── defaults
//!   /   \                         |              |
//! save  mirror              missing? mirror   mirror
//! ```
//!
//! # Save
//!
//! The document is rewritten first.  A write that stores fewer than
//! [`MIN_PLAUSIBLE_BYTES`] bytes is retried exactly once by resetting the
//! card to the first-run template, which also replaces the in-memory record.
//! If that fails too the failure is accepted.  The flat store is written
//! afterwards in every case.

use settings_core::domain::record::{PLACEHOLDER_PASSWORD, PLACEHOLDER_SSID};
use settings_core::{ConfigRecord, DeviceProfile, SettingsDocument, WifiList, MIN_PLAUSIBLE_BYTES};
use tracing::{debug, error, info, warn};

use crate::infrastructure::device::DeviceIdentity;
use crate::infrastructure::flat_store::adapter::{
    read_scalar_fields, read_wifi_list, write_scalar_fields, write_wifi_list, FlatRead,
    FlatWriteReport,
};
use crate::infrastructure::flat_store::FlatStore;
use crate::infrastructure::removable::backend::{BackendError, DocumentBackend};
use crate::infrastructure::removable::RemovableStorage;

/// What the engine is currently doing.
///
/// `Loading` and `Saving` only exist while `load` or `save` holds
/// `&mut self`, so callers always observe `Idle`.  The transitions are
/// traced at `debug` level; a state other than `Idle` on entry means a
/// previous call unwound mid-way and is logged as a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Loading,
    Saving,
}

/// Where the record came from on the last load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The document on removable storage.
    Document,
    /// The flat store (card absent, unreadable, or corrupt).
    FlatStore,
    /// Compiled-in defaults; the flat store could not be opened.
    Defaults,
}

/// Outcome of the document half of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentWrite {
    Written { bytes: usize },
    /// The first write failed and the card was reset to the template.
    RecoveredWithTemplate { bytes: usize },
    /// Both the write and the template reset failed.
    GaveUp,
    MediumAbsent,
}

/// Outcome of mirroring the record into the flat store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorReport {
    pub settings: FlatWriteReport,
    pub wifi: FlatWriteReport,
}

impl MirrorReport {
    pub fn is_clean(&self) -> bool {
        self.settings.is_clean() && self.wifi.is_clean()
    }

    /// Number of flat-store keys whose write failed.
    pub fn failed_key_count(&self) -> usize {
        self.settings.failed_keys.len() + self.wifi.failed_keys.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub document: DocumentWrite,
    pub flat: MirrorReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: LoadSource,
    pub medium_present: bool,
    /// The first-run template was written during this load.
    pub document_created: bool,
    pub document_corrupt: bool,
    /// Fields that were absent, mistyped, or out of range in the source.
    pub missing_fields: Vec<String>,
    /// Set when the load triggered a full save (schema repair).
    pub save: Option<SaveReport>,
    /// Set when the load only mirrored into the flat store.
    pub mirror: Option<MirrorReport>,
}

impl LoadReport {
    fn new(source: LoadSource, medium_present: bool) -> Self {
        Self {
            source,
            medium_present,
            document_created: false,
            document_corrupt: false,
            missing_fields: Vec::new(),
            save: None,
            mirror: None,
        }
    }

    pub fn missing_count(&self) -> usize {
        self.missing_fields.len()
    }
}

/// Owner of the live settings record and both backends.
///
/// There is exactly one engine per device.  It is not synchronised; callers
/// must not run `load` or `save` from two tasks at once.
pub struct SettingsEngine<R, F> {
    storage: R,
    flat: F,
    backend: DocumentBackend,
    profile: DeviceProfile,
    record: ConfigRecord,
    /// Last parsed document, kept so unknown keys survive a save.
    document: Option<SettingsDocument>,
    state: EngineState,
}

impl<R: RemovableStorage, F: FlatStore> SettingsEngine<R, F> {
    /// Creates an engine holding compiled-in defaults.  Call [`Self::load`]
    /// before using the record.
    pub fn new<D: DeviceIdentity + ?Sized>(
        storage: R,
        flat: F,
        identity: &D,
        profile: DeviceProfile,
    ) -> Self {
        let device_id = identity.identity_string();
        debug!(device_id = %device_id, "settings engine created");
        Self {
            storage,
            flat,
            backend: DocumentBackend::new(device_id, profile),
            profile,
            record: ConfigRecord::defaults(&profile),
            document: None,
            state: EngineState::Idle,
        }
    }

    pub fn record(&self) -> &ConfigRecord {
        &self.record
    }

    /// Mutable access for setters.  Changes are persisted by the next save.
    pub fn record_mut(&mut self) -> &mut ConfigRecord {
        &mut self.record
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn device_id(&self) -> &str {
        self.backend.device_id()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn storage(&self) -> &R {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut R {
        &mut self.storage
    }

    pub fn flat(&self) -> &F {
        &self.flat
    }

    pub fn flat_mut(&mut self) -> &mut F {
        &mut self.flat
    }

    /// Loads the settings, repairing whichever backend needs it.
    ///
    /// Nothing from a previous load is carried over: unknown keys are only
    /// preserved if they are on the medium now.
    pub fn load(&mut self) -> LoadReport {
        self.enter(EngineState::Loading);
        self.document = None;
        let report = if self.storage.is_mounted() {
            self.load_from_medium()
        } else {
            info!("removable storage not mounted, loading settings from flat store");
            self.load_from_flat(false)
        };
        info!(
            source = ?report.source,
            missing = report.missing_count(),
            "settings loaded"
        );
        self.enter(EngineState::Idle);
        report
    }

    /// Writes the current record to both backends.
    pub fn save(&mut self) -> SaveReport {
        self.enter(EngineState::Saving);
        let report = self.persist();
        self.enter(EngineState::Idle);
        report
    }

    fn enter(&mut self, next: EngineState) {
        if next != EngineState::Idle && self.state != EngineState::Idle {
            warn!(state = ?self.state, next = ?next, "previous settings operation did not finish");
        }
        debug!(from = ?self.state, to = ?next, "settings engine state");
        self.state = next;
    }

    fn load_from_medium(&mut self) -> LoadReport {
        let created = match self.backend.ensure_exists(&mut self.storage) {
            Ok(created) => created,
            Err(e) => {
                warn!(error = %e, "could not create settings document");
                false
            }
        };

        let doc = match self.backend.load(&self.storage) {
            Ok(doc) => doc,
            Err(BackendError::Document(e)) => {
                warn!(error = %e, "settings document corrupt, recovering from flat store");
                let mut report = self.read_flat(true);
                report.document_created = created;
                report.document_corrupt = true;
                report.save = Some(self.persist());
                return report;
            }
            Err(BackendError::Storage(e)) => {
                warn!(error = %e, "settings document unreadable, loading from flat store");
                return self.load_from_flat(true);
            }
        };

        let mut record = ConfigRecord::defaults(&self.profile);
        let extraction = doc.extract_into(&mut record, self.backend.device_id(), &self.profile);
        let repaired = record.normalize(&self.profile);
        self.record = record;
        self.document = Some(doc);

        let mut report = LoadReport::new(LoadSource::Document, true);
        report.document_created = created;
        report.missing_fields = extraction.missing;
        if !report.missing_fields.is_empty() || repaired {
            info!(
                missing = report.missing_count(),
                repaired, "settings document incomplete, rewriting"
            );
            report.save = Some(self.persist());
        } else {
            report.mirror = Some(self.mirror_to_flat());
        }
        report
    }

    fn load_from_flat(&mut self, medium_present: bool) -> LoadReport {
        let mut report = self.read_flat(medium_present);
        if report.source == LoadSource::Defaults || !report.missing_fields.is_empty() {
            report.mirror = Some(self.mirror_to_flat());
        }
        report
    }

    /// Replaces the record with the flat store's copy.
    ///
    /// The WiFi list is read first and kept even when the settings namespace
    /// is unusable, so credentials survive a damaged settings region.
    fn read_flat(&mut self, medium_present: bool) -> LoadReport {
        let wifi = match read_wifi_list(&mut self.flat) {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "wifi list unreadable from flat store");
                WifiList::new()
            }
        };

        match read_scalar_fields(&mut self.flat, &self.profile) {
            Ok(FlatRead { mut record, missing }) => {
                record.set_wifi(wifi);
                self.record = record;
                let mut report = LoadReport::new(LoadSource::FlatStore, medium_present);
                report.missing_fields = missing;
                report
            }
            Err(e) => {
                if e.is_absent() {
                    info!("flat store holds no settings, using defaults");
                } else {
                    warn!(error = %e, "flat store unavailable, using defaults");
                }
                let mut record = ConfigRecord::defaults(&self.profile);
                record.set_wifi(wifi);
                self.record = record;
                LoadReport::new(LoadSource::Defaults, medium_present)
            }
        }
    }

    fn persist(&mut self) -> SaveReport {
        let document = self.write_document();
        let flat = self.mirror_to_flat();
        if !flat.is_clean() {
            warn!(failed_keys = flat.failed_key_count(), "flat store mirror incomplete");
        }
        SaveReport { document, flat }
    }

    fn write_document(&mut self) -> DocumentWrite {
        if !self.storage.is_mounted() {
            info!("removable storage not mounted, skipping settings document");
            return DocumentWrite::MediumAbsent;
        }

        if self.record.wifi().is_empty() {
            self.record
                .wifi_mut()
                .upsert(PLACEHOLDER_SSID, PLACEHOLDER_PASSWORD);
        }
        let mut doc = self.document.take().unwrap_or_default();
        doc.write_record(&self.record, self.backend.device_id());

        match self.backend.write(&mut self.storage, &doc) {
            Ok(bytes) if bytes >= MIN_PLAUSIBLE_BYTES => {
                debug!(bytes, "settings document written");
                self.document = Some(doc);
                return DocumentWrite::Written { bytes };
            }
            Ok(bytes) => warn!(bytes, "settings document write too short, resetting to template"),
            Err(e) => warn!(error = %e, "settings document write failed, resetting to template"),
        }

        let (template, bytes) = self.backend.reset_to_template(&mut self.storage);
        let mut record = ConfigRecord::defaults(&self.profile);
        template.extract_into(&mut record, self.backend.device_id(), &self.profile);
        record.normalize(&self.profile);
        self.record = record;
        self.document = Some(template);

        if bytes >= MIN_PLAUSIBLE_BYTES {
            info!(bytes, "settings document reset to template");
            DocumentWrite::RecoveredWithTemplate { bytes }
        } else {
            error!(bytes, "settings document template write failed as well, giving up");
            DocumentWrite::GaveUp
        }
    }

    fn mirror_to_flat(&mut self) -> MirrorReport {
        MirrorReport {
            settings: write_scalar_fields(&mut self.flat, &self.record),
            wifi: write_wifi_list(&mut self.flat, self.record.wifi()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::device::MockDeviceIdentity;
    use crate::infrastructure::flat_store::memory::MemoryFlatStore;
    use crate::infrastructure::removable::memory::MemoryStorage;
    use settings_core::CONFIG_FILE;

    const DEVICE: &str = "24:a:c4:0:1b:ff";

    fn identity() -> MockDeviceIdentity {
        let mut mock = MockDeviceIdentity::new();
        mock.expect_identity_string()
            .times(1)
            .returning(|| DEVICE.to_string());
        mock
    }

    fn engine(storage: MemoryStorage) -> SettingsEngine<MemoryStorage, MemoryFlatStore> {
        SettingsEngine::new(storage, MemoryFlatStore::new(), &identity(), DeviceProfile::default())
    }

    #[test]
    fn test_first_boot_with_card_creates_template_and_mirrors() {
        // Arrange
        let mut engine = engine(MemoryStorage::new());

        // Act
        let report = engine.load();

        // Assert
        assert_eq!(report.source, LoadSource::Document);
        assert!(report.document_created);
        assert_eq!(report.missing_count(), 0);
        assert!(report.mirror.as_ref().is_some_and(MirrorReport::is_clean));
        assert_eq!(engine.record().dim_timeout_secs(), 10);
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.flat().value("l_wifi", "s_5F2D6F44").is_some());
    }

    #[test]
    fn test_corrupt_document_is_rebuilt_from_flat_store() {
        // Arrange: flat store holds a customised record, card holds garbage
        let mut engine = engine(MemoryStorage::new());
        engine.load();
        engine.record_mut().set_brightness(42);
        engine.record_mut().wifi_mut().upsert("Home", "pw");
        engine.save();
        engine.storage_mut().put(CONFIG_FILE, "{ not json");

        // Act
        let report = engine.load();

        // Assert
        assert!(report.document_corrupt);
        assert_eq!(report.source, LoadSource::FlatStore);
        assert!(matches!(
            report.save.as_ref().map(|s| s.document),
            Some(DocumentWrite::Written { .. })
        ));
        assert_eq!(engine.record().brightness(), 42);
        let text = engine.storage().contents(CONFIG_FILE).unwrap();
        assert!(SettingsDocument::parse(text).is_ok());
    }

    #[test]
    fn test_unmounted_card_skips_document_on_save() {
        let mut engine = engine(MemoryStorage::unmounted());
        engine.load();

        let report = engine.save();

        assert_eq!(report.document, DocumentWrite::MediumAbsent);
        assert!(report.flat.is_clean());
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_single_short_write_recovers_with_template() {
        // Arrange
        let mut engine = engine(MemoryStorage::new());
        engine.load();
        engine.record_mut().set_brightness(5);
        engine.storage_mut().fail_next_writes(1);

        // Act
        let report = engine.save();

        // Assert
        assert!(matches!(report.document, DocumentWrite::RecoveredWithTemplate { .. }));
        assert_eq!(engine.record().brightness(), 100);
        assert_eq!(engine.record().dim_timeout_secs(), 10);
    }

    #[test]
    fn test_flat_store_open_failure_falls_back_to_defaults_but_keeps_wifi() {
        // Arrange
        let mut flat = MemoryFlatStore::new();
        flat.insert("l_wifi", "s_D1E4A3EE", settings_core::FlatValue::Str("Home".into()));
        flat.insert("l_wifi", "p_D1E4A3EE", settings_core::FlatValue::Str("pw".into()));
        flat.fail_open("launcher");
        let mut engine = SettingsEngine::new(
            MemoryStorage::unmounted(),
            flat,
            &identity(),
            DeviceProfile::default(),
        );

        // Act
        let report = engine.load();

        // Assert
        assert_eq!(report.source, LoadSource::Defaults);
        assert_eq!(engine.record().wifi().password_for("Home"), Some("pw"));
        assert!(report.mirror.as_ref().is_some_and(|m| !m.settings.opened));
        assert!(engine.flat().value("l_wifi", "s_D1E4A3EE").is_some());
    }
}
