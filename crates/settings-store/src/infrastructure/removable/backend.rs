//! Structured document backend: the settings document on removable storage.
//!
//! Handles first-run creation of the document, reading it back into a
//! [`SettingsDocument`], and writing it out again.  Whether a write was good
//! enough is the sync engine's call; this module only reports byte counts.

use settings_core::{DeviceProfile, DocumentError, SettingsDocument, CONFIG_FILE};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{RemovableStorage, StorageError};

/// Error type for document backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Reads and writes the settings document for one device.
#[derive(Debug, Clone)]
pub struct DocumentBackend {
    path: String,
    device_id: String,
    profile: DeviceProfile,
}

impl DocumentBackend {
    /// Backend for the standard document path.
    pub fn new(device_id: impl Into<String>, profile: DeviceProfile) -> Self {
        Self::with_path(CONFIG_FILE, device_id, profile)
    }

    pub fn with_path(
        path: impl Into<String>,
        device_id: impl Into<String>,
        profile: DeviceProfile,
    ) -> Self {
        Self {
            path: path.into(),
            device_id: device_id.into(),
            profile,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// The first-run document for this device.
    pub fn template(&self) -> SettingsDocument {
        SettingsDocument::template(&self.device_id, self.profile.rotation())
    }

    /// Writes the first-run template if no document exists yet.
    ///
    /// Returns `true` if the template was written.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Storage`] if the template could not be written.
    pub fn ensure_exists<R: RemovableStorage + ?Sized>(
        &self,
        storage: &mut R,
    ) -> Result<bool, BackendError> {
        if storage.exists(&self.path) {
            return Ok(false);
        }
        let bytes = self.write(storage, &self.template())?;
        info!(path = %self.path, bytes, "created settings document from template");
        Ok(true)
    }

    /// Reads and parses the document.
    ///
    /// # Errors
    ///
    /// [`BackendError::Storage`] when the file cannot be read, and
    /// [`BackendError::Document`] when it is not valid UTF-8 JSON.
    pub fn load<R: RemovableStorage + ?Sized>(
        &self,
        storage: &R,
    ) -> Result<SettingsDocument, BackendError> {
        let bytes = storage.read(&self.path)?;
        let doc = SettingsDocument::from_slice(&bytes)?;
        debug!(path = %self.path, bytes = bytes.len(), "settings document parsed");
        Ok(doc)
    }

    /// Replaces the document on the medium with `doc`.
    ///
    /// Returns the number of bytes the medium accepted.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Document`] if serialization fails and
    /// [`BackendError::Storage`] if the medium rejects the write outright.
    pub fn write<R: RemovableStorage + ?Sized>(
        &self,
        storage: &mut R,
        doc: &SettingsDocument,
    ) -> Result<usize, BackendError> {
        let text = doc.to_pretty_string()?;
        storage.remove(&self.path);
        Ok(storage.write(&self.path, text.as_bytes())?)
    }

    /// Deletes whatever is on the medium and writes a fresh template.
    ///
    /// Returns the template as read back from the medium, or the in-memory
    /// template if the read-back fails, together with the bytes written
    /// (zero if the write itself failed).
    pub fn reset_to_template<R: RemovableStorage + ?Sized>(
        &self,
        storage: &mut R,
    ) -> (SettingsDocument, usize) {
        let template = self.template();
        let bytes = match self.write(storage, &template) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to write template document");
                0
            }
        };
        match self.load(storage) {
            Ok(doc) => (doc, bytes),
            Err(e) => {
                warn!(error = %e, "template document unreadable, using in-memory copy");
                (template, bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::removable::memory::MemoryStorage;

    const DEVICE: &str = "24:a:c4:0:1b:ff";

    fn backend() -> DocumentBackend {
        DocumentBackend::new(DEVICE, DeviceProfile::default())
    }

    #[test]
    fn test_ensure_exists_writes_template_once() {
        // Arrange
        let mut storage = MemoryStorage::new();

        // Act
        let first = backend().ensure_exists(&mut storage).unwrap();
        let second = backend().ensure_exists(&mut storage).unwrap();

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(storage.write_count(), 1);
        let doc = backend().load(&storage).unwrap();
        assert_eq!(doc, backend().template());
    }

    #[test]
    fn test_load_reports_corrupt_document() {
        let mut storage = MemoryStorage::new();
        storage.put(CONFIG_FILE, "[{\"bright\": ");
        assert!(matches!(
            backend().load(&storage),
            Err(BackendError::Document(_))
        ));
    }

    #[test]
    fn test_load_reports_invalid_utf8_as_corrupt_document() {
        let mut storage = MemoryStorage::new();
        storage.put(CONFIG_FILE, b"[{\xff\xfe}".to_vec());
        assert!(matches!(
            backend().load(&storage),
            Err(BackendError::Document(DocumentError::Parse(_)))
        ));
    }

    #[test]
    fn test_load_reports_missing_document() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            backend().load(&storage),
            Err(BackendError::Storage(StorageError::NotFound(_)))
        ));
    }

    #[test]
    fn test_write_returns_accepted_bytes() {
        let mut storage = MemoryStorage::new();
        storage.fail_next_writes(1);

        let bytes = backend().write(&mut storage, &backend().template()).unwrap();

        assert_eq!(bytes, 0);
        assert_eq!(storage.contents(CONFIG_FILE), Some(""));
    }

    #[test]
    fn test_reset_falls_back_to_in_memory_template() {
        let mut storage = MemoryStorage::new();
        storage.fail_next_writes(1);

        let (doc, bytes) = backend().reset_to_template(&mut storage);

        assert_eq!(bytes, 0);
        assert_eq!(doc, backend().template());
    }

    #[test]
    fn test_template_uses_profile_rotation() {
        let profile = DeviceProfile {
            default_rotation: 3,
            epaper: false,
        };
        let doc = DocumentBackend::new(DEVICE, profile).template();
        assert_eq!(doc.root()[DEVICE], serde_json::Value::from(3));
    }
}
