//! Host directory standing in for the SD card.
//!
//! The medium counts as mounted while the root directory exists, so
//! deleting or renaming the directory simulates pulling the card.

use std::io::Write;
use std::path::{Path, PathBuf};

use super::{RemovableStorage, StorageError};

#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl RemovableStorage for DirectoryStorage {
    fn is_mounted(&self) -> bool {
        self.root.is_dir()
    }

    fn exists(&self, path: &str) -> bool {
        self.is_mounted() && self.resolve(path).is_file()
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        if !self.is_mounted() {
            return Err(StorageError::NotMounted);
        }
        let full = self.resolve(path);
        std::fs::read(&full).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::Io { path: full, source },
        })
    }

    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<usize, StorageError> {
        if !self.is_mounted() {
            return Err(StorageError::NotMounted);
        }
        let full = self.resolve(path);
        let io = |source| StorageError::Io {
            path: full.clone(),
            source,
        };
        let mut file = std::fs::File::create(&full).map_err(io)?;
        file.write_all(bytes).map_err(io)?;
        file.sync_all().map_err(io)?;
        Ok(bytes.len())
    }

    fn remove(&mut self, path: &str) -> bool {
        std::fs::remove_file(self.resolve(path)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("settings_sd_{}", Uuid::new_v4()))
    }

    #[test]
    fn test_missing_root_is_not_mounted() {
        let storage = DirectoryStorage::new(temp_root());
        assert!(!storage.is_mounted());
        assert!(matches!(
            storage.read("/config.conf"),
            Err(StorageError::NotMounted)
        ));
    }

    #[test]
    fn test_write_read_remove_round_trip() {
        // Arrange
        let root = temp_root();
        std::fs::create_dir_all(&root).unwrap();
        let mut storage = DirectoryStorage::new(&root);

        // Act
        let written = storage.write("/config.conf", b"[{}]\n").unwrap();

        // Assert
        assert_eq!(written, 5);
        assert!(storage.exists("/config.conf"));
        assert_eq!(storage.read("/config.conf").unwrap(), b"[{}]\n");
        assert!(storage.remove("/config.conf"));
        assert!(!storage.remove("/config.conf"));
        assert!(matches!(
            storage.read("/config.conf"),
            Err(StorageError::NotFound(_))
        ));

        // Cleanup
        std::fs::remove_dir_all(&root).ok();
    }
}
