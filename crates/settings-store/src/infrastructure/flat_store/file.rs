//! TOML-file-backed flat store for development hosts.
//!
//! Stands in for the device's NVS partition.  Each namespace becomes a TOML
//! table; integers and strings map to TOML integers and strings:
//!
//! ```toml
//! [launcher]
//! bright = 100
//! hub_url = "https://einkhub.com"
//!
//! [l_wifi]
//! p_D1E4A3EE = "secret"
//! s_D1E4A3EE = "Home"
//! ```
//!
//! The whole file is rewritten on every commit, which matches the
//! "durable after commit" contract of the real store.

use std::path::{Path, PathBuf};

use settings_core::FlatValue;
use tracing::debug;

use super::memory::{MemoryFlatStore, MemoryNamespace, Namespaces};
use super::{FlatNamespace, FlatStore, FlatStoreError, OpenMode};

/// A [`FlatStore`] persisted to a TOML file.
#[derive(Debug)]
pub struct FileFlatStore {
    path: PathBuf,
    inner: MemoryFlatStore,
}

impl FileFlatStore {
    /// Reads the store from `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`FlatStoreError::Backing`] if the file exists but cannot be
    /// read or is not valid TOML.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, FlatStoreError> {
        let path = path.into();
        let namespaces = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str::<Namespaces>(&content).map_err(|e| {
                FlatStoreError::Backing {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "flat store file absent, starting empty");
                Namespaces::new()
            }
            Err(e) => {
                return Err(FlatStoreError::Backing {
                    path,
                    reason: e.to_string(),
                })
            }
        };
        Ok(Self {
            path,
            inner: MemoryFlatStore::from_namespaces(namespaces),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FlatStore for FileFlatStore {
    fn open<'a>(
        &'a mut self,
        namespace: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn FlatNamespace + 'a>, FlatStoreError> {
        let inner = self.inner.open_namespace(namespace, mode)?;
        Ok(Box::new(FileNamespace {
            inner,
            path: &self.path,
        }))
    }
}

struct FileNamespace<'a> {
    inner: MemoryNamespace<'a>,
    path: &'a Path,
}

impl FlatNamespace for FileNamespace<'_> {
    fn get(&self, key: &str) -> Result<FlatValue, FlatStoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: FlatValue) -> Result<(), FlatStoreError> {
        self.inner.set(key, value)
    }

    fn erase(&mut self, key: &str) -> Result<(), FlatStoreError> {
        self.inner.erase(key)
    }

    fn erase_all(&mut self) -> Result<(), FlatStoreError> {
        self.inner.erase_all()
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn commit(&mut self) -> Result<(), FlatStoreError> {
        self.inner.commit()?;
        persist(self.path, self.inner.namespaces())
    }
}

fn persist(path: &Path, namespaces: &Namespaces) -> Result<(), FlatStoreError> {
    let backing = |reason: String| FlatStoreError::Backing {
        path: path.to_path_buf(),
        reason,
    };
    let content = toml::to_string_pretty(namespaces).map_err(|e| backing(e.to_string()))?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| backing(e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| backing(e.to_string()))?;
    debug!(path = %path.display(), "flat store committed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("settings_nvs_{}", Uuid::new_v4()))
            .join("nvs.toml")
    }

    #[test]
    fn test_load_missing_file_starts_empty() {
        let store = FileFlatStore::load(temp_path()).expect("absent file is fine");
        assert!(store.inner.namespaces().is_empty());
    }

    #[test]
    fn test_commit_persists_and_reload_restores() {
        // Arrange
        let path = temp_path();
        let mut store = FileFlatStore::load(&path).unwrap();

        // Act
        {
            let mut ns = store.open("launcher", OpenMode::ReadWrite).unwrap();
            ns.set("bright", FlatValue::Int(42)).unwrap();
            ns.set("hub_url", FlatValue::Str("https://h".into())).unwrap();
            ns.commit().unwrap();
        }
        let mut reloaded = FileFlatStore::load(&path).unwrap();

        // Assert
        let ns = reloaded.open("launcher", OpenMode::ReadOnly).unwrap();
        assert_eq!(ns.get_int("bright"), Ok(42));
        assert_eq!(ns.get_str("hub_url").as_deref(), Ok("https://h"));

        // Cleanup
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_uncommitted_writes_are_not_persisted() {
        let path = temp_path();
        let mut store = FileFlatStore::load(&path).unwrap();
        store
            .open("launcher", OpenMode::ReadWrite)
            .unwrap()
            .set("bright", FlatValue::Int(1))
            .unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_toml_is_a_backing_error() {
        let path = temp_path();
        let dir = path.parent().unwrap().to_path_buf();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "[[[ not toml").unwrap();

        let result = FileFlatStore::load(&path);

        assert!(matches!(result, Err(FlatStoreError::Backing { .. })));
        std::fs::remove_dir_all(&dir).ok();
    }
}
