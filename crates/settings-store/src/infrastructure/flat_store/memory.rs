//! In-memory flat store for unit and integration testing.
//!
//! Besides plain storage, [`MemoryFlatStore`] can inject the failures the
//! sync engine has to survive: a namespace that refuses to open, individual
//! keys whose writes fail, a failing `erase_all`, and a failing commit.

use std::collections::{BTreeMap, BTreeSet};

use settings_core::FlatValue;

use super::{check_key, FlatNamespace, FlatStore, FlatStoreError, OpenMode};

/// Namespace name → key → value.
pub type Namespaces = BTreeMap<String, BTreeMap<String, FlatValue>>;

/// A [`FlatStore`] that lives entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFlatStore {
    namespaces: Namespaces,
    failing_opens: BTreeSet<String>,
    failing_keys: BTreeSet<String>,
    fail_erase_all: bool,
    fail_commit: bool,
    commits: usize,
}

impl MemoryFlatStore {
    /// Creates an empty store (factory-fresh flash).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_namespaces(namespaces: Namespaces) -> Self {
        Self {
            namespaces,
            ..Self::default()
        }
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Looks a value up without opening a namespace.
    pub fn value(&self, namespace: &str, key: &str) -> Option<&FlatValue> {
        self.namespaces.get(namespace)?.get(key)
    }

    /// Stores a value directly, bypassing fault injection.  Used to seed tests.
    pub fn insert(&mut self, namespace: &str, key: &str, value: FlatValue) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Makes every open of `namespace` fail with [`FlatStoreError::OpenFailed`].
    pub fn fail_open(&mut self, namespace: &str) {
        self.failing_opens.insert(namespace.to_string());
    }

    /// Makes every write of `key` fail with [`FlatStoreError::WriteFailed`].
    pub fn fail_key(&mut self, key: &str) {
        self.failing_keys.insert(key.to_string());
    }

    pub fn fail_erase_all(&mut self, fail: bool) {
        self.fail_erase_all = fail;
    }

    pub fn fail_commit(&mut self, fail: bool) {
        self.fail_commit = fail;
    }

    /// Clears every injected fault.
    pub fn heal(&mut self) {
        self.failing_opens.clear();
        self.failing_keys.clear();
        self.fail_erase_all = false;
        self.fail_commit = false;
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub(crate) fn open_namespace(
        &mut self,
        namespace: &str,
        mode: OpenMode,
    ) -> Result<MemoryNamespace<'_>, FlatStoreError> {
        if self.failing_opens.contains(namespace) {
            return Err(FlatStoreError::OpenFailed {
                namespace: namespace.to_string(),
                reason: "injected fault".to_string(),
            });
        }
        match mode {
            OpenMode::ReadOnly if !self.namespaces.contains_key(namespace) => {
                return Err(FlatStoreError::NamespaceNotFound(namespace.to_string()));
            }
            OpenMode::ReadOnly => {}
            OpenMode::ReadWrite => {
                self.namespaces.entry(namespace.to_string()).or_default();
            }
        }
        Ok(MemoryNamespace {
            store: self,
            name: namespace.to_string(),
            mode,
        })
    }
}

impl FlatStore for MemoryFlatStore {
    fn open<'a>(
        &'a mut self,
        namespace: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn FlatNamespace + 'a>, FlatStoreError> {
        Ok(Box::new(self.open_namespace(namespace, mode)?))
    }
}

/// Open handle on one namespace of a [`MemoryFlatStore`].
pub(crate) struct MemoryNamespace<'a> {
    store: &'a mut MemoryFlatStore,
    name: String,
    mode: OpenMode,
}

impl MemoryNamespace<'_> {
    pub(crate) fn namespaces(&self) -> &Namespaces {
        &self.store.namespaces
    }

    fn entries(&self) -> Option<&BTreeMap<String, FlatValue>> {
        self.store.namespaces.get(&self.name)
    }

    fn entries_mut(&mut self) -> Result<&mut BTreeMap<String, FlatValue>, FlatStoreError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(FlatStoreError::ReadOnly);
        }
        Ok(self.store.namespaces.entry(self.name.clone()).or_default())
    }
}

impl FlatNamespace for MemoryNamespace<'_> {
    fn get(&self, key: &str) -> Result<FlatValue, FlatStoreError> {
        self.entries()
            .and_then(|entries| entries.get(key))
            .cloned()
            .ok_or_else(|| FlatStoreError::KeyNotFound(key.to_string()))
    }

    fn set(&mut self, key: &str, value: FlatValue) -> Result<(), FlatStoreError> {
        check_key(key)?;
        if self.store.failing_keys.contains(key) {
            return Err(FlatStoreError::WriteFailed {
                key: key.to_string(),
                reason: "injected fault".to_string(),
            });
        }
        self.entries_mut()?.insert(key.to_string(), value);
        Ok(())
    }

    fn erase(&mut self, key: &str) -> Result<(), FlatStoreError> {
        self.entries_mut()?
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| FlatStoreError::KeyNotFound(key.to_string()))
    }

    fn erase_all(&mut self) -> Result<(), FlatStoreError> {
        if self.store.fail_erase_all {
            return Err(FlatStoreError::WriteFailed {
                key: "*".to_string(),
                reason: "injected fault".to_string(),
            });
        }
        self.entries_mut()?.clear();
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn commit(&mut self) -> Result<(), FlatStoreError> {
        if self.mode == OpenMode::ReadOnly {
            return Err(FlatStoreError::ReadOnly);
        }
        if self.store.fail_commit {
            return Err(FlatStoreError::CommitFailed(self.name.clone()));
        }
        self.store.commits += 1;
        Ok(())
    }
}
