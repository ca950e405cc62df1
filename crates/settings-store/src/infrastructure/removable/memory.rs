//! In-memory removable storage for testing.
//!
//! [`MemoryStorage::fail_next_writes`] simulates the card accepting a file
//! but storing nothing: the file is created empty and the write reports zero
//! bytes, which is what a failing card looks like to the firmware.

use std::collections::BTreeMap;

use super::{RemovableStorage, StorageError};

#[derive(Debug, Clone)]
pub struct MemoryStorage {
    mounted: bool,
    files: BTreeMap<String, Vec<u8>>,
    failing_writes: usize,
    writes: usize,
}

impl MemoryStorage {
    /// A mounted, empty card.
    pub fn new() -> Self {
        Self {
            mounted: true,
            files: BTreeMap::new(),
            failing_writes: 0,
            writes: 0,
        }
    }

    /// No card inserted.
    pub fn unmounted() -> Self {
        Self {
            mounted: false,
            ..Self::new()
        }
    }

    pub fn set_mounted(&mut self, mounted: bool) {
        self.mounted = mounted;
    }

    /// Places a file on the card directly.
    pub fn put(&mut self, path: &str, content: impl Into<Vec<u8>>) {
        self.files.insert(path.to_string(), content.into());
    }

    /// Current content of `path` as text, if present and valid UTF-8.
    pub fn contents(&self, path: &str) -> Option<&str> {
        self.files
            .get(path)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// The next `count` writes create an empty file and report zero bytes.
    pub fn fail_next_writes(&mut self, count: usize) {
        self.failing_writes = count;
    }

    /// Number of write calls, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RemovableStorage for MemoryStorage {
    fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn exists(&self, path: &str) -> bool {
        self.mounted && self.files.contains_key(path)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<usize, StorageError> {
        if !self.mounted {
            return Err(StorageError::NotMounted);
        }
        self.writes += 1;
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            self.files.insert(path.to_string(), Vec::new());
            return Ok(0);
        }
        self.files.insert(path.to_string(), bytes.to_vec());
        Ok(bytes.len())
    }

    fn remove(&mut self, path: &str) -> bool {
        self.mounted && self.files.remove(path).is_some()
    }
}
