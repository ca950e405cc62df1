//! Removable storage (SD card) infrastructure.
//!
//! The card may be absent at boot or pulled at any time, so every operation
//! reports failure instead of assuming a mounted filesystem.  Paths are
//! absolute from the card root (`/config.conf`).
//!
//! # Testability
//!
//! [`memory::MemoryStorage`] replaces the card in tests and can simulate a
//! short write, the failure mode the sync engine retries on.

use std::path::PathBuf;

use thiserror::Error;

pub mod backend;
pub mod directory;
pub mod memory;

/// Error type for removable storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("removable storage is not mounted")]
    NotMounted,

    #[error("{0} not found on removable storage")]
    NotFound(String),

    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File access on the removable medium.
pub trait RemovableStorage {
    /// Whether a medium is present and mounted.
    fn is_mounted(&self) -> bool;

    fn exists(&self, path: &str) -> bool;

    /// Reads the whole file as raw bytes.
    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Creates or truncates `path` and writes `bytes`.
    ///
    /// Returns the number of bytes that actually reached the medium, which
    /// can be fewer than requested.
    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<usize, StorageError>;

    /// Deletes `path`.  Returns `false` if nothing was removed.
    fn remove(&mut self, path: &str) -> bool;
}
