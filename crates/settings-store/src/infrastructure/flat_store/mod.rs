//! Flash key-value store infrastructure.
//!
//! The device keeps a disaster-recovery copy of its settings in the
//! microcontroller's key-value flash (NVS).  That store is organised into
//! namespaces, accepts keys of at most 15 characters, and only makes writes
//! durable on an explicit commit.
//!
//! # Testability
//!
//! The [`FlatStore`] and [`FlatNamespace`] traits let the sync engine run
//! against [`memory::MemoryFlatStore`] in tests (with fault injection) and
//! against [`file::FileFlatStore`] on a development host.
//!
//! The translation between a `ConfigRecord` and flat keys lives in
//! [`adapter`].

use std::path::PathBuf;

use settings_core::FlatValue;
use thiserror::Error;

pub mod adapter;
pub mod file;
pub mod memory;

/// How a namespace is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    /// Creates the namespace if it does not exist yet.
    ReadWrite,
}

/// Error type for flat-store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlatStoreError {
    /// A read-only open found no such namespace (nothing was ever written).
    #[error("namespace {0} does not exist")]
    NamespaceNotFound(String),

    /// The store could not open the namespace at all.
    #[error("failed to open namespace {namespace}: {reason}")]
    OpenFailed { namespace: String, reason: String },

    #[error("key {0} not found")]
    KeyNotFound(String),

    #[error("key {key} does not hold a {expected} value")]
    TypeMismatch { key: String, expected: &'static str },

    #[error("key {0} exceeds the 15 character limit")]
    KeyTooLong(String),

    #[error("namespace was opened read-only")]
    ReadOnly,

    #[error("failed to write key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("failed to commit namespace {0}")]
    CommitFailed(String),

    /// The host file standing in for flash could not be read or written.
    #[error("flat store backing file {path}: {reason}")]
    Backing { path: PathBuf, reason: String },
}

impl FlatStoreError {
    /// `true` for errors that only mean "nothing stored here".
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            FlatStoreError::NamespaceNotFound(_) | FlatStoreError::KeyNotFound(_)
        )
    }
}

/// An open namespace.
///
/// Writes are visible to later reads through the same handle immediately but
/// are only guaranteed durable after [`FlatNamespace::commit`].
pub trait FlatNamespace {
    fn get(&self, key: &str) -> Result<FlatValue, FlatStoreError>;

    fn set(&mut self, key: &str, value: FlatValue) -> Result<(), FlatStoreError>;

    fn erase(&mut self, key: &str) -> Result<(), FlatStoreError>;

    /// Removes every key in the namespace.
    fn erase_all(&mut self) -> Result<(), FlatStoreError>;

    /// Every key currently stored, in the store's iteration order.
    fn keys(&self) -> Vec<String>;

    fn commit(&mut self) -> Result<(), FlatStoreError>;

    fn get_int(&self, key: &str) -> Result<i64, FlatStoreError> {
        self.get(key)?
            .as_int()
            .ok_or_else(|| FlatStoreError::TypeMismatch {
                key: key.to_string(),
                expected: "integer",
            })
    }

    fn get_str(&self, key: &str) -> Result<String, FlatStoreError> {
        match self.get(key)? {
            FlatValue::Str(s) => Ok(s),
            FlatValue::Int(_) => Err(FlatStoreError::TypeMismatch {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }
}

/// A flash key-value store made of namespaces.
pub trait FlatStore {
    fn open<'a>(
        &'a mut self,
        namespace: &str,
        mode: OpenMode,
    ) -> Result<Box<dyn FlatNamespace + 'a>, FlatStoreError>;
}

/// Checks a key against the store's length limit.
pub(crate) fn check_key(key: &str) -> Result<(), FlatStoreError> {
    if key.len() > settings_core::flat::MAX_KEY_LEN {
        return Err(FlatStoreError::KeyTooLong(key.to_string()));
    }
    Ok(())
}
