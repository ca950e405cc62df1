//! Application layer use cases for the settings store.
//!
//! Use cases in this layer work against the collaborator traits
//! (`RemovableStorage`, `FlatStore`, `DeviceIdentity`) and never touch a
//! file or flash directly.
//!
//! # Sub-modules
//!
//! - **`sync_settings`** – The load/save protocol that decides which backend
//!   is authoritative, mirrors the record into the flat store, and recovers
//!   from corrupt documents and failed writes.
//!
//! - **`manage_credentials`** – WiFi credential lookup/upsert and the web UI
//!   session token, for collaborators that should not know about backends.

use settings_core::RecordError;
use thiserror::Error;

use crate::infrastructure::flat_store::FlatStoreError;

pub mod manage_credentials;
pub mod sync_settings;

/// Errors surfaced to callers of the settings API.
///
/// `load()` and `save()` never fail; these come from setters and the
/// credential/token operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid value: {0}")]
    InvalidValue(#[from] RecordError),

    #[error("session token is {0} bytes, the limit is 64")]
    TokenTooLong(usize),

    #[error("not enough memory to grow the wifi list")]
    AllocationFailed,

    #[error("flat store error: {0}")]
    FlatStore(#[from] FlatStoreError),
}
