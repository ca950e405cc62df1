//! Infrastructure layer of the settings store.
//!
//! Contains the adapters to the outside world: the flash key-value store,
//! removable storage with the document backend, the device identity, and
//! the host configuration file.
//!
//! **Dependency rule**: this layer may depend on `settings_core`, but MUST
//! NOT import anything from `application`.

pub mod device;
pub mod flat_store;
pub mod removable;
pub mod storage;
