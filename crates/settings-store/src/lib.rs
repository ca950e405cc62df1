//! settings-store library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.

pub mod application;
pub mod infrastructure;

pub use application::sync_settings::{
    DocumentWrite, EngineState, LoadReport, LoadSource, MirrorReport, SaveReport, SettingsEngine,
};
pub use application::SettingsError;
