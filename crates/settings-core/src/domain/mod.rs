//! Domain types for the launcher settings store.
//!
//! Everything in here is plain data plus validation rules.  No file, flash,
//! or JSON access happens in this module; the backends in
//! [`crate::document`] and the `settings-store` crate translate to and from
//! these types.

/// The settings record, WiFi list, favorites, and device profile.
pub mod record;

/// Named UI colour presets.
pub mod palette;
