//! Storage infrastructure for the host binary.
//!
//! The `config` sub-module reads the TOML file that tells the host binary
//! where its emulated SD card and NVS live and which device it pretends to
//! be.  It is unrelated to the settings the engine manages.

pub mod config;
