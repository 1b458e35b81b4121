// src/config/mod.rs

//! Deck file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a deck file from disk (`loader.rs`).
//! - Validate basic invariants like unique command ids (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    CommandPatch, CommandSpec, ConfigFile, ConfigSection, ProfileConfig, RawConfigFile,
    ShellSection,
};
pub use validate::validate_locale;
