// src/config/mod.rs

//! Configuration loading and validation for dagflow.
//!
//! - [`model`] defines the TOML-backed data model, including the
//!   [`DagConfig`] the scheduler requires.
//! - [`loader`] reads a config file from disk.
//! - [`validate`] checks references between tasks and global settings.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path};
pub use model::{
    ChildrenSpec, ConfigFile, DagConfig, DagSection, RawConfigFile, TaskConfig,
};
pub use validate::validate_config;
