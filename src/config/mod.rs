// src/config/mod.rs

//! Configuration loading and validation for changelink.
//!
//! - `model.rs`: the document shape (`[config]`, `[integrations]`,
//!   `[[watchers]]`).
//! - `loader.rs`: reading TOML, YAML, JSON or MessagePack from disk.
//! - `validate.rs`: `RawConfigFile` to `ConfigFile`, excluding malformed
//!   watchers.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConfigSection, IntegrationsSection, IssueTrackerConfig, RawConfigFile,
    RejectedWatcher, SlackConfig,
};
