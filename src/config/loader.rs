// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ChangelinkError, Result};
use crate::types::DocumentFormat;

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".changelink.toml";

/// Parse a document in any supported format.
pub fn parse_document<T: DeserializeOwned>(format: DocumentFormat, bytes: &[u8]) -> Result<T> {
    let doc = match format {
        DocumentFormat::Toml => toml::from_str(as_text(bytes)?)?,
        DocumentFormat::Yaml => serde_yaml::from_slice(bytes)?,
        DocumentFormat::Json => serde_json::from_slice(bytes)?,
        DocumentFormat::MsgPack => rmp_serde::from_slice(bytes)?,
    };
    Ok(doc)
}

/// Render a document in any supported format.
pub fn render_document<T: Serialize>(format: DocumentFormat, doc: &T) -> Result<Vec<u8>> {
    let bytes = match format {
        DocumentFormat::Toml => toml::to_string(doc)?.into_bytes(),
        DocumentFormat::Yaml => serde_yaml::to_string(doc)?.into_bytes(),
        DocumentFormat::Json => serde_json::to_vec_pretty(doc)?,
        DocumentFormat::MsgPack => rmp_serde::to_vec_named(doc)?,
    };
    Ok(bytes)
}

fn as_text(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| ChangelinkError::ConfigError(format!("config is not valid UTF-8: {e}")))
}

/// Load a configuration file and return the raw `RawConfigFile`.
///
/// The format is picked from the file extension. No semantic validation is
/// done here; use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)?;
    let bytes = fs::read(path).map_err(|e| {
        ChangelinkError::ConfigError(format!("cannot read {}: {e}", path.display()))
    })?;

    parse_document(format, &bytes)
}

/// Load a configuration file and validate it.
///
/// Global problems (bad timeout, empty integration URLs) are errors.
/// Malformed watchers are logged and listed in `ConfigFile::rejected`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
