// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChangelinkError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A watcher failed validation. It is excluded from matching, the run
    /// continues.
    #[error("Malformed watcher '{name}': {reason}")]
    MalformedWatcher { name: String, reason: String },

    /// An action list contained a discriminator with no registered variant.
    #[error("UnknownActionType: {0}")]
    UnknownActionType(String),

    /// An action element could not be decoded into its concrete variant.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Watcher lookup failed for '{path}': {reason}")]
    WatcherLookupFailed { path: String, reason: String },

    #[error("Action '{action}' of watcher '{watcher}' failed: {reason}")]
    ActionExecutionFailed {
        watcher: String,
        action: String,
        reason: String,
    },

    /// A single file-diff record could not be parsed. The reader skips it.
    #[error("Malformed diff at line {line}: {reason}")]
    MalformedDiff { line: usize, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML encoding error: {0}")]
    TomlEncodeError(#[from] toml::ser::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("MessagePack decoding error: {0}")]
    MsgPackDecodeError(#[from] rmp_serde::decode::Error),

    #[error("MessagePack encoding error: {0}")]
    MsgPackEncodeError(#[from] rmp_serde::encode::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ChangelinkError>;
