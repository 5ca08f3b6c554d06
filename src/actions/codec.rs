// src/actions/codec.rs

//! Encoding and decoding of heterogeneous action lists.
//!
//! Decoding is two-pass. Each list element is first read into the format's
//! own raw value tree; only the `type` discriminator is looked up on it, and
//! the element is then decoded a second time straight into the concrete
//! variant. The lookup-then-dispatch step lives in
//! [`decode_by_discriminator`] and is shared by every format through the
//! [`RawAction`] trait:
//!
//! | format      | raw tree              |
//! |-------------|-----------------------|
//! | JSON        | `serde_json::Value`   |
//! | YAML        | `serde_yaml::Value`   |
//! | TOML        | `toml::Value`         |
//! | MessagePack | `serde_json::Value`   |
//!
//! MessagePack is read into a JSON tree. Action fields are strings, lists and
//! string maps, so nothing is lost, and the discriminator can be found
//! regardless of field order. Encoding always writes `type` first.
//!
//! An unrecognised discriminator is [`ChangelinkError::UnknownActionType`],
//! never a skipped or defaulted element.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

use super::{Action, ActionType};
use crate::errors::{ChangelinkError, Result};
use crate::types::DocumentFormat;

/// Field holding the variant name in every encoded action.
pub const DISCRIMINATOR: &str = "type";

/// Format-specific access to one undecoded action element.
pub trait RawAction: Sized {
    /// The `type` field, if present and a string.
    fn discriminator(&self) -> Option<&str>;

    /// Decode the whole element as `T`.
    fn decode<T: DeserializeOwned>(self) -> std::result::Result<T, String>;
}

impl RawAction for serde_json::Value {
    fn discriminator(&self) -> Option<&str> {
        self.get(DISCRIMINATOR).and_then(serde_json::Value::as_str)
    }

    fn decode<T: DeserializeOwned>(self) -> std::result::Result<T, String> {
        serde_json::from_value(self).map_err(|e| e.to_string())
    }
}

impl RawAction for serde_yaml::Value {
    fn discriminator(&self) -> Option<&str> {
        self.get(DISCRIMINATOR).and_then(serde_yaml::Value::as_str)
    }

    fn decode<T: DeserializeOwned>(self) -> std::result::Result<T, String> {
        serde_yaml::from_value(self).map_err(|e| e.to_string())
    }
}

impl RawAction for toml::Value {
    fn discriminator(&self) -> Option<&str> {
        self.get(DISCRIMINATOR).and_then(toml::Value::as_str)
    }

    fn decode<T: DeserializeOwned>(self) -> std::result::Result<T, String> {
        self.try_into().map_err(|e: toml::de::Error| e.to_string())
    }
}

/// Decode one action by looking up its discriminator and dispatching to the
/// matching variant.
///
/// This is the only place that maps discriminators to variants.
pub fn decode_by_discriminator<V: RawAction>(raw: V) -> Result<Action> {
    let tag = raw.discriminator().ok_or_else(|| {
        ChangelinkError::InvalidAction(format!("missing string '{DISCRIMINATOR}' field"))
    })?;
    let kind: ActionType = tag.parse()?;

    let action = match kind {
        ActionType::Log => Action::Log(raw.decode().map_err(invalid(kind))?),
        ActionType::Slack => Action::Slack(raw.decode().map_err(invalid(kind))?),
        ActionType::Webhook => Action::Webhook(raw.decode().map_err(invalid(kind))?),
        ActionType::IssueTicket => Action::IssueTicket(raw.decode().map_err(invalid(kind))?),
    };
    Ok(action)
}

fn invalid(kind: ActionType) -> impl Fn(String) -> ChangelinkError {
    move |reason| ChangelinkError::InvalidAction(format!("{kind} action: {reason}"))
}

/// Decode a list of raw elements, keeping order. Fails on the first bad
/// element.
pub fn decode_actions<V: RawAction>(raw: Vec<V>) -> Result<Vec<Action>> {
    raw.into_iter()
        .enumerate()
        .map(|(index, element)| {
            decode_by_discriminator(element).map_err(|err| match err {
                ChangelinkError::InvalidAction(reason) => {
                    ChangelinkError::InvalidAction(format!("#{index}: {reason}"))
                }
                other => other,
            })
        })
        .collect()
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Every supported format is self-describing, so any of them can be
        // buffered into a JSON tree first.
        let raw = serde_json::Value::deserialize(deserializer)?;
        decode_by_discriminator(raw).map_err(de::Error::custom)
    }
}

/// TOML documents must be tables, so lists are wrapped as `[[actions]]`.
#[derive(Serialize)]
struct TomlActionsOut<'a> {
    actions: &'a [Action],
}

#[derive(Deserialize)]
struct TomlActionsIn {
    #[serde(default)]
    actions: Vec<toml::Value>,
}

pub fn encode_json(actions: &[Action]) -> Result<String> {
    Ok(serde_json::to_string_pretty(actions)?)
}

pub fn decode_json(input: &str) -> Result<Vec<Action>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(input)?;
    decode_actions(raw)
}

pub fn encode_yaml(actions: &[Action]) -> Result<String> {
    Ok(serde_yaml::to_string(actions)?)
}

pub fn decode_yaml(input: &str) -> Result<Vec<Action>> {
    let raw: Vec<serde_yaml::Value> = serde_yaml::from_str(input)?;
    decode_actions(raw)
}

pub fn encode_toml(actions: &[Action]) -> Result<String> {
    Ok(toml::to_string(&TomlActionsOut { actions })?)
}

pub fn decode_toml(input: &str) -> Result<Vec<Action>> {
    let doc: TomlActionsIn = toml::from_str(input)?;
    decode_actions(doc.actions)
}

pub fn encode_msgpack(actions: &[Action]) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(actions)?)
}

pub fn decode_msgpack(input: &[u8]) -> Result<Vec<Action>> {
    let raw: Vec<serde_json::Value> = rmp_serde::from_slice(input)?;
    decode_actions(raw)
}

/// Encode in the given format. Text formats are returned as UTF-8 bytes.
pub fn encode(format: DocumentFormat, actions: &[Action]) -> Result<Vec<u8>> {
    match format {
        DocumentFormat::Json => encode_json(actions).map(String::into_bytes),
        DocumentFormat::Yaml => encode_yaml(actions).map(String::into_bytes),
        DocumentFormat::Toml => encode_toml(actions).map(String::into_bytes),
        DocumentFormat::MsgPack => encode_msgpack(actions),
    }
}

pub fn decode(format: DocumentFormat, input: &[u8]) -> Result<Vec<Action>> {
    match format {
        DocumentFormat::Json => decode_json(utf8(input)?),
        DocumentFormat::Yaml => decode_yaml(utf8(input)?),
        DocumentFormat::Toml => decode_toml(utf8(input)?),
        DocumentFormat::MsgPack => decode_msgpack(input),
    }
}

fn utf8(input: &[u8]) -> Result<&str> {
    std::str::from_utf8(input)
        .map_err(|e| ChangelinkError::ConfigError(format!("document is not valid UTF-8: {e}")))
}
