// src/config/validate.rs

use std::collections::HashSet;

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile, RejectedWatcher};
use crate::errors::{ChangelinkError, Result};
use crate::watcher::Watcher;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ChangelinkError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_global_config(&raw)?;
        let (watchers, rejected) = decode_watchers(raw.watchers);
        Ok(ConfigFile::new_unchecked(
            raw.config,
            raw.integrations,
            watchers,
            rejected,
        ))
    }
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.http_timeout_secs == 0 {
        return Err(ChangelinkError::ConfigError(
            "[config].http_timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }

    let slack = &cfg.integrations.slack;
    if slack.api_base.trim().is_empty() {
        return Err(ChangelinkError::ConfigError(
            "[integrations.slack].api_base must not be empty".to_string(),
        ));
    }
    if slack.token_env.trim().is_empty() {
        return Err(ChangelinkError::ConfigError(
            "[integrations.slack].token_env must not be empty".to_string(),
        ));
    }

    if let Some(tracker) = &cfg.integrations.issue_tracker {
        if tracker.base_url.trim().is_empty() {
            return Err(ChangelinkError::ConfigError(
                "[integrations.issue_tracker].base_url must not be empty".to_string(),
            ));
        }
        if tracker.token_env.trim().is_empty() {
            return Err(ChangelinkError::ConfigError(
                "[integrations.issue_tracker].token_env must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Decode and validate each watcher entry on its own. Bad entries are
/// logged and returned separately; they never reach a store.
fn decode_watchers(raw: Vec<serde_json::Value>) -> (Vec<Watcher>, Vec<RejectedWatcher>) {
    let mut watchers: Vec<Watcher> = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();
    let mut names = HashSet::new();

    for (index, entry) in raw.into_iter().enumerate() {
        let name = entry
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        let checked = decode_watcher(&entry).and_then(|watcher| {
            if names.contains(&watcher.name) {
                Err(ChangelinkError::MalformedWatcher {
                    name: watcher.name.clone(),
                    reason: "another watcher already uses this name".to_string(),
                })
            } else {
                Ok(watcher)
            }
        });

        match checked {
            Ok(watcher) => {
                names.insert(watcher.name.clone());
                watchers.push(watcher);
            }
            Err(err) => {
                warn!(index, error = %err, "excluding malformed watcher");
                rejected.push(RejectedWatcher {
                    index,
                    name,
                    reason: err.to_string(),
                    raw: entry,
                });
            }
        }
    }

    (watchers, rejected)
}

fn decode_watcher(entry: &serde_json::Value) -> Result<Watcher> {
    let watcher: Watcher = serde_json::from_value(entry.clone()).map_err(|err| {
        ChangelinkError::MalformedWatcher {
            name: entry
                .get("name")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("<unnamed>")
                .to_string(),
            reason: err.to_string(),
        }
    })?;
    watcher.validate()?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_timeout_is_fatal() {
        let mut raw = RawConfigFile::default();
        raw.config.http_timeout_secs = 0;
        let err = ConfigFile::try_from(raw).unwrap_err();
        assert!(matches!(err, ChangelinkError::ConfigError(_)));
    }

    #[test]
    fn bad_watchers_are_excluded_not_fatal() {
        let raw = RawConfigFile {
            watchers: vec![
                json!({ "name": "ok", "file_path": "a.go" }),
                json!({ "name": "", "file_path": "b.go" }),
                json!({ "name": "ok", "file_path": "c.go" }),
                json!({ "name": "pigeon", "file_path": "d.go",
                        "actions": [{ "type": "carrier_pigeon", "name": "coo" }] }),
            ],
            ..RawConfigFile::default()
        };

        let cfg = ConfigFile::try_from(raw).unwrap();
        assert_eq!(cfg.watchers.len(), 1);
        assert_eq!(cfg.watchers[0].file_path, "a.go");

        let indices: Vec<_> = cfg.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(cfg.rejected[2].reason.contains("UnknownActionType: carrier_pigeon"));
    }
}
