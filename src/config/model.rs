// src/config/model.rs

use serde::{Deserialize, Serialize};

use crate::watcher::Watcher;

/// Top-level configuration document as read from disk.
///
/// ```toml
/// [config]
/// http_timeout_secs = 10
///
/// [integrations.slack]
/// token_env = "SLACK_TOKEN"
///
/// [[watchers]]
/// name = "payments"
/// file_path = "services/payments/charge.go"
/// lines = [{ start_line = 61, end_line = 80 }]
///
/// [[watchers.actions]]
/// type = "log"
/// name = "note"
/// message = "{watcher}: {reason}"
/// ```
///
/// Watchers are kept as undecoded trees here so that one bad watcher does
/// not reject the whole document. [`ConfigFile`] is the validated form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub integrations: IntegrationsSection,

    #[serde(default)]
    pub watchers: Vec<serde_json::Value>,
}

/// `[config]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSection {
    /// Timeout for every outgoing HTTP request made by actions.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_http_timeout_secs() -> u64 {
    10
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// `[integrations]` section: endpoints and the env vars holding their
/// credentials. Tokens themselves never live in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationsSection {
    #[serde(default)]
    pub slack: SlackConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_tracker: Option<IssueTrackerConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default = "default_slack_token_env")]
    pub token_env: String,

    #[serde(default = "default_slack_api_base")]
    pub api_base: String,
}

fn default_slack_token_env() -> String {
    "SLACK_TOKEN".to_string()
}

fn default_slack_api_base() -> String {
    "https://slack.com/api".to_string()
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            token_env: default_slack_token_env(),
            api_base: default_slack_api_base(),
        }
    }
}

/// `[integrations.issue_tracker]`. Without it, issue-ticket actions fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTrackerConfig {
    pub base_url: String,

    #[serde(default = "default_issue_token_env")]
    pub token_env: String,
}

fn default_issue_token_env() -> String {
    "ISSUE_TRACKER_TOKEN".to_string()
}

/// A watcher entry that failed to decode or validate.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedWatcher {
    /// Position in the document's `watchers` list.
    pub index: usize,
    pub name: Option<String>,
    pub reason: String,
    /// The entry as written, kept so that saving does not drop it.
    pub raw: serde_json::Value,
}

/// Validated configuration.
///
/// Construct via `ConfigFile::try_from(raw)`; global problems fail the
/// conversion, per-watcher problems end up in [`rejected`](Self::rejected).
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub integrations: IntegrationsSection,
    pub watchers: Vec<Watcher>,
    pub rejected: Vec<RejectedWatcher>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        integrations: IntegrationsSection,
        watchers: Vec<Watcher>,
        rejected: Vec<RejectedWatcher>,
    ) -> Self {
        Self {
            config,
            integrations,
            watchers,
            rejected,
        }
    }
}
