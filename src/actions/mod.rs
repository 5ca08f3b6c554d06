// src/actions/mod.rs

//! Notification actions.
//!
//! An [`Action`] is one entry in a watcher's `actions` list. The set of
//! variants is closed; each one carries its own settings and knows how to
//! [`perform`](Action::perform) itself given the evidence of a trigger.
//!
//! - [`log`], [`slack`], [`webhook`], [`issue`] implement the variants.
//! - [`codec`] encodes/decodes heterogeneous action lists (JSON, YAML, TOML,
//!   MessagePack) by dispatching on the `type` discriminator.
//! - [`http`] abstracts the HTTP transport so tests can swap in a fake.
//! - [`template`] renders `{watcher}`-style placeholders in messages.
//!
//! Actions never mutate their own configuration when performed.

pub mod codec;
pub mod http;
pub mod issue;
pub mod log;
pub mod slack;
pub mod template;
pub mod webhook;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::config::model::IntegrationsSection;
use crate::engine::Evidence;
use crate::errors::{ChangelinkError, Result};

use self::http::HttpClient;

pub use issue::IssueTicketAction;
pub use log::LogAction;
pub use slack::SlackAction;
pub use webhook::WebhookAction;

/// Discriminator values as written in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    Log,
    Slack,
    Webhook,
    IssueTicket,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Log => "log",
            ActionType::Slack => "slack",
            ActionType::Webhook => "webhook",
            ActionType::IssueTicket => "issue_ticket",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ChangelinkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "log" => Ok(ActionType::Log),
            "slack" => Ok(ActionType::Slack),
            "webhook" => Ok(ActionType::Webhook),
            // Older documents name the issue tracker directly.
            "issue_ticket" | "jira" => Ok(ActionType::IssueTicket),
            other => Err(ChangelinkError::UnknownActionType(other.to_string())),
        }
    }
}

/// A configured notification.
///
/// Serializes with the `type` discriminator written before the variant's own
/// fields. Deserialization goes through
/// [`codec::decode_by_discriminator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Log(LogAction),
    Slack(SlackAction),
    Webhook(WebhookAction),
    IssueTicket(IssueTicketAction),
}

impl Action {
    pub fn name(&self) -> &str {
        match self {
            Action::Log(a) => &a.name,
            Action::Slack(a) => &a.name,
            Action::Webhook(a) => &a.name,
            Action::IssueTicket(a) => &a.name,
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Log(_) => ActionType::Log,
            Action::Slack(_) => ActionType::Slack,
            Action::Webhook(_) => ActionType::Webhook,
            Action::IssueTicket(_) => ActionType::IssueTicket,
        }
    }

    /// Run this action for a triggered watcher.
    pub async fn perform(
        &self,
        env: &ActionEnv,
        request: &ActionRequest<'_>,
    ) -> Result<ActionOutcome> {
        match self {
            Action::Log(a) => a.perform(request),
            Action::Slack(a) => a.perform(env, request).await,
            Action::Webhook(a) => a.perform(env, request).await,
            Action::IssueTicket(a) => a.perform(env, request).await,
        }
    }
}

impl From<LogAction> for Action {
    fn from(a: LogAction) -> Self {
        Action::Log(a)
    }
}

impl From<SlackAction> for Action {
    fn from(a: SlackAction) -> Self {
        Action::Slack(a)
    }
}

impl From<WebhookAction> for Action {
    fn from(a: WebhookAction) -> Self {
        Action::Webhook(a)
    }
}

impl From<IssueTicketAction> for Action {
    fn from(a: IssueTicketAction) -> Self {
        Action::IssueTicket(a)
    }
}

/// What an action is told about the trigger it is running for.
#[derive(Debug, Clone, Copy)]
pub struct ActionRequest<'a> {
    pub watcher_name: &'a str,
    pub file_path: &'a str,
    pub evidence: &'a Evidence,
}

impl ActionRequest<'_> {
    /// Build the error an action reports when it cannot complete.
    pub fn failure(&self, action: &str, reason: impl Into<String>) -> ChangelinkError {
        ChangelinkError::ActionExecutionFailed {
            watcher: self.watcher_name.to_string(),
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result of a successful `perform`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Logged,
    /// An HTTP endpoint accepted the notification.
    Delivered { status: u16 },
    TicketCreated { key: String },
}

/// Slack endpoint and credentials, resolved at startup.
#[derive(Debug, Clone)]
pub struct SlackSettings {
    pub api_base: String,
    pub token: Option<String>,
    /// Name of the env var the token was read from, for error messages.
    pub token_env: String,
}

/// Issue tracker endpoint and credentials, resolved at startup.
#[derive(Debug, Clone)]
pub struct IssueTrackerSettings {
    pub base_url: String,
    pub token: Option<String>,
    pub token_env: String,
}

/// Everything actions need from the outside world.
///
/// Built once per run from the `[integrations]` config; tokens are read from
/// the environment here and nowhere else.
#[derive(Clone)]
pub struct ActionEnv {
    http: Arc<dyn HttpClient>,
    pub slack: SlackSettings,
    pub issue_tracker: Option<IssueTrackerSettings>,
}

impl fmt::Debug for ActionEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEnv")
            .field("slack_api_base", &self.slack.api_base)
            .field("issue_tracker", &self.issue_tracker.as_ref().map(|t| &t.base_url))
            .finish_non_exhaustive()
    }
}

impl ActionEnv {
    pub fn new(
        http: Arc<dyn HttpClient>,
        slack: SlackSettings,
        issue_tracker: Option<IssueTrackerSettings>,
    ) -> Self {
        Self {
            http,
            slack,
            issue_tracker,
        }
    }

    /// Resolve integration settings, reading tokens from the env vars the
    /// config names.
    pub fn from_config(integrations: &IntegrationsSection, http: Arc<dyn HttpClient>) -> Self {
        let slack_cfg = &integrations.slack;
        let slack = SlackSettings {
            api_base: slack_cfg.api_base.trim_end_matches('/').to_string(),
            token: read_token(&slack_cfg.token_env),
            token_env: slack_cfg.token_env.clone(),
        };

        let issue_tracker = integrations
            .issue_tracker
            .as_ref()
            .map(|cfg| IssueTrackerSettings {
                base_url: cfg.base_url.trim_end_matches('/').to_string(),
                token: read_token(&cfg.token_env),
                token_env: cfg.token_env.clone(),
            });

        Self::new(http, slack, issue_tracker)
    }

    pub fn http(&self) -> &dyn HttpClient {
        self.http.as_ref()
    }
}

fn read_token(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
