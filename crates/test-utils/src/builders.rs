#![allow(dead_code)]

use std::sync::Arc;

use changelink::actions::{
    Action, ActionEnv, IssueTicketAction, IssueTrackerSettings, LogAction, SlackAction,
    SlackSettings, WebhookAction,
};
use changelink::diff::{FileDiffRecord, Hunk};
use changelink::types::LineRange;
use changelink::watcher::Watcher;

use crate::fake_http::FakeHttpClient;

/// Shorthand for a valid `LineRange`.
pub fn range(start: u32, end: u32) -> LineRange {
    LineRange::new(start, end).expect("test range must have start <= end")
}

/// Builder for `Watcher` to simplify test setup.
pub struct WatcherBuilder {
    watcher: Watcher,
}

impl WatcherBuilder {
    pub fn new(name: &str, file_path: &str) -> Self {
        Self {
            watcher: Watcher::new(name, file_path),
        }
    }

    pub fn lines(mut self, start: u32, end: u32) -> Self {
        self.watcher.lines.push(range(start, end));
        self
    }

    pub fn trigger_any(mut self) -> Self {
        self.watcher.trigger_any = true;
        self
    }

    pub fn trigger_any_line_changed(mut self) -> Self {
        self.watcher.trigger_any_line_changed = true;
        self
    }

    pub fn on_rename(mut self) -> Self {
        self.watcher.trigger_on_rename = true;
        self
    }

    pub fn on_move(mut self) -> Self {
        self.watcher.trigger_on_move = true;
        self
    }

    pub fn on_delete(mut self) -> Self {
        self.watcher.trigger_on_delete = true;
        self
    }

    pub fn on_permission_change(mut self) -> Self {
        self.watcher.trigger_on_permission_change = true;
        self
    }

    pub fn action(mut self, action: impl Into<Action>) -> Self {
        self.watcher.actions.push(action.into());
        self
    }

    pub fn log(self, name: &str) -> Self {
        self.action(LogAction::new(name, "{watcher}: {reason}"))
    }

    pub fn build(self) -> Watcher {
        self.watcher
            .validate()
            .expect("builder produced an invalid watcher");
        self.watcher
    }
}

/// A modification of `path` (with `a/`/`b/` markers) with the given hunks.
pub fn modified(path: &str, hunks: &[(u32, u32)]) -> FileDiffRecord {
    hunks.iter().fold(
        FileDiffRecord::new(format!("a/{path}"), format!("b/{path}")),
        |record, &(start, lines)| record.with_hunk(Hunk::new(start, lines)),
    )
}

pub fn renamed(from: &str, to: &str) -> FileDiffRecord {
    FileDiffRecord::new(format!("a/{from}"), format!("b/{to}"))
}

pub fn deleted(path: &str) -> FileDiffRecord {
    FileDiffRecord::new(format!("a/{path}"), "/dev/null")
}

/// One of each action variant, in a fixed order.
pub fn sample_actions() -> Vec<Action> {
    vec![
        LogAction::new("note", "{watcher} changed: {reason}").into(),
        SlackAction::new("ping", "#eng", "{file} lines {lines}").into(),
        WebhookAction::new("hook", "https://hooks.example.com/x")
            .with_header("X-Secret", "s3cret")
            .into(),
        IssueTicketAction::new("ticket", "OPS", "Review {file}")
            .with_label("changelink")
            .into(),
    ]
}

/// An `ActionEnv` talking to `http`, with a Slack token and an issue
/// tracker configured.
pub fn action_env(http: &FakeHttpClient) -> ActionEnv {
    ActionEnv::new(
        Arc::new(http.clone()),
        SlackSettings {
            api_base: "https://slack.test/api".to_string(),
            token: Some("xoxb-test".to_string()),
            token_env: "SLACK_TOKEN".to_string(),
        },
        Some(IssueTrackerSettings {
            base_url: "https://issues.test".to_string(),
            token: Some("tracker-token".to_string()),
            token_env: "ISSUE_TRACKER_TOKEN".to_string(),
        }),
    )
}

/// Like [`action_env`] but with no credentials and no issue tracker.
pub fn bare_action_env(http: &FakeHttpClient) -> ActionEnv {
    ActionEnv::new(
        Arc::new(http.clone()),
        SlackSettings {
            api_base: "https://slack.test/api".to_string(),
            token: None,
            token_env: "SLACK_TOKEN".to_string(),
        },
        None,
    )
}
