// src/actions/issue.rs

//! Open a ticket in an issue tracker.
//!
//! Talks to a Jira-compatible REST endpoint: `POST {base_url}/rest/api/2/issue`
//! with `fields.project.key`, `summary`, `description`, `issuetype.name` and
//! `labels`. The tracker's `base_url` and token come from
//! `[integrations.issue_tracker]`.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::http::HttpRequest;
use super::template::{change_summary, render};
use super::{ActionEnv, ActionOutcome, ActionRequest};
use crate::errors::Result;

fn default_issue_type() -> String {
    "Task".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueTicketAction {
    pub name: String,
    /// Project key, e.g. `OPS`.
    pub project: String,
    /// Ticket title template.
    pub summary: String,
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

impl IssueTicketAction {
    pub fn new(
        name: impl Into<String>,
        project: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            project: project.into(),
            summary: summary.into(),
            issue_type: default_issue_type(),
            labels: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub async fn perform(
        &self,
        env: &ActionEnv,
        request: &ActionRequest<'_>,
    ) -> Result<ActionOutcome> {
        let Some(tracker) = env.issue_tracker.as_ref() else {
            return Err(request.failure(
                &self.name,
                "no [integrations.issue_tracker] configured",
            ));
        };

        let description = format!(
            "Watcher {} triggered: {}\n\n{}",
            request.watcher_name,
            request.evidence.reason,
            change_summary(request)
        );
        let body = json!({
            "fields": {
                "project": { "key": self.project },
                "summary": render(&self.summary, request),
                "description": description,
                "issuetype": { "name": self.issue_type },
                "labels": self.labels,
            }
        });

        let mut http_request =
            HttpRequest::post(format!("{}/rest/api/2/issue", tracker.base_url), body);
        if let Some(token) = tracker.token.as_deref() {
            http_request = http_request.bearer(token);
        }

        let response = env.http().send(http_request).await?;
        if !response.is_success() {
            return Err(request.failure(
                &self.name,
                format!(
                    "issue tracker returned HTTP {}: {}",
                    response.status, response.body
                ),
            ));
        }
        let created: CreatedIssue = response.json()?;

        info!(
            action = %self.name,
            project = %self.project,
            key = %created.key,
            "created ticket"
        );
        Ok(ActionOutcome::TicketCreated { key: created.key })
    }
}
