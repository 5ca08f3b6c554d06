// src/actions/webhook.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::http::HttpRequest;
use super::{ActionEnv, ActionOutcome, ActionRequest};
use crate::errors::Result;

/// POST a JSON description of the trigger to a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAction {
    pub name: String,
    pub url: String,
    /// Extra request headers, e.g. a shared secret.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl WebhookAction {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Payload sent to the endpoint.
    pub fn payload(&self, request: &ActionRequest<'_>) -> serde_json::Value {
        let evidence = request.evidence;
        json!({
            "action": self.name,
            "watcher": request.watcher_name,
            "file_path": request.file_path,
            "reason": evidence.reason.as_str(),
            "changed_lines": evidence.changed,
            "watched_lines": evidence.watched,
            "hunk": evidence.hunk.as_ref().map(|h| h.body.as_str()),
        })
    }

    pub async fn perform(
        &self,
        env: &ActionEnv,
        request: &ActionRequest<'_>,
    ) -> Result<ActionOutcome> {
        let mut http_request = HttpRequest::post(&self.url, self.payload(request));
        for (name, value) in &self.headers {
            http_request = http_request.header(name, value);
        }

        let response = env.http().send(http_request).await?;
        if !response.is_success() {
            return Err(request.failure(
                &self.name,
                format!("webhook returned HTTP {}: {}", response.status, response.body),
            ));
        }

        info!(
            action = %self.name,
            url = %self.url,
            status = response.status,
            "webhook delivered"
        );
        Ok(ActionOutcome::Delivered {
            status: response.status,
        })
    }
}
