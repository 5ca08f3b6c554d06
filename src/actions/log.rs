// src/actions/log.rs

use serde::{Deserialize, Serialize};
use tracing::info;

use super::template::render;
use super::{ActionOutcome, ActionRequest};
use crate::errors::Result;

/// Write a log line when the watcher triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogAction {
    pub name: String,
    #[serde(default)]
    pub message: String,
}

impl LogAction {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn perform(&self, request: &ActionRequest<'_>) -> Result<ActionOutcome> {
        let message = render(&self.message, request);
        info!(
            target: "changelink::actions::log",
            action = %self.name,
            watcher = %request.watcher_name,
            file = %request.file_path,
            reason = %request.evidence.reason,
            "{message}"
        );
        Ok(ActionOutcome::Logged)
    }
}
