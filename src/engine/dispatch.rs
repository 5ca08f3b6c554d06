// src/engine/dispatch.rs

//! Running the actions of triggered watchers.
//!
//! Every action of every triggered watcher runs, in configured order. A
//! failing action is recorded and the next one still runs. Nothing is
//! retried.

use tracing::{debug, warn};

use crate::actions::{ActionEnv, ActionRequest};
use crate::errors::ChangelinkError;

use super::TriggeredWatcher;

/// One action that did not complete.
#[derive(Debug)]
pub struct ActionFailure {
    pub watcher: String,
    pub action: String,
    pub file_path: String,
    /// Always [`ChangelinkError::ActionExecutionFailed`].
    pub error: ChangelinkError,
}

/// Totals for one run, plus every failure.
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: usize,
    pub triggered: Vec<TriggeredWatcher>,
    pub actions_performed: usize,
    pub failures: Vec<ActionFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Perform the actions of `triggered`, adding outcomes to `report`.
pub async fn dispatch_triggered(
    env: &ActionEnv,
    triggered: &[TriggeredWatcher],
    report: &mut RunReport,
) {
    for hit in triggered {
        let request = ActionRequest {
            watcher_name: &hit.watcher.name,
            file_path: &hit.file_path,
            evidence: &hit.evidence,
        };

        for action in &hit.watcher.actions {
            match action.perform(env, &request).await {
                Ok(outcome) => {
                    report.actions_performed += 1;
                    debug!(
                        watcher = %hit.watcher.name,
                        action = %action.name(),
                        ?outcome,
                        "action performed"
                    );
                }
                Err(err) => {
                    let error = match err {
                        e @ ChangelinkError::ActionExecutionFailed { .. } => e,
                        other => request.failure(action.name(), other.to_string()),
                    };
                    warn!(
                        watcher = %hit.watcher.name,
                        action = %action.name(),
                        kind = %action.action_type(),
                        error = %error,
                        "action failed"
                    );
                    report.failures.push(ActionFailure {
                        watcher: hit.watcher.name.clone(),
                        action: action.name().to_string(),
                        file_path: hit.file_path.clone(),
                        error,
                    });
                }
            }
        }
    }
}
