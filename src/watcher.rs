// src/watcher.rs

//! Watcher definitions.
//!
//! A [`Watcher`] names a file, the line ranges in it that matter, which
//! structural events should trigger it, and the actions to run when it
//! triggers. Watchers are validated before they are registered anywhere.

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::errors::{ChangelinkError, Result};
use crate::types::LineRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watcher {
    pub name: String,
    /// Repository-relative path, without any `a/`/`b/` diff marker.
    pub file_path: String,
    /// Watched ranges. Empty means any changed line triggers.
    #[serde(default)]
    pub lines: Vec<LineRange>,

    #[serde(default)]
    pub trigger_any: bool,
    #[serde(default)]
    pub trigger_any_line_changed: bool,
    #[serde(default)]
    pub trigger_on_rename: bool,
    #[serde(default)]
    pub trigger_on_move: bool,
    #[serde(default)]
    pub trigger_on_delete: bool,
    #[serde(default)]
    pub trigger_on_permission_change: bool,

    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Watcher {
    /// A watcher with no ranges, flags or actions. Call [`validate`] (or go
    /// through a store) before using it.
    ///
    /// [`validate`]: Watcher::validate
    pub fn new(name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
            lines: Vec::new(),
            trigger_any: false,
            trigger_any_line_changed: false,
            trigger_on_rename: false,
            trigger_on_move: false,
            trigger_on_delete: false,
            trigger_on_permission_change: false,
            actions: Vec::new(),
        }
    }

    /// A watcher needs a name and a file path. Action names are labels
    /// only and may repeat.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(self.malformed("name must not be empty"));
        }
        if self.file_path.trim().is_empty() {
            return Err(self.malformed("file_path must not be empty"));
        }
        Ok(())
    }

    /// Watched ranges sorted by start; the stored order is left untouched.
    pub fn sorted_lines(&self) -> Vec<LineRange> {
        let mut lines = self.lines.clone();
        lines.sort_by_key(|r| (r.start(), r.end()));
        lines
    }

    fn malformed(&self, reason: impl Into<String>) -> ChangelinkError {
        ChangelinkError::MalformedWatcher {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }
}
