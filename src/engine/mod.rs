// src/engine/mod.rs

//! Trigger evaluation for changelink.
//!
//! The pure, synchronous matching logic lives in [`core`]: it takes one
//! file-diff record at a time, looks up the watchers for the record's path,
//! and decides which of them trigger and why. The async shell in
//! [`runtime`] pulls records from a diff source, feeds them to the core, and
//! hands every triggered watcher to [`dispatch`] before reading the next
//! record.

use std::fmt;

use crate::diff::Hunk;
use crate::types::LineRange;
use crate::watcher::Watcher;

pub mod core;
pub mod dispatch;
pub mod runtime;

pub use self::core::{TriggerEngine, evaluate_watcher};
pub use dispatch::{ActionFailure, RunReport, dispatch_triggered};
pub use runtime::{Runtime, RuntimeOptions};

/// Why a watcher triggered.
///
/// Structural reasons are checked in declaration order; the first one that
/// applies wins and range matching is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerReason {
    AnyChange,
    AnyLine,
    Renamed,
    Moved,
    Deleted,
    ModeChanged,
    WatchedLinesChanged,
}

impl TriggerReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerReason::AnyChange => "Any Change",
            TriggerReason::AnyLine => "Any Line",
            TriggerReason::Renamed => "File Renamed",
            TriggerReason::Moved => "File Moved",
            TriggerReason::Deleted => "File Deleted",
            TriggerReason::ModeChanged => "File Mode Changed",
            TriggerReason::WatchedLinesChanged => "Watched lines changed",
        }
    }
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the engine found when a watcher triggered.
///
/// Structural triggers carry only a reason. Line triggers also carry the
/// changed range, the watched range it overlapped (absent for any-line
/// triggers) and the hunk the change came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub reason: TriggerReason,
    pub changed: Option<LineRange>,
    pub watched: Option<LineRange>,
    pub hunk: Option<Hunk>,
}

impl Evidence {
    pub fn structural(reason: TriggerReason) -> Self {
        Self {
            reason,
            changed: None,
            watched: None,
            hunk: None,
        }
    }
}

/// A watcher that triggered for one record, with the evidence for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredWatcher {
    pub watcher: Watcher,
    /// Original path of the record, without the diff marker.
    pub file_path: String,
    pub evidence: Evidence,
}
