// src/engine/core.rs

//! Pure trigger evaluation.
//!
//! Nothing here awaits, spawns or performs actions. Given a record and the
//! watchers for its path, the core decides which watchers trigger and
//! builds the evidence for each. The async shell
//! (`engine::runtime::Runtime`) owns reading records and running actions.
//!
//! Per watcher, evaluation order is:
//!
//! 1. structural flags, first match wins:
//!    `trigger_any`, `trigger_any_line_changed`, rename, move, delete,
//!    permission change;
//! 2. if the watcher has no lines, any changed range triggers it;
//! 3. otherwise the first overlap between the record's changed ranges and
//!    the watcher's sorted lines.

use tracing::{debug, warn};

use crate::diff::{ChangedRange, DiffSource, FileDiffRecord, classify};
use crate::errors::{ChangelinkError, Result};
use crate::matching::find_first_overlap;
use crate::store::WatcherStore;
use crate::types::LineRange;
use crate::watcher::Watcher;

use super::{Evidence, TriggerReason, TriggeredWatcher};

/// Decide whether `watcher` triggers for `record`.
///
/// `changed` must be `record.changed_ranges()`; it is passed in so it is
/// computed once per record rather than once per watcher.
pub fn evaluate_watcher(
    record: &FileDiffRecord,
    changed: &[ChangedRange],
    watcher: &Watcher,
) -> Option<Evidence> {
    if let Some(reason) = structural_reason(record, changed, watcher) {
        return Some(Evidence::structural(reason));
    }

    if watcher.lines.is_empty() {
        return changed.first().map(|first| Evidence {
            reason: TriggerReason::AnyLine,
            changed: Some(first.range),
            watched: None,
            hunk: record.hunks.get(first.hunk_index).cloned(),
        });
    }

    let lines = watcher.sorted_lines();
    let changed_ranges: Vec<LineRange> = changed.iter().map(|c| c.range).collect();
    let (i, j) = find_first_overlap(&changed_ranges, &lines)?;

    Some(Evidence {
        reason: TriggerReason::WatchedLinesChanged,
        changed: Some(changed[i].range),
        watched: Some(lines[j]),
        hunk: record.hunks.get(changed[i].hunk_index).cloned(),
    })
}

fn structural_reason(
    record: &FileDiffRecord,
    changed: &[ChangedRange],
    watcher: &Watcher,
) -> Option<TriggerReason> {
    let checks = [
        (watcher.trigger_any, TriggerReason::AnyChange),
        (
            watcher.trigger_any_line_changed && !changed.is_empty(),
            TriggerReason::AnyLine,
        ),
        (
            watcher.trigger_on_rename && classify::renamed(record),
            TriggerReason::Renamed,
        ),
        (
            watcher.trigger_on_move && classify::moved(record),
            TriggerReason::Moved,
        ),
        (
            watcher.trigger_on_delete && classify::deleted(record),
            TriggerReason::Deleted,
        ),
        (
            watcher.trigger_on_permission_change && classify::permission_changed(record),
            TriggerReason::ModeChanged,
        ),
    ];

    checks
        .into_iter()
        .find_map(|(applies, reason)| applies.then_some(reason))
}

/// Evaluates records against the watchers held by a store.
#[derive(Debug)]
pub struct TriggerEngine<S: WatcherStore> {
    store: S,
}

impl<S: WatcherStore> TriggerEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All watchers that trigger for one record, in store order.
    ///
    /// Fails with [`ChangelinkError::WatcherLookupFailed`] if the store
    /// cannot answer for the record's path.
    pub fn evaluate_record(&self, record: &FileDiffRecord) -> Result<Vec<TriggeredWatcher>> {
        let path = record.original_path();
        let watchers = self.store.find_watchers_for_path(path).map_err(|err| {
            ChangelinkError::WatcherLookupFailed {
                path: path.to_string(),
                reason: err.to_string(),
            }
        })?;

        if watchers.is_empty() {
            return Ok(Vec::new());
        }

        let changed = record.changed_ranges();
        debug!(
            file = %path,
            watchers = watchers.len(),
            changed = changed.len(),
            "evaluating record"
        );

        let triggered = watchers
            .into_iter()
            .filter_map(|watcher| {
                let evidence = evaluate_watcher(record, &changed, &watcher)?;
                debug!(
                    file = %path,
                    watcher = %watcher.name,
                    reason = %evidence.reason,
                    "watcher triggered"
                );
                Some(TriggeredWatcher {
                    watcher,
                    file_path: path.to_string(),
                    evidence,
                })
            })
            .collect();

        Ok(triggered)
    }

    /// Pull the next readable record from `source` and evaluate it.
    ///
    /// Returns `None` at end of stream. Records that fail to decode are
    /// skipped; a record whose watcher lookup fails is logged and yields no
    /// triggered watchers.
    pub fn evaluate_next(&self, source: &mut dyn DiffSource) -> Option<Vec<TriggeredWatcher>> {
        let record = next_record(source)?;
        match self.evaluate_record(&record) {
            Ok(triggered) => Some(triggered),
            Err(err) => {
                warn!(file = %record.original_path(), error = %err, "skipping record");
                Some(Vec::new())
            }
        }
    }

    /// Drain `source` and collect every triggered watcher.
    pub fn trigger_watchers(&self, source: &mut dyn DiffSource) -> Vec<TriggeredWatcher> {
        let mut all = Vec::new();
        while let Some(mut triggered) = self.evaluate_next(source) {
            all.append(&mut triggered);
        }
        all
    }
}

/// Next readable record, skipping (and logging) ones that fail to decode.
///
/// A malformed diff is a per-record failure; any other error ends the
/// stream, since the source can no longer be trusted to make progress.
fn next_record(source: &mut dyn DiffSource) -> Option<FileDiffRecord> {
    loop {
        match source.read_next() {
            Ok(record) => return record,
            Err(err @ ChangelinkError::MalformedDiff { .. }) => {
                warn!(error = %err, "skipping malformed diff record");
            }
            Err(err) => {
                warn!(error = %err, "diff source failed; stopping");
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Hunk;

    fn record(orig: &str, new: &str) -> FileDiffRecord {
        FileDiffRecord::new(orig, new)
    }

    #[test]
    fn trigger_any_wins_over_everything() {
        let mut w = Watcher::new("w", "src/a.rs");
        w.trigger_any = true;
        w.trigger_on_delete = true;
        let r = record("a/src/a.rs", "/dev/null");

        let ev = evaluate_watcher(&r, &r.changed_ranges(), &w).unwrap();
        assert_eq!(ev.reason, TriggerReason::AnyChange);
        assert!(ev.changed.is_none());
    }

    #[test]
    fn any_line_flag_needs_a_changed_range() {
        let mut w = Watcher::new("w", "src/a.rs");
        w.trigger_any_line_changed = true;
        w.lines = vec![LineRange::new(500, 600).unwrap()];

        let empty = record("a/src/a.rs", "b/src/a.rs");
        assert!(evaluate_watcher(&empty, &empty.changed_ranges(), &w).is_none());

        let changed = empty.clone().with_hunk(Hunk::new(10, 8));
        let ev = evaluate_watcher(&changed, &changed.changed_ranges(), &w).unwrap();
        assert_eq!(ev.reason, TriggerReason::AnyLine);
    }

    #[test]
    fn flags_off_means_structural_changes_are_ignored() {
        let w = Watcher {
            lines: vec![LineRange::new(1, 5).unwrap()],
            ..Watcher::new("w", "src/a.rs")
        };
        let r = record("a/src/a.rs", "b/lib/b.rs");
        assert!(evaluate_watcher(&r, &r.changed_ranges(), &w).is_none());
    }

    #[test]
    fn move_is_checked_before_mode_change() {
        let mut w = Watcher::new("w", "src/a.rs");
        w.trigger_on_move = true;
        w.trigger_on_permission_change = true;
        let mut r = record("a/src/a.rs", "b/lib/a.rs");
        r.permission_changed = true;

        let ev = evaluate_watcher(&r, &r.changed_ranges(), &w).unwrap();
        assert_eq!(ev.reason, TriggerReason::Moved);
    }
}
