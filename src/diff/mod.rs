// src/diff/mod.rs

//! File-diff records and the sources that produce them.
//!
//! - [`FileDiffRecord`] / [`Hunk`] are the per-file change metadata the
//!   engine consumes.
//! - [`classify`] derives structural facts (rename, move, delete,
//!   permission change) from a record.
//! - [`reader`] parses unified diff text into records.
//!
//! The engine pulls records through the [`DiffSource`] trait one at a time.

pub mod classify;
pub mod reader;

use std::collections::VecDeque;

use crate::errors::Result;
use crate::types::LineRange;

pub use reader::DiffReader;

/// Path the diff tool uses for the missing side of an added/deleted file.
pub const DEV_NULL: &str = "/dev/null";

/// Context lines `git diff` places on each side of a change by default.
pub const DEFAULT_CONTEXT_LINES: u32 = 3;

/// One contiguous block of changes within a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub orig_start: u32,
    pub orig_lines: u32,
    pub new_start: u32,
    pub new_lines: u32,
    /// Text after the closing `@@` of the header, usually a function name.
    pub section: String,
    /// Raw hunk lines (` `, `+`, `-`, `\` prefixed), newline separated.
    pub body: String,
    /// Unchanged lines before the first change in the hunk.
    pub context_before: u32,
    /// Unchanged lines after the last change in the hunk.
    pub context_after: u32,
}

impl Hunk {
    /// A hunk with only original-side coordinates and the conventional
    /// three lines of context on each side.
    pub fn new(orig_start: u32, orig_lines: u32) -> Self {
        Self {
            orig_start,
            orig_lines,
            new_start: orig_start,
            new_lines: orig_lines,
            section: String::new(),
            body: String::new(),
            context_before: DEFAULT_CONTEXT_LINES,
            context_after: DEFAULT_CONTEXT_LINES,
        }
    }

    pub fn with_context(mut self, before: u32, after: u32) -> Self {
        self.context_before = before;
        self.context_after = after;
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Original-side range of this hunk with the context padding trimmed.
    ///
    /// `start = orig_start + context_before` and
    /// `end = start + orig_lines - (context_before + context_after)`.
    ///
    /// Returns `None` if the context exceeds the hunk length.
    pub fn changed_range(&self) -> Option<LineRange> {
        let start = self.orig_start.checked_add(self.context_before)?;
        let changed = self
            .orig_lines
            .checked_sub(self.context_before.checked_add(self.context_after)?)?;
        let end = start.checked_add(changed)?;
        LineRange::new(start, end).ok()
    }
}

/// Changed range of a record, tied back to the hunk it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRange {
    pub range: LineRange,
    pub hunk_index: usize,
}

/// One file's worth of change metadata from a multi-file diff.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileDiffRecord {
    /// Original path as written by the diff tool (e.g. `a/src/lib.rs`).
    pub orig_name: String,
    /// New path as written by the diff tool (e.g. `b/src/lib.rs` or
    /// [`DEV_NULL`]).
    pub new_name: String,
    pub permission_changed: bool,
    pub hunks: Vec<Hunk>,
}

impl FileDiffRecord {
    pub fn new(orig_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            orig_name: orig_name.into(),
            new_name: new_name.into(),
            permission_changed: false,
            hunks: Vec::new(),
        }
    }

    pub fn with_hunk(mut self, hunk: Hunk) -> Self {
        self.hunks.push(hunk);
        self
    }

    /// Original path without the diff tool's `a/` marker. This is the key
    /// watchers are looked up by.
    pub fn original_path(&self) -> &str {
        strip_marker(&self.orig_name)
    }

    /// New path without the diff tool's `b/` marker.
    pub fn new_path(&self) -> &str {
        strip_marker(&self.new_name)
    }

    /// Changed ranges of all hunks, in hunk order.
    ///
    /// Hunks are assumed sorted by original start line, which is how diff
    /// tools emit them. Hunks whose context padding exceeds their length are
    /// left out; the reader rejects those before they get here.
    pub fn changed_ranges(&self) -> Vec<ChangedRange> {
        self.hunks
            .iter()
            .enumerate()
            .filter_map(|(hunk_index, hunk)| {
                hunk.changed_range()
                    .map(|range| ChangedRange { range, hunk_index })
            })
            .collect()
    }
}

/// Strip a one-letter `x/` prefix, as added by `git diff` to both sides.
pub(crate) fn strip_marker(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() > 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b'/' {
        &path[2..]
    } else {
        path
    }
}

/// Pull-based source of file-diff records.
///
/// `Ok(None)` is end of stream. An `Err` describes a single record that
/// could not be read; callers log it and keep reading.
pub trait DiffSource {
    fn read_next(&mut self) -> Result<Option<FileDiffRecord>>;
}

/// In-memory [`DiffSource`] over pre-built records (or errors).
#[derive(Debug, Default)]
pub struct VecSource {
    items: VecDeque<Result<FileDiffRecord>>,
}

impl VecSource {
    pub fn new(records: Vec<FileDiffRecord>) -> Self {
        Self {
            items: records.into_iter().map(Ok).collect(),
        }
    }

    pub fn with_results(items: Vec<Result<FileDiffRecord>>) -> Self {
        Self {
            items: items.into(),
        }
    }
}

impl DiffSource for VecSource {
    fn read_next(&mut self) -> Result<Option<FileDiffRecord>> {
        self.items.pop_front().transpose()
    }
}
