// src/diff/reader.rs

//! Unified diff reader.
//!
//! Turns `git diff` / `diff -u` output into [`FileDiffRecord`]s, one record
//! per call to [`DiffSource::read_next`]. Understands:
//!
//! - `diff --git a/<path> b/<path>` headers and the extended headers that
//!   follow (`old mode`/`new mode`, `new file mode`, `deleted file mode`,
//!   `rename from`/`rename to`; anything else such as `index` is skipped),
//! - `---` / `+++` file headers, including `/dev/null` and trailing
//!   timestamps,
//! - `@@ -a,b +c,d @@ section` hunks and their bodies.
//!
//! A malformed record is reported as [`ChangelinkError::MalformedDiff`] and the
//! reader moves on to the next `diff` header, so one bad entry does not end
//! the stream. An I/O error ends the stream after it is reported.
//!
//! Lines are decoded lossily: hunk bodies from non-UTF-8 sources keep their
//! shape (and line counts) with invalid bytes replaced.

use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::{DEV_NULL, DiffSource, FileDiffRecord, Hunk};
use crate::errors::{ChangelinkError, Result};

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@ ?(.*)$")
        .expect("hunk header regex is valid")
});

pub struct DiffReader<R> {
    reader: R,
    buf: Vec<u8>,
    peeked: Option<String>,
    /// 1-based number of the last line handed out by `next_line`.
    line_no: usize,
    done: bool,
}

impl<R: BufRead> DiffReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            peeked: None,
            line_no: 0,
            done: false,
        }
    }

    fn fill_peek(&mut self) -> Result<()> {
        if self.peeked.is_none() && !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => self.peeked = Some(decode_line(&self.buf)),
                Err(err) => {
                    self.done = true;
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    fn peek_line(&mut self) -> Result<Option<&str>> {
        self.fill_peek()?;
        Ok(self.peeked.as_deref())
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        self.fill_peek()?;
        let line = self.peeked.take();
        if line.is_some() {
            self.line_no += 1;
        }
        Ok(line)
    }

    fn malformed(&self, reason: impl Into<String>) -> ChangelinkError {
        ChangelinkError::MalformedDiff {
            line: self.line_no,
            reason: reason.into(),
        }
    }

    /// Drop lines until the next record header (or end of input).
    fn skip_to_next_record(&mut self) -> Result<()> {
        while let Some(line) = self.peek_line()? {
            if is_record_start(line) {
                break;
            }
            self.next_line()?;
        }
        Ok(())
    }

    fn parse_record(&mut self) -> Result<FileDiffRecord> {
        let mut record = FileDiffRecord::default();

        if self.peek_line()?.is_some_and(|l| l.starts_with("diff ")) {
            let header = self.next_line()?.unwrap_or_default();
            if let Some(rest) = header.strip_prefix("diff --git ") {
                if let Some((orig, new)) = split_git_header(rest) {
                    record.orig_name = orig;
                    record.new_name = new;
                }
            }
            self.parse_extended_headers(&mut record)?;
        }

        if self.peek_line()?.is_some_and(|l| l.starts_with("--- ")) {
            let orig = self.next_line()?.unwrap_or_default();
            record.orig_name = file_header_path(&orig["--- ".len()..]);

            let new = match self.next_line()? {
                Some(line) if line.starts_with("+++ ") => line,
                _ => return Err(self.malformed("expected '+++' after '---'")),
            };
            record.new_name = file_header_path(&new["+++ ".len()..]);
        }

        if record.orig_name.is_empty() || record.new_name.is_empty() {
            return Err(self.malformed("missing file names"));
        }

        while self.peek_line()?.is_some_and(|l| l.starts_with("@@")) {
            let hunk = self.parse_hunk()?;
            record.hunks.push(hunk);
        }

        trace!(
            orig = %record.orig_name,
            new = %record.new_name,
            hunks = record.hunks.len(),
            "parsed file diff"
        );
        Ok(record)
    }

    fn parse_extended_headers(&mut self, record: &mut FileDiffRecord) -> Result<()> {
        let mut old_mode: Option<String> = None;
        let mut new_mode: Option<String> = None;

        while let Some(line) = self.peek_line()? {
            if line.starts_with("--- ") || line.starts_with("@@") || line.starts_with("diff ") {
                break;
            }
            let line = self.next_line()?.unwrap_or_default();

            if let Some(mode) = line.strip_prefix("old mode ") {
                old_mode = Some(mode.trim().to_string());
            } else if let Some(mode) = line.strip_prefix("new mode ") {
                new_mode = Some(mode.trim().to_string());
            } else if line.starts_with("deleted file mode") {
                record.new_name = DEV_NULL.to_string();
            } else if line.starts_with("new file mode") {
                record.orig_name = DEV_NULL.to_string();
            } else if let Some(path) = line.strip_prefix("rename from ") {
                record.orig_name = format!("a/{}", unquote(path.trim()));
            } else if let Some(path) = line.strip_prefix("rename to ") {
                record.new_name = format!("b/{}", unquote(path.trim()));
            }
        }

        if let (Some(old), Some(new)) = (old_mode, new_mode) {
            record.permission_changed = old != new;
        }
        Ok(())
    }

    fn parse_hunk(&mut self) -> Result<Hunk> {
        let header = self.next_line()?.unwrap_or_default();
        let caps = HUNK_HEADER
            .captures(&header)
            .ok_or_else(|| self.malformed(format!("invalid hunk header {header:?}")))?;
        let header_line = self.line_no;

        // A missing count means one line.
        let number = |idx: usize, default: u32| -> Result<u32> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse().map_err(|e| ChangelinkError::MalformedDiff {
                    line: header_line,
                    reason: format!("invalid number in hunk header: {e}"),
                }),
                None => Ok(default),
            }
        };
        let orig_start = number(1, 0)?;
        let orig_lines = number(2, 1)?;
        let new_start = number(3, 0)?;
        let new_lines = number(4, 1)?;
        let section = caps
            .get(5)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let mut remaining_orig = orig_lines;
        let mut remaining_new = new_lines;
        let mut body: Vec<String> = Vec::new();
        let mut seen_change = false;
        let mut context_before = 0u32;
        let mut context_after = 0u32;

        while remaining_orig > 0 || remaining_new > 0 {
            // Peek first so a truncated hunk leaves the next header unread.
            match self.peek_line()?.map(|l| l.chars().next()) {
                None => return Err(self.malformed("unexpected end of input inside hunk")),
                Some(Some(' ' | '-' | '+' | '\\') | None) => {}
                Some(Some(_)) => {
                    let line = self.peeked.clone().unwrap_or_default();
                    return Err(self.malformed(format!("unexpected line in hunk: {line:?}")));
                }
            }
            let line = self.next_line()?.unwrap_or_default();

            match line.chars().next() {
                // Some tools strip the trailing space of blank context lines.
                Some(' ') | None => {
                    if remaining_orig == 0 || remaining_new == 0 {
                        return Err(self.malformed("hunk body longer than its header"));
                    }
                    remaining_orig -= 1;
                    remaining_new -= 1;
                    if seen_change {
                        context_after += 1;
                    } else {
                        context_before += 1;
                    }
                }
                Some('-') => {
                    if remaining_orig == 0 {
                        return Err(self.malformed("hunk removes more lines than its header"));
                    }
                    remaining_orig -= 1;
                    seen_change = true;
                    context_after = 0;
                }
                Some('+') => {
                    if remaining_new == 0 {
                        return Err(self.malformed("hunk adds more lines than its header"));
                    }
                    remaining_new -= 1;
                    seen_change = true;
                    context_after = 0;
                }
                _ => {}
            }
            body.push(line);
        }

        // "\ No newline at end of file" may trail the last counted line.
        if self.peek_line()?.is_some_and(|l| l.starts_with('\\')) {
            if let Some(line) = self.next_line()? {
                body.push(line);
            }
        }

        let hunk = Hunk {
            orig_start,
            orig_lines,
            new_start,
            new_lines,
            section,
            body: body.join("\n"),
            context_before,
            context_after,
        };

        if hunk.changed_range().is_none() {
            return Err(ChangelinkError::MalformedDiff {
                line: header_line,
                reason: "hunk context exceeds its length".to_string(),
            });
        }
        Ok(hunk)
    }
}

impl<R: BufRead> DiffSource for DiffReader<R> {
    fn read_next(&mut self) -> Result<Option<FileDiffRecord>> {
        // Skip preamble (commit messages, `index` lines of a broken record, ...).
        loop {
            match self.peek_line()? {
                None => return Ok(None),
                Some(line) if is_record_start(line) => break,
                Some(_) => {
                    self.next_line()?;
                }
            }
        }

        match self.parse_record() {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                self.skip_to_next_record()?;
                Err(err)
            }
        }
    }
}

/// One raw line without its `\n` / `\r\n` terminator.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

fn is_record_start(line: &str) -> bool {
    line.starts_with("diff ") || line.starts_with("--- ")
}

/// Split `a/<path> b/<path>` from a `diff --git` header.
fn split_git_header(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim();
    if let Some(idx) = rest.rfind(" b/") {
        return Some((unquote(&rest[..idx]), unquote(&rest[idx + 1..])));
    }
    rest.split_once(' ')
        .map(|(orig, new)| (unquote(orig), unquote(new)))
}

/// Path from a `---`/`+++` header, without any trailing timestamp.
fn file_header_path(rest: &str) -> String {
    let path = rest.split('\t').next().unwrap_or(rest);
    unquote(path.trim_end())
}

fn unquote(path: &str) -> String {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_terminators_are_stripped() {
        assert_eq!(decode_line(b"+a\r\n"), "+a");
        assert_eq!(decode_line(b"+a\n"), "+a");
        assert_eq!(decode_line(b"+a"), "+a");
        assert_eq!(decode_line(b"-caf\xE9\n"), "-caf\u{FFFD}");
    }
}
