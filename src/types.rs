use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ChangelinkError, Result};

/// Closed line interval `[start, end]`.
///
/// Used both for the changed region of a diff hunk and for a watched region
/// of a file. Two ranges sharing a single boundary line overlap.
///
/// Persisted as `{ start_line = .., end_line = .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLineRange", into = "RawLineRange")]
pub struct LineRange {
    start: u32,
    end: u32,
}

#[derive(Serialize, Deserialize)]
struct RawLineRange {
    start_line: u32,
    end_line: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > end {
            return Err(ChangelinkError::ConfigError(format!(
                "line range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// A one-line range.
    pub fn line(line: u32) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn overlaps(&self, other: &LineRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl TryFrom<RawLineRange> for LineRange {
    type Error = ChangelinkError;

    fn try_from(raw: RawLineRange) -> Result<Self> {
        LineRange::new(raw.start_line, raw.end_line)
    }
}

impl From<LineRange> for RawLineRange {
    fn from(range: LineRange) -> Self {
        Self {
            start_line: range.start,
            end_line: range.end,
        }
    }
}

/// Serialization formats understood for watcher documents and action lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Yaml,
    Json,
    /// MessagePack with named fields; the document-database binary format.
    MsgPack,
}

impl DocumentFormat {
    /// Pick a format from a file extension. Unknown extensions are an error
    /// rather than a silent TOML fallback.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse().map_err(ChangelinkError::ConfigError)
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "toml" => Ok(DocumentFormat::Toml),
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            "json" => Ok(DocumentFormat::Json),
            "msgpack" | "mpk" => Ok(DocumentFormat::MsgPack),
            other => Err(format!(
                "unsupported document format: {other:?} (expected toml, yaml, json or msgpack)"
            )),
        }
    }
}
