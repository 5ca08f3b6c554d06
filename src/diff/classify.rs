// src/diff/classify.rs

//! Structural facts about a file-diff record.
//!
//! All checks are O(1) on the record's paths and flags, so the engine runs
//! them before any range matching.

use super::{DEV_NULL, FileDiffRecord, strip_marker};

/// The file no longer exists on the new side.
pub fn deleted(record: &FileDiffRecord) -> bool {
    record.new_name == DEV_NULL
}

/// The file name changed (directory changes alone are a move).
pub fn renamed(record: &FileDiffRecord) -> bool {
    base_name(&record.orig_name) != base_name(&record.new_name) && !deleted(record)
}

/// The file's directory changed.
pub fn moved(record: &FileDiffRecord) -> bool {
    dir_name(strip_marker(&record.orig_name)) != dir_name(strip_marker(&record.new_name))
        && !deleted(record)
}

pub fn permission_changed(record: &FileDiffRecord) -> bool {
    record.permission_changed
}

fn base_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, base)| base)
}

fn dir_name(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(orig: &str, new: &str) -> FileDiffRecord {
        FileDiffRecord::new(orig, new)
    }

    #[test]
    fn same_name_other_directory_is_a_move_not_a_rename() {
        let r = rec("a/lib/x.go", "b/pkg/x.go");
        assert!(moved(&r));
        assert!(!renamed(&r));
    }

    #[test]
    fn top_level_file_moved_into_directory() {
        let r = rec("a/x.go", "b/cmd/x.go");
        assert!(moved(&r));
    }

    #[test]
    fn markers_alone_are_not_a_move() {
        assert!(!moved(&rec("a/src/x.go", "b/src/x.go")));
        assert!(!moved(&rec("a/x.go", "b/x.go")));
    }

    #[test]
    fn deletion_is_neither_rename_nor_move() {
        let r = rec("a/src/x.go", DEV_NULL);
        assert!(deleted(&r));
        assert!(!renamed(&r));
        assert!(!moved(&r));
    }
}
