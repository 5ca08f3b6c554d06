// src/matching.rs

//! Interval matching between two sorted sequences of line ranges.
//!
//! The engine compares the changed ranges of a diff against the ranges a
//! watcher is configured for. Both sides are sorted by start line, so a
//! two-pointer merge finds the first overlapping pair in `O(n + m)`.
//!
//! The merge assumes each input is sorted by start and that a sequence's
//! own ranges do not overlap one another. Diff ranges satisfy that by
//! construction. Watcher ranges come from hand-written config and may not, so
//! [`find_first_overlap`] checks the precondition and falls back to a
//! pairwise sweep when it does not hold.

use tracing::debug;

use crate::types::LineRange;

/// Two-pointer merge returning the indices `(i, j)` of the first overlapping
/// pair `a[i]`, `b[j]`, or `None` once either sequence is exhausted.
///
/// Symmetric: `find_overlap_indices(b, a)` reports the same pair, swapped.
pub fn find_overlap_indices(a: &[LineRange], b: &[LineRange]) -> Option<(usize, usize)> {
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        let (left, right) = (&a[i], &b[j]);

        if right.start() >= left.start() {
            // `right` starts inside `left`.
            if right.start() <= left.end() {
                return Some((i, j));
            }
            // `left` ends before `right` starts; later `right`s start even later.
            i += 1;
            continue;
        }

        // `right` starts first; overlap if its end reaches into `left`.
        if right.end() >= left.start() {
            return Some((i, j));
        }
        j += 1;
    }

    None
}

/// Like [`find_overlap_indices`] but returns the ranges themselves.
pub fn find_overlap(a: &[LineRange], b: &[LineRange]) -> Option<(LineRange, LineRange)> {
    find_overlap_indices(a, b).map(|(i, j)| (a[i], b[j]))
}

/// True if `ranges` is sorted by start and no two ranges overlap.
pub fn is_disjoint_sorted(ranges: &[LineRange]) -> bool {
    ranges
        .windows(2)
        .all(|w| w[0].start() <= w[1].start() && w[0].end() < w[1].start())
}

/// Pairwise `O(n * m)` scan. Returns the first pair in `a`-major order.
pub fn find_overlap_pairwise(a: &[LineRange], b: &[LineRange]) -> Option<(usize, usize)> {
    a.iter().enumerate().find_map(|(i, left)| {
        b.iter()
            .position(|right| left.overlaps(right))
            .map(|j| (i, j))
    })
}

/// Find the first overlapping pair, using the two-pointer merge when both
/// inputs meet its precondition and the pairwise scan otherwise.
///
/// Both inputs must already be sorted by start.
pub fn find_first_overlap(a: &[LineRange], b: &[LineRange]) -> Option<(usize, usize)> {
    if is_disjoint_sorted(a) && is_disjoint_sorted(b) {
        return find_overlap_indices(a, b);
    }

    debug!(
        left = a.len(),
        right = b.len(),
        "ranges overlap within one side; using pairwise scan"
    );
    find_overlap_pairwise(a, b)
}
