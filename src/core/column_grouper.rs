//! Column partitioning from outline (grouping) metadata
//!
//! Produces an ordered, gap-free, non-overlapping set of column ranges that
//! covers every grid column exactly once. Columns inside an outline group
//! share a range; every other column gets a singleton range.

use crate::types::{GroupedRange, OutlineSpan};
use tracing::{debug, warn};

/// Deepest outline level that is interpreted
pub const MAX_OUTLINE_LEVEL: u8 = 2;

/// Partition `[0, col_count)` using 1-based outline spans.
pub fn partition_columns(outline: &[OutlineSpan], col_count: usize) -> Vec<GroupedRange> {
    let mut level1 = Vec::new();
    let mut level2 = Vec::new();
    let mut deepest_ignored = 0u8;

    for span in outline {
        if span.min == 0 || span.min > span.max {
            debug!(?span, "skipping malformed outline span");
            continue;
        }
        match span.level {
            0 => {}
            1 => level1.push((span.min, span.max)),
            2 => level2.push((span.min, span.max)),
            level => deepest_ignored = deepest_ignored.max(level),
        }
    }
    if deepest_ignored > MAX_OUTLINE_LEVEL {
        warn!(
            level = deepest_ignored,
            "outline nesting deeper than {} levels is unsupported; ignoring deeper groups",
            MAX_OUTLINE_LEVEL
        );
    }

    let level1 = merge_ranges(level1);
    let groups = if level2.is_empty() {
        level1
    } else {
        absorb_boundary_columns(merge_ranges(level2), level1)
    };

    let grouped: Vec<GroupedRange> = groups
        .into_iter()
        .filter_map(|(min, max)| {
            let (min, max) = (min - 1, max - 1);
            (min < col_count).then(|| (min, max.min(col_count - 1)))
        })
        .enumerate()
        .map(|(owner, (min, max))| GroupedRange::new(min, max, Some(owner)))
        .collect();

    fill_gaps(grouped, col_count)
}

/// Sort ranges by start and merge the ones that touch or overlap.
pub fn merge_ranges(mut ranges: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    ranges.sort_unstable();
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (min, max) in ranges {
        match merged.last_mut() {
            Some(last) if last.1 + 1 >= min => last.1 = last.1.max(max),
            _ => merged.push((min, max)),
        }
    }
    merged
}

/// Level-2 ranges take over the level-1 singleton right after them (the
/// level-1 summary column of that sub-group). Result is sorted and disjoint.
fn absorb_boundary_columns(
    level2: Vec<(usize, usize)>,
    mut level1: Vec<(usize, usize)>,
) -> Vec<(usize, usize)> {
    let mut combined = Vec::with_capacity(level2.len() + level1.len());
    for (min, mut max) in level2 {
        if let Some(pos) = level1
            .iter()
            .position(|&(l1_min, l1_max)| l1_min == max + 1 && l1_min == l1_max)
        {
            let (_, absorbed) = level1.remove(pos);
            debug!(column = absorbed, "level-2 group absorbs level-1 boundary column");
            max = absorbed;
        }
        combined.push((min, max));
    }
    combined.extend(level1);
    combined.sort_unstable();

    let mut disjoint: Vec<(usize, usize)> = Vec::with_capacity(combined.len());
    for (min, max) in combined {
        let start = match disjoint.last() {
            Some(&(_, prev_max)) => min.max(prev_max + 1),
            None => min,
        };
        if start <= max {
            disjoint.push((start, max));
        }
    }
    disjoint
}

/// Insert singleton ranges for columns not covered by any group.
fn fill_gaps(grouped: Vec<GroupedRange>, col_count: usize) -> Vec<GroupedRange> {
    let mut partition = Vec::with_capacity(col_count);
    let mut next = 0;
    for range in grouped {
        partition.extend((next..range.min).map(GroupedRange::singleton));
        next = range.max + 1;
        partition.push(range);
    }
    partition.extend((next..col_count).map(GroupedRange::singleton));
    partition
}
