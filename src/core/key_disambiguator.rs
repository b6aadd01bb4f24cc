//! Unique column keys from header paths
//!
//! Header paths are joined into keys as-is whenever that is already
//! unambiguous. A column group whose paths collide with paths elsewhere in
//! the sheet gets a group token spliced in right after the group's common
//! head, e.g. `Fund->G3->Name` instead of `Fund->Name`.

use crate::error::{FlattenError, FlattenResult};
use crate::types::{GroupedRange, HeaderPath};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub const DEFAULT_SEPARATOR: &str = "->";
pub const DEFAULT_GROUP_TOKEN_PREFIX: &str = "G";

/// Joins header paths into unique column keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDisambiguator {
    separator: String,
    token_prefix: String,
}

impl Default for KeyDisambiguator {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR, DEFAULT_GROUP_TOKEN_PREFIX)
    }
}

impl KeyDisambiguator {
    pub fn new(separator: impl Into<String>, token_prefix: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            token_prefix: token_prefix.into(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Token for the range at `index` in the partition
    pub fn group_token(&self, index: usize) -> String {
        format!("{}{}", self.token_prefix, index)
    }

    /// One key per column of `paths`, in column order.
    ///
    /// `partition` must cover every column exactly once, in ascending order.
    /// Fails with [`FlattenError::StructuralAmbiguity`] if the keys still
    /// contain duplicates after tagging.
    pub fn disambiguate(
        &self,
        paths: &[HeaderPath],
        partition: &[GroupedRange],
    ) -> FlattenResult<Vec<String>> {
        check_partition(partition, paths.len())?;

        let global = occurrences(paths.iter());
        let mut keys = Vec::with_capacity(paths.len());

        for (index, range) in partition.iter().enumerate() {
            let slice = &paths[range.min..=range.max];
            let local = occurrences(slice.iter());
            let collides_outside = slice.iter().any(|path| global[path] > local[path]);
            let tagged = tag_repeats(slice);

            if !collides_outside {
                keys.extend(tagged.iter().map(|path| path.join(&self.separator)));
                continue;
            }

            let token = self.group_token(index);
            let (head, tails) = split_common_head(&tagged);
            debug!(
                columns = ?range.columns(),
                token = %token,
                head = ?head,
                "header paths collide outside their group; tagging"
            );
            for tail in tails {
                let parts: Vec<&str> = head
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(token.as_str()))
                    .chain(tail.iter().map(String::as_str))
                    .collect();
                keys.push(parts.join(&self.separator));
            }
        }

        ensure_unique(keys)
    }
}

/// Longest common head of `paths` and the remaining tail of each path.
///
/// Stops at the first position where the paths disagree or any path runs
/// out, so an empty path anywhere means an empty head.
pub fn split_common_head(paths: &[HeaderPath]) -> (&[String], Vec<&[String]>) {
    let Some(first) = paths.first() else {
        return (&[], Vec::new());
    };
    let mut len = 0;
    while len < first.len()
        && paths
            .iter()
            .all(|path| path.get(len).is_some_and(|part| *part == first[len]))
    {
        len += 1;
    }
    let tails = paths.iter().map(|path| &path[len..]).collect();
    (&first[..len], tails)
}

fn occurrences<'a>(paths: impl Iterator<Item = &'a HeaderPath>) -> HashMap<&'a HeaderPath, usize> {
    let mut counts = HashMap::new();
    for path in paths {
        *counts.entry(path).or_insert(0) += 1;
    }
    counts
}

/// Repeated paths within one group get an occurrence marker (`#2`, `#3`, ...)
/// so they can never merge; first occurrences are left alone.
fn tag_repeats(slice: &[HeaderPath]) -> Vec<HeaderPath> {
    let mut seen: HashMap<&HeaderPath, usize> = HashMap::new();
    slice
        .iter()
        .map(|path| {
            let n = seen.entry(path).or_insert(0);
            *n += 1;
            let mut tagged = path.clone();
            if *n > 1 {
                tagged.push(format!("#{}", n));
            }
            tagged
        })
        .collect()
}

fn check_partition(partition: &[GroupedRange], columns: usize) -> FlattenResult<()> {
    let mut next = 0;
    for range in partition {
        if range.min != next || range.max < range.min {
            return Err(FlattenError::InvalidPartition { columns });
        }
        next = range.max + 1;
    }
    if next != columns {
        return Err(FlattenError::InvalidPartition { columns });
    }
    Ok(())
}

fn ensure_unique(keys: Vec<String>) -> FlattenResult<Vec<String>> {
    let mut seen = BTreeSet::new();
    let duplicates: BTreeSet<&String> = keys.iter().filter(|key| !seen.insert(*key)).collect();
    if duplicates.is_empty() {
        return Ok(keys);
    }
    Err(FlattenError::StructuralAmbiguity {
        duplicates: duplicates.into_iter().cloned().collect(),
        keys: keys.clone(),
    })
}
