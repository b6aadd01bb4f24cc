//! Per-column header paths

use crate::types::{Grid, HeaderPath};

/// Read the first `header_rows` rows of every column, top to bottom, keeping
/// only the non-blank values. Expects merged regions to be filled already.
pub fn build_header_paths(grid: &Grid, header_rows: usize) -> Vec<HeaderPath> {
    let header_rows = header_rows.min(grid.row_count());
    (0..grid.col_count())
        .map(|col| {
            (0..header_rows)
                .filter_map(|row| grid.get(row, col).and_then(|cell| cell.header_text()))
                .collect()
        })
        .collect()
}
