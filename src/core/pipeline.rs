//! Sheet flattening pipeline
//!
//! Order of operations for one sheet:
//!
//! 1. clamp the grid to its real data extent (first blank row under the
//!    header, or `max_row`/`max_col`)
//! 2. validate the sheet spec against the grid
//! 3. fill merged regions
//! 4. drop configured rows and shrink the header-row count accordingly
//! 5. partition columns by outline group
//! 6. build header paths and disambiguate them into keys
//! 7. slice off the header rows and, optionally, all-blank columns

use crate::core::column_grouper::partition_columns;
use crate::core::header_paths::build_header_paths;
use crate::core::key_disambiguator::KeyDisambiguator;
use crate::core::region_filler::fill_regions;
use crate::error::{FlattenError, FlattenResult};
use crate::parser::SheetSpec;
use crate::types::{CellValue, FlatTable, Grid, GroupedRange, HeaderPath, SheetData};
use std::collections::BTreeSet;
use tracing::debug;

/// Options shared by all sheets of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOptions {
    pub disambiguator: KeyDisambiguator,
    pub drop_empty_columns: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            disambiguator: KeyDisambiguator::default(),
            drop_empty_columns: true,
        }
    }
}

/// Result of flattening one sheet.
///
/// `partition` and `header_paths` describe the sheet before blank columns
/// were dropped from `table`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedSheet {
    pub table: FlatTable,
    pub header_rows: usize,
    pub partition: Vec<GroupedRange>,
    pub header_paths: Vec<HeaderPath>,
    pub keys: Vec<String>,
}

/// Header-row count left after removing `drop_rows` from the sheet
pub fn effective_header_rows(header_rows: usize, drop_rows: &[usize]) -> usize {
    let dropped_in_header = drop_rows
        .iter()
        .filter(|row| **row < header_rows)
        .collect::<BTreeSet<_>>()
        .len();
    header_rows - dropped_in_header
}

/// Flatten one sheet's data according to its spec
pub fn flatten_sheet(
    data: SheetData,
    spec: &SheetSpec,
    options: &FlattenOptions,
) -> FlattenResult<FlattenedSheet> {
    let SheetData {
        mut grid,
        merged_regions,
        outline,
    } = data;

    clamp_extent(&mut grid, spec);
    validate_spec(&grid, spec)?;

    let filled = fill_regions(&mut grid, &merged_regions);
    debug!(
        sheet = %spec.sheet,
        rows = grid.row_count(),
        cols = grid.col_count(),
        regions = filled,
        "filled merged regions"
    );

    grid.remove_rows(&spec.drop_rows);
    let header_rows = effective_header_rows(spec.value_start_row, &spec.drop_rows);

    let partition = partition_columns(&outline, grid.col_count());
    let header_paths = build_header_paths(&grid, header_rows);
    let keys = options.disambiguator.disambiguate(&header_paths, &partition)?;

    let drop_empty = spec.drop_empty_columns.unwrap_or(options.drop_empty_columns);
    let blank: Vec<bool> = (0..grid.col_count())
        .map(|col| drop_empty && grid.column_is_blank(col, header_rows))
        .collect();
    let blank_columns: Vec<usize> = (0..blank.len()).filter(|col| blank[*col]).collect();
    if !blank_columns.is_empty() {
        debug!(sheet = %spec.sheet, columns = ?blank_columns, "dropping blank columns");
    }
    grid.remove_columns(&blank_columns);
    let table_keys: Vec<String> = keys
        .iter()
        .zip(&blank)
        .filter(|(_, is_blank)| !**is_blank)
        .map(|(key, _)| key.clone())
        .collect();

    let table = FlatTable {
        keys: table_keys,
        rows: grid.split_rows_at(header_rows),
    };

    Ok(FlattenedSheet {
        table,
        header_rows,
        partition,
        header_paths,
        keys,
    })
}

/// Trim trailing blanks, then cut the grid to `max_row`/`max_col`. Without
/// `max_row` the table ends at its first data row with a blank first cell,
/// which drops the notes and footnotes published under most tables.
fn clamp_extent(grid: &mut Grid, spec: &SheetSpec) {
    grid.trim_trailing_blank();
    let rows = match spec.max_row {
        Some(max_row) => max_row,
        None => {
            let end = table_end(grid, spec.value_start_row);
            if end < grid.row_count() {
                debug!(
                    sheet = %spec.sheet,
                    row = end,
                    discarded = grid.row_count() - end,
                    "table ends at first blank row"
                );
            }
            end
        }
    };
    let cols = spec.max_col.unwrap_or(usize::MAX);
    grid.truncate(rows, cols);
}

/// First row at or after `value_start_row` whose first column is blank
fn table_end(grid: &Grid, value_start_row: usize) -> usize {
    (value_start_row..grid.row_count())
        .find(|row| grid.get(*row, 0).map_or(true, CellValue::is_blank))
        .unwrap_or(grid.row_count())
}

fn validate_spec(grid: &Grid, spec: &SheetSpec) -> FlattenResult<()> {
    let rows = grid.row_count();
    let config_error = |message: String| FlattenError::Configuration {
        sheet: spec.sheet.clone(),
        message,
    };
    if spec.value_start_row > rows {
        return Err(config_error(format!(
            "value_start_row {} exceeds the {} rows of data",
            spec.value_start_row, rows
        )));
    }
    let missing: Vec<usize> = spec
        .drop_rows
        .iter()
        .copied()
        .filter(|row| *row >= rows)
        .collect();
    if !missing.is_empty() {
        return Err(config_error(format!(
            "drop_rows {:?} do not exist (sheet has {} rows)",
            missing, rows
        )));
    }
    Ok(())
}
