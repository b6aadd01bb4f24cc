//! Excel (.xlsx) sheet loading

use crate::error::{FlattenError, FlattenResult};
use crate::excel::outline::read_column_outline;
use crate::excel::WorkbookReader;
use crate::types::{CellValue, Grid, MergedRegion, SheetData};
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::path::Path;
use tracing::debug;

/// Reads sheets from .xlsx workbooks on disk
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxWorkbookReader;

impl XlsxWorkbookReader {
    pub fn new() -> Self {
        Self
    }
}

impl WorkbookReader for XlsxWorkbookReader {
    fn load_sheet(&mut self, path: &Path, sheet: &str) -> FlattenResult<SheetData> {
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| {
            FlattenError::Workbook(format!(
                "Failed to open Excel file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let sheet_names = workbook.sheet_names();
        if !sheet_names.iter().any(|name| name == sheet) {
            return Err(FlattenError::Workbook(format!(
                "Sheet '{}' not found in '{}' (available: {})",
                sheet,
                path.display(),
                sheet_names.join(", ")
            )));
        }

        let range = workbook.worksheet_range(sheet)?;
        let grid = range_to_grid(&range);

        workbook.load_merged_regions()?;
        let merged_regions: Vec<MergedRegion> = workbook
            .merged_regions_by_sheet(sheet)
            .into_iter()
            .map(|(_, _, dims)| {
                MergedRegion::new(
                    dims.start.1 as usize,
                    dims.start.0 as usize,
                    dims.end.1 as usize,
                    dims.end.0 as usize,
                )
            })
            .collect();

        let outline = read_column_outline(path, sheet)?;

        debug!(
            file = %path.display(),
            sheet,
            rows = grid.row_count(),
            cols = grid.col_count(),
            merged = merged_regions.len(),
            outline_spans = outline.len(),
            "loaded sheet"
        );

        Ok(SheetData {
            grid,
            merged_regions,
            outline,
        })
    }
}

/// Dense grid anchored at A1.
///
/// calamine ranges start at the first used cell, so leading empty rows and
/// columns have to be put back for sheet coordinates to line up.
fn range_to_grid(range: &Range<Data>) -> Grid {
    let (Some((start_row, start_col)), Some((end_row, end_col))) = (range.start(), range.end())
    else {
        return Grid::default();
    };
    let mut grid = Grid::new(end_row as usize + 1, end_col as usize + 1);
    for (row, col, data) in range.used_cells() {
        grid.set(
            start_row as usize + row,
            start_col as usize + col,
            convert_cell(data),
        );
    }
    grid
}

/// Map a calamine cell onto the pipeline's value model
pub fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // Serial date number, as the sheet stores it
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
