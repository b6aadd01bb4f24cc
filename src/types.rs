use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;

//==============================================================================
// Cell values
//==============================================================================

/// A single cell as the pipeline sees it
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Empty cells and whitespace-only text both count as blank
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Header text for this cell, `None` when blank
    pub fn header_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Number(n) => Some(format_number(*n)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// Integral numbers render without a fractional part
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                serializer.serialize_i64(*n as i64)
            }
            CellValue::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

//==============================================================================
// Grid
//==============================================================================

/// Dense, rectangular, zero-based cell storage for one sheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
    cols: usize,
}

impl Grid {
    /// Create an all-empty grid
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: vec![vec![CellValue::Empty; cols]; rows],
            cols,
        }
    }

    /// Build a grid from ragged rows; short rows are padded with empty cells
    pub fn from_rows(mut rows: Vec<Vec<CellValue>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(cols, CellValue::Empty);
        }
        Self { rows, cols }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Write a cell; returns `false` when the position is outside the grid
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) -> bool {
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Remove the given row indices; indices outside the grid are ignored
    pub fn remove_rows(&mut self, indices: &[usize]) {
        let drop: BTreeSet<usize> = indices.iter().copied().collect();
        let mut index = 0;
        self.rows.retain(|_| {
            let keep = !drop.contains(&index);
            index += 1;
            keep
        });
    }

    /// Remove the given column indices; indices outside the grid are ignored
    pub fn remove_columns(&mut self, indices: &[usize]) {
        let drop: BTreeSet<usize> = indices.iter().copied().filter(|c| *c < self.cols).collect();
        if drop.is_empty() {
            return;
        }
        for row in &mut self.rows {
            let mut index = 0;
            row.retain(|_| {
                let keep = !drop.contains(&index);
                index += 1;
                keep
            });
        }
        self.cols -= drop.len();
    }

    /// Shrink the grid to at most `rows` × `cols`
    pub fn truncate(&mut self, rows: usize, cols: usize) {
        self.rows.truncate(rows);
        if cols < self.cols {
            for row in &mut self.rows {
                row.truncate(cols);
            }
            self.cols = cols;
        }
    }

    /// Drop trailing rows and columns that contain only blank cells
    pub fn trim_trailing_blank(&mut self) {
        while self
            .rows
            .last()
            .is_some_and(|row| row.iter().all(CellValue::is_blank))
        {
            self.rows.pop();
        }
        let used_cols = self
            .rows
            .iter()
            .filter_map(|row| row.iter().rposition(|cell| !cell.is_blank()))
            .max()
            .map_or(0, |last| last + 1);
        let rows = self.rows.len();
        self.truncate(rows, used_cols);
    }

    /// True when every cell of `col` from `from_row` down is blank
    pub fn column_is_blank(&self, col: usize, from_row: usize) -> bool {
        self.rows
            .iter()
            .skip(from_row)
            .all(|row| row.get(col).map_or(true, CellValue::is_blank))
    }

    /// Split off and return the rows from `at` onwards
    pub fn split_rows_at(mut self, at: usize) -> Vec<Vec<CellValue>> {
        let at = at.min(self.rows.len());
        self.rows.split_off(at)
    }
}

//==============================================================================
// Sheet structure
//==============================================================================

/// Merged-cell rectangle, zero-based and inclusive; the anchor is `(row_min, col_min)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub col_min: usize,
    pub row_min: usize,
    pub col_max: usize,
    pub row_max: usize,
}

impl MergedRegion {
    pub fn new(col_min: usize, row_min: usize, col_max: usize, row_max: usize) -> Self {
        Self {
            col_min,
            row_min,
            col_max,
            row_max,
        }
    }

    pub fn anchor(&self) -> (usize, usize) {
        (self.row_min, self.col_min)
    }

    pub fn is_inverted(&self) -> bool {
        self.col_min > self.col_max || self.row_min > self.row_max
    }
}

/// Outline metadata for a span of columns (1-based, inclusive), as stored in
/// the worksheet's `<col>` entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlineSpan {
    pub min: usize,
    pub max: usize,
    pub level: u8,
}

impl OutlineSpan {
    pub fn new(min: usize, max: usize, level: u8) -> Self {
        Self { min, max, level }
    }

    /// One span per grouped column from a zero-based per-column level list
    pub fn from_column_levels(levels: &[u8]) -> Vec<Self> {
        levels
            .iter()
            .enumerate()
            .filter(|(_, level)| **level > 0)
            .map(|(col, level)| Self::new(col + 1, col + 1, *level))
            .collect()
    }
}

/// Inclusive, zero-based span of columns sharing one outline group.
/// `owner` is the outline group ordinal; gap-filling singletons have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupedRange {
    pub min: usize,
    pub max: usize,
    pub owner: Option<usize>,
}

impl GroupedRange {
    pub fn new(min: usize, max: usize, owner: Option<usize>) -> Self {
        Self { min, max, owner }
    }

    pub fn singleton(col: usize) -> Self {
        Self::new(col, col, None)
    }

    pub fn columns(&self) -> std::ops::RangeInclusive<usize> {
        self.min..=self.max
    }
}

/// Non-blank header values of one column, top to bottom
pub type HeaderPath = Vec<String>;

/// Everything the pipeline needs from a workbook for one sheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetData {
    pub grid: Grid,
    pub merged_regions: Vec<MergedRegion>,
    pub outline: Vec<OutlineSpan>,
}

//==============================================================================
// Output
//==============================================================================

/// Flattened sheet: one key per column, data rows only.
///
/// Serializes as a JSON array of objects, keys in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatTable {
    pub keys: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl FlatTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.keys.len()
    }

    /// Values of the column with the given key
    pub fn column(&self, key: &str) -> Option<Vec<&CellValue>> {
        let idx = self.keys.iter().position(|k| k == key)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

struct Record<'a> {
    keys: &'a [String],
    values: &'a [CellValue],
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (key, value) in self.keys.iter().zip(self.values) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for FlatTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&Record {
                keys: &self.keys,
                values: row,
            })?;
        }
        seq.end()
    }
}
