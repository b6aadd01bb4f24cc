//! Workbook reading
//!
//! - [`XlsxWorkbookReader`]: cell values and merged regions via calamine,
//!   column outline levels from the worksheet XML
//! - [`CachedReader`]: get-or-compute cache keyed by (file path, sheet name)

mod cache;
mod importer;
pub mod outline;

use crate::error::FlattenResult;
use crate::types::SheetData;
use std::path::Path;

pub use cache::CachedReader;
pub use importer::{convert_cell, XlsxWorkbookReader};

/// Source of raw sheet data
pub trait WorkbookReader {
    /// Load the grid, merged regions and column outline of one sheet
    fn load_sheet(&mut self, path: &Path, sheet: &str) -> FlattenResult<SheetData>;
}
