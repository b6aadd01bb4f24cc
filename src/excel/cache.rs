use crate::error::FlattenResult;
use crate::excel::WorkbookReader;
use crate::types::SheetData;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wraps a reader so each (file, sheet) pair is parsed at most once per
/// process. Callers always get their own copy of the sheet data. Failed loads
/// are not cached.
#[derive(Debug, Default)]
pub struct CachedReader<R> {
    inner: R,
    sheets: HashMap<(PathBuf, String), SheetData>,
}

impl<R: WorkbookReader> CachedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            sheets: HashMap::new(),
        }
    }

    /// Number of distinct sheets held
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: WorkbookReader> WorkbookReader for CachedReader<R> {
    fn load_sheet(&mut self, path: &Path, sheet: &str) -> FlattenResult<SheetData> {
        let key = (path.to_path_buf(), sheet.to_string());
        if let Some(data) = self.sheets.get(&key) {
            debug!(file = %path.display(), sheet, "sheet cache hit");
            return Ok(data.clone());
        }
        let data = self.inner.load_sheet(path, sheet)?;
        self.sheets.insert(key, data.clone());
        Ok(data)
    }
}
