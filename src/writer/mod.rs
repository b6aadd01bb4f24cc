//! Record sinks: where flattened tables go
//!
//! [`JsonFileSink`] writes one JSON array of flat objects per sheet, named
//! after the source workbook and sheet.

use crate::error::FlattenResult;
use crate::parser::SheetSpec;
use crate::types::FlatTable;
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::info;

/// Destination for flattened tables
pub trait RecordSink {
    /// Persist `table` for `spec`, returning where it went
    fn write(&mut self, spec: &SheetSpec, table: &FlatTable) -> FlattenResult<PathBuf>;

    /// Where `write` would put `spec`, if known up front. Batches use this to
    /// refuse a second sheet that maps onto an already written output.
    fn destination(&self, _spec: &SheetSpec) -> Option<PathBuf> {
        None
    }
}

/// Writes `<output_dir>/<workbook stem>__<sheet>.json`
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    output_dir: PathBuf,
    pretty: bool,
}

impl JsonFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            pretty: true,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Output path for a sheet spec
    pub fn output_path(&self, spec: &SheetSpec) -> PathBuf {
        let stem = spec
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.output_dir.join(format!(
            "{}__{}.json",
            sanitize_component(&stem),
            sanitize_component(&spec.sheet)
        ))
    }
}

impl RecordSink for JsonFileSink {
    fn write(&mut self, spec: &SheetSpec, table: &FlatTable) -> FlattenResult<PathBuf> {
        let path = self.output_path(spec);
        fs::create_dir_all(&self.output_dir)?;
        let json = if self.pretty {
            serde_json::to_string_pretty(table)?
        } else {
            serde_json::to_string(table)?
        };
        fs::write(&path, json)?;
        info!(
            path = %path.display(),
            rows = table.row_count(),
            cols = table.col_count(),
            "wrote records"
        );
        Ok(path)
    }

    fn destination(&self, spec: &SheetSpec) -> Option<PathBuf> {
        Some(self.output_path(spec))
    }
}

/// File-name-safe version of a workbook or sheet name
pub fn sanitize_component(name: &str) -> String {
    static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars =
        UNSAFE_CHARS.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));
    let cleaned = unsafe_chars.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches(|c: char| c == '_' || c == '.');
    if cleaned.is_empty() {
        "sheet".to_string()
    } else {
        cleaned.to_string()
    }
}
