//! Batch configuration
//!
//! A batch file lists the sheets to flatten plus a few output options:
//!
//! ```yaml
//! output_dir: json
//! separator: "->"
//! sheets:
//!   - file: workbook/Annual fund-level superannuation statistics June 2020.xlsx
//!     sheet: Table 1
//!     value_start_row: 8
//!     drop_rows: [7]
//! ```

use crate::core::key_disambiguator::{DEFAULT_GROUP_TOKEN_PREFIX, DEFAULT_SEPARATOR};
use crate::core::{FlattenOptions, KeyDisambiguator};
use crate::error::{FlattenError, FlattenResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One sheet to flatten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSpec {
    /// Workbook path
    pub file: PathBuf,
    /// Worksheet name
    pub sheet: String,
    /// Number of header rows above the first data row (zero-based index of
    /// the first data row)
    pub value_start_row: usize,
    /// Zero-based rows to remove before header counting is finalized
    #[serde(default)]
    pub drop_rows: Vec<usize>,
    /// Clamp the data extent to this many rows. When unset the table ends at
    /// the first row at or below `value_start_row` whose first cell is blank.
    #[serde(default)]
    pub max_row: Option<usize>,
    /// Clamp the data extent to this many columns
    #[serde(default)]
    pub max_col: Option<usize>,
    /// Per-sheet override of [`BatchConfig::drop_empty_columns`]
    #[serde(default)]
    pub drop_empty_columns: Option<bool>,
}

impl SheetSpec {
    pub fn new(file: impl Into<PathBuf>, sheet: impl Into<String>, value_start_row: usize) -> Self {
        Self {
            file: file.into(),
            sheet: sheet.into(),
            value_start_row,
            drop_rows: Vec::new(),
            max_row: None,
            max_col: None,
            drop_empty_columns: None,
        }
    }

    pub fn with_drop_rows(mut self, rows: Vec<usize>) -> Self {
        self.drop_rows = rows;
        self
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_token_prefix() -> String {
    DEFAULT_GROUP_TOKEN_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

/// Parsed batch file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default = "default_token_prefix")]
    pub group_token_prefix: String,
    #[serde(default = "default_true")]
    pub drop_empty_columns: bool,
    #[serde(default = "default_true")]
    pub pretty: bool,
    pub sheets: Vec<SheetSpec>,
}

impl BatchConfig {
    /// Options shared by every sheet of the batch
    pub fn options(&self) -> FlattenOptions {
        FlattenOptions {
            disambiguator: KeyDisambiguator::new(&self.separator, &self.group_token_prefix),
            drop_empty_columns: self.drop_empty_columns,
        }
    }

    fn validate(&self) -> FlattenResult<()> {
        if self.sheets.is_empty() {
            return Err(parse_error("batch lists no sheets"));
        }
        if self.separator.is_empty() {
            return Err(parse_error("separator must not be empty"));
        }
        if let Some(spec) = self.sheets.iter().find(|s| s.sheet.trim().is_empty()) {
            return Err(parse_error(&format!(
                "sheet entry for '{}' has an empty sheet name",
                spec.file.display()
            )));
        }
        Ok(())
    }

    /// Resolve relative paths against `base_dir`
    fn resolve_paths(&mut self, base_dir: &Path) {
        if self.output_dir.is_relative() {
            self.output_dir = base_dir.join(&self.output_dir);
        }
        for spec in &mut self.sheets {
            if spec.file.is_relative() {
                spec.file = base_dir.join(&spec.file);
            }
        }
    }
}

fn parse_error(message: &str) -> FlattenError {
    FlattenError::Parse(message.to_string())
}

/// Parse batch configuration text; paths are left as written.
pub fn parse_batch_str(content: &str) -> FlattenResult<BatchConfig> {
    let config: BatchConfig = serde_yaml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load a batch file, resolving relative paths against its directory.
pub fn parse_batch(path: &Path) -> FlattenResult<BatchConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_batch_str(&content)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base_dir);
    Ok(config)
}
