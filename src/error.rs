use std::path::PathBuf;
use thiserror::Error;

pub type FlattenResult<T> = Result<T, FlattenError>;

#[derive(Error, Debug)]
pub enum FlattenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Workbook archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Worksheet XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Configuration error in sheet '{sheet}': {message}")]
    Configuration { sheet: String, message: String },

    /// Header paths could not be turned into a unique key set.
    #[error("Ambiguous column keys {duplicates:?} (all keys: {keys:?})")]
    StructuralAmbiguity {
        duplicates: Vec<String>,
        keys: Vec<String>,
    },

    #[error("Column partition does not cover {columns} columns exactly once")]
    InvalidPartition { columns: usize },

    /// A batch would overwrite the output of an earlier sheet.
    #[error("Output '{}' was already written by {previous}", path.display())]
    OutputCollision { path: PathBuf, previous: String },

    #[error("{sheet} in {}: {source}", file.display())]
    Sheet {
        file: PathBuf,
        sheet: String,
        #[source]
        source: Box<FlattenError>,
    },
}

impl FlattenError {
    /// Attach the file and sheet a whole-sheet failure happened in.
    pub fn in_sheet(self, file: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        match self {
            already @ FlattenError::Sheet { .. } => already,
            other => FlattenError::Sheet {
                file: file.into(),
                sheet: sheet.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with any sheet context stripped.
    pub fn root(&self) -> &FlattenError {
        match self {
            FlattenError::Sheet { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<calamine::XlsxError> for FlattenError {
    fn from(e: calamine::XlsxError) -> Self {
        FlattenError::Workbook(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for FlattenError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        FlattenError::Xml(e.into())
    }
}
