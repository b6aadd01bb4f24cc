//! headerflat - flatten multi-row spreadsheet headers into record keys
//!
//! Human-formatted tables spread one column's meaning over several header
//! rows, merged cells and outline-grouped column blocks. This library turns
//! such a sheet into a flat table whose column keys are unique strings built
//! from each column's header path.
//!
//! # Features
//!
//! - Merged-region filling (every covered cell takes the anchor value)
//! - Column partitioning from outline levels 1 and 2
//! - Header path construction over the configured header rows
//! - Group-aware key disambiguation with a synthetic `G{n}` token
//! - .xlsx loading via calamine, JSON record output via serde_json
//! - YAML batch files with per-sheet failure isolation
//!
//! # Example
//!
//! ```no_run
//! use headerflat::core::{flatten_sheet, FlattenOptions};
//! use headerflat::excel::{WorkbookReader, XlsxWorkbookReader};
//! use headerflat::parser::SheetSpec;
//!
//! let spec = SheetSpec::new("stats.xlsx", "Table 1", 8).with_drop_rows(vec![7]);
//! let data = XlsxWorkbookReader::new().load_sheet(&spec.file, &spec.sheet)?;
//! let flattened = flatten_sheet(data, &spec, &FlattenOptions::default())?;
//!
//! println!("Keys: {:?}", flattened.table.keys);
//! println!("Rows: {}", flattened.table.row_count());
//! # Ok::<(), headerflat::error::FlattenError>(())
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use error::{FlattenError, FlattenResult};
pub use types::{CellValue, FlatTable, Grid, GroupedRange, HeaderPath, MergedRegion, SheetData};
