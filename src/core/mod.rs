//! Header flattening: merge filling, column grouping, header paths, unique keys

pub mod batch;
pub mod column_grouper;
pub mod header_paths;
pub mod key_disambiguator;
pub mod pipeline;
pub mod region_filler;

pub use batch::{run_batch, BatchReport, SheetOutcome, WrittenSheet};
pub use key_disambiguator::KeyDisambiguator;
pub use pipeline::{flatten_sheet, FlattenOptions, FlattenedSheet};
