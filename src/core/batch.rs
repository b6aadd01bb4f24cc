//! Batch driver: every sheet spec is attempted, failures are collected

use crate::core::pipeline::{flatten_sheet, FlattenOptions};
use crate::error::{FlattenError, FlattenResult};
use crate::excel::WorkbookReader;
use crate::parser::SheetSpec;
use crate::writer::RecordSink;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info};

/// A sheet that made it to the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenSheet {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug)]
pub struct SheetOutcome {
    pub spec: SheetSpec,
    pub result: FlattenResult<WrittenSheet>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<SheetOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&SheetSpec, &WrittenSheet)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|w| (&o.spec, w)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&SheetSpec, &FlattenError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.spec, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Load, flatten and write one sheet. Errors carry the file and sheet name.
pub fn process_sheet<R, S>(
    spec: &SheetSpec,
    reader: &mut R,
    sink: &mut S,
    options: &FlattenOptions,
) -> FlattenResult<WrittenSheet>
where
    R: WorkbookReader + ?Sized,
    S: RecordSink + ?Sized,
{
    flatten_and_write(spec, reader, sink, options, &mut HashMap::new())
        .map_err(|e| e.in_sheet(&spec.file, &spec.sheet))
}

/// Process every spec in order. One sheet failing never stops the others.
///
/// A sheet whose output would replace one already written in this batch
/// fails with [`FlattenError::OutputCollision`] instead of overwriting it.
pub fn run_batch<R, S>(
    specs: &[SheetSpec],
    reader: &mut R,
    sink: &mut S,
    options: &FlattenOptions,
) -> BatchReport
where
    R: WorkbookReader + ?Sized,
    S: RecordSink + ?Sized,
{
    let mut written_by = HashMap::new();
    let mut report = BatchReport::default();
    for spec in specs {
        let result = flatten_and_write(spec, reader, sink, options, &mut written_by)
            .map_err(|e| e.in_sheet(&spec.file, &spec.sheet));
        match &result {
            Ok(written) => info!(
                sheet = %spec.sheet,
                file = %spec.file.display(),
                rows = written.rows,
                columns = written.columns,
                "sheet flattened"
            ),
            Err(e) => error!(sheet = %spec.sheet, file = %spec.file.display(), "{}", e),
        }
        report.outcomes.push(SheetOutcome {
            spec: spec.clone(),
            result,
        });
    }
    report
}

fn flatten_and_write<R, S>(
    spec: &SheetSpec,
    reader: &mut R,
    sink: &mut S,
    options: &FlattenOptions,
    written_by: &mut HashMap<PathBuf, String>,
) -> FlattenResult<WrittenSheet>
where
    R: WorkbookReader + ?Sized,
    S: RecordSink + ?Sized,
{
    let data = reader.load_sheet(&spec.file, &spec.sheet)?;
    let flattened = flatten_sheet(data, spec, options)?;

    if let Some(path) = sink.destination(spec) {
        if let Some(previous) = written_by.get(&path) {
            return Err(FlattenError::OutputCollision {
                path,
                previous: previous.clone(),
            });
        }
    }
    let path = sink.write(spec, &flattened.table)?;
    written_by.insert(
        path.clone(),
        format!("'{}' in {}", spec.sheet, spec.file.display()),
    );

    Ok(WrittenSheet {
        path,
        rows: flattened.table.row_count(),
        columns: flattened.table.col_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellValue, FlatTable, Grid, SheetData};
    use std::path::Path;

    struct StaticReader;

    impl WorkbookReader for StaticReader {
        fn load_sheet(&mut self, _path: &Path, sheet: &str) -> FlattenResult<SheetData> {
            match sheet {
                "missing" => Err(FlattenError::Workbook("Sheet 'missing' not found".to_string())),
                _ => Ok(SheetData {
                    grid: Grid::from_rows(vec![
                        vec!["A".into(), "B".into()],
                        vec![CellValue::Number(1.0), CellValue::Number(2.0)],
                    ]),
                    ..Default::default()
                }),
            }
        }
    }

    #[derive(Default)]
    struct MemorySink {
        tables: Vec<(String, FlatTable)>,
    }

    impl RecordSink for MemorySink {
        fn write(&mut self, spec: &SheetSpec, table: &FlatTable) -> FlattenResult<PathBuf> {
            self.tables.push((spec.sheet.clone(), table.clone()));
            Ok(PathBuf::from(format!("{}.json", spec.sheet)))
        }
    }

    #[test]
    fn test_failures_do_not_abort_batch() {
        let specs = vec![
            SheetSpec::new("a.xlsx", "Table 1", 1),
            SheetSpec::new("a.xlsx", "missing", 1),
            SheetSpec::new("a.xlsx", "Table 2", 5),
            SheetSpec::new("a.xlsx", "Table 3", 1),
        ];
        let mut sink = MemorySink::default();
        let report = run_batch(&specs, &mut StaticReader, &mut sink, &FlattenOptions::default());

        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(report.failure_count(), 2);
        assert!(!report.is_success());
        let written: Vec<&str> = report.succeeded().map(|(s, _)| s.sheet.as_str()).collect();
        assert_eq!(written, vec!["Table 1", "Table 3"]);
        assert_eq!(sink.tables.len(), 2);
    }

    #[test]
    fn test_errors_carry_sheet_context() {
        let spec = SheetSpec::new("a.xlsx", "Table 2", 5);
        let err = process_sheet(
            &spec,
            &mut StaticReader,
            &mut MemorySink::default(),
            &FlattenOptions::default(),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Table 2"));
        assert!(msg.contains("a.xlsx"));
        assert!(matches!(err.root(), FlattenError::Configuration { .. }));
    }

    /// Sends every sheet to the same place
    #[derive(Default)]
    struct SingleFileSink {
        writes: usize,
    }

    impl RecordSink for SingleFileSink {
        fn write(&mut self, _spec: &SheetSpec, _table: &FlatTable) -> FlattenResult<PathBuf> {
            self.writes += 1;
            Ok(PathBuf::from("out.json"))
        }

        fn destination(&self, _spec: &SheetSpec) -> Option<PathBuf> {
            Some(PathBuf::from("out.json"))
        }
    }

    #[test]
    fn test_second_sheet_to_same_output_fails() {
        let specs = vec![
            SheetSpec::new("a.xlsx", "Table 1", 1),
            SheetSpec::new("a.xlsx", "missing", 1),
            SheetSpec::new("b.xlsx", "Table_1", 1),
        ];
        let mut sink = SingleFileSink::default();
        let report = run_batch(&specs, &mut StaticReader, &mut sink, &FlattenOptions::default());

        assert_eq!(sink.writes, 1);
        let failed: Vec<(&str, &FlattenError)> =
            report.failed().map(|(s, e)| (s.sheet.as_str(), e.root())).collect();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[1].0, "Table_1");
        match failed[1].1 {
            FlattenError::OutputCollision { path, previous } => {
                assert_eq!(path, &PathBuf::from("out.json"));
                assert!(previous.contains("Table 1"));
                assert!(previous.contains("a.xlsx"));
            }
            other => panic!("expected OutputCollision, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_sheet_does_not_claim_output() {
        let specs = vec![
            SheetSpec::new("a.xlsx", "Table 1", 5),
            SheetSpec::new("a.xlsx", "Table 1", 1),
        ];
        let mut sink = SingleFileSink::default();
        let report = run_batch(&specs, &mut StaticReader, &mut sink, &FlattenOptions::default());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(sink.writes, 1);
    }

    #[test]
    fn test_written_sheet_counts() {
        let spec = SheetSpec::new("a.xlsx", "Table 1", 1);
        let written = process_sheet(
            &spec,
            &mut StaticReader,
            &mut MemorySink::default(),
            &FlattenOptions::default(),
        )
        .unwrap();
        assert_eq!(
            written,
            WrittenSheet {
                path: PathBuf::from("Table 1.json"),
                rows: 1,
                columns: 2,
            }
        );
    }
}
