//! Reading real .xlsx files: merged header cells, grouped columns, JSON output

use headerflat::core::{flatten_sheet, FlattenOptions};
use headerflat::excel::outline::read_column_outline;
use headerflat::excel::{WorkbookReader, XlsxWorkbookReader};
use headerflat::parser::SheetSpec;
use headerflat::writer::{JsonFileSink, RecordSink};
use headerflat::{CellValue, FlattenError, MergedRegion};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Contents sheet first, then a two-row header with merged group titles and
/// a third sheet with outline-grouped columns.
fn write_statistics_workbook(path: &Path) {
    let mut workbook = Workbook::new();
    let merged = Format::new();

    let contents = workbook.add_worksheet();
    contents.set_name("Contents").unwrap();
    contents.write_string(0, 0, "Annual fund-level statistics").unwrap();

    let table1 = workbook.add_worksheet();
    table1.set_name("Table 1").unwrap();
    table1.write_string(0, 0, "Fund").unwrap();
    table1.merge_range(0, 1, 0, 2, "Assets", &merged).unwrap();
    table1.merge_range(0, 3, 0, 4, "Members", &merged).unwrap();
    for (col, name) in ["", "Cash", "Bonds", "Male", "Female"].iter().enumerate() {
        if !name.is_empty() {
            table1.write_string(1, col as u16, *name).unwrap();
        }
    }
    table1.write_string(2, 0, "Alpha").unwrap();
    table1.write_number(2, 1, 1.5).unwrap();
    table1.write_number(2, 2, 2.0).unwrap();
    table1.write_number(2, 3, 10.0).unwrap();
    table1.write_number(2, 4, 12.0).unwrap();
    table1.write_string(3, 0, "Beta").unwrap();
    table1.write_number(3, 1, 3.0).unwrap();
    table1.write_number(3, 3, 7.0).unwrap();
    table1.write_number(3, 4, 8.0).unwrap();

    let table2 = workbook.add_worksheet();
    table2.set_name("Table 2").unwrap();
    let headers = ["Region", "Super", "Wage", "Subtotal", "Note", "Super", "Total"];
    for (col, name) in headers.iter().enumerate() {
        table2.write_string(0, col as u16, *name).unwrap();
        table2.write_number(1, col as u16, col as f64).unwrap();
    }
    // B:C nested inside B:D, then F:G on its own
    table2.group_columns(1, 3).unwrap();
    table2.group_columns(1, 2).unwrap();
    table2.group_columns(5, 6).unwrap();

    workbook.save(path).unwrap();
}

fn fixture() -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("statistics.xlsx");
    write_statistics_workbook(&path);
    (temp_dir, path)
}

#[test]
fn test_load_sheet_reads_cells_and_merges() {
    let (_dir, path) = fixture();
    let data = XlsxWorkbookReader::new().load_sheet(&path, "Table 1").unwrap();

    assert_eq!(data.grid.get(0, 0), Some(&CellValue::from("Fund")));
    assert_eq!(data.grid.get(0, 1), Some(&CellValue::from("Assets")));
    assert_eq!(data.grid.get(2, 1), Some(&CellValue::Number(1.5)));
    assert!(data.grid.get(3, 2).is_some_and(CellValue::is_blank));

    let mut merged = data.merged_regions.clone();
    merged.sort_by_key(|r| r.col_min);
    assert_eq!(
        merged,
        vec![MergedRegion::new(1, 0, 2, 0), MergedRegion::new(3, 0, 4, 0)]
    );
    assert!(data.outline.is_empty());
}

#[test]
fn test_outline_levels_read_from_worksheet() {
    let (_dir, path) = fixture();
    let mut outline = read_column_outline(&path, "Table 2").unwrap();
    outline.sort_by_key(|span| span.min);

    let levels: Vec<(usize, u8)> = outline
        .iter()
        .flat_map(|span| (span.min..=span.max).map(move |col| (col, span.level)))
        .collect();
    // 1-based columns
    assert_eq!(levels, vec![(2, 2), (3, 2), (4, 1), (6, 1), (7, 1)]);
    assert!(read_column_outline(&path, "Table 1").unwrap().is_empty());
}

#[test]
fn test_flatten_merged_header_sheet() {
    let (_dir, path) = fixture();
    let data = XlsxWorkbookReader::new().load_sheet(&path, "Table 1").unwrap();
    let spec = SheetSpec::new(&path, "Table 1", 2);
    let result = flatten_sheet(data, &spec, &FlattenOptions::default()).unwrap();

    assert_eq!(
        result.table.keys,
        vec![
            "Fund",
            "Assets->Cash",
            "Assets->Bonds",
            "Members->Male",
            "Members->Female"
        ]
    );
    assert_eq!(result.table.row_count(), 2);
    assert_eq!(
        result.table.column("Assets->Bonds").unwrap(),
        vec![&CellValue::Number(2.0), &CellValue::Empty]
    );
}

#[test]
fn test_flatten_nested_column_groups() {
    let (_dir, path) = fixture();
    let data = XlsxWorkbookReader::new().load_sheet(&path, "Table 2").unwrap();
    let spec = SheetSpec::new(&path, "Table 2", 1);
    let result = flatten_sheet(data, &spec, &FlattenOptions::default()).unwrap();

    let owned: Vec<(usize, usize)> = result
        .partition
        .iter()
        .filter(|range| range.owner.is_some())
        .map(|range| (range.min, range.max))
        .collect();
    assert_eq!(owned, vec![(1, 3), (5, 6)]);
    assert_eq!(
        result.table.keys,
        vec![
            "Region",
            "G1->Super",
            "G1->Wage",
            "G1->Subtotal",
            "Note",
            "G3->Super",
            "G3->Total"
        ]
    );
}

#[test]
fn test_missing_sheet_lists_available_sheets() {
    let (_dir, path) = fixture();
    let err = XlsxWorkbookReader::new()
        .load_sheet(&path, "Table 9")
        .unwrap_err();
    match err {
        FlattenError::Workbook(message) => {
            assert!(message.contains("Table 9"));
            assert!(message.contains("Contents"));
        }
        other => panic!("expected Workbook error, got {other:?}"),
    }
}

#[test]
fn test_sheet_to_json_file() {
    let (dir, path) = fixture();
    let data = XlsxWorkbookReader::new().load_sheet(&path, "Table 1").unwrap();
    let spec = SheetSpec::new(&path, "Table 1", 2);
    let result = flatten_sheet(data, &spec, &FlattenOptions::default()).unwrap();

    let mut sink = JsonFileSink::new(dir.path().join("json")).pretty(false);
    let written = sink.write(&spec, &result.table).unwrap();
    assert_eq!(written.file_name().unwrap(), "statistics__Table_1.json");
    assert_eq!(
        fs::read_to_string(written).unwrap(),
        concat!(
            r#"[{"Fund":"Alpha","Assets->Cash":1.5,"Assets->Bonds":2,"Members->Male":10,"Members->Female":12},"#,
            r#"{"Fund":"Beta","Assets->Cash":3,"Assets->Bonds":null,"Members->Male":7,"Members->Female":8}]"#
        )
    );
}
