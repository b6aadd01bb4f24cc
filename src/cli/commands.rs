use crate::core::{flatten_sheet, run_batch, BatchReport, FlattenOptions, FlattenedSheet};
use crate::error::FlattenResult;
use crate::excel::{CachedReader, WorkbookReader, XlsxWorkbookReader};
use crate::parser::{self, SheetSpec};
use crate::types::GroupedRange;
use crate::writer::JsonFileSink;
use colored::Colorize;
use std::error::Error as _;
use std::path::PathBuf;

/// Execute the run command: every sheet listed in a batch file
pub fn run(config: PathBuf, output: Option<PathBuf>, verbose: bool) -> FlattenResult<BatchReport> {
    println!("{}", "📐 headerflat - Flattening batch".bold().green());
    println!("   Config: {}", config.display());

    let mut batch = parser::parse_batch(&config)?;
    if let Some(dir) = output {
        batch.output_dir = dir;
    }
    println!("   Output: {}", batch.output_dir.display());
    println!("   Sheets: {}\n", batch.sheets.len());

    let options = batch.options();
    let mut reader = CachedReader::new(XlsxWorkbookReader::new());
    let mut sink = JsonFileSink::new(&batch.output_dir).pretty(batch.pretty);
    let report = run_batch(&batch.sheets, &mut reader, &mut sink, &options);

    print_report(&report, verbose);
    Ok(report)
}

/// Execute the sheet command: one sheet given on the command line
pub fn sheet(
    spec: SheetSpec,
    output: PathBuf,
    options: FlattenOptions,
    verbose: bool,
) -> FlattenResult<BatchReport> {
    println!("{}", "📐 headerflat - Flattening sheet".bold().green());
    println!("   File: {}", spec.file.display());
    println!("   Sheet: {}", spec.sheet.bright_blue().bold());
    println!("   Header rows: {}\n", spec.value_start_row);

    let mut reader = XlsxWorkbookReader::new();
    let mut sink = JsonFileSink::new(output);
    let report = run_batch(std::slice::from_ref(&spec), &mut reader, &mut sink, &options);

    print_report(&report, verbose);
    Ok(report)
}

/// Execute the keys command: show how headers become keys, write nothing
pub fn keys(spec: SheetSpec, options: FlattenOptions) -> FlattenResult<()> {
    println!("{}", "🔍 headerflat - Column keys".bold().green());
    println!("   File: {}", spec.file.display());
    println!("   Sheet: {}\n", spec.sheet.bright_blue().bold());

    let data = XlsxWorkbookReader::new()
        .load_sheet(&spec.file, &spec.sheet)
        .map_err(|e| e.in_sheet(&spec.file, &spec.sheet))?;
    let flattened = flatten_sheet(data, &spec, &options)
        .map_err(|e| e.in_sheet(&spec.file, &spec.sheet))?;

    print_keys(&flattened, options.disambiguator.separator());
    Ok(())
}

fn print_keys(flattened: &FlattenedSheet, separator: &str) {
    println!(
        "{}",
        format!("📋 Header rows after drops: {}", flattened.header_rows).cyan()
    );
    println!();

    println!("{}", "🌳 Column groups:".bold().cyan());
    for range in &flattened.partition {
        println!("   {}", describe_range(range));
    }
    println!();

    println!("{}", "🔑 Keys:".bold().cyan());
    for (col, (path, key)) in flattened
        .header_paths
        .iter()
        .zip(&flattened.keys)
        .enumerate()
    {
        let path = path.join(separator);
        if path == *key {
            println!("   {:>4}  {}", col, key.bright_blue());
        } else {
            println!("   {:>4}  {}  {}", col, key.bright_blue(), format!("({})", path).dimmed());
        }
    }
    println!();

    println!(
        "{}",
        format!(
            "✅ {} keys, {} kept after dropping blank columns, {} data rows",
            flattened.keys.len(),
            flattened.table.col_count(),
            flattened.table.row_count()
        )
        .bold()
        .green()
    );
}

fn describe_range(range: &GroupedRange) -> String {
    let span = if range.min == range.max {
        format!("column {}", range.min)
    } else {
        format!("columns {}-{}", range.min, range.max)
    };
    match range.owner {
        Some(group) => format!("{} {}", span, format!("(group {})", group).yellow()),
        None => span,
    }
}

fn print_report(report: &BatchReport, verbose: bool) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(written) => println!(
                "   {} {} → {} ({} rows × {} columns)",
                "✅".green(),
                outcome.spec.sheet.bright_blue().bold(),
                written.path.display(),
                written.rows,
                written.columns
            ),
            Err(e) => {
                println!(
                    "   {} {} ({})",
                    "❌".red(),
                    outcome.spec.sheet.bright_blue().bold(),
                    outcome.spec.file.display()
                );
                println!("      {}", e.root().to_string().red());
                if verbose {
                    let mut source = e.root().source();
                    while let Some(cause) = source {
                        println!("      caused by: {}", cause.to_string().dimmed());
                        source = cause.source();
                    }
                }
            }
        }
    }
    println!();

    let failed = report.failure_count();
    let total = report.outcomes.len();
    if failed == 0 {
        println!(
            "{}",
            format!("✅ Flattened {} of {} sheets", total, total).bold().green()
        );
    } else {
        println!(
            "{}",
            format!("❌ {} of {} sheets failed", failed, total).bold().red()
        );
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
