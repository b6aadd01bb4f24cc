use clap::{Parser, Subcommand};
use headerflat::cli;
use headerflat::core::{FlattenOptions, KeyDisambiguator};
use headerflat::parser::SheetSpec;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "headerflat")]
#[command(about = "Flatten multi-row spreadsheet headers into unique JSON record keys")]
#[command(long_about = "headerflat - spreadsheet header flattening

Turns human-formatted tables (merged header cells, several header rows,
outline-grouped columns) into JSON arrays of flat records whose keys are
the joined header path of each column, e.g. \"Fund->Name\".

COMMANDS:
  run    - Flatten every sheet listed in a YAML batch file
  sheet  - Flatten a single sheet
  keys   - Show the header paths and keys of a sheet without writing

EXAMPLES:
  headerflat run batch.yaml
  headerflat sheet stats.xlsx \"Table 1\" --header-rows 8 --drop-rows 7
  headerflat keys stats.xlsx \"Table 2\" --header-rows 6

Set RUST_LOG=headerflat=debug for per-stage diagnostics.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Flatten every sheet listed in a YAML batch file.

BATCH FILE:
  output_dir: json            # relative to the batch file
  separator: \"->\"
  group_token_prefix: G
  drop_empty_columns: true
  pretty: true
  sheets:
    - file: stats.xlsx
      sheet: Table 1
      value_start_row: 8
      drop_rows: [7]

Every sheet is attempted. The exit code is non-zero if any sheet failed.")]
    /// Flatten every sheet listed in a batch file
    Run {
        /// Path to the YAML batch file
        config: PathBuf,

        /// Write JSON here instead of the batch file's output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show debug logging and full error chains
        #[arg(short, long)]
        verbose: bool,
    },

    /// Flatten a single sheet
    Sheet {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Keep columns with no data below the header
        #[arg(long)]
        keep_empty_columns: bool,

        /// Show debug logging and full error chains
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show header paths and keys without writing anything
    Keys {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Show debug logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(clap::Args)]
struct SheetArgs {
    /// Path to the .xlsx workbook
    file: PathBuf,

    /// Worksheet name
    sheet: String,

    /// Number of header rows above the first data row
    #[arg(long = "header-rows")]
    header_rows: usize,

    /// Zero-based rows to drop, comma separated
    #[arg(long = "drop-rows", value_delimiter = ',')]
    drop_rows: Vec<usize>,

    /// Key separator
    #[arg(long, default_value = "->")]
    separator: String,

    /// Prefix of the synthetic group tokens
    #[arg(long = "group-prefix", default_value = "G")]
    group_prefix: String,
}

impl SheetArgs {
    fn into_parts(self, drop_empty_columns: bool) -> (SheetSpec, FlattenOptions) {
        let spec =
            SheetSpec::new(self.file, self.sheet, self.header_rows).with_drop_rows(self.drop_rows);
        let options = FlattenOptions {
            disambiguator: KeyDisambiguator::new(self.separator, self.group_prefix),
            drop_empty_columns,
        };
        (spec, options)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "headerflat=debug"
    } else {
        "headerflat=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Commands::Run {
            config,
            output,
            verbose,
        } => {
            init_tracing(verbose);
            cli::run(config, output, verbose)?
        }

        Commands::Sheet {
            sheet,
            output,
            keep_empty_columns,
            verbose,
        } => {
            init_tracing(verbose);
            let (spec, options) = sheet.into_parts(!keep_empty_columns);
            cli::sheet(spec, output, options, verbose)?
        }

        Commands::Keys { sheet, verbose } => {
            init_tracing(verbose);
            let (spec, options) = sheet.into_parts(true);
            cli::keys(spec, options)?;
            return Ok(());
        }
    };

    if !report.is_success() {
        anyhow::bail!(
            "{} of {} sheets failed",
            report.failure_count(),
            report.outcomes.len()
        );
    }
    Ok(())
}
