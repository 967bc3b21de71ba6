//! fieldgrid CLI: calibrate, count and report 8x8 field-grid samples.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fieldgrid::io::{BatchConfig, RunConfig, RunReport, SampleStatus};
use fieldgrid::level::level_files;
use fieldgrid::pipeline::{run_batch, run_sample};
use fieldgrid::report::{collect_results, CollectFilter};
use fieldgrid::Corner;
use log::LevelFilter;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "fieldgrid")]
#[command(about = "Count fluorescent cells per field on 8x8 imprinted samples")]
#[command(version)]
struct Cli {
    /// Log verbosity.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Emit structured JSON logs (requires the `tracing` feature).
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sample end to end from a JSON config.
    Run {
        /// Path to the run config (JSON).
        config: PathBuf,
    },

    /// Run several samples from a JSON batch file.
    Batch {
        /// Path to the batch config (JSON).
        config: PathBuf,
    },

    /// Rotate images so two points lie on one horizontal line.
    Level(LevelArgs),

    /// Combine per-sample sheets into one table per day.
    Collect(CollectArgs),
}

#[derive(Debug, Clone, Args)]
struct LevelArgs {
    /// First point, as `X,Y`.
    #[arg(long, value_parser = parse_point)]
    from: Corner,

    /// Second point, as `X,Y`; it ends on the same row as the first.
    #[arg(long, value_parser = parse_point)]
    to: Corner,

    /// Output directory (default: next to each input).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Images to level with the same transform.
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CollectArgs {
    /// Folder holding the per-sample sheets.
    source: PathBuf,

    /// Folder for the `Dag_<day>_combined.csv` files.
    target: PathBuf,

    /// Only these days (comma separated).
    #[arg(long, value_delimiter = ',')]
    days: Vec<u32>,

    /// Only these sample numbers (comma separated).
    #[arg(long, value_delimiter = ',')]
    samples: Vec<u32>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn parse_point(s: &str) -> Result<Corner, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad X in {s:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad Y in {s:?}: {e}"))?;
    Ok(Corner::new(x, y))
}

fn init_logging(cli: &Cli) -> CliResult<()> {
    #[cfg(feature = "tracing")]
    {
        fieldgrid::core::init_tracing(cli.json_logs, cli.log_level.into());
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        if cli.json_logs {
            eprintln!("--json-logs needs the `tracing` feature; using plain logs");
        }
        fieldgrid::core::init_with_level(cli.log_level.into())?;
        Ok(())
    }
}

fn print_summary(report: &RunReport) {
    println!(
        "{}: {} cells in {} selected field(s), holder {} ({})",
        report.sample_name,
        report.total_count,
        report.selected_fields.len(),
        report.holder,
        report.orientation
    );
    if report.sheet_saved {
        println!("sheet saved to {}", report.sheet_path.display());
    } else {
        println!(
            "sheet NOT saved to {}: close the file and run again",
            report.sheet_path.display()
        );
    }
}

fn run_one(config: PathBuf) -> CliResult<bool> {
    let config = RunConfig::load_json(&config)?;
    let report = run_sample(&config)?;
    print_summary(&report);
    Ok(report.sheet_saved)
}

fn run_many(config: PathBuf) -> CliResult<bool> {
    let batch = BatchConfig::load_json(&config)?;
    let results = run_batch(&batch)?;
    let mut all_saved = true;
    for (entry, report) in &results {
        match (entry.status, report) {
            (SampleStatus::Done, Some(report)) => {
                print_summary(report);
                all_saved &= report.sheet_saved;
            }
            _ => println!(
                "{}: skipped ({})",
                entry.sample_dir.display(),
                entry.message.as_deref().unwrap_or("no reason recorded")
            ),
        }
    }
    Ok(all_saved)
}

fn run_level(args: LevelArgs) -> CliResult<bool> {
    let written = level_files(&args.images, args.from, args.to, args.out_dir.as_deref())?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(true)
}

fn run_collect(args: CollectArgs) -> CliResult<bool> {
    let to_set = |v: Vec<u32>| (!v.is_empty()).then(|| v.into_iter().collect::<BTreeSet<u32>>());
    let filter = CollectFilter {
        days: to_set(args.days),
        samples: to_set(args.samples),
    };
    let written = collect_results(&args.source, &args.target, &filter)?;
    if written.is_empty() {
        log::warn!("no matching sheets under {}", args.source.display());
    }
    for path in written {
        println!("{}", path.display());
    }
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli) {
        eprintln!("failed to initialise logging: {e}");
    }

    let outcome = match cli.command {
        Commands::Run { config } => run_one(config),
        Commands::Batch { config } => run_many(config),
        Commands::Level(args) => run_level(args),
        Commands::Collect(args) => run_collect(args),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        // Results are valid but a sheet could not be written.
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
