//! Compare two block-import benchmark runs and report whether the contender
//! is faster or slower than the baseline.

mod chart;
mod error;
mod report;

use std::path::{Path, PathBuf};

use block_import_stats_core::{
    CompareOptions, Series,
    compare::{DEFAULT_BINS, DEFAULT_MIN_BLOCK_NUMBER},
    load_series,
};
use clap::Parser;
use log::info;
use snafu::ResultExt;

use crate::{
    error::{CliResult, CompareSnafu, LoadSeriesSnafu},
    report::{Report, ReportFormat, display_name, write_console, write_report_file},
};

#[derive(Debug, Parser)]
#[command(name = "block-import-stats")]
#[command(about = "Compare block-import performance of a baseline and a contender run")]
struct Cli {
    /// Samples CSV of the baseline run (block_number,blocks,txs,gas,time)
    baseline: PathBuf,

    /// Samples CSV of the contender run
    contender: PathBuf,

    /// Render rolling-mean charts and open them in a viewer
    #[arg(long, default_value_t = false)]
    plot: bool,

    /// Where to write the chart SVG (default: system temp directory)
    #[arg(long, requires = "plot")]
    plot_output: Option<PathBuf>,

    /// Also write the report as a Markdown file
    #[arg(long, conflicts_with = "csv_output")]
    markdown_output: Option<PathBuf>,

    /// Also write the report as a CSV file
    #[arg(long)]
    csv_output: Option<PathBuf>,

    /// Number of bins to group block ranges into, 0 = all rows
    #[arg(long, default_value_t = DEFAULT_BINS, allow_negative_numbers = true)]
    bins: i64,

    /// Floor for skipping warm-up blocks at the start of the aligned range
    #[arg(long, default_value_t = DEFAULT_MIN_BLOCK_NUMBER)]
    min_block_number: i64,
}

impl Cli {
    fn options(&self) -> CompareOptions {
        CompareOptions {
            bins: self.bins,
            min_block_number: self.min_block_number,
        }
    }

    fn output(&self) -> Option<(&Path, ReportFormat)> {
        if let Some(p) = &self.markdown_output {
            return Some((p.as_path(), ReportFormat::Markdown));
        }
        self.csv_output
            .as_deref()
            .map(|p| (p, ReportFormat::Csv))
    }
}

fn load(path: &Path, role: &'static str) -> CliResult<Series> {
    let series = load_series(path).context(LoadSeriesSnafu { role })?;
    info!("{role}: {} samples from {}", series.len(), path.display());
    Ok(series)
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let baseline = load(&cli.baseline, "baseline")?;
    let contender = load(&cli.contender, "contender")?;

    let comparison = block_import_stats_core::compare(&baseline, &contender, &cli.options())
        .context(CompareSnafu)?;

    let baseline_name = display_name(&cli.baseline);
    let contender_name = display_name(&cli.contender);
    let report = Report {
        baseline: &baseline_name,
        contender: &contender_name,
        comparison: &comparison,
    };

    if cli.plot {
        let path = cli
            .plot_output
            .clone()
            .unwrap_or_else(chart::default_chart_path);
        chart::write_chart(&path, &comparison.rows, &format!("{baseline_name} vs {contender_name}"))?;
        chart::open_chart(&path);
    }

    write_console(&report, &mut std::io::stdout().lock())?;

    if let Some((path, format)) = cli.output() {
        write_report_file(path, format, &report)?;
        println!("\nwrote: {} ({format:?})", path.display());
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
