use arrow::error::ArrowError;
use block_import_stats_core::StatsError;
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Failed to load {role} samples: {source}"))]
    LoadSeries {
        role: &'static str,
        source: StatsError,
    },

    #[snafu(display("Cannot compare runs. {source}"))]
    Compare { source: StatsError },

    #[snafu(display("Failed to create output file: {path}"))]
    CreateOutput {
        path: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to write report to {target}: {source}"))]
    WriteOutput {
        target: String,
        source: std::io::Error,
    },

    #[snafu(display("Failed to encode CSV report: {source}"))]
    Arrow { source: ArrowError },

    #[snafu(display("Failed to write chart: {path}"))]
    WriteChart {
        path: String,
        source: std::io::Error,
    },
}
