//! Error types and SNAFU context selectors for the comparison pipeline.
//!
//! Every fallible step of the core (loading a samples file, finding the
//! common block range) reports through [`StatsError`]. Degenerate arithmetic
//! such as a zero-length sample interval is *not* an error: it produces
//! non-finite values that flow through to the report unchanged.

use arrow::{datatypes::DataType, error::ArrowError};
use snafu::prelude::*;

use crate::align::BlockRange;

/// Convenience alias for results produced by this crate.
pub type StatsResult<T> = std::result::Result<T, StatsError>;

/// Errors from loading and aligning benchmark series.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StatsError {
    /// The samples file could not be opened or read.
    #[snafu(display("Failed to read samples from {input}: {source}"))]
    Io {
        /// Path or label of the input being read.
        input: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// CSV decoding failed (malformed line, non-numeric value, ...).
    #[snafu(display("Failed to parse samples from {input}: {source}"))]
    Csv {
        /// Path or label of the input being parsed.
        input: String,
        /// Underlying Arrow CSV error.
        source: ArrowError,
    },

    /// A required column is absent from the header row.
    #[snafu(display("Missing required column '{column}' in {input}"))]
    MissingColumn {
        /// Path or label of the input being parsed.
        input: String,
        /// Name of the missing column.
        column: String,
    },

    /// A column decoded to an unexpected Arrow type.
    #[snafu(display("Column '{column}' in {input} has unexpected type {data_type:?}"))]
    InvalidColumnType {
        /// Path or label of the input being parsed.
        input: String,
        /// Name of the offending column.
        column: String,
        /// Arrow type actually found.
        data_type: DataType,
    },

    /// A required column has an empty cell.
    #[snafu(display("Empty value in column '{column}' at data row {row} of {input}"))]
    NullValue {
        /// Path or label of the input being parsed.
        input: String,
        /// Name of the offending column.
        column: String,
        /// Zero-based data row (header excluded).
        row: usize,
    },

    /// The two series share no block numbers at all.
    #[snafu(display(
        "No overlapping block range between baseline {} and contender {}",
        describe_range(baseline),
        describe_range(contender)
    ))]
    NoOverlap {
        /// Full block range of the baseline, `None` when it has no rows.
        baseline: Option<BlockRange>,
        /// Full block range of the contender, `None` when it has no rows.
        contender: Option<BlockRange>,
    },
}

fn describe_range(range: &Option<BlockRange>) -> String {
    match range {
        Some(r) => r.to_string(),
        None => "(empty)".to_string(),
    }
}
