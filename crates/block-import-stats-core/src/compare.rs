//! The end-to-end comparison pipeline: align, diff, bucket, summarize.

use log::debug;

use crate::{
    aggregate::{Bucket, aggregate},
    align::{BlockRange, align},
    delta::{AlignedRow, compute_deltas},
    error::StatsResult,
    series::Series,
    summary::Summary,
};

/// Default number of bucket edges.
pub const DEFAULT_BINS: i64 = 10;
/// Default floor of the warm-up trim.
pub const DEFAULT_MIN_BLOCK_NUMBER: i64 = 500_000;

/// Tunables of a comparison run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Number of bucket edges; `<= 0` reports every row on its own.
    pub bins: i64,
    /// Floor used by the warm-up trim.
    pub min_block_number: i64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            bins: DEFAULT_BINS,
            min_block_number: DEFAULT_MIN_BLOCK_NUMBER,
        }
    }
}

/// Everything a reporter needs to render a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Overlapping block range of the two inputs.
    pub range: BlockRange,
    /// Aligned rows with their deltas, after the warm-up trim.
    pub rows: Vec<AlignedRow>,
    /// Aggregated buckets (one per row when binning is disabled).
    pub buckets: Vec<Bucket>,
    /// Whole-run totals.
    pub summary: Summary,
}

/// Compare `contender` against `baseline`.
///
/// Fails only when the two series have no block range in common.
pub fn compare(
    baseline: &Series,
    contender: &Series,
    opts: &CompareOptions,
) -> StatsResult<Comparison> {
    let alignment = align(baseline, contender, opts.min_block_number)?;
    let rows = compute_deltas(&alignment.pairs);
    let buckets = aggregate(&rows, opts.bins);
    let summary = Summary::from_rows(&rows);
    debug!(
        "compared {} rows into {} buckets (bins={})",
        rows.len(),
        buckets.len(),
        opts.bins
    );

    Ok(Comparison {
        range: alignment.range,
        rows,
        buckets,
        summary,
    })
}
