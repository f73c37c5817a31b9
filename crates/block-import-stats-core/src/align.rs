//! Aligning a baseline and a contender series onto one block index.
//!
//! The two runs usually sample at different points: one may report every
//! 1000 blocks, the other in uneven chunks. Alignment proceeds in steps:
//!
//! 1. Find the overlapping block range of both series ([`overlap`]).
//! 2. Restrict each series to that range (inclusive on both ends).
//! 3. Outer-join on `(block_number, blocks)`. Rows only match when both the
//!    block number *and* the chunk size agree.
//! 4. Fill the gaps of each side by linear interpolation along
//!    `block_number` ([`interpolate_gaps`]).
//! 5. Keep only the keys the contender actually reported.
//! 6. Drop warm-up rows ([`warmup_cutoff`]).

use std::{collections::BTreeMap, fmt};

use log::{debug, info};

use crate::{
    error::{NoOverlapSnafu, StatsResult},
    series::{Sample, Series},
};

/// Inclusive range of block numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    /// First block number in the range.
    pub start: i64,
    /// Last block number in the range (inclusive).
    pub end: i64,
}

impl BlockRange {
    /// Construct a range `[start, end]`.
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Whether `block_number` lies within the range.
    pub fn contains(&self, block_number: i64) -> bool {
        self.start <= block_number && block_number <= self.end
    }
}

impl fmt::Display for BlockRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Timing and throughput of one side for one aligned key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Interval duration in seconds.
    pub time: f64,
    /// Blocks per second.
    pub bps: f64,
    /// Transactions per second.
    pub tps: f64,
}

impl From<&Sample> for Metrics {
    fn from(s: &Sample) -> Self {
        Self {
            time: s.time,
            bps: s.bps,
            tps: s.tps,
        }
    }
}

/// Baseline and contender metrics for one contender key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedPair {
    /// Contender block number.
    pub block_number: i64,
    /// Contender chunk size.
    pub blocks: i64,
    /// Baseline metrics (observed or interpolated).
    pub baseline: Metrics,
    /// Contender metrics as observed.
    pub contender: Metrics,
}

/// Result of aligning two series.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// Overlapping block range both series were restricted to.
    pub range: BlockRange,
    /// Aligned rows, ordered by block number, after the warm-up trim.
    pub pairs: Vec<AlignedPair>,
}

/// Overlapping block range of two series.
///
/// Fails with `NoOverlap` when either series is empty or the computed
/// window is degenerate (`start > end`).
pub fn overlap(baseline: &Series, contender: &Series) -> StatsResult<BlockRange> {
    let base = baseline.block_range();
    let cont = contender.block_range();

    match (base, cont) {
        (Some(b), Some(c)) => {
            let range = BlockRange::new(b.start.max(c.start), b.end.min(c.end));
            if range.start > range.end {
                return NoOverlapSnafu {
                    baseline: base,
                    contender: cont,
                }
                .fail();
            }
            Ok(range)
        }
        _ => NoOverlapSnafu {
            baseline: base,
            contender: cont,
        }
        .fail(),
    }
}

/// Align `contender` against `baseline`, trimming warm-up rows below the
/// cutoff derived from `min_block_number`.
pub fn align(
    baseline: &Series,
    contender: &Series,
    min_block_number: i64,
) -> StatsResult<Alignment> {
    let range = overlap(baseline, contender)?;
    debug!(
        "baseline {:?}, contender {:?}, overlap {range}",
        baseline.block_range(),
        contender.block_range()
    );

    let joined = outer_join(baseline, contender, range);
    let mut pairs = fill_and_reindex(&joined);

    if let Some(cutoff) = warmup_cutoff(&pairs, min_block_number) {
        let before = pairs.len();
        pairs.retain(|p| p.block_number >= cutoff);
        info!(
            "warm-up trim: kept block_number >= {cutoff}, dropped {} of {before} rows",
            before - pairs.len()
        );
    }

    Ok(Alignment { range, pairs })
}

/// Lower block-number bound of the warm-up trim, if one applies.
///
/// With `first`/`last` the first and last aligned block numbers: when
/// `last > min_block_number + first`, rows below
/// `min(last - min_block_number, min_block_number)` are dropped.
pub fn warmup_cutoff(pairs: &[AlignedPair], min_block_number: i64) -> Option<i64> {
    let first = pairs.first()?.block_number;
    let last = pairs.last()?.block_number;
    if last > min_block_number.saturating_add(first) {
        Some(last.saturating_sub(min_block_number).min(min_block_number))
    } else {
        None
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct JoinedRow {
    baseline: Option<Metrics>,
    contender: Option<Metrics>,
}

type JoinKey = (i64, i64);

fn outer_join(baseline: &Series, contender: &Series, range: BlockRange) -> Vec<(JoinKey, JoinedRow)> {
    let mut joined: BTreeMap<JoinKey, JoinedRow> = BTreeMap::new();

    for s in baseline.samples().iter().filter(|s| range.contains(s.block_number)) {
        joined.entry((s.block_number, s.blocks)).or_default().baseline = Some(s.into());
    }
    for s in contender.samples().iter().filter(|s| range.contains(s.block_number)) {
        joined.entry((s.block_number, s.blocks)).or_default().contender = Some(s.into());
    }

    joined.into_iter().collect()
}

fn fill_and_reindex(joined: &[(JoinKey, JoinedRow)]) -> Vec<AlignedPair> {
    let xs: Vec<f64> = joined.iter().map(|((bn, _), _)| *bn as f64).collect();

    let gaps = joined.iter().filter(|(_, r)| r.baseline.is_none()).count();
    let base_time = interpolate_gaps(&xs, &column(joined, |r| r.baseline.map(|m| m.time)));
    let base_bps = interpolate_gaps(&xs, &column(joined, |r| r.baseline.map(|m| m.bps)));
    let base_tps = interpolate_gaps(&xs, &column(joined, |r| r.baseline.map(|m| m.tps)));

    let pairs: Vec<AlignedPair> = joined
        .iter()
        .enumerate()
        .filter_map(|(i, ((block_number, blocks), row))| {
            let contender = row.contender?;
            Some(AlignedPair {
                block_number: *block_number,
                blocks: *blocks,
                baseline: row.baseline.unwrap_or(Metrics {
                    time: base_time[i],
                    bps: base_bps[i],
                    tps: base_tps[i],
                }),
                contender,
            })
        })
        .collect();

    if gaps > 0 {
        debug!(
            "interpolated {gaps} baseline gaps over {} joined keys ({} contender rows)",
            joined.len(),
            pairs.len()
        );
    }
    pairs
}

fn column(
    joined: &[(JoinKey, JoinedRow)],
    pick: impl Fn(&JoinedRow) -> Option<f64>,
) -> Vec<Option<f64>> {
    joined.iter().map(|(_, r)| pick(r)).collect()
}

/// Fill `None` entries of `ys` by linear interpolation over `xs`.
///
/// `xs` must be sorted ascending. Entries before the first known value stay
/// `NaN`; entries after the last known value repeat it. When the bracketing
/// known points share the same `x`, the left value is used.
pub fn interpolate_gaps(xs: &[f64], ys: &[Option<f64>]) -> Vec<f64> {
    debug_assert_eq!(xs.len(), ys.len());
    let mut out: Vec<f64> = ys.iter().map(|y| y.unwrap_or(f64::NAN)).collect();

    let mut prev: Option<usize> = None;
    for (i, y) in ys.iter().enumerate() {
        let Some(y1) = *y else { continue };
        if let Some(p) = prev {
            let (x0, y0, x1) = (xs[p], out[p], xs[i]);
            for j in p + 1..i {
                out[j] = if x1 == x0 {
                    y0
                } else {
                    y0 + (y1 - y0) * (xs[j] - x0) / (x1 - x0)
                };
            }
        }
        prev = Some(i);
    }

    if let Some(p) = prev {
        let last = out[p];
        for v in out.iter_mut().skip(p + 1) {
            *v = last;
        }
    }
    out
}
