//! Grouping aligned rows into block-range buckets.
//!
//! Bucket boundaries are a stable, documented mapping:
//!
//! - `bins` integer edges are spaced evenly from
//!   `first_block_number - first_row_blocks` to `last_block_number`, so the
//!   chunk covered by the first row sits inside the first bucket.
//! - Edges are truncated toward zero and deduplicated; `n` distinct edges
//!   give `n - 1` buckets.
//! - Buckets are right-closed: `(e[i], e[i + 1]]`. The first bucket also
//!   includes its left edge.
//! - Buckets without rows are omitted.
//! - `NaN` cells (baseline gaps the interpolation could not fill) are left
//!   out of sums and means; infinities are not.
//!
//! With `bins <= 0` no grouping happens and every row becomes its own bucket.

use std::{collections::BTreeMap, fmt};

use crate::delta::AlignedRow;

/// What a [`Bucket`] covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketLabel {
    /// Ungrouped output: a single row at this block number.
    Block(i64),
    /// Grouped output: block numbers in `(lower, upper]`.
    Range {
        /// Exclusive lower edge (inclusive for the first bucket).
        lower: i64,
        /// Inclusive upper edge.
        upper: i64,
    },
}

impl fmt::Display for BucketLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketLabel::Block(n) => write!(f, "{n}"),
            BucketLabel::Range { lower, upper } => write!(f, "({lower}, {upper}]"),
        }
    }
}

/// Summary statistics for one group of aligned rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    /// Block range (or single block) this bucket covers.
    pub label: BucketLabel,
    /// Number of aligned rows in the bucket.
    pub rows: usize,
    /// Sum of contender chunk sizes.
    pub blocks: i64,
    /// Mean baseline bps.
    pub bps_x: f64,
    /// Mean contender bps.
    pub bps_y: f64,
    /// Mean baseline tps.
    pub tps_x: f64,
    /// Mean contender tps.
    pub tps_y: f64,
    /// Mean relative bps difference.
    pub bpsd: f64,
    /// Mean relative tps difference.
    pub tpsd: f64,
    /// Mean relative time difference.
    pub timed: f64,
    /// Total baseline time in seconds.
    pub time_x: f64,
    /// Total contender time in seconds.
    pub time_y: f64,
}

/// Running sum of one column that skips `NaN` entries.
///
/// Interpolation leaves `NaN` where the baseline has no data yet. Those
/// cells are missing rather than zero, so they count toward neither the sum
/// nor the mean's denominator. Infinities are kept.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Column {
    sum: f64,
    count: usize,
}

impl Column {
    pub(crate) fn push(&mut self, v: f64) {
        if !v.is_nan() {
            self.sum += v;
            self.count += 1;
        }
    }

    /// Sum of the non-`NaN` values; `0` when there are none.
    pub(crate) fn sum(&self) -> f64 {
        self.sum
    }

    /// Mean of the non-`NaN` values; `NaN` when there are none.
    pub(crate) fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }
}

impl FromIterator<f64> for Column {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut col = Column::default();
        for v in iter {
            col.push(v);
        }
        col
    }
}

impl Bucket {
    /// An ungrouped bucket holding one row's values exactly, `NaN` included.
    pub fn from_row(r: &AlignedRow) -> Self {
        Self {
            label: BucketLabel::Block(r.block_number),
            rows: 1,
            blocks: r.blocks,
            bps_x: r.bps_x,
            bps_y: r.bps_y,
            tps_x: r.tps_x,
            tps_y: r.tps_y,
            bpsd: r.bpsd,
            tpsd: r.tpsd,
            timed: r.timed,
            time_x: r.time_x,
            time_y: r.time_y,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    rows: usize,
    blocks: i64,
    bps_x: Column,
    bps_y: Column,
    tps_x: Column,
    tps_y: Column,
    bpsd: Column,
    tpsd: Column,
    timed: Column,
    time_x: Column,
    time_y: Column,
}

impl Acc {
    fn push(&mut self, r: &AlignedRow) {
        self.rows += 1;
        self.blocks = self.blocks.saturating_add(r.blocks);
        self.bps_x.push(r.bps_x);
        self.bps_y.push(r.bps_y);
        self.tps_x.push(r.tps_x);
        self.tps_y.push(r.tps_y);
        self.bpsd.push(r.bpsd);
        self.tpsd.push(r.tpsd);
        self.timed.push(r.timed);
        self.time_x.push(r.time_x);
        self.time_y.push(r.time_y);
    }

    fn finish(self, label: BucketLabel) -> Bucket {
        Bucket {
            label,
            rows: self.rows,
            blocks: self.blocks,
            bps_x: self.bps_x.mean(),
            bps_y: self.bps_y.mean(),
            tps_x: self.tps_x.mean(),
            tps_y: self.tps_y.mean(),
            bpsd: self.bpsd.mean(),
            tpsd: self.tpsd.mean(),
            timed: self.timed.mean(),
            time_x: self.time_x.sum(),
            time_y: self.time_y.sum(),
        }
    }
}

/// `num` evenly spaced integer edges over `[start, stop]`, computed on
/// demand.
///
/// Edge `i` is `start + i * step` truncated toward zero, and the last edge
/// is exactly `stop`. Nothing is allocated per edge, so `num` may be huge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinEdges {
    start: i64,
    stop: i64,
    num: usize,
    step: f64,
}

impl BinEdges {
    /// Edges over `[start, stop]`. `num == 0` has no edges and `num == 1`
    /// just `start`.
    pub fn new(start: i64, stop: i64, num: usize) -> Self {
        let step = if num > 1 {
            (stop as f64 - start as f64) / (num - 1) as f64
        } else {
            0.0
        };
        Self {
            start,
            stop,
            num,
            step,
        }
    }

    /// Edges for `rows` split by `bins`, starting one chunk before the
    /// first row. `None` when `bins <= 0` or there are no rows.
    pub fn for_rows(rows: &[AlignedRow], bins: i64) -> Option<Self> {
        let (first, last) = (rows.first()?, rows.last()?);
        if bins <= 0 {
            return None;
        }
        let num = usize::try_from(bins).unwrap_or(usize::MAX);
        let start = first.block_number.saturating_sub(first.blocks);
        Some(Self::new(start, last.block_number, num))
    }

    /// Number of edges, duplicates included.
    pub fn len(&self) -> usize {
        self.num
    }

    /// Whether there are no edges at all.
    pub fn is_empty(&self) -> bool {
        self.num == 0
    }

    /// Edge `i`; `i` must be below [`Self::len`].
    pub fn edge(&self, i: usize) -> i64 {
        if i + 1 == self.num {
            self.stop
        } else {
            (self.start as f64 + i as f64 * self.step) as i64
        }
    }

    /// All distinct edges, in order. Allocates; meant for small `len`.
    pub fn distinct(&self) -> Vec<i64> {
        let mut edges: Vec<i64> = (0..self.num).map(|i| self.edge(i)).collect();
        edges.dedup();
        edges
    }

    // First index whose edge fails `pred`; edges are non-decreasing.
    fn partition_point(&self, pred: impl Fn(i64) -> bool) -> usize {
        let (mut lo, mut hi) = (0, self.num);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if pred(self.edge(mid)) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// The bucket `(lower, upper]` between distinct edges that contains
    /// `block_number`.
    ///
    /// The first bucket also contains its lower edge. Values outside the
    /// edges, and any value when fewer than two distinct edges exist, map
    /// to `None`.
    pub fn bucket(&self, block_number: i64) -> Option<(i64, i64)> {
        if self.num < 2 {
            return None;
        }
        let i = self.partition_point(|e| e < block_number);
        if i == self.num {
            return None;
        }
        let upper = self.edge(i);
        if i > 0 {
            return Some((self.edge(i - 1), upper));
        }
        if block_number != upper {
            return None;
        }
        let next = self.partition_point(|e| e <= upper);
        (next < self.num).then(|| (upper, self.edge(next)))
    }
}

/// Reduce aligned rows into buckets.
///
/// `bins <= 0` returns one bucket per row with the row's values unchanged.
pub fn aggregate(rows: &[AlignedRow], bins: i64) -> Vec<Bucket> {
    let Some(edges) = BinEdges::for_rows(rows, bins) else {
        if bins > 0 {
            return Vec::new();
        }
        return rows.iter().map(Bucket::from_row).collect();
    };

    let mut accs: BTreeMap<(i64, i64), Acc> = BTreeMap::new();
    for r in rows {
        if let Some(key) = edges.bucket(r.block_number) {
            accs.entry(key).or_default().push(r);
        }
    }

    accs.into_iter()
        .map(|((lower, upper), acc)| acc.finish(BucketLabel::Range { lower, upper }))
        .collect()
}
