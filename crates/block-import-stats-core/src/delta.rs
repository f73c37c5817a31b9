//! Per-row relative differences between baseline and contender.

use crate::align::{AlignedPair, Metrics};

/// One aligned row with both sides' metrics and their relative differences.
///
/// Field suffixes follow the usual join convention: `_x` is the baseline,
/// `_y` the contender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    /// Contender block number.
    pub block_number: i64,
    /// Contender chunk size.
    pub blocks: i64,
    /// Baseline interval time in seconds.
    pub time_x: f64,
    /// Contender interval time in seconds.
    pub time_y: f64,
    /// Baseline blocks per second.
    pub bps_x: f64,
    /// Contender blocks per second.
    pub bps_y: f64,
    /// Baseline transactions per second.
    pub tps_x: f64,
    /// Contender transactions per second.
    pub tps_y: f64,
    /// Relative bps difference; positive means the contender is faster.
    pub bpsd: f64,
    /// Relative tps difference; positive means the contender is faster.
    pub tpsd: f64,
    /// Relative time difference; negative means the contender is faster.
    pub timed: f64,
}

impl AlignedRow {
    /// Compute the deltas for one baseline/contender pair.
    pub fn from_pair(pair: &AlignedPair) -> Self {
        let AlignedPair {
            block_number,
            blocks,
            baseline: Metrics {
                time: time_x,
                bps: bps_x,
                tps: tps_x,
            },
            contender: Metrics {
                time: time_y,
                bps: bps_y,
                tps: tps_y,
            },
        } = *pair;

        Self {
            block_number,
            blocks,
            time_x,
            time_y,
            bps_x,
            bps_y,
            tps_x,
            tps_y,
            bpsd: relative_diff(bps_x, bps_y),
            tpsd: tps_diff(tps_x, tps_y),
            timed: relative_diff(time_x, time_y),
        }
    }
}

/// `(contender - baseline) / baseline`, with no guarding.
pub fn relative_diff(baseline: f64, contender: f64) -> f64 {
    (contender - baseline) / baseline
}

/// Relative tps difference; an exact-zero baseline divides by 1 instead.
pub fn tps_diff(baseline: f64, contender: f64) -> f64 {
    let denom = if baseline == 0.0 { 1.0 } else { baseline };
    (contender - baseline) / denom
}

/// Compute deltas for every aligned pair, preserving order.
pub fn compute_deltas(pairs: &[AlignedPair]) -> Vec<AlignedRow> {
    pairs.iter().map(AlignedRow::from_pair).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    fn pair(base: (f64, f64, f64), cont: (f64, f64, f64)) -> AlignedPair {
        AlignedPair {
            block_number: 1,
            blocks: 1,
            baseline: Metrics {
                time: base.0,
                bps: base.1,
                tps: base.2,
            },
            contender: Metrics {
                time: cont.0,
                bps: cont.1,
                tps: cont.2,
            },
        }
    }

    #[test]
    fn faster_contender_has_positive_rate_and_negative_time_diff() {
        let row = AlignedRow::from_pair(&pair((2.0, 5.0, 25.0), (1.8, 10.0 / 1.8, 55.0 / 1.8)));
        assert!(close(row.bpsd, 0.1111));
        assert!(close(row.tpsd, 0.2222));
        assert!(close(row.timed, -0.1));
    }

    #[test]
    fn zero_baseline_tps_divides_by_one() {
        assert_eq!(tps_diff(0.0, 3.0), 3.0);
        assert_eq!(tps_diff(2.0, 3.0), 0.5);
    }

    #[test]
    fn zero_baseline_bps_is_not_guarded() {
        assert!(relative_diff(0.0, 1.0).is_infinite());
        assert!(relative_diff(0.0, 0.0).is_nan());
    }

    #[test]
    fn compute_deltas_keeps_order() {
        let pairs = [
            AlignedPair {
                block_number: 5,
                ..pair((1.0, 1.0, 1.0), (1.0, 1.0, 1.0))
            },
            AlignedPair {
                block_number: 9,
                ..pair((1.0, 1.0, 1.0), (2.0, 0.5, 0.5))
            },
        ];
        let rows = compute_deltas(&pairs);
        assert_eq!(rows[0].block_number, 5);
        assert_eq!(rows[1].block_number, 9);
        assert_eq!(rows[1].timed, 1.0);
        assert_eq!(rows[1].bpsd, -0.5);
    }
}
