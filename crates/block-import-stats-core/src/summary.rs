//! Whole-run totals across all aligned rows.

use crate::{aggregate::Column, delta::AlignedRow};

/// Totals and averages for the complete comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Number of aligned rows.
    pub rows: usize,
    /// Total blocks covered by the aligned rows.
    pub blocks: i64,
    /// Total baseline time in seconds.
    pub time_x: f64,
    /// Total contender time in seconds.
    pub time_y: f64,
    /// Mean of the per-row bps differences.
    pub bpsd_mean: f64,
    /// Mean of the per-row tps differences.
    pub tpsd_mean: f64,
}

impl Summary {
    /// Compute totals over `rows`, skipping `NaN` cells per column. A mean
    /// over a column with no other cells is `NaN`.
    pub fn from_rows(rows: &[AlignedRow]) -> Self {
        let column = |pick: fn(&AlignedRow) -> f64| rows.iter().map(pick).collect::<Column>();
        Self {
            rows: rows.len(),
            blocks: rows.iter().fold(0i64, |acc, r| acc.saturating_add(r.blocks)),
            time_x: column(|r| r.time_x).sum(),
            time_y: column(|r| r.time_y).sum(),
            bpsd_mean: column(|r| r.bpsd).mean(),
            tpsd_mean: column(|r| r.tpsd).mean(),
        }
    }

    /// Contender total time minus baseline total time, in seconds.
    pub fn time_diff(&self) -> f64 {
        self.time_y - self.time_x
    }

    /// [`Self::time_diff`] relative to the baseline total.
    pub fn time_diff_ratio(&self) -> f64 {
        self.time_diff() / self.time_x
    }
}
