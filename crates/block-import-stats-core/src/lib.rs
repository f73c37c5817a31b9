//! Core of `block-import-stats`: compare two block-import benchmark runs.
//!
//! A benchmark run is a CSV of per-interval samples
//! (`block_number, blocks, txs, gas, time`). This crate provides the pieces
//! that turn two such runs into a comparison:
//!
//! - Loading and normalizing samples into a [`Series`] (`series` module).
//! - Restricting both runs to their common block range, joining them and
//!   interpolating gaps (`align` module).
//! - Per-row relative differences (`delta` module).
//! - Bucketing rows into block ranges (`aggregate` module) and whole-run
//!   totals (`summary` module).
//! - Shared number/duration formatting for reporters (`format` module).
//!
//! The crate does no output of its own; rendering tables, files and charts
//! is left to the CLI.
//!
//! ```
//! use block_import_stats_core::{CompareOptions, compare, load_series_from_reader};
//!
//! let csv = "block_number,blocks,txs,gas,time\n1000,10,50,0,2000000000\n";
//! let baseline = load_series_from_reader(csv.as_bytes(), "baseline").unwrap();
//! let contender = load_series_from_reader(csv.as_bytes(), "contender").unwrap();
//!
//! let cmp = compare(&baseline, &contender, &CompareOptions::default()).unwrap();
//! assert_eq!(cmp.rows[0].bps_x, 5.0);
//! assert_eq!(cmp.rows[0].timed, 0.0);
//! ```
#![deny(missing_docs)]

pub mod aggregate;
pub mod align;
pub mod compare;
pub mod delta;
pub mod error;
pub mod format;
pub mod series;
pub mod summary;

pub use aggregate::{Bucket, BucketLabel};
pub use align::BlockRange;
pub use compare::{CompareOptions, Comparison, compare};
pub use delta::AlignedRow;
pub use error::{StatsError, StatsResult};
pub use series::{Sample, Series, load_series, load_series_from_reader};
pub use summary::Summary;
