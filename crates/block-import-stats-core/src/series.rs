//! Loading raw block-import samples into a [`Series`].
//!
//! Input files are comma-delimited with a header row naming at least
//! `block_number, blocks, txs, gas, time`. Columns are located by name, so
//! their order does not matter and extra columns are ignored. `time` is the
//! elapsed nanoseconds of the sample interval and is converted to seconds on
//! load; `gas` is validated as numeric and then dropped.

use std::{
    fs::File,
    io::{Cursor, Read},
    path::Path,
    sync::Arc,
};

use arrow::{
    array::{Array, AsArray, RecordBatch},
    datatypes::{DataType, Field, Float64Type, Int64Type, Schema},
};
use arrow_csv::reader::{Format, ReaderBuilder};
use log::{debug, warn};
use snafu::{OptionExt, ResultExt};

use crate::{
    align::BlockRange,
    error::{
        CsvSnafu, InvalidColumnTypeSnafu, IoSnafu, MissingColumnSnafu, NullValueSnafu,
        StatsResult,
    },
};

/// Column holding the sample's block number (the series key).
pub const BLOCK_NUMBER: &str = "block_number";
/// Column holding the number of blocks imported in the interval.
pub const BLOCKS: &str = "blocks";
/// Column holding the number of transactions imported in the interval.
pub const TXS: &str = "txs";
/// Column holding gas used in the interval (validated, then discarded).
pub const GAS: &str = "gas";
/// Column holding the interval duration in nanoseconds.
pub const TIME: &str = "time";

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// One normalized sample interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Block number at the end of the interval.
    pub block_number: i64,
    /// Blocks imported during the interval.
    pub blocks: i64,
    /// Transactions imported during the interval.
    pub txs: i64,
    /// Interval duration in seconds.
    pub time: f64,
    /// Blocks per second.
    pub bps: f64,
    /// Transactions per second.
    pub tps: f64,
}

impl Sample {
    /// Build a sample from raw counters, with `time_ns` in nanoseconds.
    ///
    /// Rates are plain divisions: a zero duration yields infinite or NaN
    /// rates rather than an error.
    pub fn from_raw(block_number: i64, blocks: i64, txs: i64, time_ns: f64) -> Self {
        let time = time_ns / NANOS_PER_SEC;
        Self {
            block_number,
            blocks,
            txs,
            time,
            bps: blocks as f64 / time,
            tps: txs as f64 / time,
        }
    }
}

/// Samples of one benchmark run, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    samples: Vec<Sample>,
}

impl Series {
    /// Wrap already-normalized samples. Order is kept as given.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// All samples, in input order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Smallest and largest block number, or `None` for an empty series.
    pub fn block_range(&self) -> Option<BlockRange> {
        let start = self.samples.iter().map(|s| s.block_number).min()?;
        let end = self.samples.iter().map(|s| s.block_number).max()?;
        Some(BlockRange::new(start, end))
    }
}

/// Load a samples file from disk.
pub fn load_series(path: impl AsRef<Path>) -> StatsResult<Series> {
    let path = path.as_ref();
    let input = path.display().to_string();
    let file = File::open(path).context(IoSnafu {
        input: input.clone(),
    })?;
    load_series_from_reader(file, &input)
}

/// Load samples from any reader. `input` names the source in errors.
pub fn load_series_from_reader<R: Read>(mut reader: R, input: &str) -> StatsResult<Series> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).context(IoSnafu { input })?;

    let format = Format::default().with_header(true);
    let (header, _) = format
        .infer_schema(Cursor::new(&bytes), Some(0))
        .context(CsvSnafu { input })?;

    for column in [BLOCK_NUMBER, BLOCKS, TXS, GAS, TIME] {
        header
            .column_with_name(column)
            .context(MissingColumnSnafu { input, column })?;
    }

    // Re-read with the columns we care about typed; anything else stays text.
    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|f| {
            let data_type = match f.name().as_str() {
                BLOCK_NUMBER | BLOCKS | TXS => DataType::Int64,
                GAS | TIME => DataType::Float64,
                _ => DataType::Utf8,
            };
            Field::new(f.name(), data_type, true)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let csv = ReaderBuilder::new(schema)
        .with_format(format)
        .build(Cursor::new(&bytes))
        .context(CsvSnafu { input })?;

    let mut samples = Vec::new();
    for batch in csv {
        let batch = batch.context(CsvSnafu { input })?;
        append_batch(&batch, input, &mut samples)?;
    }

    let non_positive = samples.iter().filter(|s| s.time <= 0.0).count();
    if non_positive > 0 {
        warn!("{input}: {non_positive} samples with non-positive time; rates will be non-finite");
    }
    debug!("{input}: loaded {} samples", samples.len());

    Ok(Series::new(samples))
}

fn append_batch(batch: &RecordBatch, input: &str, out: &mut Vec<Sample>) -> StatsResult<()> {
    let offset = out.len();
    let block_number = int_column(batch, BLOCK_NUMBER, input, offset)?;
    let blocks = int_column(batch, BLOCKS, input, offset)?;
    let txs = int_column(batch, TXS, input, offset)?;
    // Only checked for presence and type.
    float_column(batch, GAS, input, offset)?;
    let time = float_column(batch, TIME, input, offset)?;

    out.extend((0..batch.num_rows()).map(|i| {
        Sample::from_raw(block_number[i], blocks[i], txs[i], time[i])
    }));
    Ok(())
}

fn column<'a>(batch: &'a RecordBatch, name: &str, input: &str) -> StatsResult<&'a dyn Array> {
    batch
        .column_by_name(name)
        .map(|c| c.as_ref())
        .context(MissingColumnSnafu {
            input,
            column: name,
        })
}

fn ensure_no_nulls(array: &dyn Array, name: &str, input: &str, offset: usize) -> StatsResult<()> {
    if array.null_count() == 0 {
        return Ok(());
    }
    let row = (0..array.len()).find(|&i| array.is_null(i)).unwrap_or(0);
    NullValueSnafu {
        input,
        column: name,
        row: offset + row,
    }
    .fail()
}

fn int_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
    input: &str,
    offset: usize,
) -> StatsResult<&'a [i64]> {
    let array = column(batch, name, input)?;
    let values = array
        .as_primitive_opt::<Int64Type>()
        .with_context(|| InvalidColumnTypeSnafu {
            input,
            column: name,
            data_type: array.data_type().clone(),
        })?;
    ensure_no_nulls(array, name, input, offset)?;
    let values: &[i64] = values.values();
    Ok(values)
}

fn float_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
    input: &str,
    offset: usize,
) -> StatsResult<&'a [f64]> {
    let array = column(batch, name, input)?;
    let values = array
        .as_primitive_opt::<Float64Type>()
        .with_context(|| InvalidColumnTypeSnafu {
            input,
            column: name,
            data_type: array.data_type().clone(),
        })?;
    ensure_no_nulls(array, name, input, offset)?;
    let values: &[f64] = values.values();
    Ok(values)
}
