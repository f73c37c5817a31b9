use std::{
    io::Write,
    path::{Path, PathBuf},
};

type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub const HEADER: &str = "block_number,blocks,txs,gas,time";

/// Write a samples CSV; rows are `(block_number, blocks, txs, time_ns)`.
pub fn write_samples(path: &Path, rows: &[(i64, i64, i64, u64)]) -> TestResult {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::File::create(path)?;
    writeln!(f, "{HEADER}")?;
    for (bn, blocks, txs, ns) in rows {
        writeln!(f, "{bn},{blocks},{txs},{},{ns}", txs * 21_000)?;
    }
    Ok(())
}

/// A run of `count` samples of `chunk` blocks each, every sample taking
/// `ns_per_sample` nanoseconds.
#[allow(dead_code)]
pub fn steady_run(count: i64, chunk: i64, ns_per_sample: u64) -> Vec<(i64, i64, i64, u64)> {
    (1..=count)
        .map(|i| (i * chunk, chunk, 50 + i % 11, ns_per_sample))
        .collect()
}

pub fn sample_path(tmp: &tempfile::TempDir, name: &str) -> PathBuf {
    tmp.path().join(name)
}
