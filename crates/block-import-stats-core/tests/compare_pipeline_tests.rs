#![allow(missing_docs)]

use std::io::Write;
use std::path::Path;

use block_import_stats_core::{
    BlockRange, BucketLabel, CompareOptions, StatsError, compare, load_series,
    load_series_from_reader,
};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const HEADER: &str = "block_number,blocks,txs,gas,time";

fn write_samples(path: &Path, rows: &[(i64, i64, i64, u64)]) -> std::io::Result<()> {
    let mut f = std::fs::File::create(path)?;
    writeln!(f, "{HEADER}")?;
    for (bn, blocks, txs, ns) in rows {
        writeln!(f, "{bn},{blocks},{txs},0,{ns}")?;
    }
    Ok(())
}

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

#[test]
fn two_sample_runs_match_hand_computed_deltas() -> TestResult {
    let tmp = TempDir::new()?;
    let base_path = tmp.path().join("baseline.csv");
    let cont_path = tmp.path().join("contender.csv");
    write_samples(
        &base_path,
        &[(1000, 10, 50, 2_000_000_000), (2000, 10, 60, 2_500_000_000)],
    )?;
    write_samples(
        &cont_path,
        &[(1000, 10, 55, 1_800_000_000), (2000, 10, 65, 2_200_000_000)],
    )?;

    let baseline = load_series(&base_path)?;
    let contender = load_series(&cont_path)?;
    let opts = CompareOptions {
        bins: 0,
        ..CompareOptions::default()
    };
    let cmp = compare(&baseline, &contender, &opts)?;

    assert_eq!(cmp.range, BlockRange::new(1000, 2000));
    assert_eq!(cmp.rows.len(), 2);

    let bps_x: Vec<f64> = cmp.rows.iter().map(|r| r.bps_x).collect();
    assert_eq!(bps_x, vec![5.0, 4.0]);

    // tpsd compares tx *rates*: (55 / 1.8) / (50 / 2) - 1 and
    // (65 / 2.2) / (60 / 2.5) - 1.
    let expected = [(5.56, 0.2222, -0.10), (4.55, 0.2311, -0.12)];
    for (row, (bps_y, tpsd, timed)) in cmp.rows.iter().zip(expected) {
        assert!(close(row.bps_y, bps_y, 0.01), "bps_y={}", row.bps_y);
        assert!(close(row.tpsd, tpsd, 0.001), "tpsd={}", row.tpsd);
        assert!(close(row.timed, timed, 1e-9), "timed={}", row.timed);
    }

    assert_eq!(cmp.buckets.len(), 2);
    assert_eq!(cmp.buckets[0].label, BucketLabel::Block(1000));
    assert_eq!(cmp.summary.blocks, 20);
    assert!(close(cmp.summary.time_x, 4.5, 1e-12));
    assert!(close(cmp.summary.time_y, 4.0, 1e-12));
    Ok(())
}

#[test]
fn disjoint_runs_fail_with_no_overlap() -> TestResult {
    let base_csv = format!("{HEADER}\n100,1,1,0,1000\n200,1,1,0,1000\n");
    let cont_csv = format!("{HEADER}\n500,1,1,0,1000\n600,1,1,0,1000\n");
    let baseline = load_series_from_reader(base_csv.as_bytes(), "baseline")?;
    let contender = load_series_from_reader(cont_csv.as_bytes(), "contender")?;

    let err = compare(&baseline, &contender, &CompareOptions::default())
        .err()
        .ok_or("expected an error")?;
    assert!(matches!(err, StatsError::NoOverlap { .. }));
    let msg = err.to_string();
    assert!(msg.contains("[100, 200]") && msg.contains("[500, 600]"), "{msg}");
    Ok(())
}

#[test]
fn binned_run_covers_every_aligned_row() -> TestResult {
    // 1000 samples of 1000 blocks each; contender 10% faster throughout.
    let mut base = String::from(HEADER);
    let mut cont = String::from(HEADER);
    for i in 1..=1000i64 {
        base.push_str(&format!("\n{},1000,{},0,1000000000", i * 1000, 100 + i % 7));
        cont.push_str(&format!("\n{},1000,{},0,900000000", i * 1000, 100 + i % 7));
    }
    let baseline = load_series_from_reader(base.as_bytes(), "baseline")?;
    let contender = load_series_from_reader(cont.as_bytes(), "contender")?;

    let cmp = compare(&baseline, &contender, &CompareOptions::default())?;

    // last = 1_000_000 > 500_000 + 1000: rows below 500_000 are warm-up.
    assert_eq!(cmp.rows.first().map(|r| r.block_number), Some(500_000));
    assert_eq!(cmp.rows.len(), 501);

    assert!(cmp.buckets.len() <= 9);
    let binned: usize = cmp.buckets.iter().map(|b| b.rows).sum();
    assert_eq!(binned, cmp.rows.len());
    for b in &cmp.buckets {
        assert!(close(b.timed, -0.1, 1e-9));
        assert!(b.bpsd > 0.0 && b.tpsd > 0.0);
    }
    assert!(close(cmp.summary.time_diff_ratio(), -0.1, 1e-9));
    Ok(())
}

#[test]
fn identical_keys_make_join_a_no_op() -> TestResult {
    let csv_a = format!("{HEADER}\n10,5,20,0,1000000000\n20,10,30,0,3000000000\n30,10,40,0,2000000000\n");
    let csv_b = format!("{HEADER}\n10,5,25,0,2000000000\n20,10,35,0,1000000000\n30,10,41,0,4000000000\n");
    let a = load_series_from_reader(csv_a.as_bytes(), "a")?;
    let b = load_series_from_reader(csv_b.as_bytes(), "b")?;
    let opts = CompareOptions {
        bins: 0,
        min_block_number: 0,
    };
    let cmp = compare(&a, &b, &opts)?;

    assert_eq!(cmp.rows.len(), 3);
    for ((row, sa), sb) in cmp.rows.iter().zip(a.samples()).zip(b.samples()) {
        assert_eq!(row.block_number, sa.block_number);
        assert_eq!((row.time_x, row.bps_x, row.tps_x), (sa.time, sa.bps, sa.tps));
        assert_eq!((row.time_y, row.bps_y, row.tps_y), (sb.time, sb.bps, sb.tps));
    }
    Ok(())
}

#[test]
fn offset_sampling_skips_uninterpolated_baseline_cells() -> TestResult {
    // The contender samples 50 blocks later, so its first key lies before
    // any baseline value and stays a gap after interpolation.
    let base_csv = format!(
        "{HEADER}\n1000,1000,2000,0,1000000000\n2000,1000,2000,0,1000000000\n3000,1000,2000,0,1000000000\n"
    );
    let cont_csv = format!(
        "{HEADER}\n1050,1000,2000,0,500000000\n2050,1000,2000,0,500000000\n3050,1000,2000,0,500000000\n"
    );
    let baseline = load_series_from_reader(base_csv.as_bytes(), "baseline")?;
    let contender = load_series_from_reader(cont_csv.as_bytes(), "contender")?;
    let opts = CompareOptions {
        bins: 2,
        min_block_number: 0,
    };
    let cmp = compare(&baseline, &contender, &opts)?;

    assert_eq!(cmp.range, BlockRange::new(1050, 3000));
    let keys: Vec<i64> = cmp.rows.iter().map(|r| r.block_number).collect();
    assert_eq!(keys, vec![1050, 2050]);
    assert!(cmp.rows[0].time_x.is_nan());
    assert_eq!(cmp.rows[1].time_x, 1.0);

    // Edges 50 and 2050: one bucket holding both rows.
    assert_eq!(cmp.buckets.len(), 1);
    let b = &cmp.buckets[0];
    assert_eq!(b.label, BucketLabel::Range { lower: 50, upper: 2050 });
    assert_eq!(b.rows, 2);
    assert_eq!(b.bps_x, 1000.0);
    assert_eq!(b.bps_y, 2000.0);
    assert_eq!(b.bpsd, 1.0);
    assert_eq!(b.time_x, 1.0);
    assert_eq!(b.time_y, 1.0);

    let s = &cmp.summary;
    assert_eq!(s.time_x, 1.0);
    assert_eq!(s.time_y, 1.0);
    assert_eq!(s.bpsd_mean, 1.0);
    assert_eq!(s.tpsd_mean, 1.0);
    assert_eq!(s.time_diff(), 0.0);
    Ok(())
}
