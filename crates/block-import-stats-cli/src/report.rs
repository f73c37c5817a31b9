use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::Arc,
};

use arrow::{
    array::{ArrayRef, Float64Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema},
};
use block_import_stats_core::{
    Bucket, Comparison, Summary,
    format::{format_number, format_percent, pretty_secs},
};
use snafu::ResultExt;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

use crate::error::{ArrowSnafu, CliError, CliResult, CreateOutputSnafu, WriteOutputSnafu};

/// Per-bucket columns, in output order.
pub const COLUMNS: [&str; 10] = [
    "block_range",
    "bps_baseline",
    "bps_contender",
    "tps_baseline",
    "tps_contender",
    "time_baseline",
    "time_contender",
    "bps_diff",
    "tps_diff",
    "time_diff",
];

const LEGEND: [&str; 2] = [
    "bps_diff = blocks per sec diff (+), tps_diff = txs per sec diff (+), \
     time_diff = time to process diff (-)",
    "+ = more is better, - = less is better",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Csv,
}

/// A finished comparison plus the names of the two inputs.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    pub baseline: &'a str,
    pub contender: &'a str,
    pub comparison: &'a Comparison,
}

impl Report<'_> {
    fn title(&self) -> String {
        format!("{} vs {}", self.baseline, self.contender)
    }
}

/// File name of an input path, for report headers.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| path.display().to_string())
}

fn bucket_cells(b: &Bucket) -> Vec<String> {
    vec![
        b.label.to_string(),
        format_number(b.bps_x, 2),
        format_number(b.bps_y, 2),
        format_number(b.tps_x, 2),
        format_number(b.tps_y, 2),
        format_number(b.time_x, 2),
        format_number(b.time_y, 2),
        format_percent(b.bpsd),
        format_percent(b.tpsd),
        format_percent(b.timed),
    ]
}

fn render_table(buckets: &[Bucket], style: ReportStyle) -> String {
    let mut builder = Builder::default();
    builder.push_record(COLUMNS);
    for b in buckets {
        builder.push_record(bucket_cells(b));
    }

    let mut table = builder.build();
    match style {
        ReportStyle::Console => table.with(Style::rounded()),
        ReportStyle::Markdown => table.with(Style::markdown()),
    };
    table.modify(Columns::new(1..), Alignment::right());
    table.to_string()
}

#[derive(Debug, Clone, Copy)]
enum ReportStyle {
    Console,
    Markdown,
}

fn summary_lines(s: &Summary) -> [String; 4] {
    [
        format!(
            "blocks: {}, baseline: {}, contender: {}",
            s.blocks,
            pretty_secs(s.time_x),
            pretty_secs(s.time_y)
        ),
        format!("bps_diff (mean): {}", format_percent(s.bpsd_mean)),
        format!("tps_diff (mean): {}", format_percent(s.tpsd_mean)),
        format!(
            "time_diff (total): {}, {}",
            pretty_secs(s.time_diff()),
            format_percent(s.time_diff_ratio())
        ),
    ]
}

fn write_err(target: &str) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::WriteOutput {
        target: target.to_string(),
        source,
    }
}

pub fn write_console<W: Write>(report: &Report<'_>, out: &mut W) -> CliResult<()> {
    let cmp = report.comparison;
    let mut text = String::new();
    text.push_str(&report.title());
    text.push('\n');
    if cmp.buckets.is_empty() {
        text.push_str("(no rows)\n");
    } else {
        text.push_str(&render_table(&cmp.buckets, ReportStyle::Console));
        text.push('\n');
    }
    text.push('\n');
    for line in summary_lines(&cmp.summary) {
        text.push_str(&line);
        text.push('\n');
    }
    text.push('\n');
    for line in LEGEND {
        text.push_str(line);
        text.push('\n');
    }

    out.write_all(text.as_bytes()).map_err(write_err("stdout"))
}

pub fn write_markdown<W: Write>(report: &Report<'_>, out: &mut W) -> CliResult<()> {
    let cmp = report.comparison;
    let mut text = format!("# {}\n\n", report.title());
    if cmp.buckets.is_empty() {
        text.push_str("_No rows._\n");
    } else {
        text.push_str(&render_table(&cmp.buckets, ReportStyle::Markdown));
        text.push('\n');
    }

    text.push_str("\n## Summary\n\n");
    for line in summary_lines(&cmp.summary) {
        text.push_str(&format!("- {line}\n"));
    }
    text.push('\n');
    for line in LEGEND {
        text.push_str(&format!("> {line}\n"));
    }

    out.write_all(text.as_bytes()).map_err(write_err("markdown output"))
}

fn bucket_batch(buckets: &[Bucket]) -> CliResult<RecordBatch> {
    let mut fields = vec![Field::new(COLUMNS[0], DataType::Utf8, false)];
    fields.extend(
        COLUMNS[1..]
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false)),
    );

    let floats = |f: fn(&Bucket) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(buckets.iter().map(f)))
    };
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            buckets.iter().map(|b| b.label.to_string()),
        )),
        floats(|b| b.bps_x),
        floats(|b| b.bps_y),
        floats(|b| b.tps_x),
        floats(|b| b.tps_y),
        floats(|b| b.time_x),
        floats(|b| b.time_y),
        floats(|b| b.bpsd),
        floats(|b| b.tpsd),
        floats(|b| b.timed),
    ];

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context(ArrowSnafu)
}

/// CSV table of buckets (raw values; diffs as ratios), then a blank line and
/// `metric,value` summary rows.
pub fn write_csv<W: Write>(report: &Report<'_>, out: W) -> CliResult<W> {
    let batch = bucket_batch(&report.comparison.buckets)?;
    let mut writer = arrow_csv::WriterBuilder::new().with_header(true).build(out);
    writer.write(&batch).context(ArrowSnafu)?;
    let mut out = writer.into_inner();

    let s = &report.comparison.summary;
    let mut text = String::from("\nmetric,value\n");
    for (metric, value) in [
        ("blocks", s.blocks.to_string()),
        ("time_baseline", s.time_x.to_string()),
        ("time_contender", s.time_y.to_string()),
        ("bps_diff_mean", s.bpsd_mean.to_string()),
        ("tps_diff_mean", s.tpsd_mean.to_string()),
        ("time_diff_total", s.time_diff().to_string()),
        ("time_diff_ratio", s.time_diff_ratio().to_string()),
    ] {
        text.push_str(&format!("{metric},{value}\n"));
    }
    out.write_all(text.as_bytes())
        .map_err(write_err("csv output"))?;
    Ok(out)
}

/// Write the report to `path` in `format`. The file is closed on return,
/// including on error.
pub fn write_report_file(path: &Path, format: ReportFormat, report: &Report<'_>) -> CliResult<()> {
    let target = path.display().to_string();
    let file = File::create(path).context(CreateOutputSnafu {
        path: target.clone(),
    })?;
    let mut out = BufWriter::new(file);

    match format {
        ReportFormat::Markdown => write_markdown(report, &mut out)?,
        ReportFormat::Csv => {
            out = write_csv(report, out)?;
        }
    }

    out.flush().context(WriteOutputSnafu { target })?;
    log::info!("wrote {format:?} report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_import_stats_core::{BlockRange, BucketLabel};

    fn bucket(label: BucketLabel, v: f64) -> Bucket {
        Bucket {
            label,
            rows: 1,
            blocks: 10,
            bps_x: 1234.5,
            bps_y: v,
            tps_x: 1.0,
            tps_y: 1.0,
            bpsd: 0.125,
            tpsd: 0.0,
            timed: -0.5,
            time_x: 2.0,
            time_y: 1.0,
        }
    }

    fn comparison(buckets: Vec<Bucket>) -> Comparison {
        Comparison {
            range: BlockRange::new(0, 100),
            rows: Vec::new(),
            buckets,
            summary: Summary {
                rows: 2,
                blocks: 20,
                time_x: 3725.0,
                time_y: 3600.0,
                bpsd_mean: 0.1,
                tpsd_mean: 0.05,
            },
        }
    }

    fn render<F>(cmp: &Comparison, f: F) -> String
    where
        F: FnOnce(&Report<'_>, &mut Vec<u8>) -> CliResult<()>,
    {
        let report = Report {
            baseline: "base.csv",
            contender: "cont.csv",
            comparison: cmp,
        };
        let mut buf = Vec::new();
        f(&report, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn console_report_has_table_summary_and_legend() {
        let cmp = comparison(vec![bucket(
            BucketLabel::Range {
                lower: 0,
                upper: 100,
            },
            f64::INFINITY,
        )]);
        let text = render(&cmp, |r, out| write_console(r, out));

        assert!(text.starts_with("base.csv vs cont.csv\n"));
        assert!(text.contains("block_range"));
        assert!(text.contains("(0, 100]"));
        assert!(text.contains("1,234.50"));
        assert!(text.contains("inf"));
        assert!(text.contains("12.50%"));
        assert!(text.contains("-50.00%"));
        assert!(text.contains("blocks: 20, baseline: 1h2m5s, contender: 1h0m0s"));
        assert!(text.contains("time_diff (total): -2m5s, -3.36%"));
        assert!(text.contains("+ = more is better, - = less is better"));
    }

    #[test]
    fn console_report_without_buckets_says_so() {
        let text = render(&comparison(Vec::new()), |r, out| write_console(r, out));
        assert!(text.contains("(no rows)"));
    }

    #[test]
    fn markdown_report_uses_pipe_table() {
        let cmp = comparison(vec![bucket(BucketLabel::Block(42), 2.0)]);
        let text = render(&cmp, |r, out| write_markdown(r, out));

        assert!(text.starts_with("# base.csv vs cont.csv\n"));
        assert!(text.contains("## Summary"));
        let header = text
            .lines()
            .find(|l| l.contains("block_range"))
            .unwrap_or_default();
        assert!(header.starts_with('|'), "{header}");
        assert!(text.contains("| 42"));
        assert!(text.contains("- bps_diff (mean): 10.00%"));
    }

    #[test]
    fn csv_report_has_header_rows_and_summary() {
        let cmp = comparison(vec![
            bucket(BucketLabel::Block(1), 2.0),
            bucket(BucketLabel::Block(2), 3.0),
        ]);
        let text = render(&cmp, |r, out| write_csv(r, out).map(|_| ()));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], COLUMNS.join(","));
        assert!(lines[1].starts_with("1,1234.5,2"), "{}", lines[1]);
        assert!(lines[2].starts_with("2,1234.5,3"), "{}", lines[2]);
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "metric,value");
        assert!(lines.contains(&"blocks,20"));
        assert!(lines.contains(&"time_diff_total,-125"));
    }

    #[test]
    fn display_name_uses_file_name() {
        assert_eq!(display_name(Path::new("/tmp/runs/base.csv")), "base.csv");
        assert_eq!(display_name(Path::new("plain")), "plain");
    }
}
