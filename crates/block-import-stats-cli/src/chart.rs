//! Rolling-mean charts of a comparison, rendered as a standalone SVG.
//!
//! Four panels in a 2x2 grid, all plotted against `block_number`:
//! bps (baseline and contender), bps diff, tps (baseline and contender) and
//! tps diff. Every line is the rolling mean over the last [`WINDOW`] rows.

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use block_import_stats_core::AlignedRow;
use log::{debug, warn};
use snafu::ResultExt;

use crate::error::{CliResult, WriteChartSnafu};

/// Rolling-mean window, in rows.
pub const WINDOW: usize = 3;

const PANEL_W: f64 = 640.0;
const PANEL_H: f64 = 360.0;
const MARGIN: f64 = 56.0;
const TITLE_H: f64 = 28.0;

mod colors {
    pub const BASELINE: &str = "#1f77b4";
    pub const CONTENDER: &str = "#ff7f0e";
    pub const DIFF: &str = "#2ca02c";
    pub const AXIS: &str = "#616161";
    pub const GRID: &str = "#E0E0E0";
    pub const ZERO: &str = "#9E9E9E";
}

/// Mean of each `window`-row trailing window; `None` until the window fills.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                let slice = &values[i + 1 - window..=i];
                Some(slice.iter().sum::<f64>() / window as f64)
            }
        })
        .collect()
}

struct Line<'a> {
    label: Option<&'a str>,
    color: &'a str,
    points: Vec<(f64, f64)>,
}

struct Panel<'a> {
    title: &'a str,
    lines: Vec<Line<'a>>,
    zero_line: bool,
}

fn line<'a>(
    rows: &[AlignedRow],
    label: Option<&'a str>,
    color: &'a str,
    pick: fn(&AlignedRow) -> f64,
) -> Line<'a> {
    let values: Vec<f64> = rows.iter().map(pick).collect();
    let points = rows
        .iter()
        .zip(rolling_mean(&values, WINDOW))
        .filter_map(|(r, m)| m.filter(|v| v.is_finite()).map(|v| (r.block_number as f64, v)))
        .collect();
    Line {
        label,
        color,
        points,
    }
}

fn panels(rows: &[AlignedRow]) -> [Panel<'static>; 4] {
    [
        Panel {
            title: "Blocks per second (more is better)",
            lines: vec![
                line(rows, Some("baseline"), colors::BASELINE, |r| r.bps_x),
                line(rows, Some("contender"), colors::CONTENDER, |r| r.bps_y),
            ],
            zero_line: false,
        },
        Panel {
            title: "Difference (>0 is better)",
            lines: vec![line(rows, None, colors::DIFF, |r| r.bpsd)],
            zero_line: true,
        },
        Panel {
            title: "Transactions per second (more is better)",
            lines: vec![
                line(rows, Some("baseline"), colors::BASELINE, |r| r.tps_x),
                line(rows, Some("contender"), colors::CONTENDER, |r| r.tps_y),
            ],
            zero_line: false,
        },
        Panel {
            title: "Difference (>0 is better)",
            lines: vec![line(rows, None, colors::DIFF, |r| r.tpsd)],
            zero_line: true,
        },
    ]
}

fn bounds(lines: &[Line<'_>], zero_line: bool) -> Option<(f64, f64, f64, f64)> {
    let mut pts = lines.iter().flat_map(|l| l.points.iter().copied());
    let (x0, y0) = pts.next()?;
    let (mut xmin, mut xmax, mut ymin, mut ymax) = (x0, x0, y0, y0);
    for (x, y) in pts {
        xmin = xmin.min(x);
        xmax = xmax.max(x);
        ymin = ymin.min(y);
        ymax = ymax.max(y);
    }
    if zero_line {
        ymin = ymin.min(0.0);
        ymax = ymax.max(0.0);
    }
    if xmax == xmin {
        xmax = xmin + 1.0;
    }
    if ymax == ymin {
        ymax = ymin + 1.0;
    }
    Some((xmin, xmax, ymin, ymax))
}

fn render_panel(svg: &mut String, panel: &Panel<'_>, ox: f64, oy: f64) {
    let plot_x = ox + MARGIN;
    let plot_y = oy + TITLE_H;
    let plot_w = PANEL_W - 2.0 * MARGIN;
    let plot_h = PANEL_H - TITLE_H - MARGIN;

    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" font-size="14" text-anchor="middle">{}</text>"#,
        ox + PANEL_W / 2.0,
        oy + 18.0,
        panel.title
    );
    let _ = writeln!(
        svg,
        r#"  <rect x="{plot_x:.1}" y="{plot_y:.1}" width="{plot_w:.1}" height="{plot_h:.1}" fill="none" stroke="{}"/>"#,
        colors::AXIS
    );

    let Some((xmin, xmax, ymin, ymax)) = bounds(&panel.lines, panel.zero_line) else {
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="middle" fill="{}">no data</text>"#,
            plot_x + plot_w / 2.0,
            plot_y + plot_h / 2.0,
            colors::AXIS
        );
        return;
    };

    let sx = |x: f64| plot_x + (x - xmin) / (xmax - xmin) * plot_w;
    let sy = |y: f64| plot_y + plot_h - (y - ymin) / (ymax - ymin) * plot_h;

    for i in 0..=4 {
        let frac = i as f64 / 4.0;
        let y = ymin + frac * (ymax - ymin);
        let x = xmin + frac * (xmax - xmin);
        let _ = writeln!(
            svg,
            r#"  <line x1="{plot_x:.1}" y1="{py:.1}" x2="{:.1}" y2="{py:.1}" stroke="{}"/>"#,
            plot_x + plot_w,
            colors::GRID,
            py = sy(y)
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{}</text>"#,
            plot_x - 4.0,
            sy(y) + 3.0,
            tick_label(y)
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" font-size="10" text-anchor="middle">{:.0}</text>"#,
            sx(x),
            plot_y + plot_h + 14.0,
            x
        );
    }

    if panel.zero_line {
        let _ = writeln!(
            svg,
            r#"  <line x1="{plot_x:.1}" y1="{zy:.1}" x2="{:.1}" y2="{zy:.1}" stroke="{}" stroke-dasharray="4 3"/>"#,
            plot_x + plot_w,
            colors::ZERO,
            zy = sy(0.0)
        );
    }

    let mut legend_y = plot_y + 14.0;
    for l in &panel.lines {
        if l.points.is_empty() {
            continue;
        }
        let mut pts = String::new();
        for &(x, y) in &l.points {
            let _ = write!(pts, "{:.2},{:.2} ", sx(x), sy(y));
        }
        let _ = writeln!(
            svg,
            r#"  <polyline fill="none" stroke="{}" stroke-width="1.5" points="{}"/>"#,
            l.color,
            pts.trim_end()
        );
        if let Some(label) = l.label {
            let _ = writeln!(
                svg,
                r#"  <text x="{:.1}" y="{legend_y:.1}" font-size="11" fill="{}">{label}</text>"#,
                plot_x + 8.0,
                l.color
            );
            legend_y += 14.0;
        }
    }

    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" font-size="11" text-anchor="middle">block_number</text>"#,
        plot_x + plot_w / 2.0,
        plot_y + plot_h + 32.0
    );
}

fn tick_label(v: f64) -> String {
    if v.abs() >= 100.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Render the four-panel chart for `rows` as an SVG document.
pub fn render_svg(rows: &[AlignedRow], title: &str) -> String {
    let width = 2.0 * PANEL_W;
    let height = 2.0 * PANEL_H + 40.0;
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="26" font-size="18" text-anchor="middle">{}</text>"#,
        width / 2.0,
        escape(title)
    );

    for (i, panel) in panels(rows).iter().enumerate() {
        let ox = (i % 2) as f64 * PANEL_W;
        let oy = 40.0 + (i / 2) as f64 * PANEL_H;
        render_panel(&mut svg, panel, ox, oy);
    }

    svg.push_str("</svg>\n");
    svg
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Default chart location when `--plot-output` is not given.
pub fn default_chart_path() -> PathBuf {
    std::env::temp_dir().join(format!("block-import-stats-{}.svg", std::process::id()))
}

/// Write the chart for `rows` to `path`.
pub fn write_chart(path: &Path, rows: &[AlignedRow], title: &str) -> CliResult<()> {
    let svg = render_svg(rows, title);
    fs::write(path, svg).context(WriteChartSnafu {
        path: path.display().to_string(),
    })?;
    debug!("wrote chart for {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

/// Open the chart in the platform viewer; if none can be spawned, just
/// tell the user where the file is.
pub fn open_chart(path: &Path) {
    let spawned = viewer_command(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match spawned {
        Ok(_) => eprintln!("Opened chart: {}", path.display()),
        Err(e) => {
            warn!("could not launch chart viewer: {e}");
            eprintln!("Chart written to {}", path.display());
        }
    }
}
