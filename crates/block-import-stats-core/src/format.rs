//! Human-readable number and duration formatting shared by all reporters.
//!
//! Non-finite values are rendered as Rust prints them (`inf`, `-inf`,
//! `NaN`) instead of being hidden or rejected.

/// Format seconds as `HhMmSs`, dropping leading zero units.
///
/// Fractions are truncated and negative durations get a leading `-`.
/// Non-finite values are printed as-is.
pub fn pretty_secs(secs: f64) -> String {
    if !secs.is_finite() {
        return secs.to_string();
    }
    let whole = (secs as i64).unsigned_abs();
    let s = whole % 60;
    let m = whole / 60 % 60;
    let h = whole / (60 * 60);
    let sign = if secs < 0.0 { "-" } else { "" };

    if h > 0 {
        format!("{sign}{h}h{m}m{s}s")
    } else if m > 0 {
        format!("{sign}{m}m{s}s")
    } else {
        format!("{sign}{s}s")
    }
}

/// Format with `decimals` fraction digits and `,` thousands separators.
pub fn format_number(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format a ratio as a percentage with two decimals (`0.1234` -> `12.34%`).
pub fn format_percent(ratio: f64) -> String {
    if !ratio.is_finite() {
        return ratio.to_string();
    }
    format!("{}%", format_number(ratio * 100.0, 2))
}
