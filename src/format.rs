//! Value formatting collaborator.
//!
//! The pipeline only needs `format(value, format_string) -> String` (for
//! column concatenation). Hosts plug their own formatter in; the default
//! covers fixed-decimal and grouped numeric formats and `chrono` date
//! patterns.

use crate::types::DataValue;

pub trait ValueFormatter {
    fn format(&self, value: &DataValue, format: Option<&str>) -> String;
}

/// Minimal formatter.
///
/// Numbers: `0`, `0.00`, `#,0`, `#,0.0`, with a trailing `%` multiplying by
/// 100. Date-times: a `chrono` pattern when the format contains `%`,
/// otherwise ISO-like `YYYY-MM-DD HH:MM:SS`. Null formats as the empty
/// string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueFormatter;

impl ValueFormatter for DefaultValueFormatter {
    fn format(&self, value: &DataValue, format: Option<&str>) -> String {
        match value {
            DataValue::Null => String::new(),
            DataValue::Text(s) => s.clone(),
            DataValue::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
            DataValue::Number(n) => format_number(*n, format),
            DataValue::DateTime(dt) => match format {
                Some(pattern) if pattern.contains('%') => dt.value.format(pattern).to_string(),
                _ => dt.value.format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        }
    }
}

fn format_number(n: f64, format: Option<&str>) -> String {
    let Some(format) = format.filter(|f| !f.is_empty() && is_numeric_format(f)) else {
        return plain_number(n);
    };

    let (body, percent) = match format.strip_suffix('%') {
        Some(body) => (body, true),
        None => (format, false),
    };
    let n = if percent { n * 100.0 } else { n };
    let grouped = body.contains(',');
    let decimals = body.split_once('.').map_or(0, |(_, d)| d.len());

    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed.clone(), None),
    };
    let int_part = if grouped { group_thousands(&int_part) } else { int_part };

    let mut out = String::new();
    if n < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&int_part);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(&frac);
    }
    if percent {
        out.push('%');
    }
    out
}

fn is_numeric_format(format: &str) -> bool {
    format.chars().all(|c| matches!(c, '0' | '#' | ',' | '.' | '%'))
}

fn plain_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
