use std::fmt::Write as _;

use serde::Serialize;
use stats::{PValueMethod, QuartileSummary};

use crate::analysis::MetricReport;

fn format_value(v: f64) -> String {
    if !v.is_finite() {
        format!("{v}")
    } else if v.abs() >= 100.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.3}")
    }
}

fn format_p(p: f64) -> String {
    if p < 0.0001 {
        "<0.0001".to_string()
    } else {
        format!("{p:.4}")
    }
}

fn verdict(r: &MetricReport) -> &'static str {
    if r.significant { "DIFFERENT" } else { "same" }
}

fn method_name(method: PValueMethod) -> &'static str {
    match method {
        PValueMethod::Approximate => "approximate",
        PValueMethod::Exact => "exact",
    }
}

fn five_numbers(q: &QuartileSummary) -> String {
    [q.min, q.q1, q.median, q.q3, q.max]
        .iter()
        .map(|&v| format_value(v))
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Render the comparison table and per-metric five-number summaries.
pub fn render_table(reports: &[MetricReport]) -> String {
    let mut out = String::new();
    if reports.is_empty() {
        return out;
    }

    let _ = writeln!(
        out,
        "{:<20} {:>4} {:>4} {:>10} {:>10} {:>8} {:>8} {:>7} {:>8}  {}",
        "Metric", "n A", "n B", "Mean A", "Mean B", "Change", "t", "df", "p-value", "Verdict"
    );
    let _ = writeln!(out, "{}", "-".repeat(99));
    for r in reports {
        let _ = writeln!(
            out,
            "{:<20} {:>4} {:>4} {:>10} {:>10} {:>+7.1}% {:>8.3} {:>7.1} {:>8}  {}",
            format!("{} ({})", r.metric, r.unit),
            r.group_a_samples.len(),
            r.group_b_samples.len(),
            format_value(r.mean_a),
            format_value(r.mean_b),
            r.change_pct * 100.0,
            r.t_statistic,
            r.degrees_of_freedom,
            format_p(r.p_value),
            verdict(r),
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Five-number summaries (min / q1 / median / q3 / max):");
    for r in reports {
        let _ = writeln!(out, "  {} ({})", r.metric, r.unit);
        let _ = writeln!(out, "    A: {}", five_numbers(&r.quartiles_a));
        let _ = writeln!(out, "    B: {}", five_numbers(&r.quartiles_b));
    }
    out
}

pub fn print_table(reports: &[MetricReport]) {
    print!("{}", render_table(reports));
}

// JSON output types

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a str,
    p_value_method: &'static str,
    significance_level: f64,
    metrics: &'a [MetricReport],
}

pub fn render_json(
    reports: &[MetricReport],
    source: &str,
    method: PValueMethod,
) -> Result<String, serde_json::Error> {
    let json = JsonReport {
        source,
        p_value_method: method_name(method),
        significance_level: stats::SIGNIFICANCE_LEVEL,
        metrics: reports,
    };
    serde_json::to_string_pretty(&json)
}
