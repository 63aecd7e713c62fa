//! Plain-text rendering of analysis responses for the terminal.

use hobart::Response;
use hobart::output::{Chart, Trace};
use std::fmt::Write;

/// Render a successful response as terminal text.
pub(crate) fn to_text(response: &Response) -> String {
    match response {
        Response::Regression {
            summary,
            rolling_chart,
        } => {
            let mut out = summary.clone();
            out.push('\n');
            out.push_str(&rolling_text(rolling_chart));
            out
        }
        Response::Pca { bar, line, scatter } => pca_text(bar, line, scatter),
        Response::Error { message, .. } => format!("Error: {message}"),
    }
}

fn rolling_text(chart: &Chart) -> String {
    if chart.is_placeholder() {
        return "Rolling coefficients: not enough observations for a full window\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(out, "{}", chart.title);
    let _ = writeln!(out, "{:<12} {:>8} {:>12} {:>12}", "Parameter", "Windows", "First", "Last");
    for trace in &chart.traces {
        if let Trace::Line { name, y, .. } = trace {
            let first = y.first().copied().unwrap_or(f64::NAN);
            let last = y.last().copied().unwrap_or(f64::NAN);
            let _ = writeln!(out, "{name:<12} {:>8} {first:>12.4} {last:>12.4}", y.len());
        }
    }
    if let Some(Trace::Line { x, .. }) = chart.traces.first()
        && let (Some(start), Some(end)) = (x.first(), x.last())
    {
        let _ = writeln!(out, "Window ends: {start} to {end}");
    }
    out
}

fn pca_text(bar: &Chart, line: &Chart, scatter: &Chart) -> String {
    let mut out = String::new();
    let (labels, ratios) = match bar.traces.first() {
        Some(Trace::Bar { x, y, .. }) => (x.as_slice(), y.as_slice()),
        _ => (&[][..], &[][..]),
    };
    let cumulative = match line.traces.first() {
        Some(Trace::Line { y, .. }) => y.as_slice(),
        _ => &[][..],
    };

    let _ = writeln!(out, "{:<10} {:>12} {:>12}", "Component", "Explained", "Cumulative");
    for (i, (label, ratio)) in labels.iter().zip(ratios).enumerate() {
        let cum = cumulative.get(i).copied().unwrap_or(f64::NAN);
        let _ = writeln!(out, "{label:<10} {:>11.2}% {:>11.2}%", ratio * 100.0, cum * 100.0);
    }

    if let Some(Trace::Scatter { x, y, text, .. }) = scatter.traces.first() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", scatter.title);
        let _ = writeln!(out, "{:<10} {:>12} {:>12}", "Ticker", "PC1", "PC2");
        for ((ticker, a), b) in text.iter().zip(x).zip(y) {
            let _ = writeln!(out, "{ticker:<10} {a:>12.4} {b:>12.4}");
        }
    }
    out
}
