//! Shared helper utilities used across ytbar components.

use std::fmt::Write;
use std::time::Duration;

const LOG_SNIPPET_LIMIT: usize = 160;

/// Format an elapsed duration at millisecond resolution.
///
/// Output follows the compact `1h2m3.456s` style: sub-second values are
/// shown in milliseconds, larger values drop trailing zero fractions.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    if total_ms == 0 {
        return "0s".to_string();
    }
    if total_ms < 1000 {
        return format!("{total_ms}ms");
    }

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h{minutes}m");
    } else if minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{seconds}");
    if millis > 0 {
        let fraction = format!("{millis:03}");
        let _ = write!(out, ".{}", fraction.trim_end_matches('0'));
    }
    out.push('s');
    out
}

/// Sanitizes a log string by stripping newlines and capping length.
pub fn sanitize_log_value(value: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    let mut chars = value.chars();
    let cleaned: String = chars
        .by_ref()
        .take(max_len)
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .collect();
    let truncated = chars.next().is_some();
    let trimmed = cleaned.trim();
    if truncated {
        format!("{trimmed}...")
    } else {
        trimmed.to_string()
    }
}

/// Produces a single-line log snippet of bounded length.
pub fn log_snippet(value: &str) -> String {
    sanitize_log_value(value, LOG_SNIPPET_LIMIT)
}
