//! Progress-line parsing for downloader output.
//!
//! The downloader prints one status line per update (`--newline`) without
//! color codes. Two kinds of lines matter: percentage updates such as
//! `[download]  42.5% of 10.00MiB at 1.2MiB/s` and the merge marker printed
//! when separate audio/video files are combined.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Message attached to the merge signal.
pub const MERGE_MESSAGE: &str = "Download finished, begin merge";

// One to three digits with an optional single decimal digit, then `%`.
static PERCENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:\.\d?)?)%").expect("percentage regex is valid"));

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineKind {
    /// Fractional completion in `[0.0, 1.0]`.
    Progress(f64),
    Merge,
    Ignored,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("line contains '%' but no percentage value")]
    MissingPercentage,
    #[error("invalid percentage value: {0}")]
    InvalidNumber(String),
}

/// Classify a single output line.
///
/// The merge marker is checked before the percentage so a merge line that
/// happens to contain `%` in a file name still ends the download phase.
pub fn parse_line(line: &str, merge_marker: &str) -> Result<LineKind, ParseError> {
    if !merge_marker.is_empty() && line.contains(merge_marker) {
        return Ok(LineKind::Merge);
    }
    if line.contains('%') {
        return parse_percentage(line).map(LineKind::Progress);
    }
    Ok(LineKind::Ignored)
}

/// Extract the first percentage token and normalize it to `[0.0, 1.0]`.
pub fn parse_percentage(line: &str) -> Result<f64, ParseError> {
    let captures = PERCENT_REGEX
        .captures(line)
        .ok_or(ParseError::MissingPercentage)?;
    let raw = captures
        .get(1)
        .map(|value| value.as_str())
        .ok_or(ParseError::MissingPercentage)?;
    let value: f64 = raw
        .parse()
        .map_err(|_| ParseError::InvalidNumber(raw.to_string()))?;
    Ok((value / 100.0).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "[Merger]";

    fn progress(line: &str) -> f64 {
        match parse_line(line, MARKER) {
            Ok(LineKind::Progress(value)) => value,
            other => panic!("expected progress for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn well_formed_percentages_are_normalized() {
        assert!((progress("[download]  42.5% of 10.00MiB") - 0.425).abs() < 1e-9);
        assert!((progress("[download] 100.0% of 10.00MiB") - 1.0).abs() < 1e-9);
        assert!((progress("  12.3% of 10MiB") - 0.123).abs() < 1e-9);
        assert!((progress("   0.0% of 10MiB") - 0.0).abs() < 1e-9);
    }

    #[test]
    fn trailing_decimal_point_is_accepted() {
        assert!((progress("[download]  42.% of 10.00MiB") - 0.42).abs() < 1e-9);
        assert!((progress("[download] 100.% of 10.00MiB") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn integer_percentages_are_accepted() {
        assert!((progress("[download]  55% of ~3.00MiB") - 0.55).abs() < 1e-9);
        assert!((progress("[download] 100% of 3.00MiB in 00:02") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(progress("[download] 250.0% weird"), 1.0);
    }

    #[test]
    fn merge_marker_wins_over_percent_sign() {
        assert_eq!(
            parse_line("[Merger] Merging formats into \"100% pure.mkv\"", MARKER),
            Ok(LineKind::Merge)
        );
        assert_eq!(
            parse_line("[Merger] Merging formats...", MARKER),
            Ok(LineKind::Merge)
        );
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        assert_eq!(
            parse_line("[youtube] abc123: Downloading webpage", MARKER),
            Ok(LineKind::Ignored)
        );
        assert_eq!(parse_line("", MARKER), Ok(LineKind::Ignored));
    }

    #[test]
    fn percent_sign_without_value_is_an_error() {
        assert_eq!(
            parse_line("[download] Unknown% of NA", MARKER),
            Err(ParseError::MissingPercentage)
        );
        assert_eq!(parse_line("100 %", MARKER), Err(ParseError::MissingPercentage));
    }

    #[test]
    fn empty_marker_never_matches() {
        assert_eq!(parse_line("[Merger] x", ""), Ok(LineKind::Ignored));
    }
}
