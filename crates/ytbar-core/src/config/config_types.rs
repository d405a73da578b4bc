//! Configuration types and defaults for ytbar.
//!
//! Keeps schema definitions in one place for easier auditing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub downloader: DownloaderConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: Option<String>,
    /// Log destination; the terminal is owned by the UI, so logs never go to stdout.
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Executable to launch, looked up on PATH when not absolute.
    pub program: String,
    /// Flags that keep the output parseable (no colors, one line per update).
    pub args: Vec<String>,
    /// Additional flags appended before the target.
    pub extra_args: Vec<String>,
    /// Token printed by the downloader when it enters its merge step.
    pub merge_marker: String,
    /// Treat a clean exit without a merge marker as a failure.
    pub require_merge: bool,
    /// Grace given to a merge still running when the UI exits, before it is stopped.
    pub merge_timeout_ms: u64,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            args: vec!["--no-colors".to_string(), "--newline".to_string()],
            extra_args: Vec::new(),
            merge_marker: "[Merger]".to_string(),
            require_merge: false,
            merge_timeout_ms: 300_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    /// Upper bound for the rendered progress bar width, in cells.
    pub max_width: u16,
    /// Left padding applied to every rendered line.
    pub padding: u16,
    /// Pause between completion and exit.
    pub finish_delay_ms: u64,
    /// Stopwatch tick interval; elapsed time is measured from `Instant` either way.
    pub tick_interval_ms: u64,
    /// Progress bar animation interval.
    pub frame_interval_ms: u64,
    /// Keep the highest progress seen instead of letting later lines regress it.
    pub monotonic_progress: bool,
    pub alternate_screen: bool,
    /// Grace period between SIGTERM and SIGKILL for the downloader.
    pub shutdown_timeout_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            max_width: 80,
            padding: 2,
            finish_delay_ms: 500,
            tick_interval_ms: 1,
            frame_interval_ms: 16,
            monotonic_progress: true,
            alternate_screen: false,
            shutdown_timeout_ms: 600,
        }
    }
}
