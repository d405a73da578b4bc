//! Event payloads shared between the process monitor and the UI loop.

use crate::util::sanitize_log_value;

const STDERR_SUMMARY_LIMIT: usize = 200;

/// Outcome of the downloader process once its output stream has closed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExitReport {
    /// Exit code, absent when the process was killed by a signal or could not be reaped.
    pub code: Option<i32>,
    pub success: bool,
    /// Last non-empty stderr line, usually the downloader's `ERROR:` message.
    pub stderr_tail: Option<String>,
}

impl ExitReport {
    /// One-line summary suitable for the error banner.
    pub fn describe(&self) -> String {
        let status = match (self.success, self.code) {
            (true, _) => "downloader exited before reporting completion".to_string(),
            (false, Some(code)) => format!("downloader exited with status {code}"),
            (false, None) => "downloader terminated by signal".to_string(),
        };
        match self.stderr_tail.as_deref() {
            Some(tail) if !tail.trim().is_empty() => {
                format!("{status}: {}", sanitize_log_value(tail, STDERR_SUMMARY_LIMIT))
            }
            _ => status,
        }
    }
}
