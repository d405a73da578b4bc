//! Translates downloader output into UI messages.

use std::io::BufRead;
use std::sync::mpsc::Sender;

use tracing::{debug, trace, warn};
use ytbar_core::util::{log_snippet, sanitize_log_value};
use ytbar_core::{parse_line, LineKind, MERGE_MESSAGE};

use crate::events::Message;

pub struct ProgressMonitor {
    sender: Sender<Message>,
    merge_marker: String,
    // Set once the merge marker was seen; reported when the stream ends.
    downloaded: bool,
}

impl ProgressMonitor {
    pub fn new(sender: Sender<Message>, merge_marker: impl Into<String>) -> Self {
        Self {
            sender,
            merge_marker: merge_marker.into(),
            downloaded: false,
        }
    }

    /// Read lines until end-of-stream or a read error.
    ///
    /// Returns whether the merge marker was seen.
    pub fn run(mut self, reader: impl BufRead) -> bool {
        // Split on raw bytes so a stray invalid UTF-8 title does not end the stream.
        for chunk in reader.split(b'\n') {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(err) => {
                    debug!(?err, "downloader output read failed");
                    break;
                }
            };
            let line = String::from_utf8_lossy(&bytes);
            if !self.handle_line(line.trim_end_matches('\r')) {
                debug!("ui channel closed; stopping monitor");
                break;
            }
        }
        debug!(downloaded = self.downloaded, "downloader output closed");
        self.downloaded
    }

    // Returns false once the receiving side has gone away.
    fn handle_line(&mut self, line: &str) -> bool {
        match parse_line(line, &self.merge_marker) {
            Ok(LineKind::Progress(value)) => {
                trace!(value, "progress");
                self.send(Message::ProgressUpdate(value))
            }
            Ok(LineKind::Merge) => {
                self.downloaded = true;
                self.send(Message::ProgressUpdate(1.0))
                    && self.send(Message::MergeSignal(MERGE_MESSAGE.to_string()))
            }
            Ok(LineKind::Ignored) => {
                trace!(line = %sanitize_log_value(line, 120), "ignored");
                true
            }
            Err(err) => {
                warn!(%err, line = %log_snippet(line), "skipping malformed progress line");
                true
            }
        }
    }

    fn send(&self, message: Message) -> bool {
        self.sender.send(message).is_ok()
    }
}
