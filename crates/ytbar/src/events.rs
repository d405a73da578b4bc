//! Messages delivered to the UI loop.
//!
//! Every producer (input thread, tick threads, progress monitor) posts into
//! one channel; the UI loop handles them one at a time in arrival order.

use std::time::Instant;

use crossterm::event::KeyEvent;
use ytbar_core::ExitReport;

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Key(KeyEvent),
    /// Terminal size in columns and rows.
    Resize(u16, u16),
    /// Fractional completion in `[0.0, 1.0]`.
    ProgressUpdate(f64),
    MergeSignal(String),
    ProcessExited(ExitReport),
    InternalError(String),
    StopwatchTick(Instant),
    ProgressFrame,
}
