//! Self-contained widgets owned by the UI state.

mod progress_bar;
mod stopwatch;

pub use progress_bar::ProgressBar;
pub use stopwatch::Stopwatch;
