//! UI state and message handling for the download progress screen.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use ytbar_core::{Config, UiConfig};

use crate::events::Message;
use crate::widgets::{ProgressBar, Stopwatch};

// Horizontal space reserved beside the bar on top of the padding.
const BAR_MARGIN: u16 = 4;

/// Side effect requested by `App::update`, executed by the run loop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    None,
    Quit,
    QuitAfter(Duration),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    // Download phase finished (merge started or clean exit).
    Finished,
    // User quit before completion.
    Cancelled,
    // Downloader or UI failure.
    Failed(String),
}

pub struct App {
    // Gradient bar with its own easing animation.
    progress: ProgressBar,

    // Elapsed time since launch, frozen on completion.
    stopwatch: Stopwatch,

    // Latest accepted completion value.
    percent: f64,

    // Download phase ended; the program exits after the finish delay.
    completed: bool,

    // Message shown under the banner once completed.
    status: Option<String>,

    // Error recorded before terminating.
    error: Option<String>,

    ui: UiConfig,

    // Treat a clean downloader exit without merge marker as a failure.
    require_merge: bool,
}

impl App {
    pub fn new(config: &Config, now: Instant) -> Self {
        Self {
            progress: ProgressBar::new(config.ui.max_width),
            stopwatch: Stopwatch::start(now),
            percent: 0.0,
            completed: false,
            status: None,
            error: None,
            ui: config.ui.clone(),
            require_merge: config.downloader.require_merge,
        }
    }

    pub fn update(&mut self, message: Message) -> Command {
        match message {
            Message::Key(key) => {
                debug!(code = ?key.code, "key pressed, quitting");
                Command::Quit
            }
            Message::Resize(columns, _rows) => {
                self.resize(columns);
                Command::None
            }
            Message::ProgressUpdate(value) => {
                self.apply_progress(value);
                Command::None
            }
            Message::MergeSignal(message) => self.complete(message),
            Message::ProcessExited(report) => {
                if self.error.is_some() {
                    return Command::None;
                }
                if self.completed {
                    debug!(?report, "downloader exited after completion");
                    if report.success {
                        return Command::None;
                    }
                    return self.fail(format!("merge failed: {}", report.describe()));
                }
                if report.success && !self.require_merge {
                    self.apply_progress(1.0);
                    return self.complete("Download finished".to_string());
                }
                self.fail(report.describe())
            }
            Message::InternalError(err) => self.fail(err),
            Message::StopwatchTick(now) => {
                self.stopwatch.tick(now);
                Command::None
            }
            Message::ProgressFrame => {
                self.progress.frame();
                Command::None
            }
        }
    }

    fn apply_progress(&mut self, value: f64) {
        if !value.is_finite() {
            warn!(value, "ignoring non-finite progress value");
            return;
        }
        let value = value.clamp(0.0, 1.0);
        self.percent = if self.ui.monotonic_progress {
            self.percent.max(value)
        } else {
            value
        };
        self.progress.set_target(self.percent);
    }

    fn complete(&mut self, message: String) -> Command {
        if self.completed {
            return Command::None;
        }
        self.stopwatch.stop();
        self.completed = true;
        info!(
            elapsed = %self.stopwatch.view(),
            message = %message,
            "download phase complete"
        );
        self.status = Some(message);
        Command::QuitAfter(self.ui.finish_delay())
    }

    fn fail(&mut self, err: String) -> Command {
        warn!(error = %err, "terminating on error");
        self.stopwatch.stop();
        self.error = Some(err);
        Command::Quit
    }

    fn resize(&mut self, columns: u16) {
        let reserved = self.ui.padding.saturating_mul(2).saturating_add(BAR_MARGIN);
        let width = columns.saturating_sub(reserved).min(self.ui.max_width);
        self.progress.set_width(width);
    }

    pub fn outcome(&self) -> Outcome {
        match (&self.error, self.completed) {
            (Some(err), _) => Outcome::Failed(err.clone()),
            (None, true) => Outcome::Finished,
            (None, false) => Outcome::Cancelled,
        }
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn progress(&self) -> &ProgressBar {
        &self.progress
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn padding(&self) -> u16 {
        self.ui.padding
    }
}
