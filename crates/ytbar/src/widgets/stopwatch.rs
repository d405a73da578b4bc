//! Elapsed-time stopwatch advanced by tick messages.

use std::time::{Duration, Instant};

use ytbar_core::format_elapsed;

#[derive(Clone, Debug)]
pub struct Stopwatch {
    started_at: Instant,
    elapsed: Duration,
    running: bool,
}

impl Stopwatch {
    pub fn start(now: Instant) -> Self {
        Self {
            started_at: now,
            elapsed: Duration::ZERO,
            running: true,
        }
    }

    /// Advance to `now`; ignored once stopped so the displayed value freezes.
    pub fn tick(&mut self, now: Instant) {
        if self.running {
            self.elapsed = now.saturating_duration_since(self.started_at);
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn view(&self) -> String {
        format_elapsed(self.elapsed)
    }
}
