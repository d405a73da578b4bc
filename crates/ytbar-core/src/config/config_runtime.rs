//! Runtime normalization applied after config parsing.

use std::time::Duration;

use super::{Config, DownloaderConfig, UiConfig};

// Zero-length intervals would turn the ticker threads into busy loops.
const MIN_INTERVAL_MS: u64 = 1;

pub(super) fn apply_interval_floor(ui: &mut UiConfig) {
    ui.tick_interval_ms = ui.tick_interval_ms.max(MIN_INTERVAL_MS);
    ui.frame_interval_ms = ui.frame_interval_ms.max(MIN_INTERVAL_MS);
}

impl UiConfig {
    pub fn finish_delay(&self) -> Duration {
        Duration::from_millis(self.finish_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(MIN_INTERVAL_MS))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(MIN_INTERVAL_MS))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl DownloaderConfig {
    pub fn merge_timeout(&self) -> Duration {
        Duration::from_millis(self.merge_timeout_ms)
    }
}

impl Config {
    pub(super) fn apply_runtime_defaults(&mut self) {
        apply_interval_floor(&mut self.ui);
    }
}
