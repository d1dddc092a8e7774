//! "Thinking" indicator shown while a speaker has not produced output yet

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner between a turn's `start` and its first fragment.
pub struct ThinkingIndicator {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl ThinkingIndicator {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// A no-op indicator.
    pub fn hidden() -> Self {
        Self::new(false)
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    pub fn start(&mut self, speaker: &str) {
        self.stop();
        if !self.enabled {
            return;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(Self::style());
        bar.set_message(format!("{} is thinking...", speaker.bold()));
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    pub fn stop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }
}

impl Drop for ThinkingIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}
