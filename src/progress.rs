//! Progress reporting utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Spinner-per-stage progress for comparison runs.
///
/// Each stage (loading A, loading B, comparing, writing) gets its own spinner,
/// finished with a short message before the next stage starts.
#[derive(Debug)]
pub struct ProgressReporter {
    current: Option<ProgressBar>,
    show_progress: bool,
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a reporter that draws spinners
    pub fn new_for_comparison() -> Self {
        Self {
            current: None,
            show_progress: true,
            start_time: Instant::now(),
        }
    }

    /// Create minimal progress reporter (no progress bars)
    pub fn new_minimal() -> Self {
        Self {
            current: None,
            show_progress: false,
            start_time: Instant::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Start a stage, finishing any stage still running
    pub fn begin(&mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
        log::debug!("{}", message);
        if self.show_progress {
            self.current = Some(create_spinner(message));
        }
    }

    /// Finish the running stage with a message
    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current.take() {
            pb.finish_with_message(message.to_string());
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
