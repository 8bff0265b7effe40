//! Progress reporting.
//!
//! The scanner reports through the [`ProgressCallback`] trait so it stays
//! independent of any terminal. [`Progress`] is the `indicatif`
//! implementation used by the binary.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Phase name used while enumerating candidate files.
pub const PHASE_WALK: &str = "walking";

/// Phase name used while scanning candidate files.
pub const PHASE_SCAN: &str = "scanning";

/// Receiver for scan progress.
///
/// Implementations must tolerate calls from several worker threads.
pub trait ProgressCallback: Send + Sync {
    /// A phase with `total` items begins (0 when unknown).
    fn on_phase_start(&self, phase: &str, total: usize);

    /// One item finished. `current` is 1-based; `path` is the item.
    fn on_progress(&self, current: usize, path: &str);

    /// The phase is over.
    fn on_phase_end(&self, phase: &str);

    /// Free-form status text, e.g. `"42.0% (21/50)"`.
    fn on_message(&self, _message: &str) {}
}

/// Status line emitted after each file: percentage to one decimal, then
/// the 1-based index over the total.
#[must_use]
pub fn format_progress_message(current: usize, total: usize) -> String {
    #[allow(clippy::cast_precision_loss)]
    let pct = if total == 0 {
        100.0
    } else {
        current as f64 / total as f64 * 100.0
    };
    format!("{pct:.1}% ({current}/{total})")
}

/// Terminal progress bar.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a reporter; `quiet` suppresses all output.
    ///
    /// ```
    /// use todoboard::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// assert!(progress.is_quiet());
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    /// Whether output is suppressed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    fn walk_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn scan_style() -> ProgressStyle {
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        let bar = if phase == PHASE_WALK {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::walk_style());
            pb.set_message("Collecting files");
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(Self::scan_style());
            pb.set_message(format_progress_message(0, total));
            pb
        };

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, current: usize, _path: &str) {
        if self.quiet {
            return;
        }
        self.with_bar(|pb| pb.set_position(current as u64));
    }

    fn on_phase_end(&self, _phase: &str) {
        if self.quiet {
            return;
        }
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_bar(|pb| pb.set_message(message.to_string()));
    }
}
