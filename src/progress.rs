//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements
//! [`ProgressCallback`] to display a spinner while walking and progress bars
//! while hashing and deleting.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for the scan pipeline.
///
/// Phases are `"walk"`, `"hash"` and `"delete"`.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts. `total` is 0 when unknown.
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when an item has been processed, providing its size.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    active: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use treedupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            active: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        if phase == "walk" {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::walking_style());
            pb.set_message("Walking directory");
            pb.enable_steady_tick(Duration::from_millis(100));
            if let Ok(mut walking) = self.walking.lock() {
                *walking = Some(pb);
            }
        } else {
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style());
            let label = match phase {
                "hash" => "Hashing",
                "delete" => "Deleting",
                other => other,
            };
            pb.set_message(label.to_string());
            if let Ok(mut active) = self.active.lock() {
                *active = Some(pb);
            }
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }

        let message = truncate_path(path, 30);
        if let Ok(active) = self.active.lock() {
            if let Some(ref pb) = *active {
                pb.set_position(current as u64);
                pb.set_message(message);
                return;
            }
        }
        if let Ok(walking) = self.walking.lock() {
            if let Some(ref pb) = *walking {
                pb.set_position(current as u64);
                pb.set_message(message);
            }
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        let slot = if phase == "walk" {
            &self.walking
        } else {
            &self.active
        };
        if let Some(pb) = slot.lock().ok().and_then(|mut guard| guard.take()) {
            pb.finish_and_clear();
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
