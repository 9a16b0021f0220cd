//! A console progress bar over the simulated days.
//!
//! Only one progress bar can be active at a time. The runner initializes it with the number
//! of days to simulate and updates it after every completed day.
use log::{trace, warn};
use progress_bar::{
    finalize_progress_bar, init_progress_bar, set_progress_bar_action,
    set_progress_bar_progress, Color, Style,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// The number of days the bar was initialized with, zero while no bar is active.
static MAX_DAYS: AtomicUsize = AtomicUsize::new(0);

/// Initializes the progress bar with the number of days to simulate.
pub fn init_day_progress_bar(num_days: usize) {
    trace!("initializing day progress bar with {num_days} days");
    MAX_DAYS.store(num_days, Ordering::Relaxed);
    init_progress_bar(num_days);
    set_progress_bar_action("Day", Color::Blue, Style::Bold);
}

/// Moves the bar to `completed_days`, finalizing it on the last day.
pub fn update_day_progress(completed_days: usize) {
    let max_days = MAX_DAYS.load(Ordering::Relaxed);
    if max_days == 0 {
        warn!("attempted to update day progress bar before it was initialized");
        return;
    }
    let completed_days = completed_days.min(max_days);
    set_progress_bar_progress(completed_days);
    if completed_days == max_days {
        finalize_progress_bar();
        MAX_DAYS.store(0, Ordering::Relaxed);
    }
}
