use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Spin counter shared between the simulation workers and the progress reporter.
pub struct Progress {
    done: AtomicU64,
    total: AtomicU64,
    created: Instant,
    /// Offset of the current run's start from `created`, in nanoseconds.
    started_nanos: AtomicU64,
}

impl Progress {
    pub fn new() -> Self {
        Self {
            done: AtomicU64::new(0),
            total: AtomicU64::new(0),
            created: Instant::now(),
            started_nanos: AtomicU64::new(0),
        }
    }

    /// Sets the number of spins this run has to compute and restarts the clock.
    pub fn begin(&self, total: u64) {
        let offset = self.created.elapsed().as_nanos() as u64;
        self.started_nanos.store(offset, Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    /// Time since the last `begin`, or since creation if the run has not begun.
    pub fn elapsed(&self) -> Duration {
        let started = Duration::from_nanos(self.started_nanos.load(Ordering::SeqCst));
        self.created.elapsed().saturating_sub(started)
    }

    pub fn inc(&self) {
        self.done.fetch_add(1, Ordering::Relaxed);
    }

    pub fn done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn describe(&self) -> String {
        describe_progress(self.done(), self.total(), self.elapsed())
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Human readable completion and remaining time, extrapolated from the rate so far.
///
/// Below a minute the estimate is rounded up to 5 seconds, below an hour to whole
/// minutes, below ten hours to hours and minutes, and to whole hours beyond that.
pub fn describe_progress(done: u64, total: u64, elapsed: Duration) -> String {
    if total == 0 {
        return "Done: 100%. Remaining: 0 seconds.".to_string();
    }

    let percent = (100.0 * done as f64 / total as f64).round() as u64;
    let prefix = format!("Done: {}%. Remaining: ", percent);

    if done == 0 {
        return format!("{}unknown.", prefix);
    }

    let remaining = total.saturating_sub(done) as f64 * elapsed.as_secs_f64() / done as f64;

    if remaining < 60.0 {
        let seconds = 5 * (remaining / 5.0).ceil() as u64;
        return format!("{}{} seconds.", prefix, seconds);
    }
    if remaining < 3600.0 {
        let minutes = (remaining / 60.0).ceil() as u64;
        return format!("{}{} minutes.", prefix, minutes);
    }
    if remaining < 36000.0 {
        let minutes = (remaining / 60.0).ceil() as u64;
        let hours = minutes / 60;
        let minutes = minutes % 60;

        let hours_text = if hours > 1 {
            format!("{} hours", hours)
        } else {
            "1 hour".to_string()
        };
        let minutes_text = match minutes {
            0 => String::new(),
            1 => " and 1 minute".to_string(),
            m => format!(" and {} minutes", m),
        };
        return format!("{}{}{}.", prefix, hours_text, minutes_text);
    }

    let hours = (remaining / 3600.0).ceil() as u64;
    format!("{}{} hours.", prefix, hours)
}
