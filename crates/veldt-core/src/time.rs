//! Time sources and the map update stopwatch.

use std::time::Instant;

/// A millisecond clock the map reads instead of the system clock, so tests
/// and replays can drive time explicitly.
pub trait TimeSource {
    /// Current time in milliseconds. Wraps at `u32::MAX`; callers only ever
    /// difference two readings.
    fn now_ms(&self) -> u32;
}

/// [`TimeSource`] backed by a monotonic clock, anchored at construction.
#[derive(Debug)]
pub struct MonotonicTime {
    start: Instant,
}

impl MonotonicTime {
    /// Creates a clock that reads zero now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

/// Accumulating stopwatch used to track how long a map has been live.
///
/// Pausing (`stop`) and resuming (`start`) keep a running total of active
/// milliseconds, so a map that is suspended while no players are on it does
/// not age.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    running: bool,
    started_at: u32,
    accumulated: u32,
}

impl Stopwatch {
    /// Creates a stopped stopwatch with no accumulated time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            running: false,
            started_at: 0,
            accumulated: 0,
        }
    }

    /// Starts (or resumes) the stopwatch at `now`. No-op if already running.
    pub fn start(&mut self, now: u32) {
        if !self.running {
            self.running = true;
            self.started_at = now;
        }
    }

    /// Stops the stopwatch at `now`, banking the elapsed span. No-op if
    /// already stopped.
    pub fn stop(&mut self, now: u32) {
        if self.running {
            self.running = false;
            self.accumulated = self.accumulated.wrapping_add(now.wrapping_sub(self.started_at));
        }
    }

    /// Total active milliseconds as of `now`.
    #[must_use]
    pub fn elapsed(&self, now: u32) -> u32 {
        if self.running {
            self.accumulated
                .wrapping_add(now.wrapping_sub(self.started_at))
        } else {
            self.accumulated
        }
    }

    /// Whether the stopwatch is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
