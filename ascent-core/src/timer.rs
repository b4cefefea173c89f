// timer.rs
use std::time::{Duration, Instant};

/// One-shot countdown used to gate time-delayed phase transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    start: Instant,
    duration: Duration,
}

impl Timer {
    /// Starts a countdown of `duration` from now.
    pub fn new(duration: Duration) -> Self {
        Self::starting_at(Instant::now(), duration)
    }

    /// Starts a countdown of `duration` from `start`.
    pub const fn starting_at(start: Instant, duration: Duration) -> Self {
        Self { start, duration }
    }

    pub fn elapsed(&self) -> bool {
        self.elapsed_at(Instant::now())
    }

    /// True once `now` has reached the end of the countdown.
    pub fn elapsed_at(&self, now: Instant) -> bool {
        now >= self.deadline()
    }

    pub fn deadline(&self) -> Instant {
        self.start + self.duration
    }

    pub const fn duration(&self) -> Duration {
        self.duration
    }
}
