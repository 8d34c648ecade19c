//! Sliding window of admission timestamps.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Ordered record of admitted requests inside a trailing time window.
///
/// Every method takes the current instant explicitly and prunes before
/// doing anything else, so after any call each retained timestamp `t`
/// satisfies `now - t < time_window`. Timestamps are appended in call
/// order; callers must pass non-decreasing instants, which
/// [`RequestAdmissionController`](crate::RequestAdmissionController)
/// guarantees by reading a monotonic clock under its lock.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    time_window: Duration,
}

impl SlidingWindow {
    /// Create an empty window.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(config.max_requests),
            max_requests: config.max_requests,
            time_window: config.time_window,
        }
    }

    /// Drop every timestamp that has aged out of the window.
    ///
    /// Timestamps are monotonic, so this only ever pops from the front.
    pub fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.timestamps.front() {
            if now.saturating_duration_since(oldest) >= self.time_window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Whether one more request fits in the window.
    pub fn can_proceed_at(&mut self, now: Instant) -> bool {
        self.prune(now);
        self.timestamps.len() < self.max_requests
    }

    /// Record a dispatched request. Does not check capacity.
    pub fn record_at(&mut self, now: Instant) {
        self.prune(now);
        self.timestamps.push_back(now);
    }

    /// Check and record in one step. Returns `false` without recording
    /// when the window is full.
    pub fn try_record_at(&mut self, now: Instant) -> bool {
        if self.can_proceed_at(now) {
            self.timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// Time until a slot frees up; zero when one is already free.
    pub fn wait_time_at(&mut self, now: Instant) -> Duration {
        self.prune(now);
        if self.timestamps.len() < self.max_requests {
            return Duration::ZERO;
        }
        match self.timestamps.front() {
            Some(&oldest) => self
                .time_window
                .saturating_sub(now.saturating_duration_since(oldest)),
            None => Duration::ZERO,
        }
    }

    /// Slots left in the current window.
    pub fn remaining_at(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.max_requests.saturating_sub(self.timestamps.len())
    }

    /// Number of requests counted in the current window.
    pub fn count_at(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.timestamps.len()
    }

    /// Forget every tracked request.
    pub fn clear(&mut self) {
        self.timestamps.clear();
    }

    /// Admission ceiling.
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Window length.
    pub fn time_window(&self) -> Duration {
        self.time_window
    }
}
