//! Shareable admission controller handle.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use quotegate_types::clock::{SharedClock, system_clock};
use quotegate_types::config::HasRateLimitConfig;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::RateLimitConfig;
use crate::error::RateLimited;
use crate::window::SlidingWindow;

/// Decides whether an outbound request may be dispatched right now.
///
/// Each call takes the lock, then reads the clock and prunes, so recorded
/// timestamps stay in order and clones of the same controller can be used
/// from several tasks.
/// `can_proceed` followed by `add_request` is still two lock acquisitions;
/// callers that race each other should use [`try_acquire`](Self::try_acquire).
pub struct RequestAdmissionController {
    window: Arc<Mutex<SlidingWindow>>,
    clock: SharedClock,
    config: RateLimitConfig,
}

impl RequestAdmissionController {
    /// Create a controller on the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    /// Create a controller driven by an explicit clock.
    pub fn with_clock(config: RateLimitConfig, clock: SharedClock) -> Self {
        Self {
            window: Arc::new(Mutex::new(SlidingWindow::new(config))),
            clock,
            config,
        }
    }

    /// Create a controller from any rate limit capability provider.
    pub fn from_provider<C: HasRateLimitConfig>(provider: &C) -> Self {
        Self::new(RateLimitConfig::from_provider(provider))
    }

    /// Get the controller configuration.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Whether a request dispatched now would stay under the limit.
    pub fn can_proceed(&self) -> bool {
        let mut window = self.window.lock();
        window.can_proceed_at(self.clock.now())
    }

    /// Record a request that has been dispatched.
    ///
    /// No capacity check is made; recording while
    /// [`can_proceed`](Self::can_proceed) is false pushes the window over
    /// `max_requests` until the extra timestamps age out.
    pub fn add_request(&self) {
        let mut window = self.window.lock();
        let now = self.clock.now();
        window.record_at(now);
        trace!(
            count = window.count_at(now),
            max_requests = self.config.max_requests,
            "Request recorded"
        );
    }

    /// Check and record in one step.
    pub fn try_acquire(&self) -> Result<(), RateLimited> {
        let mut window = self.window.lock();
        let now = self.clock.now();
        if window.try_record_at(now) {
            trace!(remaining = window.remaining_at(now), "Request admitted");
            Ok(())
        } else {
            let wait = window.wait_time_at(now);
            debug!(
                max_requests = self.config.max_requests,
                wait_ms = wait.as_millis() as u64,
                "Request denied by rate limiter"
            );
            Err(RateLimited { wait })
        }
    }

    /// Time until the next slot frees up; zero if one is free now.
    pub fn get_wait_time(&self) -> Duration {
        let mut window = self.window.lock();
        window.wait_time_at(self.clock.now())
    }

    /// Slots left in the current window.
    pub fn get_remaining_requests(&self) -> usize {
        let mut window = self.window.lock();
        window.remaining_at(self.clock.now())
    }

    /// Requests counted in the current window.
    pub fn request_count(&self) -> usize {
        let mut window = self.window.lock();
        window.count_at(self.clock.now())
    }

    /// Forget all tracked requests, unlocking the window immediately.
    pub fn clear_history(&self) {
        self.window.lock().clear();
        debug!("Request history cleared");
    }

    /// Snapshot of the window taken under one lock.
    pub fn stats(&self) -> RateLimitStats {
        let mut window = self.window.lock();
        let now = self.clock.now();
        RateLimitStats {
            current_requests: window.count_at(now),
            max_requests: window.max_requests(),
            time_window: window.time_window(),
            wait_time: window.wait_time_at(now),
            remaining: window.remaining_at(now),
        }
    }
}

impl Clone for RequestAdmissionController {
    fn clone(&self) -> Self {
        Self {
            window: Arc::clone(&self.window),
            clock: Arc::clone(&self.clock),
            config: self.config,
        }
    }
}

impl std::fmt::Debug for RequestAdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAdmissionController")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Admission statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStats {
    /// Requests counted in the current window.
    pub current_requests: usize,

    /// Admission ceiling.
    pub max_requests: usize,

    /// Window length.
    pub time_window: Duration,

    /// Time until the next slot frees up.
    pub wait_time: Duration,

    /// Slots left in the current window.
    pub remaining: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotegate_types::ManualClock;

    fn controller(max: usize, secs: u64) -> (RequestAdmissionController, ManualClock) {
        let clock = ManualClock::new();
        let config = RateLimitConfig::new(max, Duration::from_secs(secs));
        (
            RequestAdmissionController::with_clock(config, clock.shared()),
            clock,
        )
    }

    #[test]
    fn test_five_per_ten_seconds_scenario() {
        let (limiter, clock) = controller(5, 10);

        for _ in 0..5 {
            limiter.add_request();
        }

        assert!(!limiter.can_proceed());
        let wait = limiter.get_wait_time().as_secs_f64();
        assert!((wait - 10.0).abs() < 1e-9);

        clock.advance_secs(11);

        assert!(limiter.can_proceed());
        assert_eq!(limiter.get_remaining_requests(), 5);
    }

    #[test]
    fn test_wait_time_zero_when_can_proceed() {
        let (limiter, clock) = controller(3, 10);
        limiter.add_request();
        clock.advance_secs(2);
        limiter.add_request();

        assert!(limiter.can_proceed());
        assert_eq!(limiter.get_wait_time(), Duration::ZERO);
    }

    #[test]
    fn test_wait_time_shrinks_as_time_passes() {
        let (limiter, clock) = controller(2, 10);
        limiter.add_request();
        clock.advance_secs(3);
        limiter.add_request();

        assert_eq!(limiter.get_wait_time(), Duration::from_secs(7));
        clock.advance_secs(5);
        assert_eq!(limiter.get_wait_time(), Duration::from_secs(2));
        clock.advance_secs(2);
        assert_eq!(limiter.get_wait_time(), Duration::ZERO);
        assert_eq!(limiter.request_count(), 1);
    }

    #[test]
    fn test_clear_history_unlocks() {
        let (limiter, _clock) = controller(2, 60);
        limiter.add_request();
        limiter.add_request();
        assert!(!limiter.can_proceed());

        limiter.clear_history();

        assert!(limiter.can_proceed());
        assert_eq!(limiter.get_remaining_requests(), 2);
        assert_eq!(limiter.request_count(), 0);
    }

    #[test]
    fn test_add_request_oversubscribes_without_error() {
        let (limiter, _clock) = controller(1, 60);
        limiter.add_request();
        limiter.add_request();

        assert_eq!(limiter.request_count(), 2);
        assert_eq!(limiter.get_remaining_requests(), 0);
        assert!(!limiter.can_proceed());
    }

    #[test]
    fn test_try_acquire_reports_wait() {
        let (limiter, clock) = controller(2, 10);
        assert!(limiter.try_acquire().is_ok());
        clock.advance_secs(4);
        assert!(limiter.try_acquire().is_ok());

        let denied = limiter.try_acquire().unwrap_err();
        assert_eq!(denied.wait, Duration::from_secs(6));
        assert_eq!(limiter.request_count(), 2);
        assert!(denied.to_string().contains("6.0s"));
    }

    #[test]
    fn test_clones_share_window() {
        let (limiter, _clock) = controller(2, 10);
        let other = limiter.clone();
        limiter.add_request();
        other.add_request();

        assert!(!limiter.can_proceed());
        assert_eq!(other.request_count(), 2);
    }

    #[test]
    fn test_try_acquire_across_threads_never_oversubscribes() {
        let limiter = RequestAdmissionController::new(RateLimitConfig::new(
            10,
            Duration::from_secs(3600),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..5).filter(|_| limiter.try_acquire().is_ok()).count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 10);
        assert_eq!(limiter.request_count(), 10);
    }

    #[test]
    fn test_stats_snapshot() {
        let (limiter, clock) = controller(3, 30);
        limiter.add_request();
        clock.advance_secs(10);
        limiter.add_request();
        limiter.add_request();

        let stats = limiter.stats();
        assert_eq!(stats.current_requests, 3);
        assert_eq!(stats.max_requests, 3);
        assert_eq!(stats.time_window, Duration::from_secs(30));
        assert_eq!(stats.wait_time, Duration::from_secs(20));
        assert_eq!(stats.remaining, 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["current_requests"], 3);
        assert_eq!(json["remaining"], 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use quotegate_types::ManualClock;

    #[derive(Debug, Clone)]
    enum Op {
        Add,
        Advance(u64),
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => Just(Op::Add),
            3 => (0u64..4_000).prop_map(Op::Advance),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        /// Property: admission is denied exactly when the in-window count
        /// reaches the ceiling, and wait time is zero whenever admitted.
        #[test]
        fn admission_matches_window_count(
            max in 1usize..6,
            window_ms in 1u64..5_000,
            ops in prop::collection::vec(op_strategy(), 0..60),
        ) {
            let clock = ManualClock::new();
            let limiter = RequestAdmissionController::with_clock(
                RateLimitConfig::new(max, Duration::from_millis(window_ms)),
                clock.shared(),
            );
            let window = Duration::from_millis(window_ms);
            let mut model: Vec<Duration> = Vec::new();

            for op in ops {
                match op {
                    Op::Add => {
                        limiter.add_request();
                        model.push(clock.elapsed());
                    }
                    Op::Advance(ms) => clock.advance(Duration::from_millis(ms)),
                    Op::Clear => {
                        limiter.clear_history();
                        model.clear();
                    }
                }

                let now = clock.elapsed();
                let in_window = model.iter().filter(|t| now - **t < window).count();

                prop_assert_eq!(limiter.can_proceed(), in_window < max);
                prop_assert_eq!(limiter.get_remaining_requests(), max.saturating_sub(in_window));
                if limiter.can_proceed() {
                    prop_assert_eq!(limiter.get_wait_time(), Duration::ZERO);
                } else {
                    prop_assert!(limiter.get_wait_time() <= window);
                }
            }
        }
    }
}
