//! Repaint decimation.
//!
//! A [`Decimator`] sits in front of an outward notification callback and
//! bounds how often it runs. It only ever drops *repaint* calls: callers
//! route flush and close notifications through [`Decimator::call_always`],
//! and the state those notifications describe keeps accumulating no matter
//! how many repaints are skipped.

use std::time::{Duration, Instant};

/// Tuning knobs for a [`Decimator`].
#[derive(Debug, Clone)]
pub struct DecimatorConfig {
    /// Interval between repaints for a single stream (`throttle_units == 1`).
    pub base_interval: Duration,
    /// Pause always left after a repaint, however slow the callback was.
    pub minimum_idle: Duration,
    /// Calls allowed through ahead of the deadline at the start of a stream.
    pub free_passes: u32,
}

impl Default for DecimatorConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_secs(1) / 12,
            minimum_idle: Duration::from_millis(8),
            free_passes: 3,
        }
    }
}

impl DecimatorConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base interval.
    pub fn base_interval(mut self, interval: Duration) -> Self {
        self.base_interval = interval;
        self
    }

    /// Set the minimum idle time.
    pub fn minimum_idle(mut self, idle: Duration) -> Self {
        self.minimum_idle = idle;
        self
    }

    /// Set the number of free passes.
    pub fn free_passes(mut self, passes: u32) -> Self {
        self.free_passes = passes;
        self
    }

    /// Effective interval for a consumer shared by `throttle_units` streams.
    ///
    /// Returns `None` when throttling is disabled (`throttle_units == 0`).
    /// The interval grows with the square root of the unit count.
    #[must_use]
    pub fn interval_for(&self, throttle_units: u32) -> Option<Duration> {
        match throttle_units {
            0 => None,
            1 => Some(self.base_interval),
            n => {
                let nanos = self.base_interval.as_nanos() as f64 * f64::from(n).sqrt();
                Some(Duration::from_nanos(nanos.round() as u64))
            }
        }
    }
}

/// Rate limiter for repaint notifications.
#[derive(Debug, Clone)]
pub struct Decimator {
    interval: Option<Duration>,
    minimum_idle: Duration,
    free_passes_left: u32,
    next_deadline: Option<Instant>,
    passed: u64,
    dropped: u64,
}

impl Decimator {
    /// Create a decimator for `throttle_units` concurrent streams.
    #[must_use]
    pub fn new(throttle_units: u32) -> Self {
        Self::with_config(throttle_units, &DecimatorConfig::default())
    }

    /// Create a decimator with explicit tuning.
    #[must_use]
    pub fn with_config(throttle_units: u32, config: &DecimatorConfig) -> Self {
        Self {
            interval: config.interval_for(throttle_units),
            minimum_idle: config.minimum_idle,
            free_passes_left: config.free_passes,
            next_deadline: None,
            passed: 0,
            dropped: 0,
        }
    }

    /// Create a pass-through decimator.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Effective interval, or `None` when disabled.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Number of calls that ran.
    #[must_use]
    pub fn passed(&self) -> u64 {
        self.passed
    }

    /// Number of calls that were dropped.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Run `f` unless the call falls before the next deadline.
    ///
    /// Returns `None` when the call was dropped.
    pub fn call<R>(&mut self, f: impl FnOnce() -> R) -> Option<R> {
        let started = Instant::now();
        if !self.admit(started) {
            return None;
        }
        let out = f();
        self.completed(started, Instant::now());
        Some(out)
    }

    /// Run `f` unconditionally. Used for flush and close notifications.
    ///
    /// The call still pushes the next deadline out, so a repaint right
    /// after a flush does not pile onto a consumer that is still busy.
    pub fn call_always<R>(&mut self, f: impl FnOnce() -> R) -> R {
        let started = Instant::now();
        self.passed += 1;
        let out = f();
        self.completed(started, Instant::now());
        out
    }

    /// Decide whether a call arriving at `now` may run.
    ///
    /// Counts the call as passed or dropped. A passing call must be
    /// followed by [`Decimator::completed`].
    pub fn admit(&mut self, now: Instant) -> bool {
        if self.interval.is_none() {
            self.passed += 1;
            return true;
        }

        let early = self.next_deadline.is_some_and(|deadline| now < deadline);
        if early {
            if self.free_passes_left == 0 {
                self.dropped += 1;
                return false;
            }
            self.free_passes_left -= 1;
        }

        self.passed += 1;
        true
    }

    /// Record that an admitted call ran from `started` to `finished`.
    ///
    /// The next deadline is `finished + max(interval - elapsed, minimum_idle)`:
    /// a callback slower than the interval still gets breathing room.
    pub fn completed(&mut self, started: Instant, finished: Instant) {
        let Some(interval) = self.interval else {
            return;
        };
        let elapsed = finished.saturating_duration_since(started);
        let wait = interval.saturating_sub(elapsed).max(self.minimum_idle);
        self.next_deadline = Some(finished + wait);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DecimatorConfig {
        DecimatorConfig::new()
            .base_interval(Duration::from_millis(100))
            .minimum_idle(Duration::from_millis(10))
            .free_passes(2)
    }

    #[test]
    fn test_disabled_passes_everything() {
        let mut decimator = Decimator::disabled();
        let mut calls = 0;
        for _ in 0..500 {
            decimator.call(|| calls += 1);
        }
        assert_eq!(calls, 500);
        assert_eq!(decimator.passed(), 500);
        assert_eq!(decimator.dropped(), 0);
        assert_eq!(decimator.interval(), None);
    }

    #[test]
    fn test_burst_within_interval() {
        let mut decimator = Decimator::with_config(1, &config());
        let t0 = Instant::now();

        let mut admitted = 0;
        for i in 0..20 {
            let now = t0 + Duration::from_millis(i);
            if decimator.admit(now) {
                decimator.completed(now, now);
                admitted += 1;
            }
        }

        // first call plus the free passes
        assert_eq!(admitted, 3);
        assert_eq!(decimator.dropped(), 17);
    }

    #[test]
    fn test_deadline_reopens() {
        let mut decimator = Decimator::with_config(1, &config().free_passes(0));
        let t0 = Instant::now();

        assert!(decimator.admit(t0));
        decimator.completed(t0, t0);
        assert!(!decimator.admit(t0 + Duration::from_millis(99)));
        assert!(decimator.admit(t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_slow_callback_gets_minimum_idle() {
        let mut decimator = Decimator::with_config(1, &config().free_passes(0));
        let t0 = Instant::now();

        assert!(decimator.admit(t0));
        // callback took longer than the whole interval
        let finished = t0 + Duration::from_millis(250);
        decimator.completed(t0, finished);

        assert!(!decimator.admit(finished + Duration::from_millis(5)));
        assert!(decimator.admit(finished + Duration::from_millis(10)));
    }

    #[test]
    fn test_interval_scales_with_sqrt_units() {
        let config = config();
        assert_eq!(config.interval_for(0), None);
        assert_eq!(config.interval_for(1), Some(Duration::from_millis(100)));
        assert_eq!(config.interval_for(4), Some(Duration::from_millis(200)));
        assert_eq!(config.interval_for(9), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_call_always_never_dropped() {
        let mut decimator = Decimator::with_config(1, &config().free_passes(0));
        let mut repaints = 0;
        let mut flushes = 0;

        for _ in 0..10 {
            decimator.call(|| repaints += 1);
        }
        decimator.call_always(|| flushes += 1);

        assert_eq!(repaints, 1);
        assert_eq!(flushes, 1);
        assert_eq!(decimator.dropped(), 9);
    }
}
