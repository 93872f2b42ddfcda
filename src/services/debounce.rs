//! Single-shot debounce timers driven by an injected clock.
//!
//! The debouncer never sleeps; owners ask it whether the deadline has passed.
//! This keeps every state transition a plain function of `now`.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by tokio's time source, so paused-time tests and
/// `tokio::time::sleep_until` agree on what "now" is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Hand-driven clock for deterministic tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// A re-armable single-shot timer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the timer from `now`.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Make the timer due immediately.
    pub fn arm_now(&mut self, now: Instant) {
        self.deadline = Some(now);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the timer if it has expired. Returns true exactly once per arming.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_delay() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.arm(clock.now());

        clock.advance(Duration::from_millis(99));
        assert!(!d.fire(clock.now()));

        clock.advance(Duration::from_millis(1));
        assert!(d.fire(clock.now()));
        assert!(!d.fire(clock.now()));
        assert!(!d.is_armed());
    }

    #[test]
    fn test_rearm_pushes_deadline() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(Duration::from_millis(100));
        d.arm(clock.now());
        clock.advance(Duration::from_millis(80));
        d.arm(clock.now());
        clock.advance(Duration::from_millis(80));
        assert!(!d.fire(clock.now()));
        clock.advance(Duration::from_millis(20));
        assert!(d.fire(clock.now()));
    }

    #[test]
    fn test_cancel_and_arm_now() {
        let clock = ManualClock::new();
        let mut d = Debouncer::new(Duration::from_secs(10));
        d.arm(clock.now());
        d.cancel();
        clock.advance(Duration::from_secs(11));
        assert!(!d.fire(clock.now()));

        d.arm_now(clock.now());
        assert!(d.fire(clock.now()));
    }
}
