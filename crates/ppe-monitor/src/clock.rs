//! Time sources and cadence gates.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Source of monotonic and wall-clock time.
///
/// Debounce and cooldown arithmetic use the monotonic instant; the wall
/// clock is only used to stamp evidence.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn wall(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to. Used by tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    inner: Mutex<(Instant, DateTime<Utc>)>,
}

impl ManualClock {
    pub fn new(wall: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::new((Instant::now(), wall)),
        }
    }

    /// Move both clocks forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.0 += by;
        guard.1 += chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).0
    }

    fn wall(&self) -> DateTime<Utc> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).1
    }
}

/// Fires at most once per interval. Opens immediately on first use.
#[derive(Debug, Clone)]
pub struct IntervalGate {
    interval: Duration,
    last: Option<Instant>,
}

impl IntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn ready(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// `ready` followed by `mark` when it was.
    pub fn try_pass(&mut self, now: Instant) -> bool {
        if self.ready(now) {
            self.mark(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances_both() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
        let start = clock.now();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(clock.now() - start, Duration::from_millis(1500));
        assert_eq!(
            clock.wall(),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 1).unwrap() + chrono::Duration::milliseconds(500)
        );
    }

    #[test]
    fn test_interval_gate() {
        let start = Instant::now();
        let mut gate = IntervalGate::new(Duration::from_secs(3));

        assert!(gate.try_pass(start));
        assert!(!gate.try_pass(start + Duration::from_secs(2)));
        assert!(gate.try_pass(start + Duration::from_secs(3)));
        assert!(!gate.ready(start + Duration::from_secs(4)));
    }
}
