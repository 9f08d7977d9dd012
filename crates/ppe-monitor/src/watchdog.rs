//! No-person watchdog.

use std::time::{Duration, Instant};

use ppe_models::FrameCompliance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchdogState {
    #[default]
    PersonPresent,
    Pending {
        since: Instant,
    },
    Confirmed {
        since: Instant,
    },
}

/// Transition reported by [`NoPersonWatchdog::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogEvent {
    /// Frame carried no perception result; nothing changed.
    Ignored,
    /// Someone is in the frame.
    Present,
    /// Someone reappeared after the watchdog fired.
    Recovered,
    /// First empty frame.
    Started,
    /// Still empty, not long enough yet.
    Pending,
    /// Empty long enough; fires once per streak.
    Fired,
    /// Still empty after firing.
    StillEmpty,
}

/// Declares an empty scene once nobody has been seen for the configured
/// duration.
#[derive(Debug, Clone)]
pub struct NoPersonWatchdog {
    no_person_duration: Duration,
    state: WatchdogState,
}

impl NoPersonWatchdog {
    pub fn new(no_person_duration: Duration) -> Self {
        Self {
            no_person_duration,
            state: WatchdogState::PersonPresent,
        }
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn has_fired(&self) -> bool {
        matches!(self.state, WatchdogState::Confirmed { .. })
    }

    pub fn observe(&mut self, frame: &FrameCompliance, now: Instant) -> WatchdogEvent {
        if !frame.observed {
            return WatchdogEvent::Ignored;
        }

        if !frame.persons.is_empty() {
            let event = match self.state {
                WatchdogState::Confirmed { .. } => WatchdogEvent::Recovered,
                _ => WatchdogEvent::Present,
            };
            self.state = WatchdogState::PersonPresent;
            return event;
        }

        match self.state {
            WatchdogState::PersonPresent => {
                self.state = WatchdogState::Pending { since: now };
                WatchdogEvent::Started
            }
            WatchdogState::Pending { since } => {
                if now.saturating_duration_since(since) >= self.no_person_duration {
                    self.state = WatchdogState::Confirmed { since: now };
                    WatchdogEvent::Fired
                } else {
                    WatchdogEvent::Pending
                }
            }
            WatchdogState::Confirmed { .. } => WatchdogEvent::StillEmpty,
        }
    }
}
