//! Violation debouncing.
//!
//! A violation is confirmed only after non-compliance has persisted
//! continuously for the configured duration. One compliant frame resets
//! the streak.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use ppe_models::{EquipmentCategory, FrameCompliance};

/// Debouncer state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViolationState {
    #[default]
    Idle,
    Pending {
        since: Instant,
    },
    Confirmed {
        missing_items: BTreeSet<EquipmentCategory>,
        since: Instant,
    },
}

impl ViolationState {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, ViolationState::Confirmed { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationState::Idle => "idle",
            ViolationState::Pending { .. } => "pending",
            ViolationState::Confirmed { .. } => "confirmed",
        }
    }
}

/// Transition reported by [`ViolationDebouncer::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationEvent {
    /// Compliant frame while already idle.
    Compliant,
    /// Compliant frame ended a streak.
    Resolved { was_confirmed: bool },
    /// First non-compliant frame of a streak.
    Started,
    /// Streak still shorter than the violation duration.
    Pending,
    /// Streak reached the violation duration on this frame.
    Confirmed,
    /// Already confirmed; missing items refreshed.
    Sustained,
}

impl ViolationEvent {
    /// Whether the evidence batch must be emptied after this event.
    pub fn clears_evidence(&self) -> bool {
        matches!(self, ViolationEvent::Compliant | ViolationEvent::Resolved { .. })
    }
}

/// Per-session violation state machine.
#[derive(Debug, Clone)]
pub struct ViolationDebouncer {
    violation_duration: Duration,
    state: ViolationState,
}

impl ViolationDebouncer {
    pub fn new(violation_duration: Duration) -> Self {
        Self {
            violation_duration,
            state: ViolationState::Idle,
        }
    }

    pub fn state(&self) -> &ViolationState {
        &self.state
    }

    pub fn is_confirmed(&self) -> bool {
        self.state.is_confirmed()
    }

    /// Missing items of the confirmed violation, if any.
    pub fn missing_items(&self) -> Option<&BTreeSet<EquipmentCategory>> {
        match &self.state {
            ViolationState::Confirmed { missing_items, .. } => Some(missing_items),
            _ => None,
        }
    }

    /// Feed one frame.
    pub fn observe(&mut self, frame: &FrameCompliance, now: Instant) -> ViolationEvent {
        if frame.missing_items.is_empty() {
            let event = match self.state {
                ViolationState::Idle => ViolationEvent::Compliant,
                ViolationState::Pending { .. } => ViolationEvent::Resolved {
                    was_confirmed: false,
                },
                ViolationState::Confirmed { .. } => ViolationEvent::Resolved {
                    was_confirmed: true,
                },
            };
            self.state = ViolationState::Idle;
            return event;
        }

        match &mut self.state {
            ViolationState::Idle => {
                self.state = ViolationState::Pending { since: now };
                ViolationEvent::Started
            }
            ViolationState::Pending { since } => {
                if now.saturating_duration_since(*since) >= self.violation_duration {
                    self.state = ViolationState::Confirmed {
                        missing_items: frame.missing_items.clone(),
                        since: now,
                    };
                    ViolationEvent::Confirmed
                } else {
                    ViolationEvent::Pending
                }
            }
            ViolationState::Confirmed { missing_items, .. } => {
                missing_items.clone_from(&frame.missing_items);
                ViolationEvent::Sustained
            }
        }
    }
}
