//! Latest perception result slot and the perception in-flight flag.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use ppe_models::PerceptionResponse;

/// A perception result as seen by the primary loop.
#[derive(Debug, Clone)]
pub struct ReceivedResult {
    pub response: Arc<PerceptionResponse>,
    pub received_at: Instant,
    /// Increases by one for every stored result.
    pub sequence: u64,
}

/// Single-slot mailbox holding the most recently received result.
///
/// Written by perception tasks, read by the loop. A newer write replaces
/// the previous value regardless of request order.
#[derive(Debug, Clone, Default)]
pub struct LatestResult {
    slot: Arc<Mutex<Option<ReceivedResult>>>,
    sequence: Arc<AtomicU64>,
}

impl LatestResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, response: PerceptionResponse, received_at: Instant) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(ReceivedResult {
            response: Arc::new(response),
            received_at,
            sequence,
        });
        sequence
    }

    pub fn latest(&self) -> Option<ReceivedResult> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Sequence number of the last stored result (0 before any).
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

/// Shared "a perception call is running" flag.
#[derive(Debug, Clone, Default)]
pub struct InFlightFlag {
    busy: Arc<AtomicBool>,
}

impl InFlightFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the flag if it is free. The returned guard releases it on drop.
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the in-flight flag when dropped, including on panic.
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
