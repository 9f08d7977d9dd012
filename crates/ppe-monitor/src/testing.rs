//! In-memory collaborators for tests and offline replays.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use ppe_alerts::{AlertError, AlertMessage, AlertResult};
use ppe_models::{EquipmentCategory, EvidenceBatch, PerceptionResponse};
use ppe_perception::{PerceptionError, PerceptionResult};
use ppe_storage::{render_violation_snapshot, select_expired, ObjectInfo, StorageError, StorageResult};

use crate::collaborators::{FrameStorage, Notifier, PerceptionService};
use crate::error::{MonitorError, MonitorResult};
use crate::frame_source::{Frame, FrameSource};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Perception service answering from a script, then a fallback response.
pub struct ScriptedPerception {
    script: Mutex<VecDeque<PerceptionResult<PerceptionResponse>>>,
    fallback: Mutex<PerceptionResponse>,
    calls: AtomicUsize,
    gate: Option<Semaphore>,
}

impl ScriptedPerception {
    /// Always answer with `response`.
    pub fn always(response: PerceptionResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(response),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Calls block until [`Self::release`] is called.
    pub fn gated(response: PerceptionResponse) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::always(response)
        }
    }

    /// Queue a one-off answer ahead of the fallback.
    pub fn push(&self, result: PerceptionResult<PerceptionResponse>) {
        lock(&self.script).push_back(result);
    }

    pub fn set_fallback(&self, response: PerceptionResponse) {
        *lock(&self.fallback) = response;
    }

    /// Let `n` gated calls complete.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PerceptionService for ScriptedPerception {
    async fn detect(
        &self,
        _jpeg: &[u8],
        _min_confidence: f64,
        _required: &BTreeSet<EquipmentCategory>,
    ) -> PerceptionResult<PerceptionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| PerceptionError::ServiceUnavailable(e.to_string()))?
                .forget();
        }

        let scripted = lock(&self.script).pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(lock(&self.fallback).clone()),
        }
    }
}

/// Object store kept in a map.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    snapshots: Mutex<Vec<String>>,
    fail_puts: AtomicBool,
    fail_presign: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_presign(&self, fail: bool) {
        self.fail_presign.store(fail, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        lock(&self.objects).keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains_key(key)
    }

    /// Every violation snapshot written so far, oldest first.
    pub fn snapshots(&self) -> Vec<String> {
        lock(&self.snapshots).clone()
    }
}

#[async_trait]
impl FrameStorage for MemoryStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> StorageResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed(format!("refusing {}", key)));
        }
        lock(&self.objects).insert(key.to_string(), bytes);
        Ok(())
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        if self.fail_presign.load(Ordering::SeqCst) {
            return Err(StorageError::presign_failed(format!("refusing {}", key)));
        }
        Ok(format!("https://frames.test/{}?ttl={}", key, ttl.as_secs()))
    }

    async fn write_violation_snapshot(&self, batch: &EvidenceBatch) -> StorageResult<()> {
        lock(&self.snapshots).push(render_violation_snapshot(batch));
        Ok(())
    }

    async fn prune_frames(&self, keep: usize) -> StorageResult<u32> {
        let mut objects = lock(&self.objects);
        let listed: Vec<ObjectInfo> = objects
            .iter()
            .map(|(key, bytes)| ObjectInfo {
                key: key.clone(),
                size: bytes.len() as u64,
                last_modified: None,
            })
            .collect();

        let expired = select_expired(&listed, keep);
        for key in &expired {
            objects.remove(key);
        }
        Ok(expired.len() as u32)
    }
}

/// Notifier that records what it publishes.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<AlertMessage>>,
    attempts: AtomicUsize,
    failing: AtomicBool,
    gate: Option<Semaphore>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes block until [`Self::release`] is called.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Successfully published messages.
    pub fn messages(&self) -> Vec<AlertMessage> {
        lock(&self.messages).clone()
    }

    /// Publish calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, subject: &str, body: &str) -> AlertResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| AlertError::publish_failed(e.to_string()))?
                .forget();
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AlertError::connection_failed("notifier offline"));
        }
        lock(&self.messages).push(AlertMessage::new(subject, body));
        Ok(())
    }
}

/// Frame source yielding a fixed list of frames, optionally failing first.
pub struct QueuedFrames {
    frames: VecDeque<Frame>,
    failures_first: u32,
}

impl QueuedFrames {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            failures_first: 0,
        }
    }

    /// Fail `n` reads before yielding the queued frames.
    pub fn failing_first(mut self, n: u32) -> Self {
        self.failures_first = n;
        self
    }
}

#[async_trait]
impl FrameSource for QueuedFrames {
    async fn next_frame(&mut self) -> MonitorResult<Option<Frame>> {
        if self.failures_first > 0 {
            self.failures_first -= 1;
            return Err(MonitorError::frame_source("camera not ready"));
        }
        Ok(self.frames.pop_front())
    }
}
