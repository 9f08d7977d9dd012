//! PPE compliance monitor.
//!
//! This crate provides:
//! - Detection normalization and violation debouncing
//! - The no-person watchdog
//! - Evidence batching with cooldown-gated alert dispatch
//! - The per-frame session loop and its frame sources
//! - Frame retention and graceful shutdown with a final flush

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod evidence;
pub mod failures;
pub mod frame_source;
pub mod logging;
pub mod mailbox;
pub mod metrics;
pub mod normalizer;
pub mod notification;
pub mod perception;
pub mod retention;
pub mod runner;
pub mod session;
pub mod testing;
pub mod violation;
pub mod watchdog;

pub use clock::{Clock, IntervalGate, ManualClock, SystemClock};
pub use collaborators::{FrameStorage, Notifier, PerceptionService};
pub use config::MonitorConfig;
pub use dispatcher::{AlertDispatcher, DispatchOutcome, SkipReason};
pub use error::{MonitorError, MonitorResult};
pub use evidence::{CaptureOutcome, EvidenceBatchStore};
pub use frame_source::{DirectoryFrameSource, Frame, FrameSource, SnapshotFrameSource};
pub use logging::SessionLogger;
pub use normalizer::normalize;
pub use notification::AlertComposer;
pub use retention::RetentionTask;
pub use runner::{MonitorRunner, RunSummary, ShutdownHandle, StopReason};
pub use session::{MonitorSession, SessionDeps, TickReport};
pub use violation::{ViolationDebouncer, ViolationEvent, ViolationState};
pub use watchdog::{NoPersonWatchdog, WatchdogEvent, WatchdogState};
