//! Structured session logging.
//!
//! Every lifecycle event of a monitoring session carries the session id and
//! camera name so logs from several cameras can be told apart.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Session logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    camera: String,
}

impl SessionLogger {
    /// Create a logger with a fresh session id.
    pub fn new(camera: &str) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            camera: camera.to_string(),
        }
    }

    pub fn with_session_id(session_id: &str, camera: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            camera: camera.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            camera = %self.camera,
            "Session started: {}", message
        );
    }

    /// Log a state transition (violation confirmed, resolved, no person, ...).
    pub fn log_transition(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            camera = %self.camera,
            "Session transition: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            camera = %self.camera,
            "Session warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            camera = %self.camera,
            "Session error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            camera = %self.camera,
            "Session stopped: {}", message
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn camera(&self) -> &str {
        &self.camera
    }

    /// Create a tracing span for this session.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            camera = %self.camera
        )
    }
}
