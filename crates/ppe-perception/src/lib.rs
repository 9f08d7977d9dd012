//! Client for the PPE perception service.
//!
//! The service is a black box: it receives one JPEG frame plus the
//! confidence threshold and required equipment types, and answers with
//! the persons it found and the equipment detected on each body part.

pub mod client;
pub mod error;
pub mod types;

pub use client::{PerceptionClient, PerceptionClientConfig};
pub use error::{PerceptionError, PerceptionResult};
pub use types::{DetectRequest, HealthResponse};
