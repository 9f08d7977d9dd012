//! Alert notification transport.
//!
//! This crate provides:
//! - Alert publishing via Redis Pub/Sub
//! - A subscription stream for downstream consumers (mailers, dashboards)

pub mod channel;
pub mod error;

pub use channel::{AlertChannel, AlertChannelConfig, AlertMessage, DEFAULT_ALERT_CHANNEL};
pub use error::{AlertError, AlertResult};
