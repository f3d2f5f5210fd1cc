//! Brivas Telemetry
//!
//! Structured logging setup and in-process metric primitives that mirror
//! into the `metrics` facade.

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use crate::metrics::{
    record_dispatch_outcome, record_push_received, Counter, Gauge, Histogram,
};
pub use tracing_setup::init_tracing;

/// Initialize logging for a service from the environment
pub fn init(service_name: &str) -> Result<(), TelemetryError> {
    let config = TelemetryConfig::from_env();
    init_tracing(service_name, &config)
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),
}
