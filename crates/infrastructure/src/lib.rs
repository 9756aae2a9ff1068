//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports on top of the OpenStreetMap clients,
//! and owns configuration loading and logging setup.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::*;
pub use config::{AppConfig, ENV_PREFIX};
pub use telemetry::{LogFormat, LoggingConfig, TelemetryError, init_logging};
