//! Structured logging infrastructure for EffortProof.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.
//! Initialization is idempotent: a second call leaves the first subscriber
//! in place, so tests and embedding applications may call it freely.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use effortproof_core::logging;
///
/// logging::init();
/// tracing::info!("Session recorder started");
/// ```
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();
}

/// Initialize the logging system with JSON output for production environments.
///
/// # Example
/// ```no_run
/// use effortproof_core::logging;
///
/// logging::init_json();
/// tracing::info!(backend = "simulated", "Prover ready");
/// ```
pub fn init_json() {
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().json().with_target(true).with_thread_ids(true))
        .try_init();
}

/// Initialize logging according to the `[logging]` config section.
pub fn init_from_config(config: &LoggingConfig) {
    if config.json {
        init_json();
    } else {
        init();
    }
}
