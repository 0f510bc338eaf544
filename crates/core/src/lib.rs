//! Core functionality for the EffortProof effort-verification pipeline.
//!
//! This crate provides the telemetry types, configuration, logging and
//! error plumbing shared by the proving, disclosure and session crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{
    ArchiveConfig, Config, LoggingConfig, ProverConfig, SessionLimits, VerifierRegistry,
    WitnessOverflow,
};
pub use error::{CoreError, Result};
pub use types::{now_ms, GpsFix, SessionConfig, TelemetryPoint};
