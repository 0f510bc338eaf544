//! Telemetry and session types shared across the pipeline.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// GPS fix attached to a telemetry sample.
///
/// GPS never leaves the session buffer: it is excluded from proofs,
/// disclosures and the long-term archive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// One physiological sample delivered by the sensor layer (~1 Hz).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    /// Sample timestamp (Unix epoch milliseconds)
    pub timestamp_ms: u64,
    /// Heart rate in beats per minute
    pub heart_rate: u32,
    /// Power in watts, if a power meter is paired
    #[serde(default)]
    pub power: Option<u32>,
    /// Cadence in revolutions per minute
    #[serde(default)]
    pub cadence: u32,
    /// Optional position
    #[serde(default)]
    pub gps: Option<GpsFix>,
}

impl TelemetryPoint {
    /// Create a sample without power or GPS.
    pub fn new(timestamp_ms: u64, heart_rate: u32, cadence: u32) -> Self {
        Self {
            timestamp_ms,
            heart_rate,
            power: None,
            cadence,
            gps: None,
        }
    }

    /// Attach a power reading.
    pub fn with_power(mut self, watts: u32) -> Self {
        self.power = Some(watts);
        self
    }

    /// Attach a GPS fix.
    pub fn with_gps(mut self, gps: GpsFix) -> Self {
        self.gps = Some(gps);
        self
    }
}

/// Parameters fixed at session start.
///
/// `target_heart_rate` and `min_duration_minutes` become the public
/// threshold/duration pair of every proof produced for this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Class (ride) identifier
    pub class_id: String,
    /// Rider identifier
    pub rider_id: String,
    /// Session start (Unix epoch milliseconds)
    pub start_time_ms: u64,
    /// Heart-rate threshold in bpm
    pub target_heart_rate: u32,
    /// Minimum time above threshold, in whole minutes
    pub min_duration_minutes: u32,
    /// Average power target for composite proofs
    #[serde(default)]
    pub power_target: Option<u32>,
    /// Average cadence target for composite proofs
    #[serde(default)]
    pub cadence_target: Option<u32>,
}

impl SessionConfig {
    /// Create a single-metric session configuration starting now.
    pub fn new(
        class_id: impl Into<String>,
        rider_id: impl Into<String>,
        target_heart_rate: u32,
        min_duration_minutes: u32,
    ) -> Self {
        Self {
            class_id: class_id.into(),
            rider_id: rider_id.into(),
            start_time_ms: now_ms(),
            target_heart_rate,
            min_duration_minutes,
            power_target: None,
            cadence_target: None,
        }
    }

    /// Request a composite (multi-metric) proof at session end.
    pub fn with_composite_targets(mut self, power_target: u32, cadence_target: u32) -> Self {
        self.power_target = Some(power_target);
        self.cadence_target = Some(cadence_target);
        self
    }

    /// Whether the session carries the targets a composite proof needs.
    pub fn is_composite(&self) -> bool {
        self.power_target.is_some() && self.cadence_target.is_some()
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// A clock set before the epoch reads as zero.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
