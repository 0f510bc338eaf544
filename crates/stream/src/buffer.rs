//! Bounded telemetry buffer
//!
//! A FIFO ring of telemetry points. Once full, every insert evicts the
//! oldest point, so memory stays bounded for arbitrarily long sessions at
//! the cost of early-session granularity.

use effortproof_core::TelemetryPoint;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default resident capacity (about ten minutes at 1 Hz).
pub const DEFAULT_CAPACITY: usize = 600;

/// Summary statistics over the resident points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Resident points
    pub sample_count: usize,
    /// Peak heart rate (bpm)
    pub max_heart_rate: u32,
    /// Rounded mean power over points that carry power; `None` if none do
    pub avg_power: Option<u32>,
    /// Rounded mean cadence (rpm)
    pub avg_cadence: u32,
    /// Whole minutes covered by the resident points
    pub duration_minutes: u32,
    /// Points with heart rate strictly above the threshold
    pub samples_above_threshold: usize,
    /// Whether the owning session is recording
    pub recording: bool,
}

impl SessionStats {
    /// Summarize `points` against `threshold`.
    pub fn from_points<'a, I>(points: I, threshold: u32) -> Self
    where
        I: IntoIterator<Item = &'a TelemetryPoint>,
    {
        let mut stats = SessionStats::default();
        let mut power_sum = 0u64;
        let mut power_count = 0u64;
        let mut cadence_sum = 0u64;
        let mut first_ts = None;
        let mut last_ts = 0u64;

        for point in points {
            stats.sample_count += 1;
            stats.max_heart_rate = stats.max_heart_rate.max(point.heart_rate);
            if let Some(watts) = point.power {
                power_sum += u64::from(watts);
                power_count += 1;
            }
            cadence_sum += u64::from(point.cadence);
            if point.heart_rate > threshold {
                stats.samples_above_threshold += 1;
            }
            first_ts.get_or_insert(point.timestamp_ms);
            last_ts = point.timestamp_ms;
        }

        if stats.sample_count == 0 {
            return stats;
        }
        let count = stats.sample_count as u64;
        stats.avg_power = (power_count > 0).then(|| rounded_mean(power_sum, power_count));
        stats.avg_cadence = rounded_mean(cadence_sum, count);

        stats.duration_minutes = coverage_minutes(first_ts.unwrap_or(last_ts), last_ts, count);
        stats
    }
}

/// Whole minutes covered by `count` samples from `first_ms` to `last_ms`.
///
/// Each sample covers one sampling interval, so the span between the first
/// and last timestamps is extended by the mean interval. Without a span the
/// samples are taken to be 1 Hz.
fn coverage_minutes(first_ms: u64, last_ms: u64, count: u64) -> u32 {
    let span_ms = last_ms.saturating_sub(first_ms);
    let covered_ms = if span_ms > 0 && count > 1 {
        span_ms + span_ms / (count - 1)
    } else {
        count * 1_000
    };
    u32::try_from(covered_ms / 60_000).unwrap_or(u32::MAX)
}

fn rounded_mean(sum: u64, count: u64) -> u32 {
    ((sum + count / 2) / count) as u32
}

/// FIFO ring of telemetry points.
#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    points: VecDeque<TelemetryPoint>,
    capacity: usize,
}

impl TelemetryBuffer {
    /// Create a buffer holding at most `capacity` points.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting the oldest when full.
    pub fn push(&mut self, point: TelemetryPoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Resident points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no point is resident
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Maximum resident points
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every resident point
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Owned copy of the resident points, oldest first.
    pub fn snapshot(&self) -> Vec<TelemetryPoint> {
        self.points.iter().cloned().collect()
    }

    /// Summary statistics against `threshold`.
    pub fn stats(&self, threshold: u32) -> SessionStats {
        SessionStats::from_points(&self.points, threshold)
    }
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
