//! Long-term telemetry archive side channel
//!
//! Sessions hand their raw series to an archive after proving. The call is
//! fire-and-forget: an archive failure is logged and never fails a proof.
//! Location data is excluded by construction.

use crate::error::StreamResult;
use async_trait::async_trait;
use effortproof_core::TelemetryPoint;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Raw series handed to the archive. Carries no GPS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    /// Heart rate per point (bpm)
    pub heart_rate: Vec<u32>,
    /// Power per point (watts), 0 where no reading exists
    pub power: Vec<u32>,
    /// Cadence per point (rpm)
    pub cadence: Vec<u32>,
    /// Point timestamps (ms since epoch)
    pub timestamps: Vec<u64>,
}

impl ArchiveRecord {
    /// Split points into parallel series.
    pub fn from_points(points: &[TelemetryPoint]) -> Self {
        let mut record = ArchiveRecord {
            heart_rate: Vec::with_capacity(points.len()),
            power: Vec::with_capacity(points.len()),
            cadence: Vec::with_capacity(points.len()),
            timestamps: Vec::with_capacity(points.len()),
        };
        for point in points {
            record.heart_rate.push(point.heart_rate);
            record.power.push(point.power.unwrap_or(0));
            record.cadence.push(point.cadence);
            record.timestamps.push(point.timestamp_ms);
        }
        record
    }
}

/// Storage collaborator for raw session telemetry.
#[async_trait]
pub trait TelemetryArchive: Send + Sync {
    /// Persist `record` under `session_id`.
    async fn store(&self, session_id: &str, record: ArchiveRecord) -> StreamResult<()>;
}

/// Archive that discards everything.
#[derive(Debug, Clone, Default)]
pub struct NullArchive;

#[async_trait]
impl TelemetryArchive for NullArchive {
    async fn store(&self, session_id: &str, record: ArchiveRecord) -> StreamResult<()> {
        debug!(session_id, samples = record.heart_rate.len(), "Archive disabled, dropping record");
        Ok(())
    }
}

/// Archive writing one JSON file per session into a directory.
#[derive(Debug, Clone)]
pub struct FileArchive {
    directory: PathBuf,
}

impl FileArchive {
    /// Archive rooted at `directory` (created on first store).
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Path a session's record is written to.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.directory.join(format!("{session_id}.json"))
    }
}

#[async_trait]
impl TelemetryArchive for FileArchive {
    async fn store(&self, session_id: &str, record: ArchiveRecord) -> StreamResult<()> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let body = serde_json::to_vec(&record)?;
        let path = self.path_for(session_id);
        tokio::fs::write(&path, body).await?;
        debug!(session_id, path = %path.display(), "Archived session telemetry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use effortproof_core::GpsFix;

    #[test]
    fn test_record_excludes_gps() {
        let points = vec![
            TelemetryPoint::new(1_000, 140, 85)
                .with_power(210)
                .with_gps(GpsFix {
                    latitude: 51.5,
                    longitude: -0.12,
                }),
            TelemetryPoint::new(2_000, 142, 86),
        ];
        let record = ArchiveRecord::from_points(&points);
        assert_eq!(record.heart_rate, vec![140, 142]);
        assert_eq!(record.power, vec![210, 0]);
        assert_eq!(record.timestamps, vec![1_000, 2_000]);

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("51.5"));
        assert!(!json.to_lowercase().contains("gps"));
    }

    #[tokio::test]
    async fn test_file_archive_writes_record() {
        let dir = std::env::temp_dir().join(format!("effortproof-archive-{}", uuid::Uuid::new_v4()));
        let archive = FileArchive::new(&dir);
        let record = ArchiveRecord::from_points(&[TelemetryPoint::new(0, 130, 80)]);

        archive.store("session-1", record.clone()).await.unwrap();

        let bytes = tokio::fs::read(archive.path_for("session-1")).await.unwrap();
        let stored: ArchiveRecord = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(stored, record);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
