//! Telemetry session lifecycle
//!
//! Owns one workout session at a time: recording state, the bounded
//! telemetry buffer, and the hand-off to proving. Ingestion is an O(1)
//! append under a short-lived lock; proving always works on a snapshot so
//! telemetry keeps flowing while a proof is in flight.

use crate::archive::{ArchiveRecord, NullArchive, TelemetryArchive};
use crate::buffer::{SessionStats, TelemetryBuffer};
use crate::error::{StreamError, StreamResult};
use effortproof_core::{now_ms, SessionConfig, SessionLimits, TelemetryPoint};
use effortproof_crypto::{BackendKind, ProofInput, ProofOrchestrator, ZkProof};
use effortproof_domain::{
    calculate_privacy_score, get_privacy_level, DisclosureBuilder, DisclosureMetadata,
    DisclosurePolicy, PrivacyLevel, SelectiveDisclosure,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Summary attached to every session proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    /// Points the proof was computed over
    pub sample_count: usize,
    /// Peak heart rate (bpm)
    pub max_heart_rate: u32,
    /// Mean power, if any point carried power
    pub avg_power: Option<u32>,
    /// Mean cadence (rpm)
    pub avg_cadence: u32,
    /// Whole minutes covered
    pub duration_minutes: u32,
    /// Points strictly above the target heart rate
    pub samples_above_threshold: usize,
    /// Wall-clock proving latency
    pub proving_ms: u64,
    /// Backend that produced the proof
    pub backend: BackendKind,
}

/// Proof, disclosure and metadata for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProof {
    /// Session identifier
    pub session_id: String,
    /// Proof over the session statistics
    pub proof: ZkProof,
    /// Default-policy disclosure of the proof
    pub disclosure: SelectiveDisclosure,
    /// Session summary
    pub metadata: SessionMetadata,
}

/// Success-tagged result for UI and process boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    /// Whether a proof was produced
    pub success: bool,
    /// Session identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Proof, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<ZkProof>,
    /// Disclosure, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclosure: Option<SelectiveDisclosure>,
    /// Session summary, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SessionMetadata>,
    /// Privacy score of the disclosure, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_score: Option<u32>,
    /// Privacy level of the disclosure, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_level: Option<PrivacyLevel>,
    /// Failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<StreamResult<SessionProof>> for SessionReport {
    fn from(result: StreamResult<SessionProof>) -> Self {
        match result {
            Ok(session) => {
                let score = calculate_privacy_score(&session.disclosure);
                Self {
                    success: true,
                    session_id: Some(session.session_id),
                    proof: Some(session.proof),
                    disclosure: Some(session.disclosure),
                    metadata: Some(session.metadata),
                    privacy_score: Some(score),
                    privacy_level: Some(get_privacy_level(score)),
                    error: None,
                }
            }
            Err(e) => Self {
                success: false,
                session_id: None,
                proof: None,
                disclosure: None,
                metadata: None,
                privacy_score: None,
                privacy_level: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug)]
struct SessionState {
    session_id: Option<String>,
    config: Option<SessionConfig>,
    buffer: TelemetryBuffer,
    recording: bool,
}

/// Everything proving needs, copied out of the lock.
struct Snapshot {
    session_id: String,
    config: SessionConfig,
    points: Vec<TelemetryPoint>,
}

/// One workout session at a time.
pub struct TelemetrySession {
    state: Mutex<SessionState>,
    orchestrator: Arc<ProofOrchestrator>,
    archive: Arc<dyn TelemetryArchive>,
    policy: DisclosurePolicy,
    limits: SessionLimits,
}

impl TelemetrySession {
    /// Session proving through `orchestrator`.
    pub fn new(orchestrator: Arc<ProofOrchestrator>, limits: SessionLimits) -> Self {
        Self {
            state: Mutex::new(SessionState {
                session_id: None,
                config: None,
                buffer: TelemetryBuffer::new(limits.buffer_capacity),
                recording: false,
            }),
            orchestrator,
            archive: Arc::new(NullArchive),
            policy: DisclosurePolicy::default(),
            limits,
        }
    }

    /// Replace the archive side channel.
    pub fn with_archive(mut self, archive: Arc<dyn TelemetryArchive>) -> Self {
        self.archive = archive;
        self
    }

    /// Replace the disclosure policy.
    pub fn with_policy(mut self, policy: DisclosurePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // State is left consistent by every critical section, so a poisoned
        // lock is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start recording, discarding any previous session. Returns the new id.
    pub fn start_session(&self, config: SessionConfig) -> String {
        let session_id = Uuid::new_v4().to_string();
        let mut state = self.state();
        if state.recording {
            warn!(
                previous = state.session_id.as_deref().unwrap_or_default(),
                "Overwriting active session"
            );
        }
        state.buffer.clear();
        state.session_id = Some(session_id.clone());
        state.recording = true;
        debug!(
            session_id = %session_id,
            class_id = %config.class_id,
            target_heart_rate = config.target_heart_rate,
            min_duration_minutes = config.min_duration_minutes,
            "Session started"
        );
        state.config = Some(config);
        session_id
    }

    /// Append a point. Returns `false` (and warns) when not recording.
    pub fn add_telemetry(&self, point: TelemetryPoint) -> bool {
        let mut state = self.state();
        if !state.recording {
            warn!(timestamp_ms = point.timestamp_ms, "Telemetry received while not recording");
            return false;
        }
        state.buffer.push(point);
        true
    }

    /// Whether a session is recording.
    pub fn is_recording(&self) -> bool {
        self.state().recording
    }

    /// Current session id, if a session was started.
    pub fn session_id(&self) -> Option<String> {
        self.state().session_id.clone()
    }

    /// Read-only statistics for polling. Zeros when empty.
    pub fn get_session_stats(&self) -> SessionStats {
        let state = self.state();
        let threshold = state
            .config
            .as_ref()
            .map(|c| c.target_heart_rate)
            .unwrap_or_default();
        let mut stats = state.buffer.stats(threshold);
        stats.recording = state.recording;
        stats
    }

    fn snapshot(&self, stop: bool) -> StreamResult<Snapshot> {
        let mut state = self.state();
        if !state.recording {
            return Err(StreamError::NotRecording);
        }
        if stop {
            state.recording = false;
        }
        match (&state.session_id, &state.config) {
            (Some(session_id), Some(config)) => Ok(Snapshot {
                session_id: session_id.clone(),
                config: config.clone(),
                points: state.buffer.snapshot(),
            }),
            _ => Err(StreamError::NotRecording),
        }
    }

    /// Stop recording and prove the session.
    pub async fn end_session(&self) -> StreamResult<SessionProof> {
        let snapshot = self.snapshot(true)?;
        debug!(
            session_id = %snapshot.session_id,
            samples = snapshot.points.len(),
            "Session ended"
        );
        if snapshot.points.is_empty() {
            return Err(StreamError::NoTelemetry);
        }

        let result = self.prove(&snapshot).await?;

        let archive = Arc::clone(&self.archive);
        let session_id = snapshot.session_id.clone();
        let record = ArchiveRecord::from_points(&snapshot.points);
        tokio::spawn(async move {
            if let Err(e) = archive.store(&session_id, record).await {
                warn!(session_id = %session_id, error = %e, "Telemetry archive failed");
            }
        });

        Ok(result)
    }

    /// Prove the session so far without stopping it.
    pub async fn generate_intermediate_proof(&self) -> StreamResult<SessionProof> {
        let snapshot = self.snapshot(false)?;
        let stats = SessionStats::from_points(&snapshot.points, snapshot.config.target_heart_rate);
        let required = self.limits.min_intermediate_minutes;
        if stats.duration_minutes < required {
            return Err(StreamError::InsufficientData {
                required_minutes: required,
                available_minutes: stats.duration_minutes,
            });
        }
        self.prove(&snapshot).await
    }

    async fn prove(&self, snapshot: &Snapshot) -> StreamResult<SessionProof> {
        let config = &snapshot.config;
        let stats = SessionStats::from_points(&snapshot.points, config.target_heart_rate);

        let mut input = ProofInput::new(
            config.class_id.clone(),
            config.target_heart_rate,
            config.min_duration_minutes,
        )
        .with_rider(config.rider_id.clone())
        .with_heart_rate(stats.max_heart_rate)
        .with_power(stats.avg_power)
        .with_cadence(stats.avg_cadence)
        .with_elapsed_seconds(u32::try_from(stats.samples_above_threshold).unwrap_or(u32::MAX))
        .with_series(snapshot.points.iter().map(|p| p.heart_rate).collect());

        let started = Instant::now();
        let proof = match (config.power_target, config.cadence_target) {
            (Some(power), Some(cadence)) => {
                input = input.with_composite_targets(power, cadence);
                self.orchestrator.prove_composite(&input).await?
            }
            _ => self.orchestrator.prove_effort_threshold(&input).await?,
        };
        let proving_ms = started.elapsed().as_millis() as u64;
        drop(input);

        let disclosure = DisclosureBuilder::new(self.policy.clone())
            .with_proof(proof.clone())
            .with_metadata(DisclosureMetadata {
                class_id: config.class_id.clone(),
                rider_id: config.rider_id.clone(),
                timestamp_ms: now_ms(),
                duration_minutes: Some(stats.duration_minutes),
            })
            .build()?;

        info!(
            session_id = %snapshot.session_id,
            backend = %proof.backend(),
            circuit = %proof.circuit(),
            proving_ms,
            samples = stats.sample_count,
            "Session proof generated"
        );

        Ok(SessionProof {
            session_id: snapshot.session_id.clone(),
            metadata: SessionMetadata {
                sample_count: stats.sample_count,
                max_heart_rate: stats.max_heart_rate,
                avg_power: stats.avg_power,
                avg_cadence: stats.avg_cadence,
                duration_minutes: stats.duration_minutes,
                samples_above_threshold: stats.samples_above_threshold,
                proving_ms,
                backend: proof.backend(),
            },
            proof,
            disclosure,
        })
    }
}
