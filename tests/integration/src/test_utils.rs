//! Test utilities for pipeline integration tests

use async_trait::async_trait;
use effortproof_core::{Config, SessionLimits, TelemetryPoint};
use effortproof_crypto::zk::{
    ArtifactLocation, ArtifactSource, CircuitArtifact, EngineProof, ProvingEngine, Witness,
};
use effortproof_crypto::{ProofOrchestrator, ZkError, ZkResult};
use effortproof_stream::{ArchiveRecord, StreamError, StreamResult, TelemetryArchive, TelemetrySession};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Install a test subscriber once
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// `count` points at 1 Hz with heart rate ramping linearly from `from` to `to`
pub fn ramp(count: usize, from: u32, to: u32) -> Vec<TelemetryPoint> {
    let span = count.saturating_sub(1).max(1) as u64;
    (0..count as u64)
        .map(|i| {
            let delta = u64::from(to.saturating_sub(from)) * i / span;
            TelemetryPoint::new(i * 1000, from + delta as u32, 88).with_power(210)
        })
        .collect()
}

/// Artifact source answering every fetch with `HTTP 404`
#[derive(Debug, Default)]
pub struct NotFoundSource {
    pub fetches: AtomicUsize,
}

#[async_trait]
impl ArtifactSource for NotFoundSource {
    async fn fetch(&self, location: &ArtifactLocation) -> ZkResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Err(ZkError::ArtifactUnavailable(format!("{location}: HTTP 404 Not Found")))
    }
}

/// Artifact source serving a fixed bundle
#[derive(Debug, Clone)]
pub struct BundleSource(pub Vec<u8>);

#[async_trait]
impl ArtifactSource for BundleSource {
    async fn fetch(&self, _location: &ArtifactLocation) -> ZkResult<Vec<u8>> {
        Ok(self.0.clone())
    }
}

/// Bundle carrying both circuits
pub fn full_bundle() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "version": "test-bundle",
        "circuits": [
            {"circuit": "effort_threshold", "version": "1", "witness_capacity": 60, "payload": "01"},
            {"circuit": "composite_effort", "version": "1", "witness_capacity": 60, "payload": "02"}
        ]
    }))
    .unwrap_or_default()
}

/// Engine that reproduces the expected public signals and binds the proof
/// to the packed witness.
#[derive(Debug, Default)]
pub struct ReferenceEngine {
    pub witnesses: Mutex<Vec<usize>>,
}

impl ProvingEngine for ReferenceEngine {
    fn name(&self) -> &str {
        "reference"
    }

    fn prove(&self, artifact: &CircuitArtifact, witness: &Witness) -> ZkResult<EngineProof> {
        if let Ok(mut seen) = self.witnesses.lock() {
            seen.push(witness.series.len());
        }
        let mut hasher = blake3::Hasher::new();
        hasher.update(&artifact.payload);
        for bpm in &witness.series {
            hasher.update(&bpm.to_be_bytes());
        }
        for signal in &witness.public_inputs {
            hasher.update(signal.as_bytes());
        }
        let mut proof = vec![0u8; 128];
        hasher.finalize_xof().fill(&mut proof);
        Ok(EngineProof {
            proof,
            public_signals: witness.public_inputs.clone(),
        })
    }

    fn verify(
        &self,
        _artifact: &CircuitArtifact,
        proof: &[u8],
        public_inputs: &[String],
    ) -> ZkResult<bool> {
        Ok(proof.len() == 128 && !public_inputs.is_empty())
    }
}

/// Archive that records what it receives, or fails on demand
#[derive(Debug, Default)]
pub struct RecordingArchive {
    pub records: Mutex<Vec<(String, ArchiveRecord)>>,
    pub fail: bool,
}

#[async_trait]
impl TelemetryArchive for RecordingArchive {
    async fn store(&self, session_id: &str, record: ArchiveRecord) -> StreamResult<()> {
        if self.fail {
            return Err(StreamError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "archive offline",
            )));
        }
        if let Ok(mut records) = self.records.lock() {
            records.push((session_id.to_string(), record));
        }
        Ok(())
    }
}

/// Simulated-only session with default limits
pub fn simulated_session() -> (Arc<ProofOrchestrator>, TelemetrySession) {
    let orchestrator = Arc::new(ProofOrchestrator::simulated_only(&Config::default()));
    let session = TelemetrySession::new(Arc::clone(&orchestrator), SessionLimits::default());
    (orchestrator, session)
}

/// Orchestrator over the reference engine, initialized
pub async fn compiled_orchestrator(engine: Arc<ReferenceEngine>) -> Arc<ProofOrchestrator> {
    let orchestrator = Arc::new(ProofOrchestrator::new(
        &Config::default(),
        Some(engine as Arc<dyn ProvingEngine>),
        Some(Arc::new(BundleSource(full_bundle()))),
    ));
    orchestrator.ready().await;
    orchestrator
}
