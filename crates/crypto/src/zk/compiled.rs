//! Compiled-circuit proof backend.
//!
//! Wraps an external [`ProvingEngine`] that executes a compiled circuit over
//! a fixed-size witness. The circuit bundle is fetched once through an
//! [`ArtifactSource`]; a bundle that cannot be fetched or decoded leaves the
//! backend unavailable for the life of the process.
//!
//! # Fail-Visible Pattern
//! The engine's public signals must equal the public inputs the pipeline
//! expects for the same witness. Any disagreement is a
//! [`ZkError::CommitmentMismatch`], never a silently accepted proof.

use super::circuit::CircuitType;
use super::error::{ZkError, ZkResult};
use super::inputs::ProofInput;
use super::prover::{verifier_for, BackendKind, ProverBackend, ZkProof};
use async_trait::async_trait;
use effortproof_core::{ProverConfig, VerifierRegistry, WitnessOverflow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Where the compiled circuit bundle lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// Local file
    File(PathBuf),
    /// `http://` or `https://` URL
    Http(String),
}

impl ArtifactLocation {
    /// Classify a configured artifact path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            ArtifactLocation::Http(raw.to_string())
        } else {
            ArtifactLocation::File(PathBuf::from(raw))
        }
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactLocation::File(path) => write!(f, "{}", path.display()),
            ArtifactLocation::Http(url) => f.write_str(url),
        }
    }
}

/// Fetches raw artifact bytes (dependency injection seam).
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn fetch(&self, location: &ArtifactLocation) -> ZkResult<Vec<u8>>;
}

/// Reads files from disk and, with the `http-artifacts` feature, fetches URLs.
#[derive(Debug, Clone, Default)]
pub struct DefaultArtifactSource;

#[async_trait]
impl ArtifactSource for DefaultArtifactSource {
    async fn fetch(&self, location: &ArtifactLocation) -> ZkResult<Vec<u8>> {
        match location {
            ArtifactLocation::File(path) => tokio::fs::read(path).await.map_err(|e| {
                ZkError::ArtifactUnavailable(format!("{}: {}", path.display(), e))
            }),
            ArtifactLocation::Http(url) => fetch_http(url).await,
        }
    }
}

#[cfg(feature = "http-artifacts")]
async fn fetch_http(url: &str) -> ZkResult<Vec<u8>> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| ZkError::ArtifactUnavailable(format!("{url}: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ZkError::ArtifactUnavailable(format!("{url}: HTTP {status}")));
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| ZkError::ArtifactUnavailable(format!("{url}: {e}")))?;
    Ok(body.to_vec())
}

#[cfg(not(feature = "http-artifacts"))]
async fn fetch_http(url: &str) -> ZkResult<Vec<u8>> {
    Err(ZkError::ArtifactUnavailable(format!(
        "{url}: built without http-artifacts support"
    )))
}

/// Compiled circuit bundle as shipped on disk or over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBundle {
    /// Bundle release identifier
    pub version: String,
    /// One entry per supported circuit
    pub circuits: Vec<CircuitArtifact>,
}

impl CircuitBundle {
    /// Decode and sanity-check a JSON bundle.
    pub fn decode(bytes: &[u8]) -> ZkResult<Self> {
        let bundle: CircuitBundle =
            serde_json::from_slice(bytes).map_err(|e| ZkError::ArtifactDecode(e.to_string()))?;
        if bundle.circuits.is_empty() {
            return Err(ZkError::ArtifactDecode(
                "bundle contains no circuits".to_string(),
            ));
        }
        for artifact in &bundle.circuits {
            if artifact.payload.is_empty() {
                return Err(ZkError::ArtifactDecode(format!(
                    "{} has an empty payload",
                    artifact.circuit
                )));
            }
        }
        Ok(bundle)
    }
}

/// One compiled circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitArtifact {
    pub circuit: CircuitType,
    pub version: String,
    /// Time-series slots; 0 defers to the configured capacity
    #[serde(default)]
    pub witness_capacity: usize,
    #[serde(default)]
    pub constraints: u64,
    /// Engine-specific circuit encoding
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
}

/// Fixed-size witness handed to the engine. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Witness {
    /// Heart-rate series packed to exactly the circuit's capacity
    pub series: Vec<u32>,
    pub heart_rate: u32,
    /// Average power, 0 when absent (see `has_power`)
    pub power: u32,
    pub has_power: bool,
    pub cadence: u32,
    pub elapsed_seconds: u32,
    pub rider_id: String,
    /// Public inputs the engine must reproduce
    pub public_inputs: Vec<String>,
}

impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("slots", &self.series.len())
            .field("public_inputs", &self.public_inputs.len())
            .finish_non_exhaustive()
    }
}

/// Engine output for one proving call.
#[derive(Debug, Clone)]
pub struct EngineProof {
    pub proof: Vec<u8>,
    /// Public signals as computed by the circuit
    pub public_signals: Vec<String>,
}

/// External proving engine (dependency injection).
///
/// Calls are synchronous and CPU-bound; the backend runs them on the
/// blocking pool.
pub trait ProvingEngine: Send + Sync {
    /// Engine identifier reported in backend info.
    fn name(&self) -> &str;

    fn prove(&self, artifact: &CircuitArtifact, witness: &Witness) -> ZkResult<EngineProof>;

    fn verify(
        &self,
        artifact: &CircuitArtifact,
        proof: &[u8],
        public_inputs: &[String],
    ) -> ZkResult<bool>;
}

/// Fit a series into exactly `capacity` slots.
///
/// Shorter series are zero-padded. Longer series follow `policy`:
/// truncation keeps the earliest samples, downsampling keeps each bucket's
/// peak so threshold crossings survive, rejection fails.
pub fn pack_series(series: &[u32], capacity: usize, policy: WitnessOverflow) -> ZkResult<Vec<u32>> {
    if capacity == 0 {
        return Err(ZkError::InvalidInput(
            "witness capacity must be positive".to_string(),
        ));
    }
    let mut packed = if series.len() <= capacity {
        series.to_vec()
    } else {
        match policy {
            WitnessOverflow::Reject => {
                return Err(ZkError::WitnessCapacityExceeded {
                    len: series.len(),
                    capacity,
                })
            }
            WitnessOverflow::Truncate => {
                warn!(
                    len = series.len(),
                    capacity, "Truncating heart-rate series to witness capacity"
                );
                series[..capacity].to_vec()
            }
            WitnessOverflow::Downsample => (0..capacity)
                .map(|slot| {
                    let start = slot * series.len() / capacity;
                    let end = (slot + 1) * series.len() / capacity;
                    series[start..end].iter().copied().max().unwrap_or(0)
                })
                .collect(),
        }
    };
    packed.resize(capacity, 0);
    Ok(packed)
}

/// Backend over a compiled circuit bundle and an external engine.
pub struct CompiledBackend {
    engine: Arc<dyn ProvingEngine>,
    artifacts: BTreeMap<CircuitType, Arc<CircuitArtifact>>,
    bundle_version: String,
    verifiers: VerifierRegistry,
    witness_capacity: usize,
    overflow: WitnessOverflow,
}

impl fmt::Debug for CompiledBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledBackend")
            .field("engine", &self.engine.name())
            .field("bundle_version", &self.bundle_version)
            .field("circuits", &self.circuits())
            .finish()
    }
}

impl CompiledBackend {
    /// Fetch and decode the configured bundle.
    pub async fn load(
        config: &ProverConfig,
        verifiers: VerifierRegistry,
        engine: Arc<dyn ProvingEngine>,
        source: &dyn ArtifactSource,
    ) -> ZkResult<Self> {
        let location = ArtifactLocation::parse(&config.artifact_path);
        info!(artifact = %location, engine = engine.name(), "Loading compiled circuit bundle");
        let bytes = source.fetch(&location).await?;
        let bundle = CircuitBundle::decode(&bytes)?;
        Ok(Self::from_bundle(bundle, config, verifiers, engine))
    }

    /// Build from an already decoded bundle.
    pub fn from_bundle(
        bundle: CircuitBundle,
        config: &ProverConfig,
        verifiers: VerifierRegistry,
        engine: Arc<dyn ProvingEngine>,
    ) -> Self {
        let artifacts = bundle
            .circuits
            .into_iter()
            .map(|artifact| (artifact.circuit, Arc::new(artifact)))
            .collect();
        Self {
            engine,
            artifacts,
            bundle_version: bundle.version,
            verifiers,
            witness_capacity: config.witness_capacity,
            overflow: config.witness_overflow,
        }
    }

    pub fn supports(&self, circuit: CircuitType) -> bool {
        self.artifacts.contains_key(&circuit)
    }

    pub fn circuits(&self) -> Vec<CircuitType> {
        self.artifacts.keys().copied().collect()
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn circuit_version(&self) -> &str {
        &self.bundle_version
    }

    fn artifact(&self, circuit: CircuitType) -> ZkResult<Arc<CircuitArtifact>> {
        self.artifacts.get(&circuit).cloned().ok_or_else(|| {
            ZkError::BackendUnavailable(format!("no compiled artifact for {circuit}"))
        })
    }

    /// Build the witness for one proving call.
    pub fn build_witness(
        &self,
        artifact: &CircuitArtifact,
        input: &ProofInput,
        circuit: CircuitType,
    ) -> ZkResult<Witness> {
        let capacity = if artifact.witness_capacity > 0 {
            artifact.witness_capacity
        } else {
            self.witness_capacity
        };
        Ok(Witness {
            series: pack_series(&input.heart_rate_series, capacity, self.overflow)?,
            heart_rate: input.heart_rate,
            power: input.power.unwrap_or(0),
            has_power: input.power.is_some(),
            cadence: input.cadence,
            elapsed_seconds: input.elapsed_seconds,
            rider_id: input.rider_id.clone(),
            public_inputs: input.public_inputs(circuit),
        })
    }
}

#[async_trait]
impl ProverBackend for CompiledBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Compiled
    }

    async fn generate_proof(
        &self,
        input: &ProofInput,
        circuit: CircuitType,
    ) -> ZkResult<ZkProof> {
        input.validate(circuit)?;
        let artifact = self.artifact(circuit)?;
        let witness = self.build_witness(&artifact, input, circuit)?;
        let expected = witness.public_inputs.clone();

        let engine = Arc::clone(&self.engine);
        let started = Instant::now();
        let output = tokio::task::spawn_blocking(move || engine.prove(&artifact, &witness))
            .await
            .map_err(|e| ZkError::ProofGenerationFailed(format!("proving task failed: {e}")))??;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if output.public_signals != expected {
            warn!(%circuit, "Engine public signals disagree with expected public inputs");
            return Err(ZkError::CommitmentMismatch(format!(
                "{circuit}: engine produced {} signals that do not match the {} expected",
                output.public_signals.len(),
                expected.len()
            )));
        }
        if output.proof.is_empty() {
            return Err(ZkError::ProofGenerationFailed(
                "engine returned an empty proof".to_string(),
            ));
        }

        info!(%circuit, elapsed_ms, engine = self.engine.name(), "Compiled proof generated");
        Ok(ZkProof::new(
            output.proof,
            expected,
            circuit,
            verifier_for(&self.verifiers, circuit),
            BackendKind::Compiled,
        ))
    }

    async fn verify_proof(&self, proof: &ZkProof, public_inputs: &[String]) -> ZkResult<bool> {
        let artifact = self.artifact(proof.circuit())?;
        let engine = Arc::clone(&self.engine);
        let bytes = proof.proof().to_vec();
        let inputs = public_inputs.to_vec();
        let started = Instant::now();
        let valid = tokio::task::spawn_blocking(move || engine.verify(&artifact, &bytes, &inputs))
            .await
            .map_err(|e| ZkError::VerificationFailed(format!("verification task failed: {e}")))??;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(circuit = %proof.circuit(), elapsed_ms, valid, "Compiled proof verified");
        Ok(valid)
    }
}
