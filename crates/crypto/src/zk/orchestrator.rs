//! Proof orchestration.
//!
//! Owns both backends and routes each call. The compiled backend loads in
//! the background at construction; until it is ready, and whenever it is
//! unavailable or overridden, proofs come from the simulated backend.

use super::circuit::CircuitType;
use super::compiled::{ArtifactSource, CompiledBackend, DefaultArtifactSource, ProvingEngine};
use super::error::{ZkError, ZkResult};
use super::inputs::ProofInput;
use super::prover::{BackendKind, ProverBackend, ZkProof};
use super::simulated::SimulatedBackend;
use effortproof_core::Config;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Lifecycle of the compiled backend.
#[derive(Debug, Clone)]
enum CompiledState {
    /// Background load still running
    Pending,
    Ready(Arc<CompiledBackend>),
    /// Load failed; permanent for this process
    Unavailable(String),
}

/// Snapshot of the orchestrator's routing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Backend that would serve a single-metric proof right now
    pub kind: BackendKind,
    /// Simulated override in effect
    pub forced: bool,
    /// Compiled backend finished loading successfully
    pub initialized: bool,
    pub engine: Option<String>,
    pub circuit_version: Option<String>,
    pub unavailable_reason: Option<String>,
    /// Circuits the compiled backend can serve
    pub circuits: Vec<CircuitType>,
}

/// Routes proving and verification between the simulated and compiled backends.
pub struct ProofOrchestrator {
    simulated: SimulatedBackend,
    compiled: Arc<RwLock<CompiledState>>,
    init: Mutex<Option<JoinHandle<()>>>,
    force_simulated: AtomicBool,
    proving_deadline: Duration,
}

impl ProofOrchestrator {
    /// Create an orchestrator and start loading the compiled backend.
    ///
    /// Without an engine the orchestrator runs simulated-only. Must be called
    /// inside a tokio runtime for the background load to start; outside one
    /// the compiled backend is marked unavailable.
    pub fn new(
        config: &Config,
        engine: Option<Arc<dyn ProvingEngine>>,
        source: Option<Arc<dyn ArtifactSource>>,
    ) -> Self {
        let simulated = SimulatedBackend::new(config.verifiers.clone());
        let proving_deadline = Duration::from_millis(config.prover.proving_deadline_ms);
        let force_simulated = AtomicBool::new(config.prover.force_simulated);

        let Some(engine) = engine else {
            info!("No proving engine configured, using simulated backend");
            return Self {
                simulated,
                compiled: Arc::new(RwLock::new(CompiledState::Unavailable(
                    "no proving engine configured".to_string(),
                ))),
                init: Mutex::new(None),
                force_simulated,
                proving_deadline,
            };
        };

        let mut compiled = Arc::new(RwLock::new(CompiledState::Pending));
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let state = Arc::clone(&compiled);
                let prover = config.prover.clone();
                let verifiers = config.verifiers.clone();
                let source: Arc<dyn ArtifactSource> =
                    source.unwrap_or_else(|| Arc::new(DefaultArtifactSource));
                Some(runtime.spawn(async move {
                    let loaded =
                        CompiledBackend::load(&prover, verifiers, engine, source.as_ref()).await;
                    let next = match loaded {
                        Ok(backend) => {
                            info!(
                                engine = backend.engine_name(),
                                version = backend.circuit_version(),
                                circuits = ?backend.circuits(),
                                "Compiled backend ready"
                            );
                            CompiledState::Ready(Arc::new(backend))
                        }
                        Err(e) => {
                            warn!(error = %e, "Compiled backend unavailable, falling back to simulated");
                            CompiledState::Unavailable(e.to_string())
                        }
                    };
                    *state.write().await = next;
                }))
            }
            Err(_) => {
                warn!("No async runtime available, compiled backend disabled");
                compiled = Arc::new(RwLock::new(CompiledState::Unavailable(
                    "no async runtime at construction".to_string(),
                )));
                None
            }
        };

        Self {
            simulated,
            compiled,
            init: Mutex::new(handle),
            force_simulated,
            proving_deadline,
        }
    }

    /// Orchestrator that never attempts the compiled backend.
    pub fn simulated_only(config: &Config) -> Self {
        Self::new(config, None, None)
    }

    /// Wait for the background load to settle.
    pub async fn ready(&self) {
        let handle = self.init.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Compiled backend initialization task failed");
                let mut state = self.compiled.write().await;
                if matches!(*state, CompiledState::Pending) {
                    *state = CompiledState::Unavailable(format!("initialization task failed: {e}"));
                }
            }
        }
    }

    /// Pin (or unpin) routing to the simulated backend.
    pub fn force_simulated(&self, forced: bool) {
        self.force_simulated.store(forced, Ordering::SeqCst);
        info!(forced, "Simulated backend override changed");
    }

    pub fn is_forced(&self) -> bool {
        self.force_simulated.load(Ordering::SeqCst)
    }

    async fn compiled_for(&self, circuit: CircuitType) -> Option<Arc<CompiledBackend>> {
        if self.is_forced() {
            return None;
        }
        match &*self.compiled.read().await {
            CompiledState::Ready(backend) if backend.supports(circuit) => {
                Some(Arc::clone(backend))
            }
            _ => None,
        }
    }

    /// Prove a heart-rate threshold claim.
    pub async fn prove_effort_threshold(&self, input: &ProofInput) -> ZkResult<ZkProof> {
        self.prove(input, CircuitType::EffortThreshold).await
    }

    /// Prove a heart-rate, power and cadence claim.
    pub async fn prove_composite(&self, input: &ProofInput) -> ZkResult<ZkProof> {
        self.prove(input, CircuitType::CompositeEffort).await
    }

    /// Prove against `circuit` with whichever backend is active.
    pub async fn prove(&self, input: &ProofInput, circuit: CircuitType) -> ZkResult<ZkProof> {
        input.validate(circuit)?;
        let Some(compiled) = self.compiled_for(circuit).await else {
            info!(backend = %BackendKind::Simulated, %circuit, "Routing proof");
            return self.simulated.generate_proof(input, circuit).await;
        };
        info!(backend = %BackendKind::Compiled, %circuit, "Routing proof");

        match tokio::time::timeout(self.proving_deadline, compiled.generate_proof(input, circuit))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    %circuit,
                    deadline_ms = self.proving_deadline.as_millis() as u64,
                    "Compiled proving exceeded deadline, using simulated backend"
                );
                self.simulated.generate_proof(input, circuit).await
            }
        }
    }

    /// Verify a proof with the backend that produced it.
    pub async fn verify_proof(&self, proof: &ZkProof) -> ZkResult<bool> {
        let circuit = proof.circuit();
        if proof.public_inputs().len() != circuit.public_input_count() {
            return Ok(false);
        }
        match proof.backend() {
            BackendKind::Simulated => {
                self.simulated
                    .verify_proof(proof, proof.public_inputs())
                    .await
            }
            BackendKind::Compiled => match self.compiled.read().await.clone() {
                CompiledState::Ready(backend) => {
                    backend.verify_proof(proof, proof.public_inputs()).await
                }
                CompiledState::Pending => Err(ZkError::BackendUnavailable(
                    "compiled backend still initializing".to_string(),
                )),
                CompiledState::Unavailable(reason) => Err(ZkError::BackendUnavailable(reason)),
            },
        }
    }

    /// Current routing state.
    pub async fn backend_info(&self) -> BackendInfo {
        let forced = self.is_forced();
        let state = self.compiled.read().await.clone();
        match state {
            CompiledState::Ready(backend) => BackendInfo {
                kind: if forced || !backend.supports(CircuitType::EffortThreshold) {
                    BackendKind::Simulated
                } else {
                    BackendKind::Compiled
                },
                forced,
                initialized: true,
                engine: Some(backend.engine_name().to_string()),
                circuit_version: Some(backend.circuit_version().to_string()),
                unavailable_reason: None,
                circuits: backend.circuits(),
            },
            CompiledState::Pending => BackendInfo {
                kind: BackendKind::Simulated,
                forced,
                initialized: false,
                engine: None,
                circuit_version: None,
                unavailable_reason: None,
                circuits: Vec::new(),
            },
            CompiledState::Unavailable(reason) => BackendInfo {
                kind: BackendKind::Simulated,
                forced,
                initialized: false,
                engine: None,
                circuit_version: None,
                unavailable_reason: Some(reason),
                circuits: Vec::new(),
            },
        }
    }
}
