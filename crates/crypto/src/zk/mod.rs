//! Zero-Knowledge effort proofs.
//!
//! Proves that a rider sustained a heart rate above a threshold for a
//! minimum duration without revealing the underlying telemetry. Two
//! backends share one public-input contract; [`ProofOrchestrator`] picks
//! between them.

pub mod circuit;
pub mod compiled;
pub mod error;
pub mod inputs;
pub mod orchestrator;
pub mod prover;
pub mod simulated;

pub use circuit::{layout, CircuitConfig, CircuitType, PublicSignals};
pub use compiled::{
    pack_series, ArtifactLocation, ArtifactSource, CircuitArtifact, CircuitBundle,
    CompiledBackend, DefaultArtifactSource, EngineProof, ProvingEngine, Witness,
};
pub use error::{ZkError, ZkResult};
pub use inputs::{effort_score, ProofInput, ProofOutput, MAX_EFFORT_SCORE};
pub use orchestrator::{BackendInfo, ProofOrchestrator};
pub use prover::{verifier_for, BackendKind, ProverBackend, ZkProof};
pub use simulated::SimulatedBackend;
