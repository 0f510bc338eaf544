//! Proof artifact and the backend contract.
//!
//! Both backends implement [`ProverBackend`]; the orchestrator picks one per
//! call. A [`ZkProof`] is immutable once produced and is the unit handed to
//! the disclosure layer and to settlement.

use super::circuit::CircuitType;
use super::error::ZkResult;
use super::inputs::ProofInput;
use async_trait::async_trait;
use effortproof_core::VerifierRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend produced a proof, or is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Deterministic hash-based emulation
    Simulated,
    /// External proving engine over a compiled circuit
    Compiled,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Simulated => f.write_str("simulated"),
            BackendKind::Compiled => f.write_str("compiled"),
        }
    }
}

/// Zero-Knowledge proof handed to disclosure and settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkProof {
    /// Opaque proof bytes
    #[serde(with = "hex::serde")]
    proof: Vec<u8>,
    /// Fixed-width hex public inputs in the circuit's positional order
    public_inputs: Vec<String>,
    /// Circuit the proof was generated against
    circuit: CircuitType,
    /// On-chain verifier identifier for this circuit
    verifier: String,
    /// Backend that produced the proof
    backend: BackendKind,
}

impl ZkProof {
    pub(crate) fn new(
        proof: Vec<u8>,
        public_inputs: Vec<String>,
        circuit: CircuitType,
        verifier: String,
        backend: BackendKind,
    ) -> Self {
        Self {
            proof,
            public_inputs,
            circuit,
            verifier,
            backend,
        }
    }

    pub fn proof(&self) -> &[u8] {
        &self.proof
    }

    pub fn public_inputs(&self) -> &[String] {
        &self.public_inputs
    }

    pub fn circuit(&self) -> CircuitType {
        self.circuit
    }

    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Hex BLAKE3 digest of the proof bytes.
    pub fn proof_hash(&self) -> String {
        blake3::hash(&self.proof).to_hex().to_string()
    }

    /// Settlement payload: `(proof bytes, public inputs)`.
    pub fn settlement_payload(&self) -> (&[u8], &[String]) {
        (&self.proof, &self.public_inputs)
    }
}

/// Verifier identifier stamped on proofs of `circuit`, whichever backend
/// produced them.
pub fn verifier_for(registry: &VerifierRegistry, circuit: CircuitType) -> String {
    match circuit {
        CircuitType::EffortThreshold => registry.effort_threshold.clone(),
        CircuitType::CompositeEffort => registry.composite_effort.clone(),
    }
}

/// Contract shared by the simulated and compiled backends.
#[async_trait]
pub trait ProverBackend: Send + Sync {
    /// Backend identity.
    fn kind(&self) -> BackendKind;

    /// Generate a proof of `input` against `circuit`.
    async fn generate_proof(&self, input: &ProofInput, circuit: CircuitType)
        -> ZkResult<ZkProof>;

    /// Verify `proof` against the given public inputs.
    async fn verify_proof(&self, proof: &ZkProof, public_inputs: &[String]) -> ZkResult<bool>;
}
