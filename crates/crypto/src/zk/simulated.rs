//! Simulated proof backend.
//!
//! Produces deterministic BLAKE3-based "proofs" for development and as the
//! fallback when no compiled circuit is available. It provides **no
//! zero-knowledge guarantees**: anyone holding the input can recompute the
//! proof bytes. Verification is structural only.

use super::circuit::CircuitType;
use super::error::ZkResult;
use super::inputs::ProofInput;
use super::prover::{verifier_for, BackendKind, ProverBackend, ZkProof};
use async_trait::async_trait;
use effortproof_core::VerifierRegistry;

const DOMAIN_TAG: &[u8] = b"effortproof.simulated.v1";

/// Deterministic hash-based backend.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    verifiers: VerifierRegistry,
}

impl SimulatedBackend {
    pub fn new(verifiers: VerifierRegistry) -> Self {
        Self { verifiers }
    }

    /// Content hash of the input, stretched to the circuit's proof size.
    fn proof_bytes(input: &ProofInput, circuit: CircuitType) -> Vec<u8> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DOMAIN_TAG);
        hash_str(&mut hasher, circuit.tag());
        hasher.update(&input.heart_rate.to_be_bytes());
        hash_opt(&mut hasher, input.power);
        hasher.update(&input.cadence.to_be_bytes());
        hasher.update(&input.elapsed_seconds.to_be_bytes());
        hash_str(&mut hasher, &input.rider_id);
        hasher.update(&(input.heart_rate_series.len() as u64).to_be_bytes());
        for bpm in &input.heart_rate_series {
            hasher.update(&bpm.to_be_bytes());
        }
        hash_str(&mut hasher, &input.class_id);
        hasher.update(&input.threshold.to_be_bytes());
        hasher.update(&input.min_duration.to_be_bytes());
        hash_opt(&mut hasher, input.power_target);
        hash_opt(&mut hasher, input.cadence_target);

        let mut proof = vec![0u8; circuit.config().proof_size_bytes];
        hasher.finalize_xof().fill(&mut proof);
        proof
    }
}

fn hash_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

fn hash_opt(hasher: &mut blake3::Hasher, value: Option<u32>) {
    match value {
        Some(v) => {
            hasher.update(&[1]);
            hasher.update(&v.to_be_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}

#[async_trait]
impl ProverBackend for SimulatedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Simulated
    }

    async fn generate_proof(
        &self,
        input: &ProofInput,
        circuit: CircuitType,
    ) -> ZkResult<ZkProof> {
        input.validate(circuit)?;
        let public_inputs = input.public_inputs(circuit);
        let proof = Self::proof_bytes(input, circuit);
        Ok(ZkProof::new(
            proof,
            public_inputs,
            circuit,
            verifier_for(&self.verifiers, circuit),
            BackendKind::Simulated,
        ))
    }

    /// Structural check only: a non-empty proof with non-empty public inputs.
    async fn verify_proof(&self, proof: &ZkProof, public_inputs: &[String]) -> ZkResult<bool> {
        Ok(!proof.proof().is_empty() && !public_inputs.is_empty())
    }
}
