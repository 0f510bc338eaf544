//! Proof generation for the EffortProof pipeline.
//!
//! This crate turns a session's effort summary into a proof that can be
//! checked by a verifier without seeing the telemetry behind it.
//!
//! # Core Capabilities
//!
//! - **Effort scoring**: one integer formula shared by every backend
//! - **Simulated backend**: deterministic BLAKE3 proofs for development and fallback
//! - **Compiled backend**: an injected proving engine over a fetched circuit bundle
//! - **Orchestration**: background initialization, routing and deadline fallback
//!
//! # Security Principles
//!
//! - Simulated proofs carry no zero-knowledge guarantee and are labelled as such
//! - Witness material is zeroized on drop and never logged
//! - Compiled proofs whose public signals disagree with the expected claim are rejected
//! - All digests use BLAKE3

pub mod zk;

pub use zk::{
    effort_score, BackendInfo, BackendKind, CircuitType, ProofInput, ProofOrchestrator,
    ProofOutput, ProverBackend, ProvingEngine, PublicSignals, SimulatedBackend, ZkError, ZkProof,
    ZkResult,
};
