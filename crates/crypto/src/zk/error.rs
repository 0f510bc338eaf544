//! Errors raised while proving and verifying effort claims.

use thiserror::Error;

/// Result type for proving, verification and artifact loading
pub type ZkResult<T> = std::result::Result<T, ZkError>;

/// Everything that can go wrong between a `ProofInput` and a verified proof
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZkError {
    /// Requested backend cannot serve the call
    #[error("Proof backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Compiled circuit artifact could not be fetched
    #[error("Circuit artifact unavailable: {0}")]
    ArtifactUnavailable(String),

    /// Compiled circuit artifact could not be decoded
    #[error("Circuit artifact decode error: {0}")]
    ArtifactDecode(String),

    /// Session series does not fit the witness and the policy forbids folding it
    #[error("Witness capacity exceeded: {len} samples for {capacity} slots")]
    WitnessCapacityExceeded {
        /// Samples offered
        len: usize,
        /// Slots available
        capacity: usize,
    },

    /// Engine output disagrees with the expected public inputs
    #[error("Commitment mismatch: {0}")]
    CommitmentMismatch(String),

    /// Engine or blocking task failed while proving
    #[error("Proof generation failed: {0}")]
    ProofGenerationFailed(String),

    /// Engine or blocking task failed while verifying
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Public input is not a well-formed fixed-width value
    #[error("Malformed public input: {0}")]
    MalformedPublicInput(String),

    /// Input cannot be proven against the requested circuit
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
