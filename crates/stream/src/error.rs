//! Error types for EffortProof session operations.
//!
//! Every failure a session can produce maps to one variant here; the
//! [`SessionReport`](crate::SessionReport) boundary flattens them into an
//! error string for UI consumers.

use effortproof_crypto::ZkError;
use effortproof_domain::DisclosureError;
use thiserror::Error;

/// Errors that can occur in session operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Proving requested over an empty buffer
    #[error("No telemetry recorded for this session")]
    NoTelemetry,

    /// Operation requires an active recording
    #[error("No session is recording")]
    NotRecording,

    /// Not enough data for a meaningful claim
    #[error("Insufficient data: {available_minutes} of {required_minutes} required minutes recorded")]
    InsufficientData {
        /// Minutes required before proving
        required_minutes: u32,
        /// Minutes recorded so far
        available_minutes: u32,
    },

    /// Proof generation or verification failed
    #[error("Proof error: {0}")]
    Proof(#[from] ZkError),

    /// Disclosure could not be built
    #[error("Disclosure error: {0}")]
    Disclosure(#[from] DisclosureError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for session operations.
pub type StreamResult<T> = Result<T, StreamError>;
