//! Core error types

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for EffortProof
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration is present but unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Environment override could not be parsed
    #[error("Invalid environment override {key}: {value}")]
    InvalidEnv {
        /// Variable name
        key: String,
        /// Raw value that failed to parse
        value: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
