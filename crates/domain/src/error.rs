//! Disclosure errors

use crate::policy::DisclosureField;
use effortproof_crypto::ZkError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisclosureError {
    #[error("Disclosure requires a proof")]
    MissingProof,

    #[error("Policy overlap: {field} listed as both {first} and {second}")]
    PolicyOverlap {
        field: DisclosureField,
        first: &'static str,
        second: &'static str,
    },

    #[error("Proof error: {0}")]
    Proof(#[from] ZkError),
}

pub type DisclosureResult<T> = std::result::Result<T, DisclosureError>;
