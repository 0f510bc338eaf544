//! Disclosure layer for EffortProof
//!
//! Builds partially redacted views of effort proofs and checks them:
//! - Field-visibility policies with disjoint classes
//! - Selective disclosures with structural redaction
//! - Disclosure verification against the underlying proof
//! - Privacy scoring

pub mod disclosure;
pub mod error;
pub mod policy;
pub mod privacy;
pub mod verifier;

pub use disclosure::{
    DisclosureBuilder, DisclosureMetadata, EffortZone, HiddenMetrics, PublicFields,
    RevealedFields, SelectiveDisclosure, HIDDEN,
};
pub use error::{DisclosureError, DisclosureResult};
pub use policy::{DisclosureField, DisclosurePolicy};
pub use privacy::{calculate_privacy_score, get_privacy_level, PrivacyLevel};
pub use verifier::DisclosureVerifier;
