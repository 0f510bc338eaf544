//! Disclosure verification.
//!
//! A disclosure is only as good as the proof behind it. Verification
//! re-checks the proof, then checks every revealed value against the
//! proof's own public inputs. Any inconsistency is treated as tampering.

use crate::disclosure::{EffortZone, SelectiveDisclosure, HIDDEN};
use crate::error::DisclosureResult;
use crate::policy::DisclosureField;
use effortproof_crypto::{ProofOrchestrator, PublicSignals, ZkProof};
use std::sync::Arc;
use tracing::warn;

/// Checks disclosures against the proofs they were derived from.
#[derive(Clone)]
pub struct DisclosureVerifier {
    orchestrator: Arc<ProofOrchestrator>,
}

impl DisclosureVerifier {
    pub fn new(orchestrator: Arc<ProofOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// `Ok(false)` on any mismatch; `Err` only when the proof cannot be read.
    pub async fn verify(
        &self,
        disclosure: &SelectiveDisclosure,
        proof: &ZkProof,
    ) -> DisclosureResult<bool> {
        if !self.orchestrator.verify_proof(proof).await? {
            warn!(circuit = %proof.circuit(), "Underlying proof failed verification");
            return Ok(false);
        }

        let signals = PublicSignals::new(proof.circuit(), proof.public_inputs())?;
        let score = signals.effort_score()?;

        let revealed_score = disclosure.revealed.effort_score;
        if disclosure.is_redacted(DisclosureField::EffortScore) {
            if revealed_score != 0 {
                warn!("Redacted effort score carries a value");
                return Ok(false);
            }
        } else if revealed_score != score {
            warn!(
                revealed = revealed_score,
                proven = score,
                "Disclosed effort score does not match proof"
            );
            return Ok(false);
        }

        if !disclosure.hidden.is_zeroed() {
            warn!("Disclosure carries raw metric values");
            return Ok(false);
        }

        let zone = disclosure.revealed.zone.as_str();
        if zone != HIDDEN && zone != EffortZone::from_score(score).label() {
            warn!(zone, "Disclosed zone does not match proof");
            return Ok(false);
        }

        if let Some(hash) = &disclosure.public.proof_hash {
            if *hash != proof.proof_hash() {
                warn!("Disclosure references a different proof");
                return Ok(false);
            }
        }

        Ok(true)
    }
}
