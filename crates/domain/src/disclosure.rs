//! Selective disclosures derived from effort proofs.
//!
//! A disclosure is a partially redacted view of what a proof attests to.
//! Redaction is structural: a field the policy does not permit is still
//! present, zeroed or set to [`HIDDEN`], and listed in `redacted`. Raw
//! metrics (peak heart rate, average power, sample count) have no
//! constructor that accepts real values.

use crate::error::{DisclosureError, DisclosureResult};
use crate::policy::{DisclosureField, DisclosurePolicy};
use effortproof_crypto::{PublicSignals, ZkProof};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for a redacted label.
pub const HIDDEN: &str = "Hidden";

/// Effort band derived from the effort score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffortZone {
    Recovery,
    Endurance,
    Tempo,
    Threshold,
    Anaerobic,
}

impl EffortZone {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=199 => EffortZone::Recovery,
            200..=399 => EffortZone::Endurance,
            400..=599 => EffortZone::Tempo,
            600..=799 => EffortZone::Threshold,
            _ => EffortZone::Anaerobic,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EffortZone::Recovery => "Recovery",
            EffortZone::Endurance => "Endurance",
            EffortZone::Tempo => "Tempo",
            EffortZone::Threshold => "Threshold",
            EffortZone::Anaerobic => "Anaerobic",
        }
    }
}

impl fmt::Display for EffortZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields the policy may reveal. Redacted values are `0` / [`HIDDEN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedFields {
    pub effort_score: u32,
    pub zone: String,
    pub duration_minutes: u32,
}

impl RevealedFields {
    /// Number of fields carrying a non-trivial value.
    pub fn revealed_count(&self) -> u32 {
        u32::from(self.effort_score != 0)
            + u32::from(self.zone != HIDDEN && !self.zone.is_empty())
            + u32::from(self.duration_minutes != 0)
    }
}

/// Placeholders for raw metrics that never leave the device.
///
/// Builders only ever emit zeros. A deserialized disclosure may carry other
/// values; [`calculate_privacy_score`](crate::calculate_privacy_score) counts
/// them as leaks and [`DisclosureVerifier`](crate::DisclosureVerifier)
/// rejects them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiddenMetrics {
    max_heart_rate: u32,
    avg_power: u32,
    raw_data_points: u32,
}

impl HiddenMetrics {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn max_heart_rate(&self) -> u32 {
        self.max_heart_rate
    }

    pub fn avg_power(&self) -> u32 {
        self.avg_power
    }

    pub fn raw_data_points(&self) -> u32 {
        self.raw_data_points
    }

    pub fn is_zeroed(&self) -> bool {
        *self == Self::zeroed()
    }

    /// Number of placeholders still at zero.
    pub fn zero_count(&self) -> u32 {
        u32::from(self.max_heart_rate == 0)
            + u32::from(self.avg_power == 0)
            + u32::from(self.raw_data_points == 0)
    }
}

/// Always-exposed identifiers, present only when the policy lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicFields {
    pub class_id: Option<String>,
    pub rider_id: Option<String>,
    pub timestamp_ms: Option<u64>,
    pub proof_hash: Option<String>,
}

/// Partially redacted view of a proof's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectiveDisclosure {
    pub statement: String,
    pub revealed: RevealedFields,
    pub hidden: HiddenMetrics,
    pub public: PublicFields,
    /// Fields withheld by policy
    pub redacted: Vec<DisclosureField>,
}

impl SelectiveDisclosure {
    pub fn is_redacted(&self, field: DisclosureField) -> bool {
        self.redacted.contains(&field)
    }
}

/// Session context attached to a disclosure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosureMetadata {
    pub class_id: String,
    pub rider_id: String,
    pub timestamp_ms: u64,
    /// Session length; defaults to the proof's time above threshold
    pub duration_minutes: Option<u32>,
}

/// Fluent accumulator producing a [`SelectiveDisclosure`].
#[derive(Debug, Clone, Default)]
pub struct DisclosureBuilder {
    policy: DisclosurePolicy,
    proof: Option<ZkProof>,
    statement: Option<String>,
    metadata: Option<DisclosureMetadata>,
}

impl DisclosureBuilder {
    pub fn new(policy: DisclosurePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_proof(mut self, proof: ZkProof) -> Self {
        self.proof = Some(proof);
        self
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = Some(statement.into());
        self
    }

    pub fn with_metadata(mut self, metadata: DisclosureMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Produce the disclosure. Fails without a proof.
    pub fn build(self) -> DisclosureResult<SelectiveDisclosure> {
        let proof = self.proof.ok_or(DisclosureError::MissingProof)?;
        let signals = PublicSignals::new(proof.circuit(), proof.public_inputs())?;
        let effort_score = signals.effort_score()?;
        let threshold_met = signals.threshold_met()?;
        let threshold = signals.threshold()?;
        let min_duration = signals.min_duration()?;
        let seconds_above = signals.seconds_above()?;

        let policy = &self.policy;
        let metadata = self.metadata.unwrap_or_default();
        let mut redacted = Vec::new();

        let mut reveal = |field: DisclosureField| {
            let allowed = policy.is_revealable(field);
            if !allowed {
                redacted.push(field);
            }
            allowed
        };
        let revealed = RevealedFields {
            effort_score: if reveal(DisclosureField::EffortScore) {
                effort_score
            } else {
                0
            },
            zone: if reveal(DisclosureField::Zone) {
                EffortZone::from_score(effort_score).label().to_string()
            } else {
                HIDDEN.to_string()
            },
            duration_minutes: if reveal(DisclosureField::Duration) {
                metadata.duration_minutes.unwrap_or(seconds_above / 60)
            } else {
                0
            },
        };

        let mut expose = |field: DisclosureField| {
            let allowed = policy.is_public(field);
            if !allowed {
                redacted.push(field);
            }
            allowed
        };
        let public = PublicFields {
            class_id: expose(DisclosureField::ClassId).then(|| metadata.class_id.clone()),
            rider_id: expose(DisclosureField::RiderId).then(|| metadata.rider_id.clone()),
            timestamp_ms: expose(DisclosureField::Timestamp).then_some(metadata.timestamp_ms),
            proof_hash: expose(DisclosureField::ProofHash).then(|| proof.proof_hash()),
        };

        let statement = self.statement.unwrap_or_else(|| {
            default_statement(threshold, min_duration, threshold_met, seconds_above)
        });

        Ok(SelectiveDisclosure {
            statement,
            revealed,
            hidden: HiddenMetrics::zeroed(),
            public,
            redacted,
        })
    }
}

fn default_statement(threshold: u32, min_duration: u32, met: bool, seconds_above: u32) -> String {
    if !met {
        format!("Heart rate did not exceed {threshold} bpm")
    } else if u64::from(seconds_above) >= u64::from(min_duration) * 60 {
        format!("Heart rate exceeded {threshold} bpm for at least {min_duration} minutes")
    } else {
        format!("Heart rate exceeded {threshold} bpm")
    }
}
