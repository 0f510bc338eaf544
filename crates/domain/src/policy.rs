//! Field-visibility policy for disclosures.
//!
//! Every field belongs to at most one of three classes: private (never
//! leaves the device), revealable (exposed when the policy allows) and
//! public (always exposed). Overlapping classes are rejected at
//! construction, including when a policy is deserialized.

use crate::error::{DisclosureError, DisclosureResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Fields a disclosure can talk about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DisclosureField {
    HeartRate,
    Power,
    Cadence,
    Gps,
    Biometrics,
    EffortScore,
    Zone,
    Duration,
    ClassId,
    RiderId,
    Timestamp,
    ProofHash,
}

impl fmt::Display for DisclosureField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisclosureField::HeartRate => "heartRate",
            DisclosureField::Power => "power",
            DisclosureField::Cadence => "cadence",
            DisclosureField::Gps => "gps",
            DisclosureField::Biometrics => "biometrics",
            DisclosureField::EffortScore => "effortScore",
            DisclosureField::Zone => "zone",
            DisclosureField::Duration => "duration",
            DisclosureField::ClassId => "classId",
            DisclosureField::RiderId => "riderId",
            DisclosureField::Timestamp => "timestamp",
            DisclosureField::ProofHash => "proofHash",
        };
        f.write_str(name)
    }
}

/// Serialized shape of a policy, validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyClasses {
    #[serde(default)]
    private_fields: BTreeSet<DisclosureField>,
    #[serde(default)]
    revealable_fields: BTreeSet<DisclosureField>,
    #[serde(default)]
    public_fields: BTreeSet<DisclosureField>,
}

/// Three disjoint field classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyClasses", into = "PolicyClasses")]
pub struct DisclosurePolicy {
    private_fields: BTreeSet<DisclosureField>,
    revealable_fields: BTreeSet<DisclosureField>,
    public_fields: BTreeSet<DisclosureField>,
}

impl DisclosurePolicy {
    /// Build a policy, rejecting any field listed in two classes.
    pub fn new<P, R, U>(private: P, revealable: R, public: U) -> DisclosureResult<Self>
    where
        P: IntoIterator<Item = DisclosureField>,
        R: IntoIterator<Item = DisclosureField>,
        U: IntoIterator<Item = DisclosureField>,
    {
        let private_fields: BTreeSet<_> = private.into_iter().collect();
        let revealable_fields: BTreeSet<_> = revealable.into_iter().collect();
        let public_fields: BTreeSet<_> = public.into_iter().collect();

        let pairs = [
            (&private_fields, "private", &revealable_fields, "revealable"),
            (&private_fields, "private", &public_fields, "public"),
            (&revealable_fields, "revealable", &public_fields, "public"),
        ];
        for (a, first, b, second) in pairs {
            if let Some(field) = a.intersection(b).next() {
                return Err(DisclosureError::PolicyOverlap {
                    field: *field,
                    first,
                    second,
                });
            }
        }

        Ok(Self {
            private_fields,
            revealable_fields,
            public_fields,
        })
    }

    /// Reveals nothing beyond the public fields.
    pub fn minimal() -> Self {
        Self {
            revealable_fields: BTreeSet::new(),
            ..Self::default()
        }
    }

    pub fn is_private(&self, field: DisclosureField) -> bool {
        self.private_fields.contains(&field)
    }

    pub fn is_revealable(&self, field: DisclosureField) -> bool {
        self.revealable_fields.contains(&field)
    }

    pub fn is_public(&self, field: DisclosureField) -> bool {
        self.public_fields.contains(&field)
    }

    pub fn private_fields(&self) -> &BTreeSet<DisclosureField> {
        &self.private_fields
    }

    pub fn revealable_fields(&self) -> &BTreeSet<DisclosureField> {
        &self.revealable_fields
    }

    pub fn public_fields(&self) -> &BTreeSet<DisclosureField> {
        &self.public_fields
    }
}

impl Default for DisclosurePolicy {
    fn default() -> Self {
        use DisclosureField::*;
        Self {
            private_fields: [HeartRate, Power, Cadence, Gps, Biometrics]
                .into_iter()
                .collect(),
            revealable_fields: [EffortScore, Zone, Duration].into_iter().collect(),
            public_fields: [ClassId, RiderId, Timestamp, ProofHash].into_iter().collect(),
        }
    }
}

impl TryFrom<PolicyClasses> for DisclosurePolicy {
    type Error = DisclosureError;

    fn try_from(classes: PolicyClasses) -> DisclosureResult<Self> {
        Self::new(
            classes.private_fields,
            classes.revealable_fields,
            classes.public_fields,
        )
    }
}

impl From<DisclosurePolicy> for PolicyClasses {
    fn from(policy: DisclosurePolicy) -> Self {
        Self {
            private_fields: policy.private_fields,
            revealable_fields: policy.revealable_fields,
            public_fields: policy.public_fields,
        }
    }
}
