//! Privacy scoring.
//!
//! An explainable measure of how much a disclosure gives away. This is a
//! policy-compliance metric, not a cryptographic guarantee.

use crate::disclosure::SelectiveDisclosure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points per hidden metric left at zero.
pub const HIDDEN_METRIC_POINTS: u32 = 25;
/// Points available before revealed fields are deducted.
pub const REVEAL_BUDGET: u32 = 25;
/// Deduction per revealed field.
pub const REVEAL_PENALTY: u32 = 5;
pub const MAX_PRIVACY_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivacyLevel::Low => f.write_str("low"),
            PrivacyLevel::Medium => f.write_str("medium"),
            PrivacyLevel::High => f.write_str("high"),
        }
    }
}

/// Score on `[0, 100]`: 25 per zeroed hidden metric plus
/// `max(0, 25 - 5 × revealed)`.
pub fn calculate_privacy_score(disclosure: &SelectiveDisclosure) -> u32 {
    let hidden = disclosure.hidden.zero_count() * HIDDEN_METRIC_POINTS;
    let revealed = REVEAL_BUDGET
        .saturating_sub(REVEAL_PENALTY * disclosure.revealed.revealed_count());
    (hidden + revealed).min(MAX_PRIVACY_SCORE)
}

pub fn get_privacy_level(score: u32) -> PrivacyLevel {
    match score {
        80.. => PrivacyLevel::High,
        50..=79 => PrivacyLevel::Medium,
        _ => PrivacyLevel::Low,
    }
}
