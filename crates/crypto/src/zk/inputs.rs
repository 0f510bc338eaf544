//! Input and output types for effort proofs.
//!
//! A [`ProofInput`] is built fresh from a session snapshot for one proving
//! call and wiped on drop. [`ProofOutput`] is the claim a proof attests to;
//! its effort score is computed here, once, for every backend.

use super::circuit::{
    encode_bool, encode_label, encode_u64, CircuitType, PublicSignals,
};
use super::error::{ZkError, ZkResult};
use super::prover::ZkProof;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Power at which the power ratio equals 1.
pub const POWER_REFERENCE_WATTS: u64 = 200;

/// Cap applied to both the heart-rate and power ratios.
pub const MAX_RATIO: u64 = 2;

/// Score awarded when both ratios equal 1.
pub const SCORE_UNIT: u64 = 250;

/// Upper bound of the effort score.
pub const MAX_EFFORT_SCORE: u32 = 1000;

/// Effort score on `[0, 1000]`.
///
/// `round(min(hr / threshold, 2) × min(power / 200, 2) × 250)`, with the power
/// ratio fixed at 1 when no power reading exists. Computed in exact integer
/// arithmetic (round half up) so every backend produces the same value.
pub fn effort_score(heart_rate: u32, power: Option<u32>, threshold: u32) -> u32 {
    if threshold == 0 {
        // Every reading saturates the heart-rate ratio.
        return effort_score(MAX_RATIO as u32, power, 1);
    }
    let threshold = u64::from(threshold);
    let hr = u64::from(heart_rate).min(MAX_RATIO * threshold);

    let (numerator, denominator) = match power {
        Some(watts) => {
            let watts = u64::from(watts).min(MAX_RATIO * POWER_REFERENCE_WATTS);
            (hr * watts * SCORE_UNIT, threshold * POWER_REFERENCE_WATTS)
        }
        None => (hr * SCORE_UNIT, threshold),
    };
    let rounded = (2 * numerator + denominator) / (2 * denominator);
    rounded.min(u64::from(MAX_EFFORT_SCORE)) as u32
}

/// Witness material for one proving call.
///
/// Private fields never appear in public inputs; they are zeroized when the
/// input is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
pub struct ProofInput {
    /// Peak heart rate in bpm (private)
    pub heart_rate: u32,
    /// Average power in watts, `None` when no power meter reported (private)
    pub power: Option<u32>,
    /// Average cadence in rpm (private)
    pub cadence: u32,
    /// Seconds spent above the threshold so far (private)
    pub elapsed_seconds: u32,
    /// Rider identifier (private witness; only its digest is public)
    pub rider_id: String,
    /// Heart-rate time series packed into the compiled witness (private)
    #[serde(default)]
    pub heart_rate_series: Vec<u32>,
    /// Class identifier (public)
    pub class_id: String,
    /// Heart-rate threshold in bpm (public)
    pub threshold: u32,
    /// Minimum minutes above threshold (public)
    pub min_duration: u32,
    /// Composite only: average power target (public)
    #[serde(default)]
    pub power_target: Option<u32>,
    /// Composite only: average cadence target (public)
    #[serde(default)]
    pub cadence_target: Option<u32>,
}

impl ProofInput {
    /// Start an input bound to one threshold/duration pair.
    pub fn new(class_id: impl Into<String>, threshold: u32, min_duration: u32) -> Self {
        Self {
            heart_rate: 0,
            power: None,
            cadence: 0,
            elapsed_seconds: 0,
            rider_id: String::new(),
            heart_rate_series: Vec::new(),
            class_id: class_id.into(),
            threshold,
            min_duration,
            power_target: None,
            cadence_target: None,
        }
    }

    pub fn with_rider(mut self, rider_id: impl Into<String>) -> Self {
        self.rider_id = rider_id.into();
        self
    }

    pub fn with_heart_rate(mut self, bpm: u32) -> Self {
        self.heart_rate = bpm;
        self
    }

    pub fn with_power(mut self, watts: Option<u32>) -> Self {
        self.power = watts;
        self
    }

    pub fn with_cadence(mut self, rpm: u32) -> Self {
        self.cadence = rpm;
        self
    }

    pub fn with_elapsed_seconds(mut self, seconds: u32) -> Self {
        self.elapsed_seconds = seconds;
        self
    }

    pub fn with_series(mut self, series: Vec<u32>) -> Self {
        self.heart_rate_series = series;
        self
    }

    pub fn with_composite_targets(mut self, power_target: u32, cadence_target: u32) -> Self {
        self.power_target = Some(power_target);
        self.cadence_target = Some(cadence_target);
        self
    }

    /// Check the input can be proven against `circuit`.
    pub fn validate(&self, circuit: CircuitType) -> ZkResult<()> {
        if self.threshold == 0 {
            return Err(ZkError::InvalidInput(
                "threshold must be positive".to_string(),
            ));
        }
        if self.class_id.is_empty() {
            return Err(ZkError::InvalidInput("class_id is empty".to_string()));
        }
        if circuit == CircuitType::CompositeEffort
            && (self.power_target.is_none() || self.cadence_target.is_none())
        {
            return Err(ZkError::InvalidInput(
                "composite circuit requires power and cadence targets".to_string(),
            ));
        }
        Ok(())
    }

    /// Public inputs in the circuit's positional order.
    ///
    /// Call [`ProofInput::validate`] first; composite targets default to 0.
    pub fn public_inputs(&self, circuit: CircuitType) -> Vec<String> {
        let output = ProofOutput::evaluate(self);
        let mut inputs = vec![
            encode_u64(u64::from(self.threshold)),
            encode_u64(u64::from(self.min_duration)),
            encode_bool(output.threshold_met),
            encode_u64(u64::from(output.seconds_above)),
            encode_u64(u64::from(output.effort_score)),
            encode_label(&self.class_id),
            encode_label(&self.rider_id),
        ];
        if circuit == CircuitType::CompositeEffort {
            inputs.push(encode_u64(u64::from(self.power_target.unwrap_or(0))));
            inputs.push(encode_bool(output.power_met.unwrap_or(false)));
            inputs.push(encode_u64(u64::from(self.cadence_target.unwrap_or(0))));
            inputs.push(encode_bool(output.cadence_met.unwrap_or(false)));
        }
        inputs
    }
}

impl fmt::Debug for ProofInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProofInput")
            .field("class_id", &self.class_id)
            .field("threshold", &self.threshold)
            .field("min_duration", &self.min_duration)
            .field("power_target", &self.power_target)
            .field("cadence_target", &self.cadence_target)
            .finish_non_exhaustive()
    }
}

/// The claim a proof attests to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOutput {
    /// Peak heart rate exceeded the threshold
    pub threshold_met: bool,
    /// Some time was spent above the threshold
    pub zone_entered: bool,
    /// Time above threshold reached the minimum duration
    pub duration_satisfied: bool,
    /// Effort score on `[0, 1000]`
    pub effort_score: u32,
    /// Seconds spent above the threshold
    pub seconds_above: u32,
    /// Composite only: average power reached the target
    pub power_met: Option<bool>,
    /// Composite only: average cadence reached the target
    pub cadence_met: Option<bool>,
    /// Hex BLAKE3 of the proof bytes, once bound to a proof
    pub proof_hash: Option<String>,
}

impl ProofOutput {
    /// Evaluate the claim directly from the witness.
    pub fn evaluate(input: &ProofInput) -> Self {
        let required_seconds = u64::from(input.min_duration) * 60;
        Self {
            threshold_met: input.heart_rate > input.threshold,
            zone_entered: input.elapsed_seconds > 0,
            duration_satisfied: u64::from(input.elapsed_seconds) >= required_seconds,
            effort_score: effort_score(input.heart_rate, input.power, input.threshold),
            seconds_above: input.elapsed_seconds,
            power_met: input
                .power_target
                .map(|target| input.power.map(|w| w >= target).unwrap_or(false)),
            cadence_met: input.cadence_target.map(|target| input.cadence >= target),
            proof_hash: None,
        }
    }

    /// Re-derive the claim from a proof's public inputs.
    pub fn from_proof(proof: &ZkProof) -> ZkResult<Self> {
        let signals = PublicSignals::new(proof.circuit(), proof.public_inputs())?;
        let seconds_above = signals.seconds_above()?;
        let required_seconds = u64::from(signals.min_duration()?) * 60;
        Ok(Self {
            threshold_met: signals.threshold_met()?,
            zone_entered: seconds_above > 0,
            duration_satisfied: u64::from(seconds_above) >= required_seconds,
            effort_score: signals.effort_score()?,
            seconds_above,
            power_met: signals.power()?.map(|(_, met)| met),
            cadence_met: signals.cadence()?.map(|(_, met)| met),
            proof_hash: Some(proof.proof_hash()),
        })
    }
}
