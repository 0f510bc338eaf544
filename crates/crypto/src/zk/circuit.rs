//! Circuit identifiers, per-circuit cost figures and the public-input layout.
//!
//! The public-input vector is the binary contract with the on-chain
//! verifier: values are matched by position, never by name. Every value is
//! a 32-byte big-endian word hex-encoded as `0x` followed by 64 digits.

use super::error::{ZkError, ZkResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Positions of the public inputs.
///
/// Entries `0..=6` are shared by every circuit; the composite circuit
/// appends `7..=10`.
pub mod layout {
    pub const THRESHOLD: usize = 0;
    pub const MIN_DURATION: usize = 1;
    pub const THRESHOLD_MET: usize = 2;
    pub const SECONDS_ABOVE: usize = 3;
    pub const EFFORT_SCORE: usize = 4;
    pub const CLASS_ID: usize = 5;
    pub const RIDER_ID: usize = 6;
    pub const POWER_TARGET: usize = 7;
    pub const POWER_MET: usize = 8;
    pub const CADENCE_TARGET: usize = 9;
    pub const CADENCE_MET: usize = 10;
}

/// Width of one encoded public input in bytes.
pub const SIGNAL_BYTES: usize = 32;

/// Proof circuits known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitType {
    /// Heart rate above a threshold for a minimum duration
    EffortThreshold,
    /// Effort threshold plus power and cadence targets
    CompositeEffort,
}

impl CircuitType {
    /// Stable tag used in hashing and artifact lookup.
    pub fn tag(&self) -> &'static str {
        match self {
            CircuitType::EffortThreshold => "effort_threshold",
            CircuitType::CompositeEffort => "composite_effort",
        }
    }

    /// Number of public inputs the verifier expects.
    pub fn public_input_count(&self) -> usize {
        match self {
            CircuitType::EffortThreshold => 7,
            CircuitType::CompositeEffort => 11,
        }
    }

    /// Advisory cost figures for UX and timeout budgeting.
    pub fn config(&self) -> CircuitConfig {
        match self {
            CircuitType::EffortThreshold => CircuitConfig {
                constraints: 12_000,
                proving_time_ms: 1_500,
                verification_time_ms: 50,
                proof_size_bytes: 256,
            },
            CircuitType::CompositeEffort => CircuitConfig {
                constraints: 28_000,
                proving_time_ms: 3_500,
                verification_time_ms: 80,
                proof_size_bytes: 256,
            },
        }
    }
}

impl fmt::Display for CircuitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Per-circuit constants. Hints only; nothing enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitConfig {
    /// Constraint count of the compiled circuit
    pub constraints: u64,
    /// Expected proving latency
    pub proving_time_ms: u64,
    /// Expected verification latency
    pub verification_time_ms: u64,
    /// Serialized proof size
    pub proof_size_bytes: usize,
}

/// Encode an unsigned integer as a fixed-width public input.
pub fn encode_u64(value: u64) -> String {
    format!("0x{:064x}", value)
}

/// Encode a boolean as a fixed-width public input (0 or 1).
pub fn encode_bool(value: bool) -> String {
    encode_u64(u64::from(value))
}

/// Encode an identifier as a field-sized digest.
///
/// The leading byte is zero so the value stays below any ~254-bit modulus.
pub fn encode_label(label: &str) -> String {
    let digest = blake3::hash(label.as_bytes());
    let mut word = [0u8; SIGNAL_BYTES];
    word[1..].copy_from_slice(&digest.as_bytes()[..SIGNAL_BYTES - 1]);
    format!("0x{}", hex::encode(word))
}

fn decode_word(signal: &str) -> ZkResult<[u8; SIGNAL_BYTES]> {
    let digits = signal.strip_prefix("0x").ok_or_else(|| {
        ZkError::MalformedPublicInput(format!("missing 0x prefix: {signal}"))
    })?;
    if digits.len() != SIGNAL_BYTES * 2 {
        return Err(ZkError::MalformedPublicInput(format!(
            "expected {} hex digits, got {}",
            SIGNAL_BYTES * 2,
            digits.len()
        )));
    }
    let mut word = [0u8; SIGNAL_BYTES];
    hex::decode_to_slice(digits, &mut word)
        .map_err(|e| ZkError::MalformedPublicInput(format!("{signal}: {e}")))?;
    Ok(word)
}

/// Decode a fixed-width public input that must hold a `u64`.
pub fn decode_u64(signal: &str) -> ZkResult<u64> {
    let word = decode_word(signal)?;
    let (high, low) = word.split_at(SIGNAL_BYTES - 8);
    if high.iter().any(|b| *b != 0) {
        return Err(ZkError::MalformedPublicInput(format!(
            "value does not fit in 64 bits: {signal}"
        )));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(low);
    Ok(u64::from_be_bytes(bytes))
}

/// Decode a fixed-width public input that must hold 0 or 1.
pub fn decode_bool(signal: &str) -> ZkResult<bool> {
    match decode_u64(signal)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ZkError::MalformedPublicInput(format!(
            "expected boolean, got {other}"
        ))),
    }
}

/// Typed read access to a public-input vector.
#[derive(Debug, Clone, Copy)]
pub struct PublicSignals<'a> {
    circuit: CircuitType,
    values: &'a [String],
}

impl<'a> PublicSignals<'a> {
    /// Wrap a public-input vector, checking its length against the circuit.
    pub fn new(circuit: CircuitType, values: &'a [String]) -> ZkResult<Self> {
        if values.len() != circuit.public_input_count() {
            return Err(ZkError::MalformedPublicInput(format!(
                "{circuit} expects {} public inputs, got {}",
                circuit.public_input_count(),
                values.len()
            )));
        }
        Ok(Self { circuit, values })
    }

    pub fn circuit(&self) -> CircuitType {
        self.circuit
    }

    fn u32_at(&self, index: usize) -> ZkResult<u32> {
        let value = decode_u64(&self.values[index])?;
        u32::try_from(value).map_err(|_| {
            ZkError::MalformedPublicInput(format!("value at {index} exceeds u32: {value}"))
        })
    }

    pub fn threshold(&self) -> ZkResult<u32> {
        self.u32_at(layout::THRESHOLD)
    }

    pub fn min_duration(&self) -> ZkResult<u32> {
        self.u32_at(layout::MIN_DURATION)
    }

    pub fn threshold_met(&self) -> ZkResult<bool> {
        decode_bool(&self.values[layout::THRESHOLD_MET])
    }

    pub fn seconds_above(&self) -> ZkResult<u32> {
        self.u32_at(layout::SECONDS_ABOVE)
    }

    pub fn effort_score(&self) -> ZkResult<u32> {
        self.u32_at(layout::EFFORT_SCORE)
    }

    /// Encoded class identifier digest.
    pub fn class_id(&self) -> &str {
        &self.values[layout::CLASS_ID]
    }

    /// Encoded rider identifier digest.
    pub fn rider_id(&self) -> &str {
        &self.values[layout::RIDER_ID]
    }

    /// Power target and outcome; `None` for single-metric circuits.
    pub fn power(&self) -> ZkResult<Option<(u32, bool)>> {
        match self.circuit {
            CircuitType::EffortThreshold => Ok(None),
            CircuitType::CompositeEffort => Ok(Some((
                self.u32_at(layout::POWER_TARGET)?,
                decode_bool(&self.values[layout::POWER_MET])?,
            ))),
        }
    }

    /// Cadence target and outcome; `None` for single-metric circuits.
    pub fn cadence(&self) -> ZkResult<Option<(u32, bool)>> {
        match self.circuit {
            CircuitType::EffortThreshold => Ok(None),
            CircuitType::CompositeEffort => Ok(Some((
                self.u32_at(layout::CADENCE_TARGET)?,
                decode_bool(&self.values[layout::CADENCE_MET])?,
            ))),
        }
    }
}
