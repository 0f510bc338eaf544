//! Configuration management for EffortProof.
//!
//! Defaults mirror the pipeline constants: a 600-point session buffer
//! (~10 minutes at 1 Hz), a 5-minute minimum for intermediate proofs and
//! a 60-slot compiled-circuit witness.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding [`ProverConfig::artifact_path`].
pub const ENV_ARTIFACT_PATH: &str = "EFFORTPROOF_ARTIFACT_PATH";
/// Environment variable overriding [`ProverConfig::force_simulated`].
pub const ENV_FORCE_SIMULATED: &str = "EFFORTPROOF_FORCE_SIMULATED";
/// Environment variable overriding [`ProverConfig::proving_deadline_ms`].
pub const ENV_PROVING_DEADLINE_MS: &str = "EFFORTPROOF_PROVING_DEADLINE_MS";
/// Environment variable overriding [`ArchiveConfig::directory`].
pub const ENV_ARCHIVE_DIR: &str = "EFFORTPROOF_ARCHIVE_DIR";
/// Environment variable overriding [`LoggingConfig::json`].
pub const ENV_LOG_JSON: &str = "EFFORTPROOF_LOG_JSON";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionLimits,
    pub prover: ProverConfig,
    pub verifiers: VerifierRegistry,
    pub archive: ArchiveConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLimits {
    /// Resident telemetry points before FIFO eviction starts
    pub buffer_capacity: usize,
    /// Minimum recorded minutes before an intermediate proof is allowed
    pub min_intermediate_minutes: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            buffer_capacity: 600,
            min_intermediate_minutes: 5,
        }
    }
}

/// What the compiled backend does with sessions longer than its witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WitnessOverflow {
    /// Keep the first `witness_capacity` samples and drop the rest
    Truncate,
    /// Fold the series into `witness_capacity` buckets, keeping each bucket's peak
    #[default]
    Downsample,
    /// Refuse to build a witness
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverConfig {
    /// Location of the compiled circuit artifact (file path or http(s) URL)
    pub artifact_path: String,
    /// Pin the orchestrator to the simulated backend
    pub force_simulated: bool,
    /// Time-series slots in the compiled witness
    pub witness_capacity: usize,
    /// Overflow policy for series longer than the witness
    pub witness_overflow: WitnessOverflow,
    /// Deadline for one compiled proving call before falling back
    pub proving_deadline_ms: u64,
}

impl Default for ProverConfig {
    fn default() -> Self {
        Self {
            artifact_path: "circuits/effort_threshold.json".to_string(),
            force_simulated: false,
            witness_capacity: 60,
            witness_overflow: WitnessOverflow::default(),
            proving_deadline_ms: 10_000,
        }
    }
}

/// On-chain verifier identifiers stamped into each proof, per circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierRegistry {
    pub effort_threshold: String,
    pub composite_effort: String,
}

impl Default for VerifierRegistry {
    fn default() -> Self {
        Self {
            effort_threshold: "0x0000000000000000000000000000000000000e01".to_string(),
            composite_effort: "0x0000000000000000000000000000000000000e02".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory for the file archive; `None` disables archiving
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable output
    pub json: bool,
}

impl Config {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    /// Apply `EFFORTPROOF_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production).
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_ARTIFACT_PATH) {
            self.prover.artifact_path = path;
        }
        if let Some(raw) = lookup(ENV_FORCE_SIMULATED) {
            self.prover.force_simulated = parse_flag(ENV_FORCE_SIMULATED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PROVING_DEADLINE_MS) {
            self.prover.proving_deadline_ms =
                raw.trim().parse().map_err(|_| CoreError::InvalidEnv {
                    key: ENV_PROVING_DEADLINE_MS.to_string(),
                    value: raw.clone(),
                })?;
        }
        if let Some(dir) = lookup(ENV_ARCHIVE_DIR) {
            self.archive.directory = if dir.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        if let Some(raw) = lookup(ENV_LOG_JSON) {
            self.logging.json = parse_flag(ENV_LOG_JSON, &raw)?;
        }
        self.validate()
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.session.buffer_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "session.buffer_capacity must be positive".to_string(),
            ));
        }
        // Intermediate proofs need the minimum window to fit in the buffer at 1 Hz.
        let required = self.session.min_intermediate_minutes as usize * 60;
        if required > self.session.buffer_capacity {
            return Err(CoreError::InvalidConfig(format!(
                "session.min_intermediate_minutes ({}) needs {} points but buffer_capacity is {}",
                self.session.min_intermediate_minutes, required, self.session.buffer_capacity
            )));
        }
        if self.prover.witness_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "prover.witness_capacity must be positive".to_string(),
            ));
        }
        if self.prover.proving_deadline_ms == 0 {
            return Err(CoreError::InvalidConfig(
                "prover.proving_deadline_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CoreError::InvalidEnv {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
