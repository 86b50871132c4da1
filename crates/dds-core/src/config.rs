//! Sampler calibration constants.
//!
//! Supports configuration via:
//! - Rust defaults (`SamplerConfig::default()`)
//! - TOML or JSON documents
//! - Environment variables (DDS_TARGET_OVERHEAD_PCT, DDS_BASE_SAMPLING_INTERVAL,
//!   DDS_EMA_SMOOTHING_FACTOR, DDS_ADJUSTMENT_WINDOW_NS)
//!
//! Every loader validates before returning, so a `SamplerConfig` obtained
//! from this module is always usable by [`crate::DynamicSampler`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, SamplerError};

/// Sampling interval used right after a reset, before any readjustment.
pub const BASE_SAMPLING_INTERVAL: usize = 50;

/// Weight given to the newest observation in every running average.
pub const EMA_SMOOTHING_FACTOR: f64 = 0.6;

/// Minimum time between readjustments.
pub const ADJUSTMENT_WINDOW_NS: i64 = 1_000_000_000;

/// Target overhead applied by `DynamicSampler::new`.
pub const BASE_OVERHEAD_PCT: f64 = 1.0;

pub const ENV_TARGET_OVERHEAD_PCT: &str = "DDS_TARGET_OVERHEAD_PCT";
pub const ENV_BASE_SAMPLING_INTERVAL: &str = "DDS_BASE_SAMPLING_INTERVAL";
pub const ENV_EMA_SMOOTHING_FACTOR: &str = "DDS_EMA_SMOOTHING_FACTOR";
pub const ENV_ADJUSTMENT_WINDOW_NS: &str = "DDS_ADJUSTMENT_WINDOW_NS";

/// Calibration constants for a [`crate::DynamicSampler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Sampling interval after a reset. The counter is pre-armed to
    /// `base_sampling_interval - 1` so the first event is always sampled.
    pub base_sampling_interval: usize,
    /// EMA factor in ]0, 1]. Higher = more weight to recent windows.
    pub ema_smoothing_factor: f64,
    /// Readjustment window length in nanoseconds.
    pub adjustment_window_ns: i64,
    /// Overhead target (percent of wall time) used at construction.
    pub default_target_overhead_pct: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            base_sampling_interval: BASE_SAMPLING_INTERVAL,
            ema_smoothing_factor: EMA_SMOOTHING_FACTOR,
            adjustment_window_ns: ADJUSTMENT_WINDOW_NS,
            default_target_overhead_pct: BASE_OVERHEAD_PCT,
        }
    }
}

impl SamplerConfig {
    /// Check every field against its valid range.
    pub fn validate(&self) -> Result<()> {
        if self.base_sampling_interval == 0 {
            return Err(SamplerError::invalid(
                "base_sampling_interval",
                "must be at least 1",
            ));
        }

        let alpha = self.ema_smoothing_factor;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(SamplerError::invalid(
                "ema_smoothing_factor",
                format!("must be in ]0, 1], got {}", alpha),
            ));
        }

        if self.adjustment_window_ns <= 0 {
            return Err(SamplerError::invalid(
                "adjustment_window_ns",
                format!("must be positive, got {}", self.adjustment_window_ns),
            ));
        }

        validate_target_overhead(self.default_target_overhead_pct)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: SamplerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: SamplerConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `DDS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `DDS_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SamplerConfig::default();

        if let Some(val) = lookup(ENV_TARGET_OVERHEAD_PCT) {
            config.default_target_overhead_pct = parse_override(ENV_TARGET_OVERHEAD_PCT, &val)?;
        }
        if let Some(val) = lookup(ENV_BASE_SAMPLING_INTERVAL) {
            config.base_sampling_interval = parse_override(ENV_BASE_SAMPLING_INTERVAL, &val)?;
        }
        if let Some(val) = lookup(ENV_EMA_SMOOTHING_FACTOR) {
            config.ema_smoothing_factor = parse_override(ENV_EMA_SMOOTHING_FACTOR, &val)?;
        }
        if let Some(val) = lookup(ENV_ADJUSTMENT_WINDOW_NS) {
            config.adjustment_window_ns = parse_override(ENV_ADJUSTMENT_WINDOW_NS, &val)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_sampling_interval(mut self, interval: usize) -> Self {
        self.base_sampling_interval = interval;
        self
    }

    pub fn with_ema_smoothing_factor(mut self, alpha: f64) -> Self {
        self.ema_smoothing_factor = alpha;
        self
    }

    pub fn with_adjustment_window_ns(mut self, window_ns: i64) -> Self {
        self.adjustment_window_ns = window_ns;
        self
    }

    pub fn with_default_target_overhead_pct(mut self, pct: f64) -> Self {
        self.default_target_overhead_pct = pct;
        self
    }
}

/// Validate an overhead target percentage: must be in ]0, 100].
pub fn validate_target_overhead(pct: f64) -> Result<()> {
    // Written as a negated range check so NaN is rejected too.
    if !(pct > 0.0 && pct <= 100.0) {
        return Err(SamplerError::invalid(
            "target_overhead_pct",
            format!("must be a number in ]0, 100], got {}", pct),
        ));
    }
    Ok(())
}

fn parse_override<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| SamplerError::ConfigParse(format!("{}={:?}: {}", key, raw, e)))
}
