//! Overhead-bounded discrete dynamic sampler.
//!
//! Decides, for a high-frequency stream of events, which ones to fully
//! instrument while keeping the time spent sampling under a target
//! percentage of wall time. Decisions are O(1): a skip counter is compared
//! against a sampling interval. Once per adjustment window the interval is
//! recomputed from smoothed estimates of the event rate and of the cost of
//! a single sample (see [`readjust`]).
//!
//! # Usage
//!
//! ```
//! use dds_core::DynamicSampler;
//!
//! let mut sampler = DynamicSampler::new("allocations");
//! sampler.configure(2.0, 1_000).unwrap();
//!
//! if sampler.should_sample(1_500) {
//!     // ... collect the event ...
//!     let elapsed_ns = sampler.after_sample(4_500);
//!     assert_eq!(elapsed_ns, 3_000);
//! }
//! ```
//!
//! # Time
//!
//! The sampler never reads a clock. Every time-sensitive operation takes
//! `now_ns` from the caller, and those timestamps must be non-decreasing
//! across calls on one instance. Negative sample durations are clamped to
//! zero; a timestamp earlier than the last readjustment simply postpones
//! the next readjustment and is reported once via `tracing::warn!`. See
//! [`crate::clock`] for clock-reading wrappers.
//!
//! # Concurrency
//!
//! No internal locking. Drive one instance from a single context, or wrap
//! it in a lock that serializes every operation, or keep one instance per
//! context.

pub mod readjust;
pub mod snapshot;

use std::fmt;
use std::sync::Arc;

use dds_math::Ema;
use serde::{Deserialize, Serialize};

use crate::config::{validate_target_overhead, SamplerConfig};
use crate::error::Result;
use crate::logging::event_names;

pub use snapshot::{MinuteProjection, ReadjustObserver, ReadjustmentSnapshot};

/// Per-stream sampler state.
#[derive(Clone)]
pub struct DynamicSampler {
    label: String,
    config: SamplerConfig,
    target_overhead_pct: f64,
    state: SamplerState,
    observer: Option<Arc<dyn ReadjustObserver>>,
}

/// Everything a reset reinitializes.
#[derive(Debug, Clone, PartialEq)]
struct SamplerState {
    // Cleared at every readjustment.
    events_since_last_readjustment: usize,
    samples_since_last_readjustment: usize,
    sampling_time_since_last_readjustment_ns: i64,

    // Cleared at every sample.
    events_since_last_sample: usize,
    sample_start_time_ns: i64,

    // Calibration model, carried across windows.
    events_per_ns: Ema,
    sampling_time_ns: Ema,
    target_overhead_adjustment: Ema,

    // Decision parameters, recomputed every window.
    sampling_probability: f64,
    sampling_interval: usize,

    last_readjust_time_ns: i64,
    has_completed_full_adjustment_window: bool,
    clock_regression_reported: bool,
}

impl SamplerState {
    /// State right after a reset at `now_ns`.
    ///
    /// A reset counts as a readjustment at `now_ns` using the base interval,
    /// so statistics are only trusted after a full window. The skip counter
    /// sits one below the interval so the next event is sampled and the
    /// first real readjustment has at least one cost observation.
    fn bootstrap(config: &SamplerConfig, now_ns: i64) -> Self {
        let interval = config.base_sampling_interval;
        Self {
            events_since_last_readjustment: 0,
            samples_since_last_readjustment: 0,
            sampling_time_since_last_readjustment_ns: 0,
            events_since_last_sample: interval - 1,
            sample_start_time_ns: 0,
            events_per_ns: Ema::Empty,
            sampling_time_ns: Ema::Empty,
            target_overhead_adjustment: Ema::Empty,
            sampling_probability: 1.0 / interval as f64,
            sampling_interval: interval,
            last_readjust_time_ns: now_ns,
            has_completed_full_adjustment_window: false,
            clock_regression_reported: false,
        }
    }
}

/// Read-only copy of the sampler's counters and calibration model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerStats {
    pub label: String,
    pub target_overhead_pct: f64,
    pub sampling_interval: usize,
    pub sampling_probability: f64,
    pub events_since_last_sample: usize,
    pub events_since_last_readjustment: usize,
    pub samples_since_last_readjustment: usize,
    pub sampling_time_since_last_readjustment_ns: i64,
    /// `None` until the first window with events.
    pub events_per_ns: Option<f64>,
    /// `None` until the first window with samples.
    pub sampling_time_ns: Option<f64>,
    pub target_overhead_adjustment: Option<f64>,
    pub last_readjust_time_ns: i64,
    pub has_completed_full_adjustment_window: bool,
    pub sample_in_flight: bool,
}

impl DynamicSampler {
    /// New sampler with default calibration, reset at time 0.
    ///
    /// Because the readjustment clock starts at 0, the first operation that
    /// can readjust treats the window as exactly one window long.
    pub fn new(label: impl Into<String>) -> Self {
        let config = SamplerConfig::default();
        let target_overhead_pct = config.default_target_overhead_pct;
        let state = SamplerState::bootstrap(&config, 0);
        Self {
            label: label.into(),
            config,
            target_overhead_pct,
            state,
            observer: None,
        }
    }

    /// New sampler with custom calibration, reset at time 0.
    pub fn with_config(label: impl Into<String>, config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        let target_overhead_pct = config.default_target_overhead_pct;
        let state = SamplerState::bootstrap(&config, 0);
        Ok(Self {
            label: label.into(),
            config,
            target_overhead_pct,
            state,
            observer: None,
        })
    }

    /// Install a hook invoked at the end of every readjustment.
    pub fn with_observer<O: ReadjustObserver + 'static>(mut self, observer: O) -> Self {
        self.set_observer(observer);
        self
    }

    pub fn set_observer<O: ReadjustObserver + 'static>(&mut self, observer: O) {
        self.observer = Some(Arc::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Reinitialize counters, model and decision parameters.
    ///
    /// Keeps the label, calibration and target overhead. Use after any
    /// discontinuity (e.g. a fork) that timers and counters must not span.
    pub fn reset(&mut self, now_ns: i64) {
        self.state = SamplerState::bootstrap(&self.config, now_ns);
        tracing::debug!(
            event = event_names::SAMPLER_RESET,
            label = %self.label,
            now_ns,
            target_overhead_pct = self.target_overhead_pct,
            "sampler reset"
        );
    }

    /// Set a new overhead target (percent of wall time) and reset.
    ///
    /// Fails with `InvalidConfiguration` unless `0 < pct <= 100`, in which
    /// case the sampler is left untouched.
    pub fn configure(&mut self, target_overhead_pct: f64, now_ns: i64) -> Result<()> {
        validate_target_overhead(target_overhead_pct)?;
        self.target_overhead_pct = target_overhead_pct;
        tracing::debug!(
            event = event_names::SAMPLER_CONFIGURED,
            label = %self.label,
            target_overhead_pct,
            "sampler configured"
        );
        self.reset(now_ns);
        Ok(())
    }

    /// Decide whether the current event should be sampled.
    ///
    /// Systematic sampling: every `sampling_interval`-th event is selected.
    /// On `true` the caller must call [`after_sample`](Self::after_sample)
    /// once collection is done. On `false` a readjustment may run.
    #[inline]
    pub fn should_sample(&mut self, now_ns: i64) -> bool {
        let state = &mut self.state;
        state.events_since_last_sample = state.events_since_last_sample.saturating_add(1);
        state.events_since_last_readjustment =
            state.events_since_last_readjustment.saturating_add(1);

        let should_sample = state.sampling_interval > 0
            && state.events_since_last_sample >= state.sampling_interval;

        if should_sample {
            state.sample_start_time_ns = now_ns;
        } else {
            self.maybe_readjust(now_ns);
        }

        should_sample
    }

    /// Record the end of a sample and return how long it took.
    ///
    /// Returns 0 when no sample was in flight or when `now_ns` precedes the
    /// sample start.
    pub fn after_sample(&mut self, now_ns: i64) -> i64 {
        let state = &mut self.state;
        let elapsed_ns = if state.sample_start_time_ns == 0 {
            0
        } else {
            dds_math::max_i64(0, now_ns.saturating_sub(state.sample_start_time_ns))
        };

        state.samples_since_last_readjustment =
            state.samples_since_last_readjustment.saturating_add(1);
        state.sampling_time_since_last_readjustment_ns = state
            .sampling_time_since_last_readjustment_ns
            .saturating_add(elapsed_ns);
        state.events_since_last_sample = 0;
        state.sample_start_time_ns = 0;

        self.maybe_readjust(now_ns);

        elapsed_ns
    }

    /// Current sampling probability as a percentage in [0, 100].
    pub fn current_probability(&self) -> f64 {
        self.state.sampling_probability * 100.0
    }

    pub fn events_since_last_sample(&self) -> usize {
        self.state.events_since_last_sample
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn target_overhead_pct(&self) -> f64 {
        self.target_overhead_pct
    }

    /// 0 means sampling is disabled until the next readjustment.
    pub fn sampling_interval(&self) -> usize {
        self.state.sampling_interval
    }

    /// Sampling probability in [0, 1].
    pub fn sampling_probability(&self) -> f64 {
        self.state.sampling_probability
    }

    pub fn stats(&self) -> SamplerStats {
        let state = &self.state;
        SamplerStats {
            label: self.label.clone(),
            target_overhead_pct: self.target_overhead_pct,
            sampling_interval: state.sampling_interval,
            sampling_probability: state.sampling_probability,
            events_since_last_sample: state.events_since_last_sample,
            events_since_last_readjustment: state.events_since_last_readjustment,
            samples_since_last_readjustment: state.samples_since_last_readjustment,
            sampling_time_since_last_readjustment_ns: state
                .sampling_time_since_last_readjustment_ns,
            events_per_ns: state.events_per_ns.value(),
            sampling_time_ns: state.sampling_time_ns.value(),
            target_overhead_adjustment: state.target_overhead_adjustment.value(),
            last_readjust_time_ns: state.last_readjust_time_ns,
            has_completed_full_adjustment_window: state.has_completed_full_adjustment_window,
            sample_in_flight: state.sample_start_time_ns != 0,
        }
    }
}

impl fmt::Debug for DynamicSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicSampler")
            .field("label", &self.label)
            .field("config", &self.config)
            .field("target_overhead_pct", &self.target_overhead_pct)
            .field("state", &self.state)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}
