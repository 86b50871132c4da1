//! Clock seam for hosts that want the sampler to read time itself.
//!
//! [`DynamicSampler`] takes every timestamp as a parameter so it can be
//! driven by synthetic time. [`ClockedSampler`] pairs it with a [`Clock`]
//! for hosts that just want `should_sample()` / `after_sample()`.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use crate::config::SamplerConfig;
use crate::error::Result;
use crate::sampler::{DynamicSampler, ReadjustObserver};

/// Source of monotonic nanosecond timestamps.
pub trait Clock {
    fn now_ns(&self) -> i64;
}

static ANCHOR: OnceLock<Instant> = OnceLock::new();

/// Nanoseconds since a process-wide anchor taken on first use.
///
/// Readings start at 1: the sampler treats 0 as "never happened".
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now_ns(&self) -> i64 {
        let anchor = ANCHOR.get_or_init(Instant::now);
        let elapsed = anchor.elapsed().as_nanos();
        i64::try_from(elapsed).unwrap_or(i64::MAX - 1) + 1
    }
}

/// Hand-driven clock for tests and simulations.
///
/// Clones share the same time, so a test can keep a handle while a
/// [`ClockedSampler`] owns another. Like [`MonotonicClock`], the default
/// starts at 1: a sample started at 0 reads as "no sample in flight" and
/// its cost is recorded as 0.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ManualClock {
    /// Avoid starting at 0 if samples may begin before the first advance.
    pub fn new(start_ns: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ns)),
        }
    }

    pub fn set(&self, now_ns: i64) {
        self.now.store(now_ns, Ordering::SeqCst);
    }

    /// Move time forward and return the new reading.
    pub fn advance(&self, delta_ns: i64) -> i64 {
        self.now.fetch_add(delta_ns, Ordering::SeqCst) + delta_ns
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A [`DynamicSampler`] that reads timestamps from a [`Clock`].
#[derive(Debug, Clone)]
pub struct ClockedSampler<C: Clock = MonotonicClock> {
    sampler: DynamicSampler,
    clock: C,
}

impl ClockedSampler<MonotonicClock> {
    /// Sampler with default calibration reset at the current monotonic time.
    pub fn monotonic(label: impl Into<String>) -> Self {
        Self::new(label, MonotonicClock)
    }
}

impl<C: Clock> ClockedSampler<C> {
    /// Default calibration, reset at the clock's current reading.
    pub fn new(label: impl Into<String>, clock: C) -> Self {
        let mut sampler = DynamicSampler::new(label);
        sampler.reset(clock.now_ns());
        Self { sampler, clock }
    }

    pub fn with_config(label: impl Into<String>, config: SamplerConfig, clock: C) -> Result<Self> {
        let mut sampler = DynamicSampler::with_config(label, config)?;
        sampler.reset(clock.now_ns());
        Ok(Self { sampler, clock })
    }

    pub fn with_observer<O: ReadjustObserver + 'static>(mut self, observer: O) -> Self {
        self.sampler.set_observer(observer);
        self
    }

    pub fn reset(&mut self) {
        let now = self.clock.now_ns();
        self.sampler.reset(now);
    }

    pub fn configure(&mut self, target_overhead_pct: f64) -> Result<()> {
        let now = self.clock.now_ns();
        self.sampler.configure(target_overhead_pct, now)
    }

    #[inline]
    pub fn should_sample(&mut self) -> bool {
        let now = self.clock.now_ns();
        self.sampler.should_sample(now)
    }

    pub fn after_sample(&mut self) -> i64 {
        let now = self.clock.now_ns();
        self.sampler.after_sample(now)
    }

    pub fn current_probability(&self) -> f64 {
        self.sampler.current_probability()
    }

    pub fn sampler(&self) -> &DynamicSampler {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut DynamicSampler {
        &mut self.sampler
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_inner(self) -> DynamicSampler {
        self.sampler
    }
}
