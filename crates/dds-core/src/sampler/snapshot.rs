//! Readjustment snapshots and the observer hook they are delivered to.

use serde::{Deserialize, Serialize};

const NS_PER_SEC: f64 = 1e9;
const PROJECTION_SECS: f64 = 60.0;

/// Every intermediate value computed by one readjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadjustmentSnapshot {
    pub label: String,
    /// Timestamp the readjustment ran at.
    pub now_ns: i64,
    pub window_time_ns: i64,
    pub events_in_window: usize,
    pub samples_in_window: usize,
    /// Smoothed event arrival rate after this window.
    pub events_per_sec: f64,
    /// Smoothed per-sample cost after this window.
    pub sampling_time_ns: f64,
    /// Time actually spent sampling during the window.
    pub sampling_window_time_ns: i64,
    /// Sampling budget for the window at the nominal target.
    pub reference_target_sampling_time_ns: i64,
    pub sampling_overshoot_time_ns: i64,
    pub working_window_time_ns: i64,
    pub time_to_sample_all_events_ns: i64,
    pub sampling_interval: usize,
    pub sampling_probability: f64,
    pub target_overhead_pct: f64,
    pub target_overhead_adjustment: f64,
    /// Nominal target after the overshoot correction was applied.
    pub effective_target_overhead_pct: f64,
    pub target_sampling_time_ns: i64,
    pub first_window: bool,
}

/// Extrapolations over a one-minute horizon, useful when eyeballing whether
/// the sampler is on track to honour its budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinuteProjection {
    pub expected_events: f64,
    pub expected_samples: f64,
    pub expected_sampling_secs: f64,
    /// What the last window's real sampling time scales to over a minute.
    pub observed_sampling_secs: f64,
    pub max_allowed_sampling_secs: f64,
}

impl ReadjustmentSnapshot {
    /// Project the new parameters over the next 60 seconds.
    pub fn minute_projection(&self) -> MinuteProjection {
        let expected_events = self.events_per_sec * PROJECTION_SECS;
        let expected_samples = expected_events * self.sampling_probability;
        let expected_sampling_secs = expected_samples * self.sampling_time_ns / NS_PER_SEC;
        let observed_sampling_secs = if self.window_time_ns > 0 {
            self.sampling_window_time_ns as f64 / self.window_time_ns as f64 * PROJECTION_SECS
        } else {
            0.0
        };
        MinuteProjection {
            expected_events,
            expected_samples,
            expected_sampling_secs,
            observed_sampling_secs,
            max_allowed_sampling_secs: self.effective_target_overhead_pct / 100.0 * PROJECTION_SECS,
        }
    }

    /// Sampling time as a percentage of the window it was observed in.
    pub fn observed_overhead_pct(&self) -> f64 {
        if self.window_time_ns <= 0 {
            return 0.0;
        }
        self.sampling_window_time_ns as f64 * 100.0 / self.window_time_ns as f64
    }
}

/// Receives a snapshot at the end of every readjustment.
///
/// Invoked synchronously on the thread that triggered the readjustment, so
/// implementations should be cheap (hand off to a channel or a counter).
pub trait ReadjustObserver: Send + Sync {
    fn on_readjust(&self, snapshot: &ReadjustmentSnapshot);
}

impl<F> ReadjustObserver for F
where
    F: Fn(&ReadjustmentSnapshot) + Send + Sync,
{
    fn on_readjust(&self, snapshot: &ReadjustmentSnapshot) {
        self(snapshot)
    }
}
