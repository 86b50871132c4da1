//! Periodic recalibration of the sampling interval.
//!
//! Once per adjustment window the sampler solves for the probability `p`
//! that keeps sampling time within budget:
//!
//! ```text
//! window_time = working_time + sampling_time
//! sampling_time = events_per_ns * working_time * p * cost_per_sample
//!
//! p = target_sampling_time / (events_per_ns * working_time * cost_per_sample)
//!   = max_allowed_sampling_time / time_to_sample_all_events
//! ```
//!
//! clamped to [0, 1]. The interval is then `ceil(1 / p)`.
//!
//! The budget itself is corrected downwards when a window overshoots it
//! (bursty, non-uniform event arrival). The correction is an EMA that is
//! updated even in windows without samples, so a single large spike decays
//! instead of pinning the probability at 0 forever.

use dds_math::{interval_for_probability, max_f64, max_i64, min_f64, truncate_ns, Ema};

use super::{DynamicSampler, ReadjustmentSnapshot};
use crate::logging::event_names;

impl DynamicSampler {
    /// Recompute decision parameters if a full window has elapsed.
    pub(super) fn maybe_readjust(&mut self, now_ns: i64) {
        let adjustment_window_ns = self.config.adjustment_window_ns;
        let alpha = self.config.ema_smoothing_factor;
        let target_overhead_pct = self.target_overhead_pct;
        let state = &mut self.state;

        // A zero readjustment time means "never readjusted": force one now.
        let window_time_ns = if state.last_readjust_time_ns == 0 {
            adjustment_window_ns
        } else {
            now_ns.saturating_sub(state.last_readjust_time_ns)
        };

        if window_time_ns < adjustment_window_ns {
            if window_time_ns < 0 && !state.clock_regression_reported {
                state.clock_regression_reported = true;
                tracing::warn!(
                    event = event_names::CLOCK_REGRESSION,
                    label = %self.label,
                    now_ns,
                    last_readjust_time_ns = state.last_readjust_time_ns,
                    "timestamp went backwards; readjustment postponed until the clock catches up"
                );
            }
            return;
        }

        let first_window = !state.has_completed_full_adjustment_window;
        let events_in_window = state.events_since_last_readjustment;
        let samples_in_window = state.samples_since_last_readjustment;
        let sampling_window_time_ns = state.sampling_time_since_last_readjustment_ns;

        // Event rate: only updated when the window saw events.
        if events_in_window > 0 {
            state
                .events_per_ns
                .observe(events_in_window as f64 / window_time_ns as f64, alpha);
        }
        let events_per_ns = state.events_per_ns.value_or(0.0);

        // Per-sample cost: can only be estimated from windows that sampled.
        if samples_in_window > 0 {
            let avg_sampling_time_ns = sampling_window_time_ns / samples_in_window as i64;
            state
                .sampling_time_ns
                .observe(avg_sampling_time_ns as f64, alpha);
        }
        let sampling_time_ns = state.sampling_time_ns.value_or(0.0);

        // Overshoot is always >= 0; undershooting leaves the budget alone.
        let reference_target_sampling_time_ns =
            truncate_ns(window_time_ns as f64 * (target_overhead_pct / 100.0));
        let sampling_overshoot_time_ns = max_i64(
            0,
            sampling_window_time_ns.saturating_sub(reference_target_sampling_time_ns),
        );
        let last_adjustment = -min_f64(
            target_overhead_pct,
            sampling_overshoot_time_ns as f64 * 100.0 / window_time_ns as f64,
        );
        let adjustment = state
            .target_overhead_adjustment
            .observe(last_adjustment, alpha)
            .clamp(-target_overhead_pct, 0.0);
        state.target_overhead_adjustment = Ema::Value(adjustment);

        let effective_target_overhead_pct = max_f64(0.0, target_overhead_pct + adjustment);
        let target_sampling_time_ns =
            truncate_ns(window_time_ns as f64 * (effective_target_overhead_pct / 100.0));

        let working_window_time_ns =
            max_i64(0, window_time_ns.saturating_sub(sampling_window_time_ns));
        let time_to_sample_all_events_ns =
            truncate_ns(events_per_ns * working_window_time_ns as f64 * sampling_time_ns);

        let sampling_probability = if target_sampling_time_ns == 0 {
            // No budget at all.
            0.0
        } else if time_to_sample_all_events_ns == 0 {
            // Nothing observed that costs anything; sample everything.
            1.0
        } else {
            min_f64(
                1.0,
                target_sampling_time_ns as f64 / time_to_sample_all_events_ns as f64,
            )
            .max(0.0)
        };
        let sampling_interval = interval_for_probability(sampling_probability);

        state.sampling_probability = sampling_probability;
        state.sampling_interval = sampling_interval;

        state.events_since_last_readjustment = 0;
        state.samples_since_last_readjustment = 0;
        state.sampling_time_since_last_readjustment_ns = 0;
        state.last_readjust_time_ns = now_ns;
        state.has_completed_full_adjustment_window = true;

        let snapshot = ReadjustmentSnapshot {
            label: self.label.clone(),
            now_ns,
            window_time_ns,
            events_in_window,
            samples_in_window,
            events_per_sec: events_per_ns * 1e9,
            sampling_time_ns,
            sampling_window_time_ns,
            reference_target_sampling_time_ns,
            sampling_overshoot_time_ns,
            working_window_time_ns,
            time_to_sample_all_events_ns,
            sampling_interval,
            sampling_probability,
            target_overhead_pct,
            target_overhead_adjustment: adjustment,
            effective_target_overhead_pct,
            target_sampling_time_ns,
            first_window,
        };

        tracing::debug!(
            event = event_names::SAMPLER_READJUSTED,
            label = %snapshot.label,
            window_time_ns,
            events_in_window,
            samples_in_window,
            events_per_sec = snapshot.events_per_sec,
            sampling_time_ns,
            sampling_window_time_ns,
            sampling_overshoot_time_ns,
            sampling_interval,
            sampling_probability,
            target_overhead_adjustment = adjustment,
            target_sampling_time_ns,
            "readjusted sampling parameters"
        );

        if let Some(observer) = &self.observer {
            observer.on_readjust(&snapshot);
        }
    }
}
