//! End-to-end scenarios driving the sampler with synthetic timestamps.
//!
//! Each scenario simulates an event stream where time advances by a fixed
//! gap between events, plus the cost of every sample taken.

use std::sync::{Arc, Mutex};

use dds_core::{DynamicSampler, ReadjustmentSnapshot, SamplerConfig, SamplerError};

const SEC: i64 = 1_000_000_000;
const MS: i64 = 1_000_000;
const US: i64 = 1_000;

/// Feed `events` events spaced `gap_ns` apart; every sampled event costs `cost_ns`.
/// Returns the time after the last event.
fn drive(sampler: &mut DynamicSampler, mut now: i64, events: usize, gap_ns: i64, cost_ns: i64) -> i64 {
    for _ in 0..events {
        now += gap_ns;
        if sampler.should_sample(now) {
            now += cost_ns;
            sampler.after_sample(now);
        }
    }
    now
}

/// Three one-second windows of 9k events with a 10us sample cost.
fn warmed_up_sampler(label: &str) -> (DynamicSampler, i64) {
    let mut sampler = DynamicSampler::new(label);
    sampler.reset(SEC);
    let mut now = SEC;
    for _ in 0..3 {
        let window_start = now;
        now = drive(&mut sampler, now, 9_000, 100 * US, 10 * US);
        now = now.max(window_start + SEC);
        sampler.should_sample(now);
    }
    (sampler, now)
}

// ============================================================================
// Bootstrap
// ============================================================================

#[test]
fn first_event_after_reset_is_sampled() {
    let mut sampler = DynamicSampler::new("bootstrap");
    sampler.reset(0);
    assert_eq!(sampler.events_since_last_sample(), 49);
    assert!(sampler.should_sample(0));
}

#[test]
fn first_event_after_configure_is_sampled() {
    let mut sampler = DynamicSampler::new("bootstrap");
    let _ = drive(&mut sampler, 0, 1_000, 10 * US, US);
    sampler.configure(4.0, 50 * SEC).unwrap();
    assert!(sampler.should_sample(50 * SEC + 1));
}

#[test]
fn invalid_configure_reports_invalid_configuration() {
    let mut sampler = DynamicSampler::new("config");
    sampler.configure(2.0, SEC).unwrap();
    let before = sampler.stats();

    let err = sampler.configure(101.0, 2 * SEC).unwrap_err();
    assert!(matches!(err, SamplerError::InvalidConfiguration { .. }));
    assert_eq!(err.code(), 10);
    assert_eq!(sampler.stats(), before);
    assert_eq!(sampler.target_overhead_pct(), 2.0);
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn steady_stream_converges_to_target_overhead() {
    // 1M events/s of application work, 10us per sample, 1% target.
    // Ideal probability: 1% of 1s / (1e6 events * 10us) = 0.1%.
    let mut sampler = DynamicSampler::new("steady");
    sampler.reset(1);

    let mut now: i64 = 1;
    let end = 1 + 10 * SEC;
    let mut sampling_ns_per_sec = vec![0i64; 11];
    while now < end {
        now += US;
        if sampler.should_sample(now) {
            now += 10 * US;
            let elapsed = sampler.after_sample(now);
            assert_eq!(elapsed, 10 * US);
            sampling_ns_per_sec[((now - 1) / SEC) as usize] += elapsed;
        }
        let p = sampler.current_probability();
        assert!((0.0..=100.0).contains(&p));
    }

    let p = sampler.current_probability();
    assert!(p > 0.08 && p < 0.12, "probability {}% not near 0.1%", p);
    let interval = sampler.sampling_interval();
    assert!((800..=1_250).contains(&interval), "interval {}", interval);

    let stats = sampler.stats();
    assert_eq!(stats.sampling_time_ns, Some(10_000.0));

    // Once the EMAs settle, each second stays close to the 10ms budget.
    for (sec, sampling_ns) in sampling_ns_per_sec.iter().enumerate().take(10).skip(6) {
        let overhead_pct = *sampling_ns as f64 * 100.0 / SEC as f64;
        assert!(overhead_pct <= 1.1, "second {} overhead {}%", sec, overhead_pct);
        assert!(overhead_pct >= 0.8, "second {} overhead {}%", sec, overhead_pct);
    }
}

#[test]
fn low_rate_stream_samples_everything() {
    // 100 events/s with 1us samples is far under any budget.
    let mut sampler = DynamicSampler::new("trickle");
    sampler.reset(SEC);
    let mut now = SEC;
    for _ in 0..3 {
        now = drive(&mut sampler, now, 100, 10 * MS, US);
    }
    assert_eq!(sampler.sampling_interval(), 1);
    assert!((sampler.current_probability() - 100.0).abs() < 1e-9);
}

// ============================================================================
// Burst self-correction
// ============================================================================

#[test]
fn burst_pulls_probability_below_unburst_baseline() {
    let (mut burst, t_burst) = warmed_up_sampler("burst");
    let (mut calm, t_calm) = warmed_up_sampler("calm");
    assert_eq!(t_burst, t_calm);
    assert_eq!(burst.sampling_interval(), calm.sampling_interval());

    // Same 10k events; the burst stream pays 1ms per sample.
    let end_burst = drive(&mut burst, t_burst, 10_000, 10 * US, MS);
    let end_calm = drive(&mut calm, t_calm, 10_000, 10 * US, 10 * US);
    burst.should_sample(end_burst.max(t_burst + SEC));
    calm.should_sample(end_calm.max(t_calm + SEC));

    let adjustment = burst.stats().target_overhead_adjustment.unwrap();
    assert!(adjustment < 0.0, "adjustment {}", adjustment);
    assert!(adjustment >= -burst.target_overhead_pct());
    assert!(
        burst.sampling_probability() < calm.sampling_probability(),
        "burst p={} calm p={}",
        burst.sampling_probability(),
        calm.sampling_probability()
    );
}

#[test]
fn massive_overshoot_recovers_instead_of_sticking_at_zero() {
    let mut sampler = DynamicSampler::new("spike");
    sampler.reset(SEC);
    // A single sample eating half a second.
    assert!(sampler.should_sample(SEC));
    sampler.after_sample(SEC + 500 * MS);
    sampler.should_sample(2 * SEC);
    assert_eq!(sampler.sampling_interval(), 0);
    assert_eq!(sampler.current_probability(), 0.0);

    let mut now = 2 * SEC;
    for _ in 0..10 {
        let window_start = now;
        now = drive(&mut sampler, now, 1_000, 100 * US, 10 * US);
        now = now.max(window_start + SEC);
        sampler.should_sample(now);
    }
    assert!(sampler.sampling_interval() > 0);
    assert!(sampler.current_probability() > 0.0);
}

// ============================================================================
// Window bookkeeping
// ============================================================================

#[test]
fn zero_event_window_keeps_event_rate() {
    let mut sampler = DynamicSampler::new("quiet");
    sampler.reset(SEC);
    let now = drive(&mut sampler, SEC, 500, MS, 10 * US);
    // Close the window with a completion so the boundary call cannot start a sample.
    sampler.after_sample(now.max(2 * SEC));
    let rate = sampler.stats().events_per_ns;
    assert!(rate.is_some());
    let last = sampler.stats().last_readjust_time_ns;

    // A completion with no new events, one window later.
    sampler.after_sample(last + SEC);
    let stats = sampler.stats();
    assert_eq!(stats.events_per_ns, rate);
    assert_eq!(stats.last_readjust_time_ns, last + SEC);
    assert_eq!(stats.events_since_last_readjustment, 0);
    assert_eq!(stats.samples_since_last_readjustment, 0);
    assert_eq!(stats.sampling_time_since_last_readjustment_ns, 0);
}

#[test]
fn observer_sees_every_readjustment() {
    let seen: Arc<Mutex<Vec<ReadjustmentSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let mut sampler = DynamicSampler::new("observed").with_observer(move |s: &ReadjustmentSnapshot| {
        sink.lock().unwrap().push(s.clone());
    });
    sampler.reset(SEC);

    let mut now = SEC;
    for _ in 0..5 {
        let window_start = now;
        now = drive(&mut sampler, now, 2_000, 100 * US, 5 * US);
        now = now.max(window_start + SEC);
        sampler.should_sample(now);
    }

    let snapshots = seen.lock().unwrap();
    assert!(snapshots.len() >= 4, "only {} readjustments", snapshots.len());
    assert!(snapshots[0].first_window);
    assert!(snapshots[1..].iter().all(|s| !s.first_window));
    for s in snapshots.iter() {
        assert_eq!(s.label, "observed");
        assert!(s.window_time_ns >= SEC);
        assert!((0.0..=1.0).contains(&s.sampling_probability));
        assert!(s.target_overhead_adjustment <= 0.0);
        let projection = s.minute_projection();
        assert!(projection.expected_samples <= projection.expected_events + 1e-9);
    }
}

#[test]
fn custom_calibration_is_honoured() {
    let config = SamplerConfig::default()
        .with_base_sampling_interval(10)
        .with_adjustment_window_ns(100 * MS)
        .with_default_target_overhead_pct(5.0);
    let mut sampler = DynamicSampler::with_config("custom", config).unwrap();
    assert_eq!(sampler.target_overhead_pct(), 5.0);
    sampler.reset(SEC);
    assert_eq!(sampler.sampling_interval(), 10);
    assert!(sampler.should_sample(SEC));
    sampler.after_sample(SEC + US);

    sampler.should_sample(SEC + 100 * MS);
    assert_eq!(sampler.stats().last_readjust_time_ns, SEC + 100 * MS);
}
