//! Exponential moving average with an explicit "no observation yet" state.

use serde::{Deserialize, Serialize};

/// Running exponential moving average.
///
/// The first observation becomes the average as-is; later observations are
/// blended as `(1 - alpha) * avg + alpha * sample`. Higher `alpha` gives
/// more weight to recent samples.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "avg")]
pub enum Ema {
    /// No observation has been folded in yet.
    #[default]
    Empty,
    /// Current smoothed average.
    Value(f64),
}

impl Ema {
    /// Fold `sample` into the average and return the updated value.
    pub fn observe(&mut self, sample: f64, alpha: f64) -> f64 {
        let next = match *self {
            Ema::Empty => sample,
            Ema::Value(avg) => (1.0 - alpha) * avg + alpha * sample,
        };
        *self = Ema::Value(next);
        next
    }

    /// Current average, if any observation has been made.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Ema::Empty => None,
            Ema::Value(avg) => Some(avg),
        }
    }

    /// Current average, or `default` before the first observation.
    pub fn value_or(&self, default: f64) -> f64 {
        self.value().unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Ema::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_seeds_average() {
        let mut ema = Ema::default();
        assert!(ema.is_empty());
        assert_eq!(ema.observe(42.0, 0.6), 42.0);
        assert_eq!(ema.value(), Some(42.0));
    }

    #[test]
    fn later_observations_blend() {
        let mut ema = Ema::Value(10.0);
        // 0.4 * 10 + 0.6 * 20 = 16
        let out = ema.observe(20.0, 0.6);
        assert!((out - 16.0).abs() < 1e-12);
        assert!((ema.value_or(0.0) - 16.0).abs() < 1e-12);
    }

    #[test]
    fn value_or_before_first_observation() {
        let ema = Ema::Empty;
        assert_eq!(ema.value_or(7.5), 7.5);
        assert_eq!(ema.value(), None);
    }

    #[test]
    fn alpha_one_tracks_latest() {
        let mut ema = Ema::Value(100.0);
        ema.observe(3.0, 1.0);
        assert_eq!(ema.value(), Some(3.0));
    }

    #[test]
    fn serializes_tagged() {
        let json = serde_json::to_string(&Ema::Value(1.5)).unwrap();
        assert_eq!(json, r#"{"state":"value","avg":1.5}"#);
        let empty: Ema = serde_json::from_str(r#"{"state":"empty"}"#).unwrap();
        assert_eq!(empty, Ema::Empty);
    }
}
